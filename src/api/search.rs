//! Search API endpoints.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::{ok, ApiQuery, ApiResult};
use crate::models::Book;
use crate::services::BookService;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_search_limit() -> usize {
    20
}

/// Search results with paging metadata.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    /// Number of indexed books matching the query, across all pages
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Single search result item.
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub book: Book,
    pub score: f32,
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// GET /books/search - Full-text search over the catalogue.
///
/// `offset` above [`MAX_SEARCH_OFFSET`](crate::search::MAX_SEARCH_OFFSET) is rejected with 422.
pub async fn search_books(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let limit = params.limit.min(MAX_SEARCH_LIMIT);

    let page = state.search.search(&params.q, limit, params.offset)?;

    // Hydrate hits from the database so copy counts are current
    let ids: Vec<String> = page.hits.iter().map(|hit| hit.book_id.clone()).collect();
    let books = BookService::new(&state.repo).get_books(&ids).await?;

    let results: Vec<SearchResultItem> = page
        .hits
        .into_iter()
        .filter_map(|hit| {
            books
                .iter()
                .find(|book| book.id == hit.book_id)
                .map(|book| SearchResultItem {
                    book: book.clone(),
                    score: hit.score,
                })
        })
        .collect();

    ok(SearchResponse {
        results,
        total: page.total,
        limit,
        offset: params.offset,
    })
}
