//! Book API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::{created, default_limit, non_empty, ok, ApiQuery, ApiResult, ValidJson};
use crate::errors::AppError;
use crate::models::{Book, BookCreate, BookFilter, BookUpdate};
use crate::services::BookService;
use crate::AppState;

/// Query parameters for listing books.
#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
}

/// GET /books - List books with optional exact-match filters.
pub async fn list_books(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListBooksQuery>,
) -> ApiResult<Vec<Book>> {
    let filter = BookFilter {
        title: non_empty(params.title),
        author: non_empty(params.author),
        genre: non_empty(params.genre),
    };

    let books = BookService::new(&state.repo)
        .list_books(&filter, params.skip, params.limit)
        .await?;
    ok(books)
}

/// GET /books/{id} - Get a single book.
pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Book> {
    ok(BookService::new(&state.repo).get_book(&id).await?)
}

/// POST /books - Add a book to the catalogue.
pub async fn create_book(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<BookCreate>,
) -> ApiResult<Book> {
    let book = BookService::new(&state.repo).create_book(&request).await?;

    if let Err(e) = state.search.index_book(&book).await {
        tracing::warn!("Failed to index book {}: {}", book.id, e);
    }

    created(book)
}

/// PATCH /books/{id} - Update some fields of a book.
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<BookUpdate>,
) -> ApiResult<Book> {
    let book = BookService::new(&state.repo)
        .update_book(&id, &request)
        .await?;

    // Concurrent patches may finish out of order; index whatever is stored now
    let current = state.repo.get_book(&book.id);
    if let Err(e) = state.search.refresh_book(&book.id, current).await {
        tracing::warn!("Failed to re-index book {}: {}", book.id, e);
    }

    ok(book)
}

/// DELETE /books/{id} - Remove a book from the catalogue.
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    BookService::new(&state.repo).delete_book(&id).await?;

    if let Err(e) = state.search.remove_book(&id).await {
        tracing::warn!("Failed to remove book {} from index: {}", id, e);
    }

    Ok(StatusCode::NO_CONTENT)
}
