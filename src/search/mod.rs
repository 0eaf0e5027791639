//! Tantivy-based search index module.
//!
//! Provides full-text search over the book catalogue with field boosting.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Book;

/// Field boost values.
const BOOST_TITLE: f32 = 10.0;
const BOOST_AUTHOR: f32 = 6.0;
const BOOST_GENRE: f32 = 3.0;

/// Deepest result a caller may page to. The collector allocates
/// `limit + offset` slots up front.
pub const MAX_SEARCH_OFFSET: usize = 10_000;

/// Search result with book ID and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub book_id: String,
    pub score: f32,
}

/// One page of hits plus the number of documents that matched overall.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub hits: Vec<SearchResult>,
    pub total: usize,
}

/// Search index schema fields.
struct SearchFields {
    book_id: Field,
    title: Field,
    author: Field,
    genre: Field,
}

/// Tantivy search index for books.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        // Raw (untokenized) so the ID can be used as a delete term
        let book_id = schema_builder.add_text_field("book_id", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let author = schema_builder.add_text_field("author", TEXT);
        let genre = schema_builder.add_text_field("genre", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            book_id,
            title,
            author,
            genre,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from the catalogue.
    pub async fn rebuild(&self, books: &[Book]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for book in books {
            writer.add_document(self.create_document(book))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} books", books.len());
        Ok(())
    }

    /// Index (or re-index) a single book.
    pub async fn index_book(&self, book: &Book) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.book_id, &book.id);
        writer.delete_term(term);
        writer.add_document(self.create_document(book))?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Re-index a book from its current stored state.
    ///
    /// `current` is awaited only once the writer lock is held, so when
    /// updates race the last writer indexes the latest row. A book that
    /// no longer exists is removed.
    pub async fn refresh_book<F>(&self, book_id: &str, current: F) -> Result<(), AppError>
    where
        F: Future<Output = Result<Option<Book>, AppError>>,
    {
        let mut writer = self.writer.write().await;
        let book = current.await?;

        let term = tantivy::Term::from_field_text(self.fields.book_id, book_id);
        writer.delete_term(term);
        if let Some(book) = &book {
            writer.add_document(self.create_document(book))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Remove a book from the index.
    pub async fn remove_book(&self, book_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.book_id, book_id);
        writer.delete_term(term);
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for books matching the query.
    ///
    /// The query is parsed leniently, so stray operators in user input
    /// (`C++`, an unbalanced quote) are dropped instead of failing the search.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<SearchPage, AppError> {
        if offset > MAX_SEARCH_OFFSET {
            return Err(AppError::Validation(format!(
                "offset: must be at most {}",
                MAX_SEARCH_OFFSET
            )));
        }
        if query_str.trim().is_empty() || limit == 0 {
            return Ok(SearchPage::default());
        }

        let searcher = self.reader.searcher();

        let field_queries = [
            (self.fields.title, BOOST_TITLE),
            (self.fields.author, BOOST_AUTHOR),
            (self.fields.genre, BOOST_GENRE),
        ];

        let subqueries: Vec<(Occur, Box<dyn Query>)> = field_queries
            .into_iter()
            .map(|(field, boost)| {
                let (field_query, _errors) =
                    QueryParser::for_index(&self.index, vec![field]).parse_query_lenient(query_str);
                let boosted: Box<dyn Query> = Box::new(BoostQuery::new(field_query, boost));
                (Occur::Should, boosted)
            })
            .collect();
        let query = BooleanQuery::new(subqueries);

        let collector = (TopDocs::with_limit(limit).and_offset(offset), Count);
        let (top_docs, total) = searcher
            .search(&query, &collector)
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let hits = top_docs
            .into_iter()
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let book_id = doc.get_first(self.fields.book_id)?.as_str()?.to_string();
                Some(SearchResult { book_id, score })
            })
            .collect();

        Ok(SearchPage { hits, total })
    }

    fn create_document(&self, book: &Book) -> TantivyDocument {
        doc!(
            self.fields.book_id => book.id.clone(),
            self.fields.title => book.title.clone(),
            self.fields.author => book.author.clone(),
            self.fields.genre => book.genre.clone()
        )
    }
}
