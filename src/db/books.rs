//! Book catalogue queries.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::repository::{book_from_row, conflict_on_unique, rows_to, Repository, BOOK_COLUMNS};
use crate::errors::AppError;
use crate::models::{Book, BookCreate, BookFilter, BookUpdate};

const DUPLICATE_BOOK: &str = "A book with that title and author already exists";

impl Repository {
    /// List books in insertion order, applying exact-match filters and pagination.
    pub async fn list_books(
        &self,
        filter: &BookFilter,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Book>, AppError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM books b WHERE 1 = 1", BOOK_COLUMNS));

        if let Some(title) = &filter.title {
            query.push(" AND b.title = ").push_bind(title);
        }
        if let Some(author) = &filter.author {
            query.push(" AND b.author = ").push_bind(author);
        }
        if let Some(genre) = &filter.genre {
            query.push(" AND b.genre = ").push_bind(genre);
        }

        query
            .push(" ORDER BY b.rowid LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(skip);

        let rows = query.build().fetch_all(&self.pool).await?;
        rows_to(rows, book_from_row)
    }

    /// Every book in the catalogue, used to rebuild the search index.
    pub async fn all_books(&self) -> Result<Vec<Book>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM books b ORDER BY b.rowid",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows_to(rows, book_from_row)
    }

    /// Get a book by ID.
    pub async fn get_book(&self, id: &str) -> Result<Option<Book>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM books b WHERE b.id = ?", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(book_from_row).transpose()?)
    }

    /// Find a book with exactly this title and author.
    pub async fn find_book_by_title_author(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Option<Book>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM books b WHERE b.title = ? AND b.author = ? LIMIT 1",
            BOOK_COLUMNS
        ))
        .bind(title)
        .bind(author)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(book_from_row).transpose()?)
    }

    /// Create a new book. A concurrent insert of the same title and author
    /// surfaces as a conflict.
    pub async fn create_book(&self, request: &BookCreate) -> Result<Book, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO books (id, title, author, published_year, genre, total_copies, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.title)
        .bind(&request.author)
        .bind(request.published_year)
        .bind(&request.genre)
        .bind(request.total_copies)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_BOOK))?;

        self.get_book(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to read back the created book".to_string()))
    }

    /// Apply a partial update in a single statement.
    ///
    /// Returns `Ok(None)` if the book does not exist. The copy count may not
    /// drop below the number of active loans; that check is part of the
    /// UPDATE so a concurrent loan cannot slip in between.
    pub async fn update_book(
        &self,
        id: &str,
        request: &BookUpdate,
    ) -> Result<Option<Book>, AppError> {
        let result = sqlx::query(
            r#"UPDATE books SET
                title = COALESCE(?, title),
                author = COALESCE(?, author),
                published_year = CASE WHEN ? THEN ? ELSE published_year END,
                genre = COALESCE(?, genre),
                total_copies = COALESCE(?, total_copies),
                updated_at = ?
            WHERE id = ?
              AND COALESCE(?, total_copies)
                >= (SELECT COUNT(*) FROM loans WHERE book_id = books.id AND status = 'borrowed')"#,
        )
        .bind(request.title.as_deref())
        .bind(request.author.as_deref())
        .bind(request.published_year.is_some())
        .bind(request.published_year.flatten())
        .bind(request.genre.as_deref())
        .bind(request.total_copies)
        .bind(Utc::now())
        .bind(id)
        .bind(request.total_copies)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_BOOK))?;

        if result.rows_affected() == 0 {
            return match self.get_book(id).await? {
                None => Ok(None),
                Some(current) => Err(AppError::Conflict(format!(
                    "Cannot set total_copies to {}: {} copies are on loan",
                    request.total_copies.unwrap_or(current.total_copies),
                    current.total_copies - current.available_copies
                ))),
            };
        }

        self.get_book(id).await
    }

    /// Delete a book and its loan history unless a copy is out on loan.
    ///
    /// The active-loan check is part of the DELETE, so a loan created
    /// concurrently is never cascaded away. Returns whether a row was removed.
    pub async fn delete_book(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"DELETE FROM books
            WHERE id = ?
              AND NOT EXISTS (
                SELECT 1 FROM loans WHERE loans.book_id = books.id AND loans.status = 'borrowed'
              )"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
