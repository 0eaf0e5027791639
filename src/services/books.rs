//! Catalogue rules.

use super::check_pagination;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::rules::parse_id;
use crate::models::{Book, BookCreate, BookFilter, BookUpdate};

pub struct BookService<'a> {
    repo: &'a Repository,
}

impl<'a> BookService<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// A book counts as a duplicate when title and author both match.
    async fn ensure_not_duplicate(&self, request: &BookCreate) -> Result<(), AppError> {
        if self
            .repo
            .find_book_by_title_author(&request.title, &request.author)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "A book titled '{}' by {} already exists",
                request.title, request.author
            )));
        }
        Ok(())
    }

    async fn ensure_book_exists(&self, id: &str) -> Result<Book, AppError> {
        parse_id("book", id)?;
        self.repo
            .get_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    pub async fn create_book(&self, request: &BookCreate) -> Result<Book, AppError> {
        self.ensure_not_duplicate(request).await?;
        let book = self.repo.create_book(request).await?;
        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        Ok(book)
    }

    pub async fn get_book(&self, id: &str) -> Result<Book, AppError> {
        self.ensure_book_exists(id).await
    }

    pub async fn list_books(
        &self,
        filter: &BookFilter,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Book>, AppError> {
        check_pagination(skip, limit)?;
        self.repo.list_books(filter, skip, limit).await
    }

    /// Fetch the books behind a list of IDs, skipping any that vanished.
    pub async fn get_books(&self, ids: &[String]) -> Result<Vec<Book>, AppError> {
        let mut books = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(book) = self.repo.get_book(id).await? {
                books.push(book);
            }
        }
        Ok(books)
    }

    pub async fn update_book(&self, id: &str, request: &BookUpdate) -> Result<Book, AppError> {
        let existing = self.ensure_book_exists(id).await?;
        if request.is_empty() {
            return Ok(existing);
        }

        self.repo
            .update_book(id, request)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Remove a book. Books with copies out on loan cannot be removed.
    pub async fn delete_book(&self, id: &str) -> Result<(), AppError> {
        parse_id("book", id)?;

        if !self.repo.delete_book(id).await? {
            let existing = self
                .repo
                .get_book(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
            return Err(AppError::Conflict(format!(
                "Book {} has {} copies on loan",
                id,
                existing.total_copies - existing.available_copies
            )));
        }

        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}
