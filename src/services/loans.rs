//! Lending rules.

use chrono::{Duration, Utc};

use super::check_pagination;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::rules::parse_id;
use crate::models::{LoanCreate, LoanFilter, LoanStatus, LoanUpdate, LoanWithBook};

pub struct LoanService<'a> {
    repo: &'a Repository,
    loan_days: i64,
}

impl<'a> LoanService<'a> {
    pub fn new(repo: &'a Repository, loan_days: i64) -> Self {
        Self { repo, loan_days }
    }

    async fn ensure_loan_exists(&self, id: &str) -> Result<LoanWithBook, AppError> {
        parse_id("loan", id)?;
        self.repo
            .get_loan(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))
    }

    /// Lend one copy of a book to a user.
    pub async fn create_loan(&self, request: &LoanCreate) -> Result<LoanWithBook, AppError> {
        parse_id("user", &request.user_id)?;
        parse_id("book", &request.book_id)?;

        if self.repo.get_user(&request.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User {} not found",
                request.user_id
            )));
        }
        let book = self
            .repo
            .get_book(&request.book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", request.book_id)))?;

        let borrowed_at = request.borrowed_at.unwrap_or_else(Utc::now);
        let due_date = request
            .due_date
            .unwrap_or_else(|| borrowed_at.date_naive() + Duration::days(self.loan_days));
        if due_date < borrowed_at.date_naive() {
            return Err(AppError::Validation(
                "due_date cannot be before the loan starts".to_string(),
            ));
        }

        let loan = self
            .repo
            .create_loan(&request.user_id, &request.book_id, borrowed_at, Some(due_date))
            .await?;
        let Some(loan) = loan else {
            // The availability check also fails when the book was deleted meanwhile
            if self.repo.get_book(&book.id).await?.is_none() {
                return Err(AppError::NotFound(format!("Book {} not found", book.id)));
            }
            return Err(AppError::Conflict(format!(
                "No copies of '{}' are available",
                book.title
            )));
        };

        tracing::info!(
            loan_id = %loan.loan.id,
            user_id = %loan.loan.user_id,
            book_id = %loan.loan.book_id,
            "Book lent"
        );
        Ok(loan)
    }

    pub async fn get_loan(&self, id: &str) -> Result<LoanWithBook, AppError> {
        self.ensure_loan_exists(id).await
    }

    pub async fn list_loans(
        &self,
        filter: &LoanFilter,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<LoanWithBook>, AppError> {
        check_pagination(skip, limit)?;
        self.repo.list_loans(filter, skip, limit).await
    }

    /// Apply a partial update, keeping `status` and `returned_at` consistent.
    pub async fn update_loan(
        &self,
        id: &str,
        request: &LoanUpdate,
    ) -> Result<LoanWithBook, AppError> {
        let current = self.ensure_loan_exists(id).await?;
        if request.is_empty() {
            return Ok(current);
        }
        let existing = current.loan;

        let status = request.status.unwrap_or(existing.status);
        let due_date = request.due_date.or(existing.due_date);

        if let Some(due) = request.due_date {
            if due < existing.borrowed_at.date_naive() {
                return Err(AppError::Validation(
                    "due_date cannot be before the loan starts".to_string(),
                ));
            }
        }
        if let Some(returned_at) = request.returned_at {
            if returned_at < existing.borrowed_at {
                return Err(AppError::Validation(
                    "returned_at cannot be before borrowed_at".to_string(),
                ));
            }
        }

        let updated = match status {
            LoanStatus::Borrowed => {
                if request.returned_at.is_some() {
                    return Err(AppError::Validation(
                        "returned_at must be empty while the book is borrowed".to_string(),
                    ));
                }
                if existing.status.is_active() {
                    self.repo
                        .update_loan(id, due_date, None, LoanStatus::Borrowed)
                        .await?
                } else {
                    // Taking a copy back out needs a free copy again
                    match self.repo.reactivate_loan(id, due_date).await? {
                        Some(loan) => Some(loan),
                        None => {
                            return Err(AppError::Conflict(format!(
                                "No copies of book {} are available",
                                existing.book_id
                            )))
                        }
                    }
                }
            }
            LoanStatus::Returned => {
                let returned_at = request
                    .returned_at
                    .or(existing.returned_at)
                    .unwrap_or_else(Utc::now);
                self.repo
                    .update_loan(id, due_date, Some(returned_at), LoanStatus::Returned)
                    .await?
            }
            LoanStatus::Lost => {
                let returned_at = request.returned_at.or(existing.returned_at);
                self.repo
                    .update_loan(id, due_date, returned_at, LoanStatus::Lost)
                    .await?
            }
        };

        updated.ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))
    }

    /// Mark a loan as returned now.
    pub async fn return_loan(&self, id: &str) -> Result<LoanWithBook, AppError> {
        let existing = self.ensure_loan_exists(id).await?.loan;
        if existing.status == LoanStatus::Returned {
            return Err(AppError::Conflict(format!("Loan {} was already returned", id)));
        }

        let loan = self
            .repo
            .update_loan(id, existing.due_date, Some(Utc::now()), LoanStatus::Returned)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))?;

        tracing::info!(loan_id = %id, book_id = %loan.loan.book_id, "Book returned");
        Ok(loan)
    }

    pub async fn delete_loan(&self, id: &str) -> Result<(), AppError> {
        self.ensure_loan_exists(id).await?;
        if !self.repo.delete_loan(id).await? {
            return Err(AppError::NotFound(format!("Loan {} not found", id)));
        }
        Ok(())
    }
}
