//! Loan queries.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite};

use super::repository::{loan_from_row, not_found_on_foreign_key, rows_to, Repository, LOAN_COLUMNS};
use crate::errors::AppError;
use crate::models::{LoanFilter, LoanStatus, LoanWithBook};

impl Repository {
    /// List loans in creation order, filtered and paginated.
    pub async fn list_loans(
        &self,
        filter: &LoanFilter,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<LoanWithBook>, AppError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM loans l JOIN books b ON b.id = l.book_id WHERE 1 = 1",
            LOAN_COLUMNS
        ));

        if let Some(user_id) = &filter.user_id {
            query.push(" AND l.user_id = ").push_bind(user_id);
        }
        if let Some(book_id) = &filter.book_id {
            query.push(" AND l.book_id = ").push_bind(book_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND l.status = ").push_bind(status.as_str());
        }

        query
            .push(" ORDER BY l.rowid LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(skip);

        let rows = query.build().fetch_all(&self.pool).await?;
        rows_to(rows, loan_from_row)
    }

    /// Get a loan by ID.
    pub async fn get_loan(&self, id: &str) -> Result<Option<LoanWithBook>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM loans l JOIN books b ON b.id = l.book_id WHERE l.id = ?",
            LOAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(loan_from_row).transpose()?)
    }

    /// Lend a copy of a book.
    ///
    /// The copy-availability check and the insert are a single statement, so
    /// two concurrent requests for the last copy cannot both succeed.
    /// Returns `Ok(None)` when no copy is available.
    pub async fn create_loan(
        &self,
        user_id: &str,
        book_id: &str,
        borrowed_at: DateTime<Utc>,
        due_date: Option<NaiveDate>,
    ) -> Result<Option<LoanWithBook>, AppError> {
        let id = uuid::Uuid::new_v4().to_string();

        let result = sqlx::query(
            r#"INSERT INTO loans (id, user_id, book_id, borrowed_at, due_date, returned_at, status)
            SELECT ?, ?, ?, ?, ?, NULL, 'borrowed'
            WHERE (SELECT total_copies FROM books WHERE id = ?)
                > (SELECT COUNT(*) FROM loans WHERE book_id = ? AND status = 'borrowed')"#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(book_id)
        .bind(borrowed_at)
        .bind(due_date)
        .bind(book_id)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(|e| not_found_on_foreign_key(e, "The user or book no longer exists"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_loan(&id).await
    }

    /// Overwrite the mutable fields of a loan that stays out of circulation
    /// (returned or lost) or keeps its current status.
    pub async fn update_loan(
        &self,
        id: &str,
        due_date: Option<NaiveDate>,
        returned_at: Option<DateTime<Utc>>,
        status: LoanStatus,
    ) -> Result<Option<LoanWithBook>, AppError> {
        let result =
            sqlx::query("UPDATE loans SET due_date = ?, returned_at = ?, status = ? WHERE id = ?")
                .bind(due_date)
                .bind(returned_at)
                .bind(status.as_str())
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_loan(id).await
    }

    /// Put a returned or lost loan back into `borrowed`, clearing its return time.
    ///
    /// Like [`Repository::create_loan`], the availability check is part of the
    /// UPDATE. Returns `Ok(None)` when no copy is available.
    pub async fn reactivate_loan(
        &self,
        id: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<Option<LoanWithBook>, AppError> {
        let result = sqlx::query(
            r#"UPDATE loans SET status = 'borrowed', returned_at = NULL, due_date = ?
            WHERE id = ? AND status != 'borrowed'
              AND (SELECT total_copies FROM books WHERE id = loans.book_id)
                > (SELECT COUNT(*) FROM loans AS active
                   WHERE active.book_id = loans.book_id AND active.status = 'borrowed')"#,
        )
        .bind(due_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_loan(id).await
    }

    /// Delete a loan. Returns whether a row was removed.
    pub async fn delete_loan(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM loans WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
