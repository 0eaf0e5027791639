//! Database repository shared by the per-entity operation modules.
//!
//! The repository only talks SQL; business rules live in the services.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Book, BookSummary, Loan, LoanStatus, LoanWithBook, Role, User};

/// Columns selected for a book, including its live active-loan count.
pub(super) const BOOK_COLUMNS: &str = r#"
    b.id, b.title, b.author, b.published_year, b.genre, b.total_copies,
    b.created_at, b.updated_at,
    (SELECT COUNT(*) FROM loans l WHERE l.book_id = b.id AND l.status = 'borrowed') AS active_loans
"#;

pub(super) const USER_COLUMNS: &str =
    "id, first_name, last_name, email, role, registered_date, created_at, updated_at";

/// Columns selected for a loan joined with its book.
pub(super) const LOAN_COLUMNS: &str = r#"
    l.id, l.user_id, l.book_id, l.borrowed_at, l.due_date, l.returned_at, l.status,
    b.title AS book_title, b.author AS book_author, b.genre AS book_genre
"#;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Verify the database answers queries.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique-constraint violation to a conflict, everything else to a database error.
pub(super) fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => err.into(),
    }
}

/// Map a foreign-key violation (the referenced row is gone) to a not-found error.
pub(super) fn not_found_on_foreign_key(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::NotFound(message.to_string())
        }
        _ => err.into(),
    }
}

// Helper functions for row conversion

pub(super) fn book_from_row(row: &SqliteRow) -> Result<Book, sqlx::Error> {
    let published_year = row.try_get("published_year")?;
    let total_copies: i64 = row.try_get("total_copies")?;
    let active_loans: i64 = row.try_get("active_loans")?;

    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        published_year,
        genre: row.try_get("genre")?,
        total_copies,
        available_copies: (total_copies - active_loans).max(0),
        age_since_publication: Book::age_since(published_year, Utc::now().date_naive()),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(super) fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    let first_name: String = row.try_get("first_name")?;
    let last_name: String = row.try_get("last_name")?;
    let role: String = row.try_get("role")?;
    let role = Role::parse(&role)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown role: {}", role).into()))?;

    Ok(User {
        id: row.try_get("id")?,
        full_name: format!("{} {}", first_name, last_name),
        first_name,
        last_name,
        email: row.try_get("email")?,
        role,
        registered_date: row.try_get("registered_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(super) fn loan_from_row(row: &SqliteRow) -> Result<LoanWithBook, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = LoanStatus::parse(&status)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown loan status: {}", status).into()))?;
    let book_id: String = row.try_get("book_id")?;

    Ok(LoanWithBook {
        book: BookSummary {
            id: book_id.clone(),
            title: row.try_get("book_title")?,
            author: row.try_get("book_author")?,
            genre: row.try_get("book_genre")?,
        },
        loan: Loan {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            book_id,
            borrowed_at: row.try_get("borrowed_at")?,
            due_date: row.try_get("due_date")?,
            returned_at: row.try_get("returned_at")?,
            status,
        },
    })
}

pub(super) fn rows_to<T>(
    rows: Vec<SqliteRow>,
    convert: fn(&SqliteRow) -> Result<T, sqlx::Error>,
) -> Result<Vec<T>, AppError> {
    rows.iter()
        .map(|row| convert(row).map_err(AppError::from))
        .collect()
}
