//! Loan models linking users to borrowed books.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{rules, BookSummary};

/// Lifecycle state of a loan. Only `Borrowed` holds a copy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Borrowed,
    Returned,
    Lost,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Returned => "returned",
            LoanStatus::Lost => "lost",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "borrowed" => Some(LoanStatus::Borrowed),
            "returned" => Some(LoanStatus::Returned),
            "lost" => Some(LoanStatus::Lost),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LoanStatus::Borrowed)
    }
}

/// A loan of one copy of a book to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

/// A loan together with a summary of the borrowed book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanWithBook {
    #[serde(flatten)]
    pub loan: Loan,
    pub book: BookSummary,
}

/// Request body for lending a book.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoanCreate {
    #[validate(custom(function = "rules::not_blank"))]
    pub user_id: String,
    #[validate(custom(function = "rules::not_blank"))]
    pub book_id: String,
    #[serde(default)]
    pub borrowed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Request body for a partial loan update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoanUpdate {
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<LoanStatus>,
}

impl LoanUpdate {
    pub fn is_empty(&self) -> bool {
        self.due_date.is_none() && self.returned_at.is_none() && self.status.is_none()
    }
}

/// Exact-match filters for listing loans.
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    pub user_id: Option<String>,
    pub book_id: Option<String>,
    pub status: Option<LoanStatus>,
}
