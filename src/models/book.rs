//! Book models for the catalogue.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::rules;

/// A book in the library catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub published_year: Option<NaiveDate>,
    pub genre: String,
    pub total_copies: i64,
    /// Copies not currently out on an active loan
    pub available_copies: i64,
    /// Whole years between the publication year and the current year
    pub age_since_publication: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn age_since(published: Option<NaiveDate>, today: NaiveDate) -> Option<i32> {
        published.map(|date| today.year() - date.year())
    }
}

/// Trimmed-down view of a book embedded in loan responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
        }
    }
}

/// Request body for adding a book to the catalogue.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookCreate {
    #[validate(custom(function = "rules::not_blank"))]
    pub title: String,
    #[validate(custom(function = "rules::not_blank"))]
    pub author: String,
    #[serde(default)]
    pub published_year: Option<NaiveDate>,
    #[validate(custom(function = "rules::not_blank"))]
    pub genre: String,
    #[validate(range(min = 0, message = "number of copies cannot be negative"))]
    pub total_copies: i64,
}

/// Request body for a partial book update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BookUpdate {
    #[serde(default)]
    #[validate(custom(function = "rules::not_blank"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "rules::not_blank"))]
    pub author: Option<String>,
    /// `Some(None)` clears the date; an absent field leaves it untouched.
    #[serde(default, deserialize_with = "present")]
    pub published_year: Option<Option<NaiveDate>>,
    #[serde(default)]
    #[validate(custom(function = "rules::not_blank"))]
    pub genre: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "number of copies cannot be negative"))]
    pub total_copies: Option<i64>,
}

/// Wrap any value that is present in the body, `null` included, in `Some`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.published_year.is_none()
            && self.genre.is_none()
            && self.total_copies.is_none()
    }
}

/// Exact-match filters for listing books.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
}
