//! User registry queries.

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite};

use super::repository::{conflict_on_unique, rows_to, user_from_row, Repository, USER_COLUMNS};
use crate::errors::AppError;
use crate::models::{Role, User};

const DUPLICATE_EMAIL: &str = "A user with that email already exists";

/// Column values for a new user, after normalisation and hashing.
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub role: Role,
    pub password_hash: &'a str,
    pub registered_date: NaiveDate,
}

/// Column changes for an existing user. `None` leaves a column untouched.
#[derive(Default)]
pub struct UserChanges<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub role: Option<Role>,
    pub password_hash: Option<&'a str>,
}

impl Repository {
    /// List users in registration order, optionally filtered by exact email.
    pub async fn list_users(
        &self,
        email: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<User>, AppError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM users", USER_COLUMNS));

        if let Some(email) = email {
            query.push(" WHERE email = ").push_bind(email);
        }

        query
            .push(" ORDER BY rowid LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(skip);

        let rows = query.build().fetch_all(&self.pool).await?;
        rows_to(rows, user_from_row)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    /// Get a user by their stored (already normalised) email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    /// Insert a user. A concurrent insert with the same email surfaces as a conflict.
    pub async fn create_user(&self, user: &NewUser<'_>) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, role, password_hash, registered_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.email)
        .bind(user.role.as_str())
        .bind(user.password_hash)
        .bind(user.registered_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_EMAIL))?;

        self.get_user(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to read back the created user".to_string()))
    }

    /// Apply column changes. Returns `Ok(None)` if the user does not exist.
    pub async fn update_user(
        &self,
        id: &str,
        changes: &UserChanges<'_>,
    ) -> Result<Option<User>, AppError> {
        let result = sqlx::query(
            r#"UPDATE users SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                email = COALESCE(?, email),
                role = COALESCE(?, role),
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
            WHERE id = ?"#,
        )
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.email)
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_EMAIL))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_user(id).await
    }

    /// Delete a user and their loan history unless they still hold a book.
    ///
    /// Like [`Repository::delete_book`], the active-loan check is part of the
    /// DELETE. Returns whether a row was removed.
    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"DELETE FROM users
            WHERE id = ?
              AND NOT EXISTS (
                SELECT 1 FROM loans WHERE loans.user_id = users.id AND loans.status = 'borrowed'
              )"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Number of loans this user currently holds.
    pub async fn count_active_loans_for_user(&self, id: &str) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE user_id = ? AND status = 'borrowed'")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
