//! User registry rules.

use chrono::Utc;

use super::check_pagination;
use crate::auth::password::hash_password;
use crate::db::{NewUser, Repository, UserChanges};
use crate::errors::AppError;
use crate::models::rules::{normalize_email, parse_id};
use crate::models::{LoanFilter, LoanWithBook, User, UserCreate, UserUpdate};

pub struct UserService<'a> {
    repo: &'a Repository,
}

impl<'a> UserService<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    async fn ensure_user_exists(&self, id: &str) -> Result<User, AppError> {
        parse_id("user", id)?;
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Fail if `email` belongs to a user other than `except_id`.
    async fn ensure_email_free(&self, email: &str, except_id: Option<&str>) -> Result<(), AppError> {
        match self.repo.get_user_by_email(email).await? {
            Some(other) if Some(other.id.as_str()) != except_id => Err(AppError::Conflict(
                format!("Email {} is already in use", email),
            )),
            _ => Ok(()),
        }
    }

    pub async fn create_user(&self, request: &UserCreate) -> Result<User, AppError> {
        let email = normalize_email(&request.email);
        self.ensure_email_free(&email, None).await?;

        let password_hash = hash_password(&request.password)?;
        let user = self
            .repo
            .create_user(&NewUser {
                first_name: &request.first_name,
                last_name: &request.last_name,
                email: &email,
                role: request.role,
                password_hash: &password_hash,
                registered_date: request
                    .registered_date
                    .unwrap_or_else(|| Utc::now().date_naive()),
            })
            .await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, AppError> {
        self.ensure_user_exists(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, AppError> {
        let email = normalize_email(email);
        self.repo
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user with email {}", email)))
    }

    pub async fn list_users(
        &self,
        email: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<User>, AppError> {
        check_pagination(skip, limit)?;
        let email = email.map(normalize_email);
        self.repo.list_users(email.as_deref(), skip, limit).await
    }

    /// Loans (active and historical) held by a user.
    pub async fn user_loans(
        &self,
        id: &str,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<LoanWithBook>, AppError> {
        check_pagination(skip, limit)?;
        self.ensure_user_exists(id).await?;

        let filter = LoanFilter {
            user_id: Some(id.to_string()),
            ..Default::default()
        };
        self.repo.list_loans(&filter, skip, limit).await
    }

    pub async fn update_user(&self, id: &str, request: &UserUpdate) -> Result<User, AppError> {
        let existing = self.ensure_user_exists(id).await?;
        if request.is_empty() {
            return Ok(existing);
        }

        let email = request.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            self.ensure_email_free(email, Some(id)).await?;
        }

        let password_hash = request.password.as_deref().map(hash_password).transpose()?;

        let changes = UserChanges {
            first_name: request.first_name.as_deref(),
            last_name: request.last_name.as_deref(),
            email: email.as_deref(),
            role: request.role,
            password_hash: password_hash.as_deref(),
        };

        self.repo
            .update_user(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Remove a user. Users still holding books cannot be removed.
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        parse_id("user", id)?;

        if !self.repo.delete_user(id).await? {
            self.ensure_user_exists(id).await?;
            let active = self.repo.count_active_loans_for_user(id).await?;
            return Err(AppError::Conflict(format!(
                "User {} still has {} books on loan",
                id, active
            )));
        }

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
