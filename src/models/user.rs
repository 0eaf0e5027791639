//! Library user models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::rules;

/// Role of a user within the library system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "user" => Some(Role::User),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

/// A registered library user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub registered_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for registering a user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserCreate {
    #[validate(custom(function = "rules::not_blank"))]
    pub first_name: String,
    #[validate(custom(function = "rules::not_blank"))]
    pub last_name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    pub role: Role,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub registered_date: Option<NaiveDate>,
}

/// Request body for a partial user update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[serde(default)]
    #[validate(custom(function = "rules::not_blank"))]
    pub first_name: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "rules::not_blank"))]
    pub last_name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.password.is_none()
    }
}
