//! User API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::{created, default_limit, non_empty, ok, ApiQuery, ApiResult, PageQuery, ValidJson};
use crate::errors::AppError;
use crate::models::{LoanWithBook, User, UserCreate, UserUpdate};
use crate::services::UserService;
use crate::AppState;

/// Query parameters for listing users.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Exact email filter (case-insensitive)
    pub email: Option<String>,
}

/// GET /users - List users.
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListUsersQuery>,
) -> ApiResult<Vec<User>> {
    let email = non_empty(params.email);
    let users = UserService::new(&state.repo)
        .list_users(email.as_deref(), params.skip, params.limit)
        .await?;
    ok(users)
}

/// GET /users/{id} - Get a single user.
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    ok(UserService::new(&state.repo).get_user(&id).await?)
}

/// GET /users/by-email/{email} - Look a user up by email.
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<User> {
    ok(UserService::new(&state.repo)
        .get_user_by_email(&email)
        .await?)
}

/// GET /users/{id}/loans - Loans held by a user, newest last.
pub async fn list_user_loans(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Vec<LoanWithBook>> {
    let loans = UserService::new(&state.repo)
        .user_loans(&id, page.skip, page.limit)
        .await?;
    ok(loans)
}

/// POST /users - Register a user.
pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UserCreate>,
) -> ApiResult<User> {
    created(UserService::new(&state.repo).create_user(&request).await?)
}

/// PATCH /users/{id} - Update some fields of a user.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<UserUpdate>,
) -> ApiResult<User> {
    ok(UserService::new(&state.repo)
        .update_user(&id, &request)
        .await?)
}

/// DELETE /users/{id} - Remove a user.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    UserService::new(&state.repo).delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
