//! Loan API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::{created, default_limit, non_empty, ok, ApiQuery, ApiResult, ValidJson};
use crate::errors::AppError;
use crate::models::{LoanCreate, LoanFilter, LoanStatus, LoanUpdate, LoanWithBook};
use crate::services::LoanService;
use crate::AppState;

/// Query parameters for listing loans.
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub user_id: Option<String>,
    pub book_id: Option<String>,
    pub status: Option<LoanStatus>,
}

fn loan_service(state: &AppState) -> LoanService<'_> {
    LoanService::new(&state.repo, state.config.loan_days)
}

/// GET /loans - List loans.
pub async fn list_loans(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListLoansQuery>,
) -> ApiResult<Vec<LoanWithBook>> {
    let filter = LoanFilter {
        user_id: non_empty(params.user_id),
        book_id: non_empty(params.book_id),
        status: params.status,
    };

    let loans = loan_service(&state)
        .list_loans(&filter, params.skip, params.limit)
        .await?;
    ok(loans)
}

/// GET /loans/{id} - Get a single loan.
pub async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<LoanWithBook> {
    ok(loan_service(&state).get_loan(&id).await?)
}

/// POST /loans - Lend a book to a user.
pub async fn create_loan(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoanCreate>,
) -> ApiResult<LoanWithBook> {
    created(loan_service(&state).create_loan(&request).await?)
}

/// PATCH /loans/{id} - Update due date, status or return time.
pub async fn update_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<LoanUpdate>,
) -> ApiResult<LoanWithBook> {
    ok(loan_service(&state).update_loan(&id, &request).await?)
}

/// POST /loans/{id}/return - Mark a loan as returned.
pub async fn return_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<LoanWithBook> {
    ok(loan_service(&state).return_loan(&id).await?)
}

/// DELETE /loans/{id} - Remove a loan record.
pub async fn delete_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    loan_service(&state).delete_loan(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
