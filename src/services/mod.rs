//! Business rules on top of the repository.
//!
//! Services check existence and uniqueness, normalise input and translate
//! repository results into [`AppError`]s. They are cheap borrowing wrappers
//! built per request.

mod books;
mod loans;
mod users;

pub use books::BookService;
pub use loans::LoanService;
pub use users::UserService;

use crate::errors::AppError;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size a list endpoint will serve.
pub const MAX_LIMIT: i64 = 200;

/// Reject pagination parameters outside `skip >= 0` and `1 <= limit <= MAX_LIMIT`.
pub fn check_pagination(skip: i64, limit: i64) -> Result<(), AppError> {
    if skip < 0 {
        return Err(AppError::Validation(
            "The 'skip' parameter cannot be negative".to_string(),
        ));
    }
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "The 'limit' parameter must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_pagination() {
        assert!(check_pagination(0, DEFAULT_LIMIT).is_ok());
        assert!(check_pagination(10, MAX_LIMIT).is_ok());
        assert!(check_pagination(-1, 10).is_err());
        assert!(check_pagination(0, 0).is_err());
        assert!(check_pagination(0, MAX_LIMIT + 1).is_err());
    }
}
