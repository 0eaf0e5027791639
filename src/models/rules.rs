//! Validation rules shared across request payloads.

use validator::ValidationError;

/// Rejects empty or whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Parses a path identifier, naming the resource in the error.
pub fn parse_id(kind: &str, raw: &str) -> Result<uuid::Uuid, crate::errors::AppError> {
    uuid::Uuid::parse_str(raw)
        .map_err(|_| crate::errors::AppError::Validation(format!("Invalid {} ID: {}", kind, raw)))
}

/// Lowercases and trims an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Dune").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank(" \t").is_err());
    }

    #[test]
    fn test_parse_id() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_id("book", &id.to_string()).unwrap(), id);

        let err = parse_id("book", "6939baae9689a8b88e1dc261").unwrap_err();
        assert_eq!(err.message(), "Invalid book ID: 6939baae9689a8b88e1dc261");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Reader@Example.COM "), "reader@example.com");
    }
}
