//! Input validation for API requests.
//!
//! Booking fields are validated by the scheduling core; this module covers
//! what only the HTTP boundary sees: query-string filters and attachment paths.

use lazy_static::lazy_static;
use regex::Regex;

use crate::schedule::Temporal;

use super::error::ApiError;

lazy_static! {
    /// Regex for validating stored attachment paths (relative, no spaces)
    static ref ATTACHMENT_PATH_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9_][A-Za-z0-9_.-]*(/[A-Za-z0-9_][A-Za-z0-9_.-]*)*$"
    ).unwrap();

    /// Regex for validating numeric id filters
    static ref ID_REGEX: Regex = Regex::new(r"^[0-9]{1,18}$").unwrap();
}

/// Validate an optional id filter from the query string.
///
/// Absent and empty values both mean "no filter".
pub fn validate_filter_id(raw: Option<&str>, field_name: &str) -> Result<Option<i64>, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    if !ID_REGEX.is_match(raw) {
        return Err(format!("{} must be a positive integer", field_name));
    }

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(Some(id)),
        _ => Err(format!("{} must be a positive integer", field_name)),
    }
}

/// Validate the `when` filter (all, future or past)
pub fn validate_temporal(raw: Option<&str>) -> Result<Temporal, String> {
    raw.map(str::trim).unwrap_or("").parse()
}

/// Validate an attachment path (optional field)
pub fn validate_attachment_path(path: &Option<String>) -> Result<(), String> {
    if let Some(p) = path {
        if p.is_empty() {
            return Ok(()); // Empty string treated as no attachment
        }

        if p.len() > 512 {
            return Err("Attachment path is too long (max 512 characters)".to_string());
        }

        // Check for path traversal attempts
        if p.contains("..") {
            return Err("Attachment path cannot contain '..'".to_string());
        }

        if !ATTACHMENT_PATH_REGEX.is_match(p) {
            return Err("Attachment path must be a relative file path".to_string());
        }
    }

    Ok(())
}

/// Collect filter parse failures into a single field-level ApiError
pub fn field_error(field: &str, result: Result<Option<i64>, String>) -> Result<Option<i64>, ApiError> {
    result.map_err(|message| ApiError::validation_field(field, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filter_id() {
        assert_eq!(validate_filter_id(None, "group"), Ok(None));
        assert_eq!(validate_filter_id(Some(""), "group"), Ok(None));
        assert_eq!(validate_filter_id(Some(" 12 "), "group"), Ok(Some(12)));
        assert!(validate_filter_id(Some("0"), "group").is_err());
        assert!(validate_filter_id(Some("-4"), "group").is_err());
        assert!(validate_filter_id(Some("1 OR 1=1"), "group").is_err());
        assert!(validate_filter_id(Some("99999999999999999999"), "group").is_err());
    }

    #[test]
    fn test_validate_temporal() {
        assert_eq!(validate_temporal(None), Ok(Temporal::All));
        assert_eq!(validate_temporal(Some("future")), Ok(Temporal::FutureOnly));
        assert_eq!(validate_temporal(Some("past")), Ok(Temporal::PastOnly));
        assert!(validate_temporal(Some("yesterday")).is_err());
    }

    #[test]
    fn test_validate_attachment_path() {
        // Valid paths
        assert!(validate_attachment_path(&None).is_ok());
        assert!(validate_attachment_path(&Some("".to_string())).is_ok());
        assert!(validate_attachment_path(&Some("uploads/42/notes.pdf".to_string())).is_ok());
        assert!(validate_attachment_path(&Some("slides_v2.pptx".to_string())).is_ok());

        // Invalid paths
        assert!(validate_attachment_path(&Some("/etc/passwd".to_string())).is_err());
        assert!(validate_attachment_path(&Some("uploads/../secret".to_string())).is_err());
        assert!(validate_attachment_path(&Some("my notes.pdf".to_string())).is_err());
        assert!(validate_attachment_path(&Some("a".repeat(513))).is_err());
    }
}
