//! Validation helpers for DTOs.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use validator::ValidationError;

/// Rejects text that is empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates an RFC 3339 timestamp such as `2024-05-01T12:00:00Z`.
pub fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    if OffsetDateTime::parse(value, &Rfc3339).is_err() {
        let mut err = ValidationError::new("timestamp_format");
        err.message = Some(format!("`{value}` is not an RFC 3339 timestamp").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert!(validate_not_blank("Awkward silence").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \t").is_err());
    }

    #[test]
    fn timestamps_must_be_rfc3339() {
        assert!(validate_timestamp("2024-05-01T12:00:00Z").is_ok());
        assert!(validate_timestamp("2024-05-01T12:00:00+02:00").is_ok());
        assert!(validate_timestamp("2024-05-01").is_err());
        assert!(validate_timestamp("yesterday").is_err());
    }
}
