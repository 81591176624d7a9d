//! Common validation utilities.

use validator::ValidationError;

/// Maximum accepted size of a scanned QR payload in bytes.
///
/// Version-40 QR codes top out just under 3 KB of binary data; anything
/// larger than this did not come from a ticket.
pub const MAX_PAYLOAD_BYTES: usize = 4096;

/// Maximum length of an operator note on a check-in record.
pub const MAX_NOTES_CHARS: usize = 2000;

/// Validates raw scanner output before it is handed to the payload parser.
///
/// Rejects blank input and anything larger than [`MAX_PAYLOAD_BYTES`].
pub fn validate_qr_data(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        let mut err = ValidationError::new("qr_data_blank");
        err.message = Some("Scanned payload must not be blank".into());
        return Err(err);
    }
    if raw.len() > MAX_PAYLOAD_BYTES {
        let mut err = ValidationError::new("qr_data_size");
        err.message = Some("Scanned payload exceeds maximum size".into());
        return Err(err);
    }
    Ok(())
}

/// Validates an operator note for length.
pub fn validate_notes(notes: &str) -> Result<(), ValidationError> {
    if notes.chars().count() > MAX_NOTES_CHARS {
        let mut err = ValidationError::new("notes_length");
        err.message = Some("Notes must be at most 2000 characters".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_qr_data_accepts_json_payload() {
        assert!(validate_qr_data(r#"{"eventId":"e1","userId":"u1"}"#).is_ok());
    }

    #[test]
    fn test_validate_qr_data_rejects_empty() {
        assert!(validate_qr_data("").is_err());
    }

    #[test]
    fn test_validate_qr_data_rejects_whitespace_only() {
        let err = validate_qr_data("   \n\t ").unwrap_err();
        assert_eq!(err.code, "qr_data_blank");
    }

    #[test]
    fn test_validate_qr_data_rejects_oversized() {
        let huge = "x".repeat(MAX_PAYLOAD_BYTES + 1);
        let err = validate_qr_data(&huge).unwrap_err();
        assert_eq!(err.code, "qr_data_size");
    }

    #[test]
    fn test_validate_qr_data_accepts_max_size() {
        let max = "x".repeat(MAX_PAYLOAD_BYTES);
        assert!(validate_qr_data(&max).is_ok());
    }

    #[test]
    fn test_validate_qr_data_error_message() {
        let err = validate_qr_data("").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Scanned payload must not be blank"
        );
    }

    #[test]
    fn test_validate_notes_accepts_empty() {
        assert!(validate_notes("").is_ok());
    }

    #[test]
    fn test_validate_notes_accepts_normal_text() {
        assert!(validate_notes("ID checked at the door, plus one stroller").is_ok());
    }

    #[test]
    fn test_validate_notes_boundary() {
        let exact = "n".repeat(MAX_NOTES_CHARS);
        assert!(validate_notes(&exact).is_ok());

        let over = "n".repeat(MAX_NOTES_CHARS + 1);
        let err = validate_notes(&over).unwrap_err();
        assert_eq!(err.code, "notes_length");
    }

    #[test]
    fn test_validate_notes_counts_chars_not_bytes() {
        // Multibyte characters count once each
        let exact = "ü".repeat(MAX_NOTES_CHARS);
        assert!(validate_notes(&exact).is_ok());
    }
}
