//! Scanned payload validation.
//!
//! Pure parsing of raw scanner output into a typed check-in request. No IO;
//! the only context is the event the scan session is bound to.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Typed check-in request extracted from a scanned payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInRequest {
    pub event_id: Uuid,
    pub user_id: Uuid,
}

/// Why a scanned payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The string is not a JSON object with usable identifier fields.
    #[error("Scanned code is not a ticket for this system")]
    MalformedPayload,
    /// A required field is absent or empty.
    #[error("Ticket payload is missing {field}")]
    IncompletePayload { field: &'static str },
    /// The ticket belongs to a different event than the one being scanned.
    #[error("Ticket is for a different event")]
    WrongEventPayload { expected: Uuid, found: Uuid },
}

/// Wire shape of a ticket payload. Extra fields (timestamp, display name,
/// legacy check-in codes) are ignored here and only matter for issuance.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicketPayload {
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// Validates a raw decoded string against the session's event.
///
/// Rules, in order: the string must parse as a JSON object; `eventId` and
/// `userId` must be present and non-empty; identifiers must be well-formed;
/// the event must match the scan session.
pub fn validate_payload(
    raw: &str,
    session_event_id: Uuid,
) -> Result<CheckInRequest, ValidationError> {
    let payload: RawTicketPayload =
        serde_json::from_str(raw).map_err(|_| ValidationError::MalformedPayload)?;

    let event_field = field_value(&payload.event_id, "eventId")?;
    let user_field = field_value(&payload.user_id, "userId")?;

    let event_id =
        Uuid::parse_str(event_field).map_err(|_| ValidationError::MalformedPayload)?;
    let user_id = Uuid::parse_str(user_field).map_err(|_| ValidationError::MalformedPayload)?;

    if event_id != session_event_id {
        return Err(ValidationError::WrongEventPayload {
            expected: session_event_id,
            found: event_id,
        });
    }

    Ok(CheckInRequest { event_id, user_id })
}

fn field_value<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::IncompletePayload { field }),
    }
}
