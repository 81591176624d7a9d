//! Check-in domain models.
//!
//! A check-in is the append-only audit record of an admission at the venue.
//! Cancelling one flips its status to `cancelled`; rows are never deleted, so
//! the admission history of an event stays reconstructible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// How an admission was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInMethod {
    /// Scanned at a station running the QR flow.
    QrScanner,
    /// Entered by hand from the roster (no ticket present).
    Manual,
}

impl FromStr for CheckInMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "qr_scanner" => Ok(CheckInMethod::QrScanner),
            "manual" => Ok(CheckInMethod::Manual),
            _ => Err(format!("Unknown check-in method: {}", s)),
        }
    }
}

impl std::fmt::Display for CheckInMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckInMethod::QrScanner => write!(f, "qr_scanner"),
            CheckInMethod::Manual => write!(f, "manual"),
        }
    }
}

/// Status of a check-in record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInStatus {
    Active,
    Cancelled,
}

impl FromStr for CheckInStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(CheckInStatus::Active),
            "cancelled" => Ok(CheckInStatus::Cancelled),
            _ => Err(format!("Unknown check-in status: {}", s)),
        }
    }
}

impl std::fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckInStatus::Active => write!(f, "active"),
            CheckInStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The admin identity a check-in is attributed to.
///
/// Resolved by the external identity service; this core only records it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: Uuid,
    pub name: Option<String>,
}

impl Operator {
    pub fn new(id: Uuid) -> Self {
        Self { id, name: None }
    }

    pub fn named(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

/// A recorded admission event.
///
/// `participant_name`, `participant_email`, and `dependent_count` are
/// snapshots taken at admission time; later edits to the user or their
/// dependents do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: i64,
    pub event_id: Uuid,
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub participant_name: String,
    pub participant_email: Option<String>,
    pub dependent_count: i32,
    pub method: CheckInMethod,
    pub performed_by: Uuid,
    pub performed_by_name: Option<String>,
    pub notes: Option<String>,
    pub status: CheckInStatus,
    pub occurred_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckIn {
    /// Total people admitted by this record (primary + dependents).
    pub fn admitted_count(&self) -> i64 {
        1 + self.dependent_count as i64
    }

    pub fn is_active(&self) -> bool {
        self.status == CheckInStatus::Active
    }
}

/// Input for recording a new check-in.
#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub event_id: Uuid,
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub participant_name: String,
    pub participant_email: Option<String>,
    pub dependent_count: i32,
    pub method: CheckInMethod,
    pub performed_by: Uuid,
    pub performed_by_name: Option<String>,
    pub notes: Option<String>,
}

/// Per-event attendance aggregates, recomputed from registrations and
/// check-ins on every read. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStats {
    /// Approved registrations for the event.
    pub total_registered: i64,
    /// Admitted people: active check-ins plus their dependent counts.
    pub total_checked_in: i64,
    /// Approved registrations without an active check-in.
    pub total_pending: i64,
}

/// Request payload for verifying a scanned QR code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyScanRequest {
    #[validate(custom(function = "shared::validation::validate_qr_data"))]
    pub qr_data: String,
}

/// Request payload for committing a check-in after operator approval.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommitCheckInRequest {
    pub registration_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_notes"))]
    pub notes: Option<String>,

    #[serde(default)]
    pub method: Option<CheckInMethod>,
}

/// Request payload for editing the operator note on a check-in.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckInNotesRequest {
    #[validate(custom(function = "shared::validation::validate_notes"))]
    pub notes: Option<String>,
}

/// Query parameters for the check-in roster listing.
#[derive(Debug, Clone, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRosterQuery {
    #[validate(range(min = 1, max = 200, message = "Limit must be between 1 and 200"))]
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}
