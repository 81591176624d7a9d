//! Registration domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Approval status of a registration.
///
/// Only `Approved` registrations are eligible for check-in; `Pending` and
/// `Rejected` are indistinguishable from "never registered" at the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RegistrationStatus::Pending),
            "approved" => Ok(RegistrationStatus::Approved),
            "rejected" => Ok(RegistrationStatus::Rejected),
            _ => Err(format!("Unknown registration status: {}", s)),
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Pending => write!(f, "pending"),
            RegistrationStatus::Approved => write!(f, "approved"),
            RegistrationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A user's request to attend an event.
///
/// The (event_id, user_id) pair is unique; admission history lives in the
/// append-only check-in table, never on this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Whether this registration may be admitted.
    pub fn is_eligible(&self) -> bool {
        self.status == RegistrationStatus::Approved
    }
}

/// One line of the door list: a registration joined with profile data and
/// current admission state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub status: RegistrationStatus,
    pub dependent_count: i64,
    pub checked_in: bool,
    pub registered_at: DateTime<Utc>,
}

/// Query parameters for the door-list roster.
#[derive(Debug, Clone, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantListQuery {
    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<i64>,
    #[validate(range(min = 0, message = "Offset must not be negative"))]
    pub offset: Option<i64>,
}

/// One door-list page with the total approved count for progress displays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantListResponse {
    pub participants: Vec<Participant>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
