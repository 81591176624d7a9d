//! Event domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Open for registration and check-in.
    Active,
    /// Hidden from attendees; check-in is refused.
    Inactive,
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EventStatus::Active),
            "inactive" => Ok(EventStatus::Inactive),
            _ => Err(format!("Unknown event status: {}", s)),
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Active => write!(f, "active"),
            EventStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Represents an event that attendees register for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether check-in is currently allowed for this event.
    pub fn accepts_check_ins(&self) -> bool {
        self.status == EventStatus::Active
    }
}

/// Event summary used by station-facing responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
    pub status: EventStatus,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            starts_at: event.starts_at,
            location: event.location,
            status: event.status,
        }
    }
}
