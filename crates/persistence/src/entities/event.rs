//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::event::EventStatus;
use domain::models::Event;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for event status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatusDb {
    Active,
    Inactive,
}

impl From<EventStatusDb> for EventStatus {
    fn from(status: EventStatusDb) -> Self {
        match status {
            EventStatusDb::Active => EventStatus::Active,
            EventStatusDb::Inactive => EventStatus::Inactive,
        }
    }
}

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub status: EventStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Event {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            starts_at: entity.starts_at,
            location: entity.location,
            capacity: entity.capacity,
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
