//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::registration::RegistrationStatus;
use domain::models::{Participant, Registration};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for registration status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Pending,
    Approved,
    Rejected,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(status: RegistrationStatusDb) -> Self {
        match status {
            RegistrationStatusDb::Pending => RegistrationStatus::Pending,
            RegistrationStatusDb::Approved => RegistrationStatus::Approved,
            RegistrationStatusDb::Rejected => RegistrationStatus::Rejected,
        }
    }
}

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RegistrationEntity> for Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Registration {
            id: entity.id,
            event_id: entity.event_id,
            user_id: entity.user_id,
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Registration joined with profile data for the door list.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantEntity {
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub status: RegistrationStatusDb,
    pub dependent_count: i64,
    pub checked_in: bool,
    pub registered_at: DateTime<Utc>,
}

impl From<ParticipantEntity> for Participant {
    fn from(entity: ParticipantEntity) -> Self {
        Participant {
            registration_id: entity.registration_id,
            user_id: entity.user_id,
            email: entity.email,
            full_name: entity.full_name,
            status: entity.status.into(),
            dependent_count: entity.dependent_count,
            checked_in: entity.checked_in,
            registered_at: entity.registered_at,
        }
    }
}
