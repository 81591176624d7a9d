//! Check-in entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::check_in::CheckInMethod;
use domain::models::{CheckIn, CheckInStats, CheckInStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for check-in status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "check_in_status", rename_all = "lowercase")]
pub enum CheckInStatusDb {
    Active,
    Cancelled,
}

impl From<CheckInStatusDb> for CheckInStatus {
    fn from(status: CheckInStatusDb) -> Self {
        match status {
            CheckInStatusDb::Active => CheckInStatus::Active,
            CheckInStatusDb::Cancelled => CheckInStatus::Cancelled,
        }
    }
}

/// Database enum for how a check-in was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "check_in_method", rename_all = "snake_case")]
pub enum CheckInMethodDb {
    QrScanner,
    Manual,
}

impl From<CheckInMethodDb> for CheckInMethod {
    fn from(method: CheckInMethodDb) -> Self {
        match method {
            CheckInMethodDb::QrScanner => CheckInMethod::QrScanner,
            CheckInMethodDb::Manual => CheckInMethod::Manual,
        }
    }
}

impl From<CheckInMethod> for CheckInMethodDb {
    fn from(method: CheckInMethod) -> Self {
        match method {
            CheckInMethod::QrScanner => CheckInMethodDb::QrScanner,
            CheckInMethod::Manual => CheckInMethodDb::Manual,
        }
    }
}

/// Database row mapping for the check_ins audit table.
#[derive(Debug, Clone, FromRow)]
pub struct CheckInEntity {
    pub id: i64,
    pub event_id: Uuid,
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub participant_name: String,
    pub participant_email: Option<String>,
    pub dependent_count: i32,
    pub method: CheckInMethodDb,
    pub performed_by: Uuid,
    pub performed_by_name: Option<String>,
    pub notes: Option<String>,
    pub status: CheckInStatusDb,
    pub occurred_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CheckInEntity> for CheckIn {
    fn from(entity: CheckInEntity) -> Self {
        CheckIn {
            id: entity.id,
            event_id: entity.event_id,
            registration_id: entity.registration_id,
            user_id: entity.user_id,
            participant_name: entity.participant_name,
            participant_email: entity.participant_email,
            dependent_count: entity.dependent_count,
            method: entity.method.into(),
            performed_by: entity.performed_by,
            performed_by_name: entity.performed_by_name,
            notes: entity.notes,
            status: entity.status.into(),
            occurred_at: entity.occurred_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Row shape of the attendance stats recomputation.
#[derive(Debug, Clone, FromRow)]
pub struct CheckInStatsEntity {
    pub total_registered: i64,
    pub total_checked_in: i64,
    pub total_pending: i64,
}

impl From<CheckInStatsEntity> for CheckInStats {
    fn from(entity: CheckInStatsEntity) -> Self {
        CheckInStats {
            total_registered: entity.total_registered,
            total_checked_in: entity.total_checked_in,
            total_pending: entity.total_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_in_entity_to_domain() {
        let now = Utc::now();
        let entity = CheckInEntity {
            id: 42,
            event_id: Uuid::new_v4(),
            registration_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            participant_name: "Ana Horvat".to_string(),
            participant_email: Some("ana@example.com".to_string()),
            dependent_count: 2,
            method: CheckInMethodDb::QrScanner,
            performed_by: Uuid::new_v4(),
            performed_by_name: Some("Door Admin".to_string()),
            notes: None,
            status: CheckInStatusDb::Active,
            occurred_at: now,
            updated_at: now,
        };

        let check_in: CheckIn = entity.clone().into();
        assert_eq!(check_in.id, 42);
        assert_eq!(check_in.method, CheckInMethod::QrScanner);
        assert_eq!(check_in.status, CheckInStatus::Active);
        assert_eq!(check_in.admitted_count(), 3);
    }

    #[test]
    fn test_method_round_trips_through_db_enum() {
        let db: CheckInMethodDb = CheckInMethod::Manual.into();
        assert_eq!(CheckInMethod::from(db), CheckInMethod::Manual);
    }

    #[test]
    fn test_stats_entity_to_domain() {
        let entity = CheckInStatsEntity {
            total_registered: 120,
            total_checked_in: 87,
            total_pending: 55,
        };
        let stats: CheckInStats = entity.into();
        assert_eq!(stats.total_registered, 120);
        assert_eq!(stats.total_checked_in, 87);
        assert_eq!(stats.total_pending, 55);
    }
}
