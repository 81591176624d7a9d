//! Dependent entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Dependent;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the dependents table.
#[derive(Debug, Clone, FromRow)]
pub struct DependentEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub age: Option<i32>,
    pub relationship: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DependentEntity> for Dependent {
    fn from(entity: DependentEntity) -> Self {
        Dependent {
            id: entity.id,
            user_id: entity.user_id,
            full_name: entity.full_name,
            age: entity.age,
            relationship: entity.relationship,
            notes: entity.notes,
            created_at: entity.created_at,
        }
    }
}
