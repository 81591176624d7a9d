//! User profile entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::UserProfile;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the user_profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct UserProfileEntity {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfileEntity> for UserProfile {
    fn from(entity: UserProfileEntity) -> Self {
        UserProfile {
            id: entity.id,
            email: entity.email,
            full_name: entity.full_name,
            created_at: entity.created_at,
        }
    }
}
