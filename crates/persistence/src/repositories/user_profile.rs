//! User profile repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use domain::services::identity::{UserInfo, UserInfoSource};

use crate::entities::UserProfileEntity;
use crate::metrics::QueryTimer;

/// Repository for user-profile reads.
#[derive(Clone)]
pub struct UserProfileRepository {
    pool: PgPool,
}

impl UserProfileRepository {
    /// Creates a new UserProfileRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user profile by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_profile_by_id");
        let result = sqlx::query_as::<_, UserProfileEntity>(
            r#"
            SELECT id, email, full_name, created_at
            FROM user_profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

/// Display-name resolution strategy backed by the user_profiles table.
///
/// First link in the resolution chain; database errors are logged and
/// answered with `None` so the chain can fall through.
#[derive(Clone)]
pub struct ProfileDirectorySource {
    repository: UserProfileRepository,
}

impl ProfileDirectorySource {
    pub fn new(repository: UserProfileRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UserInfoSource for ProfileDirectorySource {
    fn name(&self) -> &'static str {
        "user_profiles"
    }

    async fn resolve(&self, user_id: Uuid) -> Option<UserInfo> {
        match self.repository.find_by_id(user_id).await {
            Ok(Some(profile)) => Some(UserInfo::new(profile.full_name, Some(profile.email))),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "Profile lookup failed, falling through");
                None
            }
        }
    }
}
