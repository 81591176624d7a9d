//! Dependent repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::DependentEntity;
use crate::metrics::QueryTimer;

/// Repository for dependent-related database operations.
#[derive(Clone)]
pub struct DependentRepository {
    pool: PgPool,
}

impl DependentRepository {
    /// Creates a new DependentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's dependents, oldest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<DependentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_dependents_for_user");
        let result = sqlx::query_as::<_, DependentEntity>(
            r#"
            SELECT id, user_id, full_name, age, relationship, notes, created_at
            FROM dependents
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count a user's dependents.
    pub async fn count_for_user(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_dependents_for_user");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM dependents
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
