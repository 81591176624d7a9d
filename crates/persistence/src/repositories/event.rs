//! Event repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::EventEntity;
use crate::metrics::QueryTimer;

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, title, description, starts_at, location, capacity, status,
                   created_at, updated_at
            FROM events
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
