//! Registration repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ParticipantEntity, RegistrationEntity};
use crate::metrics::QueryTimer;

/// Repository for registration-related database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the approved registration for an (event, user) pair.
    ///
    /// Pending and rejected registrations are not visible through this
    /// query; eligibility requires approved status.
    pub async fn find_approved(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_approved_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, event_id, user_id, status, created_at, updated_at
            FROM registrations
            WHERE event_id = $1 AND user_id = $2 AND status = 'approved'
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an approved registration by ID, scoped to an event.
    pub async fn find_approved_for_event(
        &self,
        id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_approved_registration_by_id");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, event_id, user_id, status, created_at, updated_at
            FROM registrations
            WHERE id = $1 AND event_id = $2 AND status = 'approved'
            "#,
        )
        .bind(id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List approved registrations for an event with profile data, dependent
    /// counts, and whether an active check-in exists.
    pub async fn list_participants(
        &self,
        event_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ParticipantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_participants");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT r.id AS registration_id, r.user_id, u.email, u.full_name, r.status,
                   (SELECT COUNT(*) FROM dependents d WHERE d.user_id = r.user_id)
                       AS dependent_count,
                   EXISTS(SELECT 1 FROM check_ins c
                          WHERE c.registration_id = r.id AND c.status = 'active')
                       AS checked_in,
                   r.created_at AS registered_at
            FROM registrations r
            JOIN user_profiles u ON u.id = r.user_id
            WHERE r.event_id = $1 AND r.status = 'approved'
            ORDER BY u.full_name NULLS LAST, u.email
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(event_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count approved registrations for an event.
    pub async fn count_participants(&self, event_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_participants");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM registrations
            WHERE event_id = $1 AND status = 'approved'
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
