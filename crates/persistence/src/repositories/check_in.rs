//! Check-in repository for database operations.
//!
//! The check_ins table is append-only audit data: admission inserts a row,
//! cancellation flips status to cancelled, nothing is deleted. The partial
//! unique index on (registration_id) WHERE status = 'active' is the only
//! concurrency-control primitive the flow needs.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::NewCheckIn;

use crate::entities::{CheckInEntity, CheckInMethodDb, CheckInStatsEntity};
use crate::metrics::QueryTimer;

/// Repository for check-in-related database operations.
#[derive(Clone)]
pub struct CheckInRepository {
    pool: PgPool,
}

impl CheckInRepository {
    /// Creates a new CheckInRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a check-in, conditioned on no active check-in existing for the
    /// registration. Returns `None` when a concurrent insert already won.
    pub async fn insert(&self, input: &NewCheckIn) -> Result<Option<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_check_in");
        let result = sqlx::query_as::<_, CheckInEntity>(
            r#"
            INSERT INTO check_ins (event_id, registration_id, user_id, participant_name,
                                   participant_email, dependent_count, method,
                                   performed_by, performed_by_name, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (registration_id) WHERE status = 'active' DO NOTHING
            RETURNING id, event_id, registration_id, user_id, participant_name,
                      participant_email, dependent_count, method, performed_by,
                      performed_by_name, notes, status, occurred_at, updated_at
            "#,
        )
        .bind(input.event_id)
        .bind(input.registration_id)
        .bind(input.user_id)
        .bind(&input.participant_name)
        .bind(&input.participant_email)
        .bind(input.dependent_count)
        .bind(CheckInMethodDb::from(input.method))
        .bind(input.performed_by)
        .bind(&input.performed_by_name)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a check-in by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_check_in_by_id");
        let result = sqlx::query_as::<_, CheckInEntity>(
            r#"
            SELECT id, event_id, registration_id, user_id, participant_name,
                   participant_email, dependent_count, method, performed_by,
                   performed_by_name, notes, status, occurred_at, updated_at
            FROM check_ins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the active check-in for a registration, if any.
    pub async fn find_active_for_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_check_in");
        let result = sqlx::query_as::<_, CheckInEntity>(
            r#"
            SELECT id, event_id, registration_id, user_id, participant_name,
                   participant_email, dependent_count, method, performed_by,
                   performed_by_name, notes, status, occurred_at, updated_at
            FROM check_ins
            WHERE registration_id = $1 AND status = 'active'
            "#,
        )
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Soft-cancel an active check-in. Returns `None` if the row does not
    /// exist or is already cancelled.
    pub async fn cancel(&self, id: i64) -> Result<Option<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("cancel_check_in");
        let result = sqlx::query_as::<_, CheckInEntity>(
            r#"
            UPDATE check_ins
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING id, event_id, registration_id, user_id, participant_name,
                      participant_email, dependent_count, method, performed_by,
                      performed_by_name, notes, status, occurred_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replace the operator notes on a check-in.
    pub async fn update_notes(
        &self,
        id: i64,
        notes: Option<&str>,
    ) -> Result<Option<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_check_in_notes");
        let result = sqlx::query_as::<_, CheckInEntity>(
            r#"
            UPDATE check_ins
            SET notes = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, event_id, registration_id, user_id, participant_name,
                      participant_email, dependent_count, method, performed_by,
                      performed_by_name, notes, status, occurred_at, updated_at
            "#,
        )
        .bind(id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List active check-ins for an event, newest first, keyset-paginated on
    /// (occurred_at, id).
    pub async fn list_active_for_event(
        &self,
        event_id: Uuid,
        limit: i64,
        cursor: Option<(DateTime<Utc>, i64)>,
    ) -> Result<Vec<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_check_ins_for_event");
        let result = if let Some((occurred_at, id)) = cursor {
            sqlx::query_as::<_, CheckInEntity>(
                r#"
                SELECT id, event_id, registration_id, user_id, participant_name,
                       participant_email, dependent_count, method, performed_by,
                       performed_by_name, notes, status, occurred_at, updated_at
                FROM check_ins
                WHERE event_id = $1 AND status = 'active'
                  AND (occurred_at, id) < ($2, $3)
                ORDER BY occurred_at DESC, id DESC
                LIMIT $4
                "#,
            )
            .bind(event_id)
            .bind(occurred_at)
            .bind(id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, CheckInEntity>(
                r#"
                SELECT id, event_id, registration_id, user_id, participant_name,
                       participant_email, dependent_count, method, performed_by,
                       performed_by_name, notes, status, occurred_at, updated_at
                FROM check_ins
                WHERE event_id = $1 AND status = 'active'
                ORDER BY occurred_at DESC, id DESC
                LIMIT $2
                "#,
            )
            .bind(event_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        };
        timer.record();
        result
    }

    /// Recompute attendance stats for an event from the source tables.
    ///
    /// total_checked_in counts admitted people (attendees plus their
    /// dependents); total_pending counts approved registrations without an
    /// active check-in.
    pub async fn stats_for_event(&self, event_id: Uuid) -> Result<CheckInStatsEntity, sqlx::Error> {
        let timer = QueryTimer::new("event_check_in_stats");
        let result = sqlx::query_as::<_, CheckInStatsEntity>(
            r#"
            SELECT
                (SELECT COUNT(*)
                 FROM registrations r
                 WHERE r.event_id = $1 AND r.status = 'approved') AS total_registered,
                (SELECT COUNT(*) + COALESCE(SUM(c.dependent_count), 0)
                 FROM check_ins c
                 WHERE c.event_id = $1 AND c.status = 'active') AS total_checked_in,
                (SELECT COUNT(*)
                 FROM registrations r
                 WHERE r.event_id = $1 AND r.status = 'approved'
                   AND NOT EXISTS (SELECT 1 FROM check_ins c
                                   WHERE c.registration_id = r.id
                                     AND c.status = 'active')) AS total_pending
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Event IDs with at least one check-in since the given instant. Feeds
    /// the stats gauge job.
    pub async fn recently_active_event_ids(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("recently_active_event_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT event_id
            FROM check_ins
            WHERE occurred_at > $1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
