//! Database metrics collection.
//!
//! Provides functions for recording database-related metrics and the
//! per-event attendance gauges exported by the stats job.

use domain::models::CheckInStats;
use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
///
/// Call this function after executing a query to record its duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record database connection pool metrics.
///
/// Call this function periodically to track pool health. `max_connections`
/// is the configured pool ceiling; saturation is the active share of it.
pub fn record_pool_metrics(pool: &PgPool, max_connections: u32) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
    gauge!("database_connections_saturation").set(pool_saturation(active, max_connections));
}

/// Active share of the configured pool ceiling, in `[0.0, 1.0]`.
fn pool_saturation(active: usize, max_connections: u32) -> f64 {
    if max_connections == 0 {
        return 0.0;
    }
    active as f64 / max_connections as f64
}

/// Export one event's attendance counts as gauges.
///
/// The gauges mirror the stats endpoint; they are derived from the same
/// recomputation and never written back to the database.
pub fn record_event_stats(event_id: &str, stats: &CheckInStats) {
    gauge!("event_registered_total", "event" => event_id.to_string())
        .set(stats.total_registered as f64);
    gauge!("event_checked_in_total", "event" => event_id.to_string())
        .set(stats.total_checked_in as f64);
    gauge!("event_pending_total", "event" => event_id.to_string())
        .set(stats.total_pending as f64);
}

/// A helper to time database operations and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = QueryTimer::new("find_active_check_in");
/// let result = sqlx::query_as::<_, CheckInEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: String,
    start: Instant,
}

impl QueryTimer {
    /// Create a new timer for the given query name.
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(&self.query_name, duration);
    }
}
