//! Per-event attendance gauge export.
//!
//! Recomputes check-in stats for events that saw admissions recently and
//! publishes them as Prometheus gauges, so dashboards track door throughput
//! without polling the stats endpoint.

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use tracing::debug;

use domain::models::CheckInStats;
use persistence::repositories::CheckInRepository;

use super::scheduler::{Job, JobFrequency};

/// How far back an event's last check-in may be to still count as active.
const ACTIVITY_WINDOW_HOURS: i64 = 12;

/// Exports attendance gauges for recently active events.
pub struct StatsGaugesJob {
    check_ins: CheckInRepository,
}

impl StatsGaugesJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            check_ins: CheckInRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for StatsGaugesJob {
    fn name(&self) -> &'static str {
        "stats_gauges"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<(), String> {
        let since = Utc::now() - ChronoDuration::hours(ACTIVITY_WINDOW_HOURS);

        let event_ids = self
            .check_ins
            .recently_active_event_ids(since)
            .await
            .map_err(|e| format!("Failed to list active events: {}", e))?;

        for event_id in &event_ids {
            let stats: CheckInStats = self
                .check_ins
                .stats_for_event(*event_id)
                .await
                .map_err(|e| format!("Failed to compute stats for {}: {}", event_id, e))?
                .into();

            persistence::metrics::record_event_stats(&event_id.to_string(), &stats);
        }

        debug!(events = event_ids.len(), "Exported attendance gauges");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_every_minute() {
        let freq = JobFrequency::Minutes(1);
        assert_eq!(freq.duration().as_secs(), 60);
    }
}
