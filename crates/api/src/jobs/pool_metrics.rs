//! Connection pool gauge export.

use sqlx::PgPool;

use super::scheduler::{Job, JobFrequency};

/// Publishes pool usage gauges on a short interval.
///
/// Saturation is active connections over the configured ceiling; stations
/// queue on acquire once it reaches 1.0.
pub struct PoolMetricsJob {
    pool: PgPool,
    max_connections: u32,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool, max_connections: u32) -> Self {
        Self {
            pool,
            max_connections,
        }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(10)
    }

    async fn execute(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool, self.max_connections);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_reads_pool_counters() {
        // A lazy pool opens no connections; execute only reads its counters.
        let pool =
            PgPool::connect_lazy("postgres://eventgate@localhost/eventgate").expect("lazy pool");
        let job = PoolMetricsJob::new(pool, 20);

        assert_eq!(job.name(), "pool_metrics");
        assert_eq!(job.frequency().duration().as_secs(), 10);
        job.execute().await.expect("pool gauge export");
    }
}
