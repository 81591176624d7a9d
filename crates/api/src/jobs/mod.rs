//! Background job scheduler and job implementations.

mod pool_metrics;
mod scheduler;
mod stats_gauges;

pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use stats_gauges::StatsGaugesJob;
