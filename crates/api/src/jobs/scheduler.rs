//! Job scheduler infrastructure for background tasks.
//!
//! Jobs run on independent tokio intervals and stop together through a watch
//! channel. A failing job logs and waits for its next tick; it is never
//! unscheduled.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How often a job runs.
#[derive(Debug, Clone, Copy)]
pub enum JobFrequency {
    /// Every N seconds.
    Seconds(u64),
    /// Every N minutes.
    Minutes(u64),
    /// Every hour.
    Hourly,
}

impl JobFrequency {
    /// Interval between executions.
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs(*secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(*mins * 60),
            JobFrequency::Hourly => Duration::from_secs(3600),
        }
    }
}

/// A background task run on a fixed interval.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// How often to run.
    fn frequency(&self) -> JobFrequency;

    /// One execution. An `Err` is logged; the schedule continues.
    async fn execute(&self) -> Result<(), String>;
}

/// Runs registered jobs until shutdown.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    /// Register a job. Has no effect on jobs after `start`.
    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Spawn one task per registered job.
    pub fn start(&mut self) {
        info!("Starting job scheduler with {} jobs", self.jobs.len());

        for job in &self.jobs {
            let job = Arc::clone(job);
            let shutdown_rx = self.shutdown_rx.clone();
            self.handles.push(tokio::spawn(run_job(job, shutdown_rx)));
        }
    }

    /// Signal all jobs to stop. Returns immediately.
    pub fn shutdown(&self) {
        info!("Initiating job scheduler shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for all job tasks to finish, up to `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let join_all = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!("Job task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, join_all).await {
            Ok(()) => info!("All jobs stopped"),
            Err(_) => warn!("Job shutdown timed out after {:?}", timeout),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Tick loop for one job. The interval's immediate first tick is consumed so
/// a job never runs at startup.
async fn run_job(job: Arc<dyn Job>, mut shutdown_rx: watch::Receiver<bool>) {
    let name = job.name();
    let frequency = job.frequency();
    let mut interval = tokio::time::interval(frequency.duration());
    interval.tick().await;

    info!(job = name, frequency = ?frequency, "Job scheduled");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let start = std::time::Instant::now();

                match job.execute().await {
                    Ok(()) => {
                        info!(
                            job = name,
                            elapsed_ms = start.elapsed().as_millis(),
                            "Job completed"
                        );
                    }
                    Err(e) => {
                        error!(
                            job = name,
                            elapsed_ms = start.elapsed().as_millis(),
                            error = %e,
                            "Job failed"
                        );
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!(job = name, "Job shutting down");
                    break;
                }
            }
        }
    }
}
