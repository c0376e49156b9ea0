use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Result type for scheduler job execution.
pub type JobResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Trait for defining a scheduled job.
///
/// Jobs run on a fixed interval; errors are logged and retried on the
/// next tick, never fatal to the scheduler.
#[async_trait]
pub trait SchedulerJob: Send + Sync {
    /// Unique name, used for logging.
    fn name(&self) -> &'static str;

    /// Interval between executions.
    fn interval(&self) -> Duration;

    /// Executes the job logic.
    async fn execute(&self) -> JobResult;
}

/// Runs each registered job on its own interval timer.
pub struct SchedulerService {
    jobs: Vec<Arc<dyn SchedulerJob>>,
}

impl SchedulerService {
    pub fn new(jobs: Vec<Arc<dyn SchedulerJob>>) -> Self {
        Self { jobs }
    }

    /// Spawn one timer task per job.
    pub fn start(&self) {
        tracing::info!("Scheduler started with {} job(s)", self.jobs.len());

        for job in &self.jobs {
            let job = Arc::clone(job);
            tokio::spawn(async move {
                let mut timer = tokio::time::interval(job.interval());
                timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                // The first tick fires immediately; consume it so jobs
                // start one full interval after boot.
                timer.tick().await;

                loop {
                    timer.tick().await;
                    tracing::info!("Running scheduled job '{}'", job.name());
                    if let Err(e) = job.execute().await {
                        tracing::error!("Job '{}' failed: {}", job.name(), e);
                    }
                }
            });
        }
    }
}
