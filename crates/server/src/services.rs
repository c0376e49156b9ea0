mod jobs;
mod scheduler;

pub use jobs::{CacheSweepJob, EnrichmentBatchJob};
pub use scheduler::{JobResult, SchedulerJob, SchedulerService};
