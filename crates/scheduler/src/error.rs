use std::time::Duration;

/// Errors surfaced synchronously by scheduler operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Job already registered: {0}")]
    DuplicateJob(String),
    #[error("Job {id} has invalid interval {interval:?}: must be greater than zero")]
    InvalidInterval { id: String, interval: Duration },
    #[error("Unknown job: {0}")]
    UnknownJob(String),
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("Failed to spawn timer thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Failure reported by a job action. Logged by the scheduler, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Job failed: {0}")]
    Failed(String),
    #[error("Job panicked: {0}")]
    Panicked(String),
}
