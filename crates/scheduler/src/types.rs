use serde::{Deserialize, Serialize};

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker threads running job actions. Defaults to 20; 0 = available parallelism.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

fn default_worker_threads() -> usize { 20 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_worker_threads(worker_threads: usize) -> Self {
        Self { worker_threads }
    }

    /// Resolve worker thread count (0 means use available parallelism).
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_threads
        }
    }

    /// Pool for `jobs` jobs: one worker each, capped at this config's size.
    pub fn for_jobs(&self, jobs: usize) -> Self {
        Self::with_worker_threads(jobs.clamp(1, self.resolved_worker_threads().max(1)))
    }
}
