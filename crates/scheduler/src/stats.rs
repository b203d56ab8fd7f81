use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-job execution counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobStats {
    /// Completed executions, including misfire recovery runs.
    pub runs: u64,
    /// Fires that arrived while the job was already running.
    pub misfires: u64,
    /// Executions whose action returned an error or panicked.
    pub failures: u64,
    /// When the last execution finished.
    pub last_run: Option<DateTime<Utc>>,
    /// Rolling average execution time.
    pub avg_duration: Duration,
}

impl JobStats {
    /// Record a finished execution.
    pub fn record_run(&mut self, duration: Duration, failed: bool) {
        self.runs += 1;
        if failed {
            self.failures += 1;
        }
        self.last_run = Some(Utc::now());

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        self.avg_duration = if self.runs == 1 {
            duration
        } else {
            let prev_nanos = self.avg_duration.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / self.runs as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
    }

    pub fn record_misfire(&mut self) {
        self.misfires += 1;
    }
}
