//! Interval job scheduler with misfire coalescing.
//!
//! Every registered job fires on its own timer thread. A job never runs
//! twice at the same time: a fire that arrives while the previous run is
//! still going is recorded as a misfire, and all misfires recorded during
//! one run collapse into exactly one follow-up run on the same worker.
//! Runs execute on a `rayon` pool so a slow action never delays the timers.

pub mod error;
pub mod job;
pub mod runner;
pub mod stats;
pub mod types;

pub use error::{JobError, SchedulerError};
pub use job::{FireOutcome, JobAction};
pub use runner::JobScheduler;
pub use stats::JobStats;
pub use types::SchedulerConfig;
