//! A single recurring job and its `Idle -> Running -> Idle` state machine.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::JobError;
use crate::stats::JobStats;

/// Zero-argument action executed on every fire.
pub type JobAction = Arc<dyn Fn() -> Result<(), JobError> + Send + Sync>;

/// What happened to a fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// This fire ran the action `runs` times: once, plus one run per
    /// coalesced batch of misfires that arrived meanwhile.
    Executed { runs: u32 },
    /// The job was already running; the fire was recorded as a misfire.
    Misfired,
}

struct JobState {
    running: bool,
    misfired: bool,
    stats: JobStats,
}

pub(crate) struct Job {
    pub(crate) id: String,
    pub(crate) interval: Duration,
    action: JobAction,
    state: Mutex<JobState>,
    idle: Condvar,
}

impl Job {
    pub(crate) fn new(id: String, interval: Duration, action: JobAction) -> Self {
        Self {
            id,
            interval,
            action,
            state: Mutex::new(JobState {
                running: false,
                misfired: false,
                stats: JobStats::default(),
            }),
            idle: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        // Actions never run under this lock, so a poisoned guard still holds
        // consistent flags.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle a fire on the calling thread, running the action (and any
    /// misfire recovery) to completion when the job was idle.
    pub(crate) fn fire(&self) -> FireOutcome {
        if self.try_begin() {
            FireOutcome::Executed { runs: self.run_to_idle() }
        } else {
            FireOutcome::Misfired
        }
    }

    /// Claim the job for execution. Returns `false` and records a misfire
    /// if another execution is in progress.
    pub(crate) fn try_begin(&self) -> bool {
        let mut state = self.lock();
        if state.running {
            state.misfired = true;
            state.stats.record_misfire();
            warn!(job_id = %self.id, "job misfired");
            return false;
        }
        state.running = true;
        state.misfired = false;
        true
    }

    /// Execute the action, then keep re-executing while misfires were
    /// recorded during the previous run. Must follow a successful
    /// [`try_begin`](Self::try_begin). Returns the number of executions.
    pub(crate) fn run_to_idle(&self) -> u32 {
        let mut runs = 0;
        loop {
            self.execute_once();
            runs += 1;

            let mut state = self.lock();
            if state.misfired {
                state.misfired = false;
                drop(state);
                debug!(job_id = %self.id, "recovering from misfire");
                continue;
            }
            // Clearing `running` in the same critical section as the misfire
            // check leaves no window for a fire to be lost.
            state.running = false;
            self.idle.notify_all();
            return runs;
        }
    }

    fn execute_once(&self) {
        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| (self.action)()))
            .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload.as_ref()))));
        let duration = start.elapsed();

        let failed = match result {
            Ok(()) => {
                debug!(job_id = %self.id, "job completed in {:?}", duration);
                false
            }
            Err(e) => {
                warn!(job_id = %self.id, error = %e, "job action failed");
                true
            }
        };
        self.lock().stats.record_run(duration, failed);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.lock().running
    }

    pub(crate) fn stats(&self) -> JobStats {
        self.lock().stats.clone()
    }

    /// Block until no execution of this job is in flight.
    pub(crate) fn wait_idle(&self) {
        let mut state = self.lock();
        while state.running {
            state = self.idle.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
