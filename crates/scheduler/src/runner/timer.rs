use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError};
use std::thread::{self, JoinHandle};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::job::Job;

use super::JobScheduler;

/// A job's timer thread. Dropping the handle disconnects the stop channel,
/// which ends the thread at its next wake-up.
pub(crate) struct TimerHandle {
    pub(crate) job_id: String,
    stop: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl TimerHandle {
    fn shutdown(self) {
        drop(self.stop);
        if self.thread.join().is_err() {
            warn!(job_id = %self.job_id, "timer thread panicked");
        }
    }
}

/// Spawn the timer thread for `job`, dispatching fires onto `pool`.
pub(super) fn spawn_timer(job: Arc<Job>, pool: Arc<ThreadPool>) -> Result<TimerHandle, SchedulerError> {
    let (stop, stop_rx) = mpsc::channel::<()>();
    let job_id = job.id.clone();

    let thread = thread::Builder::new()
        .name(format!("timer-{}", job.id))
        .spawn(move || loop {
            match stop_rx.recv_timeout(job.interval) {
                Err(RecvTimeoutError::Timeout) => dispatch(&job, &pool),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })?;

    Ok(TimerHandle { job_id, stop, thread })
}

/// One timer fire: claim the job under its lock, run it on the pool.
/// A fire that finds the job running only records the misfire.
fn dispatch(job: &Arc<Job>, pool: &ThreadPool) {
    if job.try_begin() {
        let job = Arc::clone(job);
        pool.spawn(move || {
            let runs = job.run_to_idle();
            debug!(job_id = %job.id, runs, "job idle");
        });
    }
}

impl JobScheduler {
    /// Start firing every registered job on its interval. No-op if already
    /// started.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut timers = self.lock_timers();
        if timers.pool.is_some() {
            debug!("Scheduler already started");
            return Ok(());
        }

        let num_workers = self.config.resolved_worker_threads();
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(num_workers)
                .thread_name(|i| format!("job-worker-{}", i))
                .build()?,
        );

        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs.values() {
            // On failure the already spawned timers stop as `handles` drops.
            handles.push(spawn_timer(Arc::clone(job), Arc::clone(&pool))?);
        }

        info!(
            "Scheduler starting with {} workers, {} registered jobs",
            num_workers,
            handles.len()
        );
        timers.pool = Some(pool);
        timers.handles = handles;
        Ok(())
    }

    /// Stop firing jobs and wait for in-flight executions, including any
    /// pending misfire recovery, to finish. Never interrupts an action.
    ///
    /// Must not be called from inside a job action.
    pub fn stop(&self) {
        let handles = {
            let mut timers = self.lock_timers();
            if timers.pool.take().is_none() {
                return;
            }
            std::mem::take(&mut timers.handles)
        };

        info!("Scheduler stop requested, waiting for in-flight jobs");
        for handle in handles {
            handle.shutdown();
        }

        let jobs: Vec<Arc<Job>> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for job in jobs {
            job.wait_idle();
        }
        info!("Scheduler stopped");
    }
}
