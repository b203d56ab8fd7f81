use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use rayon::ThreadPool;
use tracing::info;

use crate::error::{JobError, SchedulerError};
use crate::job::{FireOutcome, Job, JobAction};
use crate::stats::JobStats;
use crate::types::SchedulerConfig;

use super::timer::{spawn_timer, TimerHandle};

/// Timer threads and the pool they dispatch to. Present only while started.
#[derive(Default)]
pub(super) struct TimerSet {
    pub(super) pool: Option<Arc<ThreadPool>>,
    pub(super) handles: Vec<TimerHandle>,
}

/// Owns named recurring jobs and guarantees at most one concurrent
/// execution per job.
///
/// Lock order is always `timers` before `jobs`.
pub struct JobScheduler {
    pub(super) config: SchedulerConfig,
    /// Registered jobs keyed by id.
    pub(super) jobs: RwLock<HashMap<String, Arc<Job>>>,
    pub(super) timers: Mutex<TimerSet>,
}

impl JobScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            jobs: RwLock::new(HashMap::new()),
            timers: Mutex::new(TimerSet::default()),
        }
    }

    /// Register a recurring job firing every `interval`.
    ///
    /// Fails without side effects if `id` is taken or `interval` is zero.
    /// Jobs registered on a started scheduler get their timer immediately.
    pub fn register_job<F>(
        &self,
        id: impl Into<String>,
        interval: Duration,
        action: F,
    ) -> Result<(), SchedulerError>
    where
        F: Fn() -> Result<(), JobError> + Send + Sync + 'static,
    {
        self.register_job_action(id, interval, Arc::new(action))
    }

    /// [`register_job`](Self::register_job) for an already shared action.
    pub fn register_job_action(
        &self,
        id: impl Into<String>,
        interval: Duration,
        action: JobAction,
    ) -> Result<(), SchedulerError> {
        let id = id.into();
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval { id, interval });
        }

        let mut timers = self.lock_timers();
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if jobs.contains_key(&id) {
            return Err(SchedulerError::DuplicateJob(id));
        }

        let job = Arc::new(Job::new(id.clone(), interval, action));
        if let Some(pool) = timers.pool.clone() {
            let handle = spawn_timer(Arc::clone(&job), pool)?;
            timers.handles.push(handle);
        }
        jobs.insert(id.clone(), job);

        info!(job_id = %id, "Registered job (interval: {:?})", interval);
        Ok(())
    }

    /// Fire a job now, on the calling thread, with the same semantics as a
    /// timer fire. Blocks until the action (and any misfire recovery) is done
    /// unless the job was already running.
    pub fn fire(&self, id: &str) -> Result<FireOutcome, SchedulerError> {
        let job = self
            .job(id)
            .ok_or_else(|| SchedulerError::UnknownJob(id.to_string()))?;
        Ok(job.fire())
    }

    /// Whether an execution of `id` is in progress.
    pub fn is_running(&self, id: &str) -> bool {
        self.job(id).map(|j| j.is_running()).unwrap_or(false)
    }

    /// Snapshot of a job's counters.
    pub fn stats(&self, id: &str) -> Option<JobStats> {
        self.job(id).map(|j| j.stats())
    }

    /// Registered job ids, sorted.
    pub fn job_ids(&self) -> Vec<String> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = jobs.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the timer subsystem is running.
    pub fn is_started(&self) -> bool {
        self.lock_timers().pool.is_some()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub(super) fn job(&self, id: &str) -> Option<Arc<Job>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub(super) fn lock_timers(&self) -> MutexGuard<'_, TimerSet> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
