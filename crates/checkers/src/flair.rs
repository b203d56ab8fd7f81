//! Flair enforcement.
//!
//! Unflaired posts are remembered when they come through the post stream.
//! A periodic sweep re-fetches each remembered post: once it has a flair it
//! is forgotten, past the warning age its author is messaged once, and past
//! the removal age it is removed citing the flair rule.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use warden_cache::{RecencyMap, RecencySet};
use warden_core::{CheckerError, FlairSettings, ItemId, ModerationItem, Rule, SinkError, Verdict};
use warden_rules::{Capability, Checker, ExtensionContext, ModerationSink, SetupError};
use warden_scheduler::JobError;

use crate::env::CheckerEnv;
use crate::platform::Platform;

pub const SWEEP_JOB: &str = "flair.sweep";

const WARNING_SUBJECT: &str = "Your post needs a flair";

#[derive(Debug, thiserror::Error)]
enum SweepError {
    #[error(transparent)]
    Lookup(#[from] CheckerError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    /// Posts that got a flair (or vanished) and are no longer tracked.
    pub resolved: usize,
    pub warned: usize,
    pub removed: usize,
    pub failed: usize,
}

enum Step {
    Resolved,
    Warned,
    Removed,
    Waiting,
}

struct FlairState {
    /// Unflaired posts keyed by id, oldest first.
    tracked: RecencyMap<ItemId, ModerationItem>,
    /// Posts whose author has already been warned.
    warned: RecencySet<ItemId>,
}

pub struct FlairChecker {
    warn_after: chrono::Duration,
    remove_after: chrono::Duration,
    sink: Arc<dyn ModerationSink>,
    platform: Arc<dyn Platform>,
    /// Shared by the post stream and the sweep job.
    state: Mutex<FlairState>,
}

impl FlairChecker {
    pub fn new(settings: &FlairSettings, sink: Arc<dyn ModerationSink>, platform: Arc<dyn Platform>) -> Self {
        Self {
            warn_after: secs(settings.warn_after_secs),
            remove_after: secs(settings.remove_after_secs),
            sink,
            platform,
            state: Mutex::new(FlairState {
                tracked: RecencyMap::new(settings.capacity),
                warned: RecencySet::new(settings.capacity),
            }),
        }
    }

    pub fn tracked(&self) -> usize {
        self.lock_state().tracked.len()
    }

    pub fn is_tracked(&self, id: &str) -> bool {
        self.lock_state().tracked.contains_key(id)
    }

    /// Check every tracked post against `now`. Platform calls happen
    /// outside the state lock so the post stream is never held up.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let snapshot: Vec<ModerationItem> = self.lock_state().tracked.values().cloned().collect();
        let mut report = SweepReport::default();

        for item in snapshot {
            report.checked += 1;
            match self.sweep_one(&item, now) {
                Ok(Step::Resolved) => report.resolved += 1,
                Ok(Step::Warned) => report.warned += 1,
                Ok(Step::Removed) => report.removed += 1,
                Ok(Step::Waiting) => {}
                Err(e) => {
                    warn!(item_id = %item.id, error = %e, "flair sweep failed for post");
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn sweep_one(&self, item: &ModerationItem, now: DateTime<Utc>) -> Result<Step, SweepError> {
        let current = self.platform.refresh(item)?;
        if current.flair.is_some() || current.removed {
            debug!(item_id = %item.id, "post resolved, no longer tracking");
            self.lock_state().tracked.take(&item.id);
            return Ok(Step::Resolved);
        }

        let age = current.age(now);
        if age >= self.remove_after {
            self.sink.remove(&current, Some(&Rule::Flair))?;
            self.lock_state().tracked.take(&item.id);
            info!(item_id = %item.id, "Removed unflaired post: {}", current.locator());
            return Ok(Step::Removed);
        }

        if age >= self.warn_after && !self.lock_state().warned.contains(&item.id) {
            let remaining = (self.remove_after - age).num_minutes().max(1);
            let body = format!(
                "Your post {} has no flair. Add one within {} minutes or it will be removed.",
                current.locator(),
                remaining
            );
            self.platform.message_author(&current, WARNING_SUBJECT, &body)?;
            self.lock_state().warned.record(item.id.clone());
            debug!(item_id = %item.id, author = %current.author, "warned author about missing flair");
            return Ok(Step::Warned);
        }

        Ok(Step::Waiting)
    }

    fn run_sweep(&self) -> Result<(), JobError> {
        let report = self.sweep(Utc::now());
        if report.resolved + report.warned + report.removed > 0 {
            info!(
                checked = report.checked,
                resolved = report.resolved,
                warned = report.warned,
                removed = report.removed,
                "flair sweep finished"
            );
        }
        if report.failed > 0 {
            return Err(JobError::Failed(format!(
                "{} of {} tracked posts failed",
                report.failed, report.checked
            )));
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, FlairState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn secs(s: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(s).unwrap_or(i64::MAX))
}

impl Checker for FlairChecker {
    fn name(&self) -> &str {
        "flair"
    }

    fn capability(&self) -> Capability {
        Capability::PostOnly
    }

    /// Never judges on sight: the author gets time to add a flair.
    fn evaluate(&self, item: &ModerationItem) -> Result<Verdict, CheckerError> {
        if item.flair.is_none() {
            let mut state = self.lock_state();
            if state.tracked.set(item.id.clone(), item.clone()).is_none() {
                debug!(item_id = %item.id, "tracking unflaired post");
            }
        }
        Ok(Verdict::pass())
    }
}

pub fn setup(ctx: &mut ExtensionContext<'_, CheckerEnv>) -> Result<(), SetupError> {
    let env = ctx.env();
    let settings = &env.settings.flair;
    if settings.capacity == 0 {
        return Err(SetupError::Settings("flair.capacity must be greater than zero".to_string()));
    }
    let interval = Duration::from_secs(settings.sweep_interval_secs);
    let checker = Arc::new(FlairChecker::new(
        settings,
        Arc::clone(&env.sink),
        Arc::clone(&env.platform),
    ));

    ctx.add_extension(Arc::clone(&checker) as Arc<dyn Checker>);
    ctx.register_job(SWEEP_JOB, interval, move || checker.run_sweep())
}
