//! Rule chain evaluation.
//!
//! Runs one item through an ordered capability bucket and aggregates the
//! verdicts:
//! - `Remove` applies immediately and stops the chain; later checkers never run.
//! - `Manual` vetoes approval for the rest of the chain.
//! - `Approve` from any checker approves once, unless vetoed.
//! - `Pass` has no effect.
//!
//! Registration order is therefore part of the contract: an earlier checker
//! can pre-empt every later one.


use std::sync::Arc;

use tracing::{debug, warn};
use warden_core::{Action, CheckerError, ModerationItem, Rule, SinkError};

use crate::checker::Checker;
use crate::sink::ModerationSink;

/// Final result of running one item through a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Approved,
    Removed(Option<Rule>),
    /// At least one checker asked for a human decision.
    AwaitingManual,
    /// Nobody approved; the item is left as is.
    Untouched,
    /// A checker or the sink failed; the item is left as is for this pass.
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Checker {checker} failed: {source}")]
    Checker {
        checker: String,
        #[source]
        source: CheckerError,
    },
    #[error("Failed to {action} item: {source}")]
    Sink {
        action: &'static str,
        #[source]
        source: SinkError,
    },
}

/// Aggregates per-checker verdicts into one action applied through `S`.
pub struct RuleEngine<S> {
    sink: S,
}

impl<S: ModerationSink> RuleEngine<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Evaluate `item` against `bucket` in order and apply the result.
    ///
    /// Failures are logged and reported as [`Outcome::Failed`]; they never
    /// propagate to the calling stream loop.
    pub fn process(&self, item: &ModerationItem, bucket: &[Arc<dyn Checker>]) -> Outcome {
        match self.try_process(item, bucket) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(item_id = %item.id, kind = %item.kind, error = %e, "rule chain failed, leaving item untouched");
                Outcome::Failed
            }
        }
    }

    /// Like [`process`](Self::process) but surfaces the failure.
    pub fn try_process(
        &self,
        item: &ModerationItem,
        bucket: &[Arc<dyn Checker>],
    ) -> Result<Outcome, EngineError> {
        let mut approved = false;
        let mut manual = false;
        let mut short_circuited = false;
        let mut removal_reason: Option<Rule> = None;

        for checker in bucket {
            debug!(checker = checker.name(), item_id = %item.id, "Checking {}...", item.kind);
            let verdict = checker.evaluate(item).map_err(|source| EngineError::Checker {
                checker: checker.name().to_string(),
                source,
            })?;

            match verdict.action {
                Action::Remove => {
                    debug!(checker = checker.name(), item_id = %item.id, "{} failed check", item.kind);
                    self.sink
                        .remove(item, verdict.reason.as_ref())
                        .map_err(|source| EngineError::Sink { action: "remove", source })?;
                    removal_reason = verdict.reason;
                    short_circuited = true;
                    break;
                }
                Action::Manual => {
                    debug!(checker = checker.name(), item_id = %item.id, "Leaving for manual approval");
                    manual = true;
                }
                Action::Pass => {
                    debug!(checker = checker.name(), item_id = %item.id, "Ignoring {}", item.kind);
                }
                Action::Approve => {
                    debug!(checker = checker.name(), item_id = %item.id, "{} passed check", item.kind);
                    approved = true;
                }
            }
        }

        if short_circuited {
            debug!(item_id = %item.id, "{} removed: {}", item.kind, item.locator());
            return Ok(Outcome::Removed(removal_reason));
        }

        if approved && !manual {
            self.sink
                .approve(item)
                .map_err(|source| EngineError::Sink { action: "approve", source })?;
            debug!(item_id = %item.id, "{} approved: {}", item.kind, item.locator());
            Ok(Outcome::Approved)
        } else if manual {
            debug!(item_id = %item.id, "{} waiting for manual approval: {}", item.kind, item.locator());
            Ok(Outcome::AwaitingManual)
        } else {
            Ok(Outcome::Untouched)
        }
    }
}
