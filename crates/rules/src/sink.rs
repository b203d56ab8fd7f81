//! Side-effecting moderation actions, implemented by the platform client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use warden_core::{ItemId, ModerationItem, Rule, SinkError};

/// Where the rule engine and periodic jobs send their decisions.
pub trait ModerationSink: Send + Sync {
    fn approve(&self, item: &ModerationItem) -> Result<(), SinkError>;

    /// Remove `item`, citing the broken rule when one is known.
    fn remove(&self, item: &ModerationItem, reason: Option<&Rule>) -> Result<(), SinkError>;
}

impl<T: ModerationSink + ?Sized> ModerationSink for Arc<T> {
    fn approve(&self, item: &ModerationItem) -> Result<(), SinkError> {
        (**self).approve(item)
    }

    fn remove(&self, item: &ModerationItem, reason: Option<&Rule>) -> Result<(), SinkError> {
        (**self).remove(item, reason)
    }
}

/// An action captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedAction {
    Approved(ItemId),
    Removed(ItemId, Option<Rule>),
}

/// In-memory sink that records every action instead of applying it.
///
/// Used for dry runs and tests. [`set_failing`](Self::set_failing) makes
/// every call fail after recording nothing.
#[derive(Debug, Default)]
pub struct RecordingSink {
    actions: Mutex<Vec<RecordedAction>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn actions(&self) -> Vec<RecordedAction> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn approvals(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, RecordedAction::Approved(_)))
            .count()
    }

    pub fn removals(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, RecordedAction::Removed(..)))
            .count()
    }

    fn record(&self, action: RecordedAction, name: &'static str, item_id: &str) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Rejected {
                action: name,
                item_id: item_id.to_string(),
                reason: "sink set to fail".to_string(),
            });
        }
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);
        Ok(())
    }
}

impl ModerationSink for RecordingSink {
    fn approve(&self, item: &ModerationItem) -> Result<(), SinkError> {
        self.record(RecordedAction::Approved(item.id.clone()), "approve", &item.id)
    }

    fn remove(&self, item: &ModerationItem, reason: Option<&Rule>) -> Result<(), SinkError> {
        self.record(
            RecordedAction::Removed(item.id.clone(), reason.cloned()),
            "remove",
            &item.id,
        )
    }
}
