//! Logging stand-ins for the platform client. Nothing leaves the process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, info};
use warden_checkers::{Platform, PromotionLookup};
use warden_core::{CheckerError, ItemId, ModerationItem, Rule, SinkError};
use warden_rules::ModerationSink;

/// Logs every approve/remove instead of applying it.
#[derive(Debug, Default)]
pub struct DryRunSink {
    /// Reply with the broken rule on comment removals too.
    comment_reason: bool,
    approved: AtomicUsize,
    removed: AtomicUsize,
    reasons: AtomicUsize,
}

impl DryRunSink {
    pub fn new(comment_reason: bool) -> Self {
        Self {
            comment_reason,
            ..Self::default()
        }
    }

    pub fn approved(&self) -> usize {
        self.approved.load(Ordering::Relaxed)
    }

    pub fn removed(&self) -> usize {
        self.removed.load(Ordering::Relaxed)
    }

    /// Removal reasons that would have been posted as replies.
    pub fn reasons(&self) -> usize {
        self.reasons.load(Ordering::Relaxed)
    }
}

impl ModerationSink for DryRunSink {
    fn approve(&self, item: &ModerationItem) -> Result<(), SinkError> {
        self.approved.fetch_add(1, Ordering::Relaxed);
        info!(item_id = %item.id, kind = %item.kind, "[dry-run] approve {}", item.locator());
        Ok(())
    }

    fn remove(&self, item: &ModerationItem, reason: Option<&Rule>) -> Result<(), SinkError> {
        self.removed.fetch_add(1, Ordering::Relaxed);
        let reply = reason.filter(|_| item.is_post() || self.comment_reason);
        if let Some(rule) = reply {
            self.reasons.fetch_add(1, Ordering::Relaxed);
            info!(item_id = %item.id, rule = rule.id(), "[dry-run] reply with removal reason");
        }
        let rule = reason.map(Rule::id).unwrap_or("none");
        info!(item_id = %item.id, kind = %item.kind, rule, "[dry-run] remove {}", item.locator());
        Ok(())
    }
}

/// Serves items back unchanged and logs every write. Has no search
/// index, so promotion lookups fail.
#[derive(Debug, Default)]
pub struct DryRunPlatform {
    next_sticky: AtomicUsize,
}

impl DryRunPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Platform for DryRunPlatform {
    fn refresh(&self, item: &ModerationItem) -> Result<ModerationItem, CheckerError> {
        Ok(item.clone())
    }

    fn message_author(&self, item: &ModerationItem, subject: &str, _body: &str) -> Result<(), CheckerError> {
        info!(item_id = %item.id, author = %item.author, subject, "[dry-run] message author");
        Ok(())
    }

    fn create_sticky(&self, container_id: &str, _body: &str) -> Result<ItemId, CheckerError> {
        let n = self.next_sticky.fetch_add(1, Ordering::Relaxed) + 1;
        let sticky_id = format!("dry-run-sticky-{}", n);
        info!(container_id, sticky_id = %sticky_id, "[dry-run] create sticky");
        Ok(sticky_id)
    }

    fn edit_sticky(&self, sticky_id: &str, _body: &str) -> Result<(), CheckerError> {
        info!(sticky_id, "[dry-run] edit sticky");
        Ok(())
    }

    fn hot_listing(&self, limit: usize) -> Result<Vec<ModerationItem>, CheckerError> {
        debug!(limit, "[dry-run] hot listing is empty");
        Ok(Vec::new())
    }

    fn set_flair(&self, item: &ModerationItem, text: &str) -> Result<(), CheckerError> {
        info!(item_id = %item.id, text, "[dry-run] set flair");
        Ok(())
    }
}

impl PromotionLookup for DryRunPlatform {
    fn comment_count(&self, author: &str) -> Result<u64, CheckerError> {
        Err(CheckerError::Lookup {
            item_id: author.to_string(),
            reason: "no comment history in dry run".to_string(),
        })
    }

    fn video_duration(&self, url: &str) -> Result<Duration, CheckerError> {
        Err(CheckerError::Lookup {
            item_id: url.to_string(),
            reason: "no video metadata in dry run".to_string(),
        })
    }
}
