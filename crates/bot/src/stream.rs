//! Long-lived stream loop: pulls items of one kind from a feed and runs
//! each through the rule chain, strictly in feed order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use warden_cache::RecencySet;
use warden_core::{ItemId, ItemKind, ModerationItem};
use warden_rules::{ExtensionRegistry, ModerationSink, Outcome, RuleEngine};

use crate::feed::{FeedError, ItemFeed};

#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Size of the "already seen" window.
    pub dedup_capacity: usize,
    /// Items created before this instant are skipped.
    pub skip_before: Option<DateTime<Utc>>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            dedup_capacity: 1000,
            skip_before: None,
        }
    }
}

/// Why an item never reached the rule chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    WrongKind,
    Backlog,
    Duplicate,
    Removed,
    ArchivedThread,
}

/// Counters for one stream loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub received: usize,
    /// Feed lines that could not be decoded into an item.
    pub malformed: usize,
    pub skipped: usize,
    pub approved: usize,
    pub removed: usize,
    pub awaiting_manual: usize,
    pub untouched: usize,
    pub failed: usize,
}

impl StreamStats {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Approved => self.approved += 1,
            Outcome::Removed(_) => self.removed += 1,
            Outcome::AwaitingManual => self.awaiting_manual += 1,
            Outcome::Untouched => self.untouched += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

pub struct StreamLoop<F, S, E> {
    kind: ItemKind,
    feed: F,
    registry: Arc<ExtensionRegistry<E>>,
    engine: Arc<RuleEngine<S>>,
    seen: RecencySet<ItemId>,
    skip_before: Option<DateTime<Utc>>,
    stop: Arc<AtomicBool>,
    stats: StreamStats,
}

impl<F: ItemFeed, S: ModerationSink, E> StreamLoop<F, S, E> {
    pub fn new(
        kind: ItemKind,
        feed: F,
        registry: Arc<ExtensionRegistry<E>>,
        engine: Arc<RuleEngine<S>>,
        options: StreamOptions,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            kind,
            feed,
            registry,
            engine,
            seen: RecencySet::new(options.dedup_capacity),
            skip_before: options.skip_before,
            stop,
            stats: StreamStats::default(),
        }
    }

    /// Run until the feed is exhausted or the stop flag is raised. The flag
    /// is checked between items; an item already pulled is finished first.
    ///
    /// A malformed item is logged and skipped. An I/O error ends the loop
    /// and is returned.
    pub fn run(mut self) -> Result<StreamStats, FeedError> {
        info!(kind = %self.kind, "stream loop started");
        while !self.stop.load(Ordering::SeqCst) {
            match self.feed.next_item() {
                Ok(Some(item)) => {
                    self.handle(&item);
                }
                Ok(None) => {
                    info!(kind = %self.kind, "feed exhausted");
                    break;
                }
                Err(e @ FeedError::Parse { .. }) => {
                    warn!(kind = %self.kind, error = %e, "skipping malformed item");
                    self.stats.malformed += 1;
                }
                Err(e @ FeedError::Io(_)) => {
                    error!(kind = %self.kind, error = %e, "feed failed, stopping stream loop");
                    return Err(e);
                }
            }
        }
        info!(
            kind = %self.kind,
            received = self.stats.received,
            malformed = self.stats.malformed,
            approved = self.stats.approved,
            removed = self.stats.removed,
            "stream loop stopped"
        );
        Ok(self.stats)
    }

    /// Process one item. Returns `None` when it was skipped.
    ///
    /// A failed item is not marked as seen, so a redelivered copy runs
    /// through the chain again.
    pub fn handle(&mut self, item: &ModerationItem) -> Option<Outcome> {
        self.stats.received += 1;
        if let Some(reason) = self.skip_reason(item) {
            debug!(item_id = %item.id, kind = %item.kind, ?reason, "skipping item");
            self.stats.skipped += 1;
            return None;
        }

        let bucket = self.registry.bucket(self.kind);
        let outcome = self.engine.process(item, &bucket);
        if outcome != Outcome::Failed {
            self.seen.record(item.id.clone());
        }
        self.stats.record(&outcome);
        Some(outcome)
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    fn skip_reason(&self, item: &ModerationItem) -> Option<Skip> {
        if item.kind != self.kind {
            warn!(item_id = %item.id, expected = %self.kind, got = %item.kind, "item on the wrong stream");
            return Some(Skip::WrongKind);
        }
        if self.skip_before.is_some_and(|start| item.created_at < start) {
            return Some(Skip::Backlog);
        }
        if self.seen.contains(&item.id) {
            return Some(Skip::Duplicate);
        }
        match item.kind {
            ItemKind::Post if item.removed => Some(Skip::Removed),
            ItemKind::Comment if item.archived => Some(Skip::ArchivedThread),
            _ => None,
        }
    }
}
