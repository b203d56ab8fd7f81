//! Platform operations the checkers need beyond approve/remove.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use warden_core::{CheckerError, ItemId, ModerationItem};

/// Read and write access to the hosting platform, implemented by the
/// platform client.
pub trait Platform: Send + Sync {
    /// Fetch the current state of `item`.
    fn refresh(&self, item: &ModerationItem) -> Result<ModerationItem, CheckerError>;

    /// Send a private message to the author of `item`.
    fn message_author(&self, item: &ModerationItem, subject: &str, body: &str) -> Result<(), CheckerError>;

    /// Post a moderator sticky in thread `container_id`. Returns its id.
    fn create_sticky(&self, container_id: &str, body: &str) -> Result<ItemId, CheckerError>;

    /// Replace the body of an existing sticky.
    fn edit_sticky(&self, sticky_id: &str, body: &str) -> Result<(), CheckerError>;

    /// The first `limit` posts of the site-wide hot listing.
    fn hot_listing(&self, limit: usize) -> Result<Vec<ModerationItem>, CheckerError>;

    /// Set the flair text of post `item`, keeping its flair class.
    fn set_flair(&self, item: &ModerationItem, text: &str) -> Result<(), CheckerError>;
}

/// In-memory platform that serves refreshes from a table and records every
/// write. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    items: Mutex<HashMap<ItemId, ModerationItem>>,
    messages: Mutex<Vec<(String, String)>>,
    stickies: Mutex<Vec<(ItemId, ItemId, String)>>,
    next_sticky: AtomicUsize,
    /// Sticky creations left to reject.
    sticky_failures: AtomicUsize,
    hot: Mutex<Vec<ModerationItem>>,
    flairs: Mutex<Vec<(ItemId, String)>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later refreshes of `item.id` return `item`.
    pub fn update(&self, item: ModerationItem) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item.id.clone(), item);
    }

    /// `(author, subject)` of every message sent.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reject the next `n` sticky creations.
    pub fn fail_stickies(&self, n: usize) {
        self.sticky_failures.store(n, Ordering::SeqCst);
    }

    /// Serve `items` as the hot listing.
    pub fn set_hot(&self, items: Vec<ModerationItem>) {
        *self.hot.lock().unwrap_or_else(PoisonError::into_inner) = items;
    }

    /// `(item_id, text)` of every flair set.
    pub fn flairs(&self) -> Vec<(ItemId, String)> {
        self.flairs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(container_id, sticky_id, body)` of every sticky, latest body last.
    pub fn stickies(&self) -> Vec<(ItemId, ItemId, String)> {
        self.stickies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Platform for RecordingPlatform {
    fn refresh(&self, item: &ModerationItem) -> Result<ModerationItem, CheckerError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(&item.id).cloned().unwrap_or_else(|| item.clone()))
    }

    fn message_author(&self, item: &ModerationItem, subject: &str, _body: &str) -> Result<(), CheckerError> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((item.author.clone(), subject.to_string()));
        Ok(())
    }

    fn create_sticky(&self, container_id: &str, body: &str) -> Result<ItemId, CheckerError> {
        let failing = self
            .sticky_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CheckerError::Platform(format!("sticky in {} rejected", container_id)));
        }
        let n = self.next_sticky.fetch_add(1, Ordering::SeqCst) + 1;
        let sticky_id = format!("sticky{}", n);
        self.stickies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((container_id.to_string(), sticky_id.clone(), body.to_string()));
        Ok(sticky_id)
    }

    fn edit_sticky(&self, sticky_id: &str, body: &str) -> Result<(), CheckerError> {
        let mut stickies = self.stickies.lock().unwrap_or_else(PoisonError::into_inner);
        match stickies.iter_mut().find(|(_, id, _)| id == sticky_id) {
            Some(entry) => {
                entry.2 = body.to_string();
                Ok(())
            }
            None => Err(CheckerError::Platform(format!("no sticky {}", sticky_id))),
        }
    }

    fn hot_listing(&self, limit: usize) -> Result<Vec<ModerationItem>, CheckerError> {
        let hot = self.hot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(hot.iter().take(limit).cloned().collect())
    }

    fn set_flair(&self, item: &ModerationItem, text: &str) -> Result<(), CheckerError> {
        self.flairs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((item.id.clone(), text.to_string()));
        Ok(())
    }
}
