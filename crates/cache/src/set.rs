use std::hash::Hash;

use indexmap::IndexSet;

/// Bounded set of recently seen keys with FIFO eviction.
///
/// Re-recording a key that is already present keeps its original position;
/// only first sightings count towards recency.
#[derive(Debug, Clone)]
pub struct RecencySet<K: Hash + Eq> {
    entries: IndexSet<K>,
    capacity: usize,
}

impl<K: Hash + Eq> RecencySet<K> {
    /// Create an empty window holding at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexSet::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Record a sighting. Returns `true` if the key was not already present.
    pub fn record(&mut self, key: K) -> bool {
        let inserted = self.entries.insert(key);
        while self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0);
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.entries.iter()
    }
}
