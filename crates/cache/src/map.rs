use std::borrow::Borrow;
use std::hash::Hash;

use indexmap::IndexMap;

/// Bounded map with FIFO eviction by first insertion.
///
/// Overwriting an existing key updates its value in place without making it
/// any younger.
#[derive(Debug, Clone)]
pub struct RecencyMap<K: Hash + Eq, V> {
    entries: IndexMap<K, V>,
    capacity: usize,
}

impl<K: Hash + Eq, V> RecencyMap<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite `key`, evicting the oldest entries past capacity.
    /// Returns the previous value for `key`, if any.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.entries.insert(key, value);
        while self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0);
        }
        previous
    }

    /// Drop an entry the owner has finished with.
    pub fn take<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.shift_remove(key)
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

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut anchors = RecencyMap::new(20);
        anchors.set("post1".to_string(), "sticky1".to_string());
        assert_eq!(anchors.get("post1").map(String::as_str), Some("sticky1"));
        assert!(anchors.get("post2").is_none());
    }

    #[test]
    fn evicts_first_inserted() {
        let mut anchors = RecencyMap::new(2);
        anchors.set("a", 1);
        anchors.set("b", 2);
        anchors.set("c", 3);

        assert!(!anchors.contains_key("a"));
        assert_eq!(anchors.get("b"), Some(&2));
        assert_eq!(anchors.get("c"), Some(&3));
    }

    #[test]
    fn overwrite_keeps_age() {
        let mut anchors = RecencyMap::new(2);
        anchors.set("a", 1);
        anchors.set("b", 2);
        assert_eq!(anchors.set("a", 10), Some(1));
        anchors.set("c", 3);

        assert!(!anchors.contains_key("a"));
        assert_eq!(anchors.len(), 2);
    }

    #[test]
    fn take_removes_entry() {
        let mut anchors = RecencyMap::new(4);
        anchors.set("a", 1);
        assert_eq!(anchors.take("a"), Some(1));
        assert!(anchors.is_empty());
    }
}
