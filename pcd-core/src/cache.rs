//! Fixed-capacity key/value store with insertion-order eviction.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `value` and returns whatever had to leave the cache: the old
    /// value for a replaced key, or the oldest entry when full. Replacing a
    /// key keeps its original position in the eviction order.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.capacity == 0 {
            return Some((key, value));
        }
        if let Some(previous) = self.entries.insert(key.clone(), value) {
            return Some((key, previous));
        }
        self.order.push_back(key);

        if self.order.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            let evicted = self.entries.remove(&oldest)?;
            log::debug!("cache full ({}), evicted oldest entry", self.capacity);
            return Some((oldest, evicted));
        }
        None
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    /// Drops every entry whose key fails `keep`, preserving the order of the rest.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K) -> bool,
    {
        let entries = &mut self.entries;
        self.order.retain(|k| {
            let kept = keep(k);
            if !kept {
                entries.remove(k);
            }
            kept
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_in_insertion_order() {
        let mut cache = BoundedCache::new(2);
        assert_eq!(cache.insert("a", 1), None);
        assert_eq!(cache.insert("b", 2), None);
        assert_eq!(cache.insert("c", 3), Some(("a", 1)));

        assert!(!cache.contains_key(&"a"));
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), Some(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn replacing_keeps_eviction_position() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.insert("a", 10), Some(("a", 1)));

        // "a" is still the oldest
        assert_eq!(cache.insert("c", 3), Some(("a", 10)));
        assert_eq!(cache.get(&"b"), Some(&2));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut cache = BoundedCache::new(0);
        assert_eq!(cache.insert(1, "x"), Some((1, "x")));
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_forgets_order() {
        let mut cache = BoundedCache::new(2);
        cache.insert(1, 'a');
        cache.insert(2, 'b');
        assert_eq!(cache.remove(&1), Some('a'));
        assert_eq!(cache.insert(3, 'c'), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn retain_drops_matching_keys() {
        let mut cache = BoundedCache::new(3);
        cache.insert(("dem", 1), 'a');
        cache.insert(("las", 1), 'b');
        cache.insert(("dem", 2), 'c');
        cache.retain(|(source, _)| *source != "dem");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&("las", 1)), Some(&'b'));
        assert_eq!(cache.insert(("x", 0), 'd'), None);
        assert_eq!(cache.insert(("y", 0), 'e'), None);
        assert_eq!(cache.insert(("z", 0), 'f'), Some((("las", 1), 'b')));
    }
}
