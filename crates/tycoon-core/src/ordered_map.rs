//! Insertion-ordered keyed container.
//!
//! Entries live in a slot arena and are chained into a doubly linked list,
//! with a key → slot hash index on the side. Lookup, append and removal are
//! O(1) on average and iteration follows insertion order. Freed slots are
//! recycled through a free list, so order stays stable across removals.
//!
//! Duplicate keys are explicit: [`OrderedMap::insert`] rejects them and
//! hands the value back, [`OrderedMap::replace`] overwrites in place. A key
//! that is removed and inserted again moves to the end.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Key-value map that remembers insertion order.
#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
        }
    }
}

impl<K: Eq + Hash + Clone, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Append a new entry.
    ///
    /// Fails if the key is already present, returning the rejected value
    /// and leaving the map untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), V> {
        if self.index.contains_key(&key) {
            return Err(value);
        }
        self.push_back(key, value);
        Ok(())
    }

    /// Overwrite the value for `key` in place, keeping its position.
    /// Appends when the key is absent.
    pub fn replace(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&slot) = self.index.get(&key) {
            if let Some(node) = self.node_mut(slot) {
                return Some(std::mem::replace(&mut node.value, value));
            }
        }
        self.push_back(key, value);
        None
    }

    /// Remove an entry, returning its value. `None` if the key is absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        let node = self.slots.get_mut(slot)?.take()?;
        self.unlink(node.prev, node.next);
        self.free.push(slot);
        Some(node.value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.slots.get(slot)?.as_ref().map(|node| &node.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.node_mut(slot).map(|node| &mut node.value)
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        let node = self.slots.get(self.tail?)?.as_ref()?;
        Some((&node.key, &node.value))
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Visit every entry in insertion order.
    pub fn for_each<F: FnMut(&K, &V)>(&self, mut visitor: F) {
        for (key, value) in self.iter() {
            visitor(key, value);
        }
    }

    /// Visit every entry in insertion order with mutable access to values.
    /// Keys and order cannot change during the visit.
    pub fn for_each_mut<F: FnMut(&K, &mut V)>(&mut self, mut visitor: F) {
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let Some(node) = self.node_mut(slot) else {
                break;
            };
            visitor(&node.key, &mut node.value);
            cursor = node.next;
        }
    }

    /// Transform every value, preserving order.
    pub fn map<U, F: FnMut(&V) -> U>(&self, mut transform: F) -> Vec<U> {
        self.values().map(|value| transform(value)).collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Take every entry out in insertion order, leaving the map empty.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let mut slots = std::mem::take(&mut self.slots);
        let mut cursor = self.head;
        let mut entries = Vec::with_capacity(self.len());
        while let Some(slot) = cursor {
            let Some(node) = slots.get_mut(slot).and_then(Option::take) else {
                break;
            };
            cursor = node.next;
            entries.push((node.key, node.value));
        }
        self.clear();
        entries
    }

    fn push_back(&mut self, key: K, value: V) {
        let node = Node {
            key: key.clone(),
            value,
            prev: self.tail,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        match self.tail {
            Some(tail) => {
                if let Some(node) = self.node_mut(tail) {
                    node.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.index.insert(key, slot);
    }

    fn unlink(&mut self, prev: Option<usize>, next: Option<usize>) {
        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }
}

/// Borrowing iterator over an [`OrderedMap`] in insertion order.
pub struct Iter<'a, K, V> {
    slots: &'a [Option<Node<K, V>>],
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.slots.get(self.cursor?)?.as_ref()?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: Eq + Hash + Clone, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Later duplicates overwrite earlier values but keep the first position.
impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Eq + Hash + Clone, V> Extend<(K, V)> for OrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.replace(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn keys_of(map: &OrderedMap<u32, u32>) -> Vec<u32> {
        map.keys().copied().collect()
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut map = OrderedMap::new();
        for key in [5, 1, 9, 3] {
            map.insert(key, key * 10).unwrap();
        }
        assert_eq!(keys_of(&map), vec![5, 1, 9, 3]);
        assert_eq!(map.map(|v| *v), vec![50, 10, 90, 30]);
        assert_eq!(map.first(), Some((&5, &50)));
        assert_eq!(map.last(), Some((&3, &30)));
    }

    #[test]
    fn test_insert_rejects_duplicate_key() {
        let mut map = OrderedMap::new();
        map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();
        assert_eq!(map.insert("a", 3), Err(3));
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut map = OrderedMap::new();
        map.insert(1, "one").unwrap();
        map.insert(2, "two").unwrap();
        assert_eq!(map.replace(1, "uno"), Some("one"));
        assert_eq!(map.replace(3, "three"), None);
        let entries: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(entries, vec![(1, "uno"), (2, "two"), (3, "three")]);
    }

    #[test]
    fn test_remove_then_reinsert_moves_to_end() {
        let mut map = OrderedMap::new();
        for key in 0..4 {
            map.insert(key, key).unwrap();
        }
        assert_eq!(map.remove(&1), Some(1));
        assert_eq!(map.remove(&1), None);
        map.insert(1, 100).unwrap();
        assert_eq!(keys_of(&map), vec![0, 2, 3, 1]);
        assert_eq!(map.get(&1), Some(&100));
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut map = OrderedMap::new();
        for key in 0..3 {
            map.insert(key, key).unwrap();
        }
        map.remove(&0);
        map.remove(&2);
        assert_eq!(keys_of(&map), vec![1]);
        assert_eq!(map.first(), map.last());
        map.remove(&1);
        assert!(map.is_empty());
        assert_eq!(map.first(), None);
        assert_eq!(map.last(), None);
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut map = OrderedMap::new();
        for key in 0..8 {
            map.insert(key, key).unwrap();
        }
        for key in 0..8 {
            map.remove(&key);
        }
        for key in 10..18 {
            map.insert(key, key).unwrap();
        }
        assert_eq!(map.slots.len(), 8);
        assert_eq!(keys_of(&map), (10..18).collect::<Vec<_>>());
    }

    #[test]
    fn test_for_each_mut_and_drain() {
        let mut map: OrderedMap<u32, u32> = (0..4).map(|k| (k, k)).collect();
        map.for_each_mut(|_, value| *value *= 2);
        let mut seen = Vec::new();
        map.for_each(|key, value| seen.push((*key, *value)));
        assert_eq!(seen, vec![(0, 0), (1, 2), (2, 4), (3, 6)]);

        map.remove(&1);
        let drained = map.drain();
        assert_eq!(drained, vec![(0, 0), (2, 4), (3, 6)]);
        assert!(map.is_empty());
        map.insert(7, 7).unwrap();
        assert_eq!(keys_of(&map), vec![7]);
    }

    #[test]
    fn test_random_sequences_match_reference_model() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut map = OrderedMap::new();
        let mut model: Vec<u32> = Vec::new();

        for step in 0..5_000u32 {
            let key = rng.gen_range(0..64);
            if rng.gen_bool(0.55) {
                let inserted = map.insert(key, step).is_ok();
                assert_eq!(inserted, !model.contains(&key));
                if inserted {
                    model.push(key);
                }
            } else {
                let removed = map.remove(&key).is_some();
                let position = model.iter().position(|k| *k == key);
                assert_eq!(removed, position.is_some());
                if let Some(position) = position {
                    model.remove(position);
                }
            }
            assert_eq!(map.len(), model.len());
        }

        assert_eq!(keys_of(&map), model);
    }
}
