//! `VisitQueue`: households awaiting a field visit.
//!
//! Rebuilt wholesale on every coordinator tick; between ticks enumerators
//! pop from the front and requeue at the back.  Ordering is ascending by
//! priority with ties kept in insertion order (`sort_by_key` is stable).

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct VisitQueue<K> {
    items: VecDeque<K>,
}

impl<K> Default for VisitQueue<K> {
    fn default() -> Self {
        Self { items: VecDeque::new() }
    }
}

impl<K> VisitQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `eligible`, sorted by priority.
    pub fn rebuild<I>(&mut self, eligible: I)
    where
        I: IntoIterator<Item = (K, i64)>,
    {
        let mut keyed: Vec<(K, i64)> = eligible.into_iter().collect();
        keyed.sort_by_key(|&(_, priority)| priority);
        self.items = keyed.into_iter().map(|(k, _)| k).collect();
    }

    pub fn pop_front(&mut self) -> Option<K> {
        self.items.pop_front()
    }

    pub fn push_back(&mut self, key: K) {
        self.items.push_back(key);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.items.iter()
    }
}
