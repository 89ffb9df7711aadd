//! `Scheduler`: the virtual clock and its pending-resumption heap.
//!
//! Entries are ordered by `(time, seq)` where `seq` is a monotonically
//! increasing insertion counter.  Two actions scheduled for the same instant
//! therefore resume in the order they were scheduled, which keeps a replay
//! with the same seed identical.
//!
//! The clock only moves forward: `pop` advances `now` to the popped entry's
//! time, and scheduling into the past is clamped to `now`.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use cs_core::SimTime;

struct Entry<A> {
    at:     SimTime,
    seq:    u64,
    action: A,
}

impl<A> PartialEq for Entry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<A> Eq for Entry<A> {}

impl<A> PartialOrd for Entry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Entry<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of actions keyed by virtual time.
pub struct Scheduler<A> {
    now:  SimTime,
    seq:  u64,
    heap: BinaryHeap<Reverse<Entry<A>>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self { now: SimTime::ZERO, seq: 0, heap: BinaryHeap::new() }
    }

    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Resume `action` at `at` (clamped to `now`).
    pub fn schedule(&mut self, at: SimTime, action: A) {
        let at = at.max(self.now);
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Entry { at, seq, action }));
    }

    /// Resume `action` after `delay` hours.
    #[inline]
    pub fn schedule_in(&mut self, delay: f64, action: A) {
        self.schedule(self.now.after(delay), action);
    }

    /// Time of the earliest pending entry.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(e)| e.at)
    }

    /// Pop the earliest entry and advance the clock to it.
    pub fn pop(&mut self) -> Option<(SimTime, A)> {
        let Reverse(entry) = self.heap.pop()?;
        self.now = entry.at;
        Some((entry.at, entry.action))
    }

    /// Pop the earliest entry only if it is strictly before `end`.  The clock
    /// is left untouched otherwise.
    pub fn pop_before(&mut self, end: SimTime) -> Option<(SimTime, A)> {
        match self.peek_time() {
            Some(at) if at < end => self.pop(),
            _ => None,
        }
    }

    /// Move the clock forward to `t` without resuming anything.  Used to stamp
    /// end-of-run records.
    pub fn advance_to(&mut self, t: SimTime) {
        self.now = self.now.max(t);
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
