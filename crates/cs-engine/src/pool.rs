//! `ResourcePool`: a capacity-bounded store of resource instances with
//! filtered, FIFO-fair acquisition.
//!
//! # Semantics
//!
//! * An instance is either *available* (held by the pool), *in use* (handed
//!   out by a grant), or outside the pool (never inserted, or retired).  The
//!   pool tracks in-use instances only by count; the holder owns the value.
//! * `acquire` hands out the first available instance the filter accepts.
//!   Instances the filter rejects stay available, untouched and in order.
//! * If nothing matches, the caller gets a [`Ticket`] and waits.  When an
//!   instance becomes available (insert or release) the *first* waiter in
//!   FIFO order whose filter accepts it is granted it directly, so a released
//!   instance is never idle while a matching waiter exists.
//! * A waiter can be withdrawn with `cancel` (abandonment).
//!
//! `W` is opaque owner data carried with each waiter and handed back in the
//! [`Grant`], so the caller can route the instance to whoever asked for it.

use std::collections::VecDeque;
use std::fmt;

use crate::{PoolError, PoolResult};

/// Predicate over instances a waiter will accept.
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send>;

/// Identifies one pending acquisition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of [`ResourcePool::acquire`].
#[derive(Debug, PartialEq, Eq)]
pub enum Acquire<T> {
    Granted(T),
    Queued(Ticket),
}

/// An instance handed to a previously queued waiter.
#[derive(Debug, PartialEq, Eq)]
pub struct Grant<T, W> {
    pub ticket: Ticket,
    pub owner:  W,
    pub item:   T,
}

struct Waiter<T, W> {
    ticket: Ticket,
    owner:  W,
    filter: Option<Filter<T>>,
}

impl<T, W> Waiter<T, W> {
    fn accepts(&self, item: &T) -> bool {
        self.filter.as_ref().is_none_or(|f| f(item))
    }
}

pub struct ResourcePool<T, W> {
    capacity:    usize,
    available:   VecDeque<T>,
    in_use:      usize,
    waiters:     VecDeque<Waiter<T, W>>,
    next_ticket: u64,
}

impl<T, W> ResourcePool<T, W> {
    /// An empty pool that can hold at most `capacity` instances.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            available: VecDeque::new(),
            in_use: 0,
            waiters: VecDeque::new(),
            next_ticket: 0,
        }
    }

    /// Add a new instance.  If a waiter accepts it, it is granted at once.
    pub fn insert(&mut self, item: T) -> PoolResult<Option<Grant<T, W>>> {
        if self.available.len() + self.in_use >= self.capacity {
            return Err(PoolError::Full { capacity: self.capacity });
        }
        Ok(self.offer(item))
    }

    /// Take the first available instance, or queue behind earlier waiters.
    pub fn acquire(&mut self, owner: W) -> Acquire<T> {
        self.acquire_inner(owner, None)
    }

    /// Take the first available instance accepted by `filter`, or queue.
    pub fn acquire_where(&mut self, owner: W, filter: Filter<T>) -> Acquire<T> {
        self.acquire_inner(owner, Some(filter))
    }

    fn acquire_inner(&mut self, owner: W, filter: Option<Filter<T>>) -> Acquire<T> {
        let pos = match &filter {
            Some(f) => self.available.iter().position(|item| f(item)),
            None => (!self.available.is_empty()).then_some(0),
        };
        if let Some(item) = pos.and_then(|i| self.available.remove(i)) {
            self.in_use += 1;
            return Acquire::Granted(item);
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.waiters.push_back(Waiter { ticket, owner, filter });
        Acquire::Queued(ticket)
    }

    /// Return an in-use instance to the pool.  If a waiter accepts it, it is
    /// granted at once.
    pub fn release(&mut self, item: T) -> PoolResult<Option<Grant<T, W>>> {
        if self.in_use == 0 {
            return Err(PoolError::NotInUse);
        }
        self.in_use -= 1;
        Ok(self.offer(item))
    }

    /// Take an in-use instance out of the pool for good.  The capacity slot
    /// becomes free for a later `insert`.
    pub fn retire(&mut self, _item: T) -> PoolResult<()> {
        if self.in_use == 0 {
            return Err(PoolError::NotInUse);
        }
        self.in_use -= 1;
        Ok(())
    }

    /// Withdraw a pending waiter.  Returns its owner data, or `None` if the
    /// ticket was already granted or cancelled.
    pub fn cancel(&mut self, ticket: Ticket) -> Option<W> {
        let pos = self.waiters.iter().position(|w| w.ticket == ticket)?;
        self.waiters.remove(pos).map(|w| w.owner)
    }

    /// Is `ticket` still waiting?
    pub fn is_waiting(&self, ticket: Ticket) -> bool {
        self.waiters.iter().any(|w| w.ticket == ticket)
    }

    fn offer(&mut self, item: T) -> Option<Grant<T, W>> {
        match self.waiters.iter().position(|w| w.accepts(&item)) {
            Some(pos) => {
                let waiter = self.waiters.remove(pos)?;
                self.in_use += 1;
                Some(Grant { ticket: waiter.ticket, owner: waiter.owner, item })
            }
            None => {
                self.available.push_back(item);
                None
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    pub fn available(&self) -> impl Iterator<Item = &T> {
        self.available.iter()
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn waiting(&self) -> usize {
        self.waiters.len()
    }

    /// `available + in_use <= capacity`.
    pub fn is_balanced(&self) -> bool {
        self.available.len() + self.in_use <= self.capacity
    }
}
