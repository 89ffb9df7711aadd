//! Call-centre advisers.
//!
//! Each district keeps one adviser pool that starts empty.  An adviser joins
//! it at the start of every shift and leaves at the end.  Leaving is itself a
//! filtered acquisition for the adviser's own identity, queued FIFO with the
//! callers.  An adviser busy at shift end therefore first serves every
//! caller that was already on hold when the shift ended, one call after
//! another, and only then leaves; callers who join the queue after the
//! shift-end claim are not served by it.

use cs_core::{AdviserId, ShiftWindow};
use cs_engine::{Acquire, Grant, PoolError, Ticket};
use tracing::trace;

use crate::sim::Action;
use crate::{Sim, SimError, SimResult};

/// Who is waiting on an adviser pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PoolClaim {
    /// A household on the phone.
    Caller(usize),
    /// An adviser waiting to go off shift.
    ShiftEnd(usize),
}

#[derive(Clone, Debug)]
pub struct Adviser {
    pub id:       AdviserId,
    pub district: usize,
    pub window:   ShiftWindow,
    /// Shift-end claim still waiting for this adviser to come off a call.
    pub pending_removal: Option<Ticket>,
}

impl Sim {
    fn pool_error(&self, d: usize, source: PoolError) -> SimError {
        SimError::Pool { district: self.districts[d].name.clone(), source }
    }

    /// Shift start: join the pool, unless last shift's removal never went
    /// through (the adviser is still on a call and simply stays).
    pub(crate) fn adviser_on(&mut self, a: usize) -> SimResult<()> {
        let d = self.advisers[a].district;
        let now = self.scheduler.now();

        let stayed = match self.advisers[a].pending_removal.take() {
            Some(ticket) => self.districts[d].adviser_pool.cancel(ticket).is_some(),
            None => false,
        };
        if !stayed {
            let grant = self.districts[d]
                .adviser_pool
                .insert(a)
                .map_err(|e| self.pool_error(d, e))?;
            if let Some(grant) = grant {
                self.route_grant(grant)?;
            }
        }
        trace!(adviser = %self.advisers[a].id, time = now.hours(), "adviser on shift");

        let day = (now.hours() / cs_core::HOURS_PER_DAY).floor() as i64;
        let off = self.advisers[a].window.shift_end(day);
        self.scheduler.schedule(off, Action::AdviserOff(a));
        Ok(())
    }

    /// Shift end: claim this adviser back out of the pool, then book the next
    /// shift.
    pub(crate) fn adviser_off(&mut self, a: usize) -> SimResult<()> {
        let d = self.advisers[a].district;
        let claim = self.districts[d]
            .adviser_pool
            .acquire_where(PoolClaim::ShiftEnd(a), Box::new(move |item: &usize| *item == a));
        match claim {
            Acquire::Granted(item) => {
                self.districts[d].adviser_pool.retire(item).map_err(|e| self.pool_error(d, e))?;
            }
            Acquire::Queued(ticket) => self.advisers[a].pending_removal = Some(ticket),
        }
        trace!(adviser = %self.advisers[a].id, time = self.scheduler.now().hours(), "adviser off shift");

        let now = self.scheduler.now();
        if let Some(wait) = self.advisers[a].window.hold_until(now) {
            self.scheduler.schedule_in(wait, Action::AdviserOn(a));
        }
        Ok(())
    }

    /// Return an adviser after a call.
    pub(crate) fn release_adviser(&mut self, d: usize, adviser: usize) -> SimResult<()> {
        let grant = self.districts[d]
            .adviser_pool
            .release(adviser)
            .map_err(|e| self.pool_error(d, e))?;
        if let Some(grant) = grant {
            self.route_grant(grant)?;
        }
        Ok(())
    }

    /// Hand an adviser to whoever was waiting for it.
    fn route_grant(&mut self, grant: Grant<usize, PoolClaim>) -> SimResult<()> {
        match grant.owner {
            PoolClaim::Caller(hh) => {
                let Some(pending) = self.households[hh].call.filter(|c| c.ticket == grant.ticket) else {
                    // Stale claim: put the adviser back.
                    return self.release_adviser(self.households[hh].district, grant.item);
                };
                let waited = self.scheduler.now().hours() - pending.called_at;
                self.call_contact(hh, grant.item, waited, pending.patience);
            }
            PoolClaim::ShiftEnd(a) => {
                let d = self.advisers[a].district;
                self.advisers[a].pending_removal = None;
                self.districts[d]
                    .adviser_pool
                    .retire(grant.item)
                    .map_err(|e| self.pool_error(d, e))?;
            }
        }
        Ok(())
    }
}
