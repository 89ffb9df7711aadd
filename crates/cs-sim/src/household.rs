//! The household state machine.
//!
//! ```text
//! Created ──► Deciding ──► Responding ──► Responded
//!                 │  ▲
//!                 │  └──── Calling (contact / renege)
//!                 └──────► Idle (do nothing)
//! ```
//!
//! `resp_level` and `help_level` are cumulative breakpoints on a `[0, 100)`
//! draw: at or below `resp_level` the household plans to respond, up to
//! `help_level` it plans to call, above that it does nothing.  Every
//! disqualifying interaction recomputes or zeroes them.

use cs_core::{Behaviour, Channel, EventKind, HouseholdId, HouseholdTypeConfig, Reminder};
use cs_engine::{Acquire, Ticket};

use crate::adviser::PoolClaim;
use crate::sim::Action;
use crate::{Sim, SimResult};

/// Service time of an answered call, in hours.
pub(crate) const CALL_SERVICE_HOURS: f64 = 0.1;
/// Share of the help rate left after a completed call.
const HELP_AFTER_CONTACT: f64 = 0.1;
/// Share of the help rate left after hanging up in the queue.
const HELP_AFTER_RENEGE: f64 = 0.5;

/// A call waiting for an adviser.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PendingCall {
    pub ticket:    Ticket,
    pub called_at: f64,
    /// Hours the caller is prepared to wait.
    pub patience:  f64,
}

/// One live household.
#[derive(Clone, Debug)]
pub struct Household {
    pub id:       HouseholdId,
    pub district: usize,
    /// Index into the district's `types`.
    pub hh_type:  usize,

    /// Channel preference; changed only by a successful digital assist.
    pub digital:       bool,
    pub paper_allowed: bool,
    /// Visit-queue sort key.
    pub priority:      i64,

    pub resp_level: f64,
    pub help_level: f64,

    pub visits: u32,
    pub calls:  u32,

    pub resp_planned: bool,
    pub responded:    bool,
    pub returned:     bool,

    pub call: Option<PendingCall>,
}

impl Household {
    pub fn channel(&self) -> Channel {
        Channel::from_digital(self.digital)
    }

    /// Can the household respond on its preferred channel?
    pub fn channel_ok(&self) -> bool {
        self.digital || self.paper_allowed
    }
}

/// Behaviour levels `(resp, help)` after `interactions` prior interactions.
/// `help` is cumulative (it includes `resp`) and is pinned to `resp` when the
/// district runs no call centre.
pub(crate) fn behaviour_levels(
    cfg:          &HouseholdTypeConfig,
    channel_ok:   bool,
    has_advisers: bool,
    interactions: u32,
) -> (f64, f64) {
    let resp = cfg.behaviours.table(channel_ok).level(Behaviour::Response, interactions);
    (resp, resp + help_rate(cfg, channel_ok, has_advisers, interactions))
}

/// Raw (non-cumulative) help rate; `0` without a call centre.
pub(crate) fn help_rate(
    cfg:          &HouseholdTypeConfig,
    channel_ok:   bool,
    has_advisers: bool,
    interactions: u32,
) -> f64 {
    if has_advisers {
        cfg.behaviours.table(channel_ok).level(Behaviour::Help, interactions)
    } else {
        0.0
    }
}

impl Sim {
    /// Recompute levels from the behaviour tables at `interactions`.
    pub(crate) fn reset_levels(&mut self, hh: usize, interactions: u32) {
        let h = &self.households[hh];
        let district = &self.districts[h.district];
        let (resp, help) = behaviour_levels(
            &district.types[h.hh_type].cfg,
            h.channel_ok(),
            district.has_advisers(),
            interactions,
        );
        let h = &mut self.households[hh];
        h.resp_level = resp;
        h.help_level = help;
    }

    pub(crate) fn zero_levels(&mut self, hh: usize) {
        let h = &mut self.households[hh];
        h.resp_level = 0.0;
        h.help_level = 0.0;
    }

    // ── Deciding ──────────────────────────────────────────────────────────

    /// Draw the next course of action from the current levels.
    pub(crate) fn decide(&mut self, hh: usize) {
        let test = self.rng.percent();
        let h = &self.households[hh];
        if h.responded {
            return;
        }

        if test <= h.resp_level {
            let first = !h.resp_planned;
            let cfg = &self.districts[h.district].types[h.hh_type].cfg;
            let delay = cfg.response_time.for_channel(h.digital).sample(&mut self.rng);
            self.households[hh].resp_planned = true;
            if first {
                self.emit_household(hh, EventKind::ResponsePlanned);
            }
            self.scheduler.schedule_in(delay, Action::Respond(hh));
        } else if test <= h.help_level && !h.resp_planned {
            // Already on hold: the queued call stands.
            if h.call.is_none() {
                let delay = self.call_time.sample(&mut self.rng);
                self.scheduler.schedule_in(delay, Action::Call(hh));
            }
        } else if !h.resp_planned {
            self.emit_household(hh, EventKind::DoNothing);
        }
    }

    // ── Responding ────────────────────────────────────────────────────────

    /// Send the response.  Only the first call has any effect.
    pub(crate) fn respond(&mut self, hh: usize) {
        if self.households[hh].responded {
            return;
        }
        let channel = self.households[hh].channel();
        let h = &self.households[hh];
        let delay = self.districts[h.district].types[h.hh_type].cfg.delay.for_channel(h.digital);
        {
            let h = &mut self.households[hh];
            h.responded = true;
            h.resp_planned = true;
        }
        self.emit_household(hh, EventKind::Responded { channel, early: false });
        self.scheduler.schedule_in(delay, Action::ReturnReceived(hh));
    }

    pub(crate) fn return_received(&mut self, hh: usize) {
        let h = &mut self.households[hh];
        if h.returned {
            return;
        }
        h.returned = true;
        let channel = h.channel();
        let district = &mut self.districts[h.district];
        district.responses += 1;
        district.live_returns += 1;
        self.summary.responses += 1;
        self.emit_household(hh, EventKind::ReturnReceived { channel });
    }

    // ── Calling ───────────────────────────────────────────────────────────

    pub(crate) fn call(&mut self, hh: usize) -> SimResult<()> {
        if self.households[hh].responded {
            return Ok(());
        }
        self.emit_household(hh, EventKind::Call);
        self.households[hh].calls += 1;

        let h = &self.households[hh];
        let district = &self.districts[h.district];
        let cfg = &district.types[h.hh_type].cfg;
        let paper_on_request = !h.digital
            && !h.paper_allowed
            && cfg.paper_on_request
            && district.live_return_percent() < district.paper_trigger;

        if paper_on_request {
            let postal_delay = district.postal_delay;
            self.households[hh].paper_allowed = true;
            self.emit_household(hh, EventKind::CallPaper);
            self.scheduler.schedule_in(postal_delay, Action::Deliver {
                household: hh,
                reminder:  Reminder::PaperQuestionnaire,
                effect:    0.0,
                pq:        true,
            });
            return Ok(());
        }

        let patience = self.rng.exponential(cfg.renege_hours);
        let d = h.district;
        match self.districts[d].adviser_pool.acquire(PoolClaim::Caller(hh)) {
            Acquire::Granted(adviser) => self.call_contact(hh, adviser, 0.0, patience),
            Acquire::Queued(ticket) => {
                let now = self.scheduler.now().hours();
                self.households[hh].call = Some(PendingCall { ticket, called_at: now, patience });
                self.scheduler.schedule_in(patience, Action::Renege { household: hh, ticket });
            }
        }
        Ok(())
    }

    /// An adviser picks up.
    pub(crate) fn call_contact(&mut self, hh: usize, adviser: usize, waited: f64, patience: f64) {
        self.households[hh].call = None;
        self.emit_household(hh, EventKind::CallContact);
        if waited > 0.0 {
            self.emit_household(hh, EventKind::CallWait { wait_hours: waited.min(patience) });
        }
        self.scheduler.schedule_in(CALL_SERVICE_HOURS, Action::CallEnd { household: hh, adviser });
    }

    pub(crate) fn call_end(&mut self, hh: usize, adviser: usize) -> SimResult<()> {
        let calls = self.households[hh].calls;
        self.reset_after_call(hh, calls, HELP_AFTER_CONTACT);
        self.release_adviser(self.households[hh].district, adviser)?;
        self.decide(hh);
        Ok(())
    }

    /// The renege timer fired.  Ignored if the call was answered first.
    pub(crate) fn renege(&mut self, hh: usize, ticket: Ticket) {
        let Some(pending) = self.households[hh].call.filter(|c| c.ticket == ticket) else {
            return;
        };
        let d = self.households[hh].district;
        if self.districts[d].adviser_pool.cancel(ticket).is_none() {
            return;
        }
        self.households[hh].call = None;

        let waited = self.scheduler.now().hours() - pending.called_at;
        self.emit_household(hh, EventKind::CallRenege);
        if waited > 0.0 {
            self.emit_household(hh, EventKind::CallWait { wait_hours: waited.min(pending.patience) });
        }
        let calls = self.households[hh].calls;
        self.reset_after_call(hh, calls, HELP_AFTER_RENEGE);
        self.decide(hh);
    }

    fn reset_after_call(&mut self, hh: usize, calls: u32, help_share: f64) {
        let h = &self.households[hh];
        let district = &self.districts[h.district];
        let help = help_rate(
            &district.types[h.hh_type].cfg,
            h.channel_ok(),
            district.has_advisers(),
            calls,
        );
        let h = &mut self.households[hh];
        h.resp_level = 0.0;
        h.help_level = help * help_share;
    }

    // ── Post ──────────────────────────────────────────────────────────────

    /// A letter or paper questionnaire arrives.
    pub(crate) fn deliver(&mut self, hh: usize, reminder: Reminder, effect: f64, pq: bool) {
        self.emit_household(hh, EventKind::LetterReceived { reminder: reminder.clone() });
        let h = &self.households[hh];

        if h.responded {
            self.emit_household(hh, EventKind::ReminderWasted { reminder });
            return;
        }
        if h.resp_planned {
            self.emit_household(hh, EventKind::ReminderUnnecessary { reminder });
            return;
        }

        if pq {
            if h.digital {
                // Paper makes no difference to a household happy online.
                self.zero_levels(hh);
                return;
            }
            self.households[hh].paper_allowed = true;
        } else if !h.channel_ok() {
            self.zero_levels(hh);
            return;
        }

        self.reset_levels(hh, 0);
        let h = &mut self.households[hh];
        h.resp_level = (h.resp_level + effect).clamp(0.0, 100.0);
        h.help_level = h.help_level.max(h.resp_level);
        self.decide(hh);
    }
}
