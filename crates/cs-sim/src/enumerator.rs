//! Field enumerators and the visit protocol.
//!
//! ```text
//! OffShift ──► Available ──► Visiting ──► Available | OffShift
//!                  │
//!                  └──► Parked (queue empty, woken by new work)
//! ```
//!
//! A visit is a chain of timed stages.  The contact draw and the assist draw
//! happen on arrival; each stage then resumes after its service time and
//! applies its effect.  Travel time is paid once, on the first stage.

use cs_core::{EnumeratorId, EventKind, ShiftWindow};
use tracing::trace;

use crate::sim::Action;
use crate::Sim;

/// Knock, no answer.
const NO_ANSWER_HOURS: f64 = 3.0 / 60.0;
/// Each digital-assist outcome.
const ASSIST_HOURS: f64 = 0.2;
/// Contacted, but already responded or refusing.
const SHORT_VISIT_HOURS: f64 = 5.0 / 60.0;
/// Contacted and completing the questionnaire on the doorstep.
const SUCCESS_HOURS: f64 = 30.0 / 60.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnumeratorState {
    /// Between visits, about to look for work.
    Available,
    /// Waiting for the next shift.
    OffShift,
    /// On shift with nothing to do.
    Parked,
    Visiting,
    Retired,
}

#[derive(Clone, Debug)]
pub struct Enumerator {
    pub id:           EnumeratorId,
    pub district:     usize,
    pub window:       ShiftWindow,
    /// Distance units per hour.
    pub travel_speed: f64,
    pub state:        EnumeratorState,

    pub visits:            u32,
    pub total_distance:    f64,
    pub total_travel_time: f64,

    /// The current visit found the household already responded.
    pub(crate) wasted_on_arrival: bool,
}

/// The stage a visit resumes at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitStep {
    /// Nobody answered.
    NoAnswer,
    /// Talked into responding online.
    Persuaded,
    /// Given a paper questionnaire.
    PaperGranted,
    /// Offered some other kind of help.
    OtherAssist,
    /// Completed the questionnaire during the visit.
    Converted,
    /// Contacted but not responding.
    Refused,
    /// Contacted after having responded already.
    Wasted,
}

impl Sim {
    // ── Availability ──────────────────────────────────────────────────────

    /// Look for work: sleep off-shift, park on an empty queue, or start the
    /// next visit.
    pub(crate) fn enumerator_step(&mut self, e: usize) {
        let now = self.scheduler.now();
        let enu = &self.enumerators[e];
        if matches!(enu.state, EnumeratorState::Retired | EnumeratorState::Visiting) {
            return;
        }

        if !enu.window.on_shift(now) {
            match enu.window.hold_until(now) {
                Some(wait) => {
                    self.enumerators[e].state = EnumeratorState::OffShift;
                    self.scheduler.schedule_in(wait, Action::EnumeratorStep(e));
                }
                None => self.enumerators[e].state = EnumeratorState::Retired,
            }
            return;
        }

        let d = enu.district;
        let Some(hh) = self.next_visitable(d) else {
            if self.enumerators[e].state != EnumeratorState::Parked {
                self.enumerators[e].state = EnumeratorState::Parked;
                self.districts[d].parked.push(e);
            }
            return;
        };
        self.start_visit(e, hh);
    }

    /// Put parked enumerators of district `d` back to work.
    pub(crate) fn wake_parked(&mut self, d: usize) {
        let parked = std::mem::take(&mut self.districts[d].parked);
        for e in parked {
            if self.enumerators[e].state == EnumeratorState::Parked {
                self.enumerators[e].state = EnumeratorState::Available;
                self.scheduler.schedule_in(0.0, Action::EnumeratorStep(e));
            }
        }
    }

    /// Pop queue entries until one is still under its visit cap.  A
    /// household can be queued twice when a rebuild lands mid-visit.
    fn next_visitable(&mut self, d: usize) -> Option<usize> {
        while let Some(hh) = self.districts[d].visit_queue.pop_front() {
            let h = &self.households[hh];
            if h.visits < self.districts[d].types[h.hh_type].cfg.max_visits {
                return Some(hh);
            }
        }
        None
    }

    /// Put a household back at the tail of the visit queue.
    fn requeue(&mut self, hh: usize) {
        let d = self.households[hh].district;
        if !self.districts[d].visit_queue.iter().any(|&q| q == hh) {
            self.districts[d].visit_queue.push_back(hh);
        }
        self.wake_parked(d);
    }

    // ── Visiting ──────────────────────────────────────────────────────────

    fn start_visit(&mut self, e: usize, hh: usize) {
        let d = self.enumerators[e].district;
        self.enumerators[e].state = EnumeratorState::Visiting;
        self.districts[d].working += 1;
        let working = self.districts[d].working;
        self.emit_district(d, EventKind::EnumeratorUtil { working });

        {
            let h = &mut self.households[hh];
            h.visits += 1;
            h.priority = h.visits as i64;
        }

        let distance = self.districts[d].separation;
        let enu = &mut self.enumerators[e];
        let travel_time = distance / enu.travel_speed;
        enu.visits += 1;
        enu.total_distance += distance;
        enu.total_travel_time += travel_time;
        let travel = EventKind::EnumeratorTravel {
            enumerator:        enu.id,
            distance,
            travel_time,
            total_distance:    enu.total_distance,
            total_travel_time: enu.total_travel_time,
        };
        self.emit_district(d, travel);
        self.emit_household(hh, EventKind::Visit);

        let (planned, responded) = {
            let h = &self.households[hh];
            (h.resp_planned, h.responded)
        };
        self.enumerators[e].wasted_on_arrival = responded;
        if responded {
            self.emit_household(hh, EventKind::VisitWasted);
        } else if planned {
            self.emit_household(hh, EventKind::VisitUnnecessary);
        }

        let h = &self.households[hh];
        let cfg = &self.districts[d].types[h.hh_type].cfg;
        let contacted = self.rng.percent() <= cfg.contact_rate;
        if !contacted {
            self.emit_household(hh, EventKind::VisitOut);
            self.visit_after(e, hh, NO_ANSWER_HOURS + travel_time, VisitStep::NoAnswer);
            return;
        }
        self.emit_household(hh, EventKind::VisitContact);

        let h = &self.households[hh];
        if h.digital || h.paper_allowed {
            self.visit_outcome(e, hh, travel_time);
            return;
        }

        // Paper preferred but not available: try digital assistance.
        let test = self.rng.percent();
        let cfg = &self.districts[d].types[h.hh_type].cfg;
        let at_cap_with_paper = h.visits == cfg.max_visits && cfg.paper_after_max_visits;
        let step = if test < cfg.dig_assist_eff {
            VisitStep::Persuaded
        } else if test < cfg.dig_assist_eff + cfg.dig_assist_flex || at_cap_with_paper {
            VisitStep::PaperGranted
        } else {
            VisitStep::OtherAssist
        };
        self.visit_after(e, hh, ASSIST_HOURS + travel_time, step);
    }

    /// Draw the conversion outcome of a contacted household and schedule
    /// the matching stage.
    fn visit_outcome(&mut self, e: usize, hh: usize, travel_time: f64) {
        let h = &self.households[hh];
        let cfg = &self.districts[h.district].types[h.hh_type].cfg;
        let converts = self.rng.percent() <= cfg.conversion_rate;

        if self.households[hh].responded {
            if !self.enumerators[e].wasted_on_arrival {
                self.emit_household(hh, EventKind::VisitWasted);
            }
            self.visit_after(e, hh, SHORT_VISIT_HOURS + travel_time, VisitStep::Wasted);
        } else if converts {
            self.emit_household(hh, EventKind::VisitSuccess);
            self.households[hh].resp_planned = true;
            self.visit_after(e, hh, SUCCESS_HOURS + travel_time, VisitStep::Converted);
        } else {
            self.visit_after(e, hh, SHORT_VISIT_HOURS + travel_time, VisitStep::Refused);
        }
    }

    fn visit_after(&mut self, e: usize, hh: usize, hours: f64, step: VisitStep) {
        self.scheduler.schedule_in(hours, Action::Visit { enumerator: e, household: hh, step });
    }

    /// Resume a visit after its service time.
    pub(crate) fn visit_step(&mut self, e: usize, hh: usize, step: VisitStep) {
        trace!(enumerator = e, household = hh, ?step, "visit stage");
        match step {
            VisitStep::NoAnswer => {
                if !self.requeue_under_cap(hh) && self.paper_at_cap(hh) {
                    self.scheduler.schedule_in(0.0, Action::Decide(hh));
                }
            }
            VisitStep::Persuaded => {
                self.households[hh].digital = true;
                self.visit_outcome(e, hh, 0.0);
                return;
            }
            VisitStep::PaperGranted => {
                self.emit_household(hh, EventKind::VisitPaper);
                self.households[hh].paper_allowed = true;
                self.reset_levels(hh, 0);
                self.visit_outcome(e, hh, 0.0);
                return;
            }
            VisitStep::OtherAssist => {
                self.emit_household(hh, EventKind::VisitAssist);
                self.requeue_under_cap(hh);
            }
            VisitStep::Converted => self.respond(hh),
            VisitStep::Refused => {
                self.zero_levels(hh);
                if !self.requeue_under_cap(hh) {
                    self.paper_at_cap(hh);
                }
                self.scheduler.schedule_in(0.0, Action::Decide(hh));
            }
            VisitStep::Wasted => {}
        }
        self.finish_visit(e);
    }

    /// Requeue if the household has visits left.
    fn requeue_under_cap(&mut self, hh: usize) -> bool {
        let h = &self.households[hh];
        let max_visits = self.districts[h.district].types[h.hh_type].cfg.max_visits;
        if h.visits < max_visits {
            self.requeue(hh);
            true
        } else {
            false
        }
    }

    /// At the visit cap, a paper-preferring household without paper may be
    /// left a questionnaire; its levels are recomputed.  Returns whether
    /// paper was granted.
    fn paper_at_cap(&mut self, hh: usize) -> bool {
        let h = &self.households[hh];
        let cfg = &self.districts[h.district].types[h.hh_type].cfg;
        if !cfg.paper_after_max_visits || h.digital || h.paper_allowed || h.responded {
            return false;
        }
        self.emit_household(hh, EventKind::VisitPaper);
        self.households[hh].paper_allowed = true;
        self.reset_levels(hh, 0);
        true
    }

    fn finish_visit(&mut self, e: usize) {
        let d = self.enumerators[e].district;
        self.districts[d].working = self.districts[d].working.saturating_sub(1);
        let working = self.districts[d].working;
        self.emit_district(d, EventKind::EnumeratorUtil { working });
        self.enumerators[e].state = EnumeratorState::Available;
        self.scheduler.schedule_in(0.0, Action::EnumeratorStep(e));
    }
}
