//! The `Sim` struct and its event loop.

use std::sync::Arc;

use cs_core::{CumulativeProfile, EventKind, EventRecord, HouseholdId, Reminder, SimRng, SimTime};
use cs_engine::{Scheduler, Ticket};
use tracing::{debug, info, warn};

use crate::adviser::Adviser;
use crate::district::District;
use crate::enumerator::{Enumerator, VisitStep};
use crate::household::Household;
use crate::{EventSink, SimResult};

// ── Actions ───────────────────────────────────────────────────────────────────

/// A suspended process step, resumed by the scheduler.
///
/// Indices refer to the run-wide `households`, `enumerators`, `advisers` and
/// `districts` vectors of [`Sim`].
#[derive(Clone, Debug)]
pub(crate) enum Action {
    /// Draw the household's next course of action.
    Decide(usize),
    /// The household sends its response.
    Respond(usize),
    /// The household phones the call centre.
    Call(usize),
    /// A sent response reaches the census office.
    ReturnReceived(usize),
    /// A queued caller runs out of patience.
    Renege { household: usize, ticket: Ticket },
    /// An adviser finishes a call.
    CallEnd { household: usize, adviser: usize },
    /// Post arrives at a household.
    Deliver { household: usize, reminder: Reminder, effect: f64, pq: bool },
    /// An enumerator looks for work.
    EnumeratorStep(usize),
    /// An enumerator finishes one stage of a visit.
    Visit { enumerator: usize, household: usize, step: VisitStep },
    /// A district coordinator refreshes its visit queue.
    CoordinatorTick(usize),
    /// A letter phase is posted.
    LetterFire { district: usize, phase: usize },
    AdviserOn(usize),
    AdviserOff(usize),
}

// ── RunSummary ────────────────────────────────────────────────────────────────

/// Totals reported by [`Sim::run`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub run:  u32,
    pub rep:  u32,
    pub seed: u64,
    /// Every household of the run, early responders included.
    pub households:      u32,
    /// Returns received before the end of the run (early ones included).
    pub responses:       u32,
    pub early_responses: u32,
    pub travel_distance: f64,
    pub travel_time:     f64,
    /// Records handed to the sink.
    pub records:         u64,
    /// Records the sink rejected.
    pub dropped_records: u64,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// One replication of one run.
///
/// All mutable state of the run lives here and is reached only through
/// `&mut self`, so independent `Sim`s never share anything.  Create via
/// [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub(crate) run:  u32,
    pub(crate) rep:  u32,
    pub(crate) seed: u64,
    pub(crate) end:  SimTime,

    pub(crate) scheduler: Scheduler<Action>,
    pub(crate) rng:       SimRng,
    /// Delay between deciding to call and calling.
    pub(crate) call_time: CumulativeProfile,

    pub(crate) districts:   Vec<District>,
    pub(crate) households:  Vec<Household>,
    pub(crate) enumerators: Vec<Enumerator>,
    pub(crate) advisers:    Vec<Adviser>,

    /// Records produced since the last flush.
    pub(crate) pending: Vec<EventRecord>,
    pub(crate) summary: RunSummary,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run until the end date, handing every record to `sink`.
    ///
    /// Actions due at or after the end are not resumed.  After the loop every
    /// live household that never responded gets a `NonResponse` record.
    pub fn run<S: EventSink>(&mut self, sink: &mut S) -> SimResult<RunSummary> {
        info!(
            run = self.run,
            rep = self.rep,
            seed = self.seed,
            households = self.summary.households,
            end_hours = self.end.hours(),
            "replication started"
        );
        self.flush(sink);

        while let Some((_, action)) = self.scheduler.pop_before(self.end) {
            self.dispatch(action)?;
            self.flush(sink);
        }

        self.scheduler.advance_to(self.end);
        self.non_response_sweep();
        self.flush(sink);
        if let Err(e) = sink.finish() {
            warn!(run = self.run, rep = self.rep, error = %e, "event sink failed to finish");
        }

        self.summary.travel_distance = self.enumerators.iter().map(|e| e.total_distance).sum();
        self.summary.travel_time = self.enumerators.iter().map(|e| e.total_travel_time).sum();
        info!(
            run = self.run,
            rep = self.rep,
            responses = self.summary.responses,
            households = self.summary.households,
            dropped = self.summary.dropped_records,
            "replication finished"
        );
        Ok(self.summary.clone())
    }

    /// Current virtual time.
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Live (non-early) households, across all districts.
    pub fn households(&self) -> &[Household] {
        &self.households
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn enumerators(&self) -> &[Enumerator] {
        &self.enumerators
    }

    pub fn advisers(&self) -> &[Adviser] {
        &self.advisers
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) -> SimResult<()> {
        match action {
            Action::Decide(hh)              => self.decide(hh),
            Action::Respond(hh)             => self.respond(hh),
            Action::Call(hh)                => self.call(hh)?,
            Action::ReturnReceived(hh)      => self.return_received(hh),
            Action::Renege { household, ticket } => self.renege(household, ticket),
            Action::CallEnd { household, adviser } => self.call_end(household, adviser)?,
            Action::Deliver { household, reminder, effect, pq } => {
                self.deliver(household, reminder, effect, pq)
            }
            Action::EnumeratorStep(e)       => self.enumerator_step(e),
            Action::Visit { enumerator, household, step } => {
                self.visit_step(enumerator, household, step)
            }
            Action::CoordinatorTick(d)      => self.coordinator_tick(d),
            Action::LetterFire { district, phase } => self.letter_fire(district, phase),
            Action::AdviserOn(a)            => self.adviser_on(a)?,
            Action::AdviserOff(a)           => self.adviser_off(a)?,
        }
        Ok(())
    }

    fn non_response_sweep(&mut self) {
        let now = self.scheduler.now();
        let silent: Vec<usize> = (0..self.households.len())
            .filter(|&hh| !self.households[hh].responded)
            .collect();
        debug!(run = self.run, rep = self.rep, count = silent.len(), "recording non-response");
        for hh in silent {
            self.emit_household_at(now, hh, EventKind::NonResponse);
        }
    }

    // ── Records ───────────────────────────────────────────────────────────

    /// Queue a record about a live household, stamped now.
    pub(crate) fn emit_household(&mut self, hh: usize, kind: EventKind) {
        self.emit_household_at(self.scheduler.now(), hh, kind);
    }

    pub(crate) fn emit_household_at(&mut self, time: SimTime, hh: usize, kind: EventKind) {
        let household = &self.households[hh];
        let id = household.id;
        let owner = &self.districts[household.district];
        let district = owner.id;
        let subject = Arc::clone(&owner.types[household.hh_type].name);
        self.emit_raw(time, district, Some(id), Some(subject), kind);
    }

    /// Queue a district-level record (resources, warnings), stamped now.
    pub(crate) fn emit_district(&mut self, d: usize, kind: EventKind) {
        let district = self.districts[d].id;
        self.emit_raw(self.scheduler.now(), district, None, None, kind);
    }

    pub(crate) fn emit_raw(
        &mut self,
        time:         SimTime,
        district:     cs_core::DistrictId,
        household:    Option<HouseholdId>,
        subject_type: Option<Arc<str>>,
        kind:         EventKind,
    ) {
        self.pending.push(EventRecord {
            run: self.run,
            rep: self.rep,
            time,
            district,
            household,
            subject_type,
            kind,
        });
    }

    /// A recoverable anomaly: log it and record it.
    pub(crate) fn warn_district(&mut self, d: usize, message: String) {
        warn!(
            run = self.run,
            rep = self.rep,
            seed = self.seed,
            time = self.scheduler.now().hours(),
            district = %self.districts[d].name,
            "{message}"
        );
        self.emit_district(d, EventKind::Warning { message });
    }

    /// Hand queued records to the sink.  Rejected records are skipped.
    fn flush<S: EventSink>(&mut self, sink: &mut S) {
        for record in self.pending.drain(..) {
            let kind = record.kind.name();
            match sink.record(record) {
                Ok(()) => self.summary.records += 1,
                Err(e) => {
                    self.summary.dropped_records += 1;
                    warn!(run = self.run, rep = self.rep, kind, error = %e, "event record dropped");
                }
            }
        }
    }
}
