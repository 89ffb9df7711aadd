//! District coordinator: periodic visit-queue refresh.

use tracing::debug;

use crate::district::separation;
use crate::sim::Action;
use crate::Sim;

impl Sim {
    /// Rebuild the visit queue from every eligible household, refresh the
    /// household separation, wake idle enumerators and book the next tick.
    ///
    /// Eligible: not responded, follow-up enabled and started, under the
    /// visit cap.  Order: ascending priority, roster order on ties.
    pub(crate) fn coordinator_tick(&mut self, d: usize) {
        let now = self.scheduler.now().hours();
        let district = &self.districts[d];
        let eligible: Vec<(usize, i64)> = district
            .households
            .iter()
            .filter_map(|&hh| {
                let h = &self.households[hh];
                let cfg = &district.types[h.hh_type].cfg;
                let ok = !h.responded && cfg.fu_on && cfg.fu_start <= now && h.visits < cfg.max_visits;
                ok.then_some((hh, h.priority))
            })
            .collect();
        let queued = eligible.len();
        self.districts[d].visit_queue.rebuild(eligible);

        self.refresh_separation(d);
        debug!(
            run = self.run,
            rep = self.rep,
            district = %self.districts[d].name,
            time = now,
            queued,
            separation = self.districts[d].separation,
            "visit queue rebuilt"
        );

        self.wake_parked(d);
        let cadence = self.districts[d].update_hours;
        self.scheduler.schedule_in(cadence, Action::CoordinatorTick(d));
    }

    /// `initial / sqrt(1 - rate)`, clamped to zero with a warning when it
    /// degenerates (every live household has responded).
    pub(crate) fn refresh_separation(&mut self, d: usize) {
        let district = &self.districts[d];
        let rate = district.live_return_rate().unwrap_or(1.0);
        match separation(district.initial_separation, rate) {
            Some(sep) => self.districts[d].separation = sep,
            None => {
                self.districts[d].separation = 0.0;
                let message = format!(
                    "household separation undefined at response rate {rate:.4}; set to zero"
                );
                self.warn_district(d, message);
            }
        }
    }
}
