//! Letter campaigns.

use std::sync::Arc;

use cs_core::{EventKind, Reminder};

use crate::sim::Action;
use crate::Sim;

/// One configured mail-out of a district.
#[derive(Clone, Debug)]
pub struct LetterPhase {
    pub name:     Arc<str>,
    /// Posting time, in hours.
    pub at:       f64,
    /// Indices of the targeted household types.
    pub targets:  Vec<usize>,
    pub effect:   f64,
    /// Postal delay, in hours.
    pub delay:    f64,
    /// Skip households that have responded.
    pub targeted: bool,
    pub pq:       bool,
}

impl Sim {
    /// Post the phase to every matching household of the roster.
    pub(crate) fn letter_fire(&mut self, d: usize, phase: usize) {
        let letter = self.districts[d].letters[phase].clone();
        let recipients: Vec<usize> = self.districts[d]
            .households
            .iter()
            .copied()
            .filter(|&hh| {
                let h = &self.households[hh];
                letter.targets.contains(&h.hh_type) && !(letter.targeted && h.responded)
            })
            .collect();

        for hh in recipients {
            let reminder = Reminder::Letter { phase: Arc::clone(&letter.name) };
            self.emit_household(hh, EventKind::LetterSent { reminder: reminder.clone() });
            self.scheduler.schedule_in(letter.delay, Action::Deliver {
                household: hh,
                reminder,
                effect: letter.effect,
                pq: letter.pq,
            });
        }
    }
}
