//! Districts: the unit that owns a household roster and its resources.

use std::f64::consts::PI;
use std::sync::Arc;

use cs_core::{DistrictId, HouseholdTypeConfig};
use cs_engine::{ResourcePool, VisitQueue};

use crate::adviser::PoolClaim;
use crate::letter::LetterPhase;

/// One household type of a district, with its rates and tables.
#[derive(Debug)]
pub struct HouseholdType {
    pub name: Arc<str>,
    pub cfg:  HouseholdTypeConfig,
}

/// Per-district state shared by its households, enumerators, advisers and
/// coordinator.
pub struct District {
    pub id:   DistrictId,
    pub name: String,

    pub postal_delay:  f64,
    /// Percentage of returns below which paper is granted on request.
    pub paper_trigger: f64,

    pub types: Vec<HouseholdType>,

    /// Live household slots, in shuffled roster order.
    pub households:       Vec<usize>,
    /// Households of the district, early responders included.
    pub total_households: u32,
    /// Returns received, early responders included.
    pub responses:        u32,
    /// Returns received from live households.
    pub live_returns:     u32,
    pub early_responders: u32,

    /// Separation between live households with nobody responded.
    pub initial_separation: f64,
    /// Separation at the last coordinator refresh.
    pub separation:         f64,

    /// Earliest visit or letter, in hours.  Households that would respond
    /// before it are early responders.
    pub first_interaction: f64,

    pub visit_queue: VisitQueue<usize>,
    pub enumerators: Vec<usize>,
    /// On-shift enumerators waiting for the queue to fill.
    pub parked:      Vec<usize>,
    /// Enumerators currently on a visit.
    pub working:     u32,
    pub update_hours: f64,

    pub adviser_pool: ResourcePool<usize, PoolClaim>,
    pub advisers:     Vec<usize>,

    pub letters: Vec<LetterPhase>,
}

impl District {
    pub fn has_advisers(&self) -> bool {
        !self.advisers.is_empty()
    }

    /// Fraction of live households whose return has been received.
    pub fn live_return_rate(&self) -> Option<f64> {
        if self.households.is_empty() {
            None
        } else {
            Some(self.live_returns as f64 / self.households.len() as f64)
        }
    }

    /// The same rate as a percentage, `0` for a district without live
    /// households.
    pub fn live_return_percent(&self) -> f64 {
        self.live_return_rate().map_or(0.0, |r| r * 100.0)
    }
}

/// Average separation of `households` households spread over `area`:
/// `2 * sqrt(area / households / pi)`.  `None` when undefined.
pub fn initial_separation(area: f64, households: usize) -> Option<f64> {
    let sep = 2.0 * (area / households as f64 / PI).sqrt();
    (sep.is_finite() && sep >= 0.0).then_some(sep)
}

/// Separation of the households still to respond:
/// `initial / sqrt(1 - response_rate)`.  `None` when the result is not a
/// finite non-negative number (every household responded, or bad inputs).
pub fn separation(initial: f64, response_rate: f64) -> Option<f64> {
    let sep = initial / (1.0 - response_rate).sqrt();
    (sep.is_finite() && sep >= 0.0).then_some(sep)
}
