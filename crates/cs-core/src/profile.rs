//! Precomputed cumulative-probability lookup tables.
//!
//! Response-time and call-time distributions are supplied as histograms that
//! have already been normalised and accumulated (the sampling tables are
//! produced outside the simulator).  Sampling inverts the table: draw
//! `r ~ U(0,1)`, find the first bin whose cumulative probability exceeds `r`,
//! then place the sample uniformly inside that bin.

use serde::{Deserialize, Serialize};

use crate::SimRng;

/// A binned cumulative distribution over a delay measured in hours.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CumulativeProfile {
    /// Hours added to every sample (the start of bin 0).
    #[serde(default)]
    pub offset_hours: f64,
    /// Width of each bin in hours.  `0` makes every sample equal to
    /// `offset_hours`.
    pub bin_hours:  f64,
    /// Non-decreasing cumulative probabilities, one per bin, ending at ~1.
    pub cumulative: Vec<f64>,
}

impl CumulativeProfile {
    /// A profile that always yields exactly `hours`.
    pub fn fixed(hours: f64) -> Self {
        Self { offset_hours: hours, bin_hours: 0.0, cumulative: vec![1.0] }
    }

    /// Check the table is usable; returns a human-readable reason if not.
    pub fn check(&self) -> Result<(), String> {
        if self.cumulative.is_empty() {
            return Err("cumulative profile is empty".into());
        }
        if !(self.offset_hours >= 0.0 && self.offset_hours.is_finite()) {
            return Err(format!("offset {} is not a finite non-negative number", self.offset_hours));
        }
        if !(self.bin_hours >= 0.0 && self.bin_hours.is_finite()) {
            return Err(format!("bin width {} is not a finite non-negative number", self.bin_hours));
        }
        let mut prev = 0.0;
        for (i, &p) in self.cumulative.iter().enumerate() {
            if !(0.0..=1.0 + 1e-9).contains(&p) || p + 1e-12 < prev {
                return Err(format!("cumulative probability at bin {i} ({p}) is out of order or range"));
            }
            prev = p;
        }
        if prev <= 0.0 {
            return Err("cumulative profile never accumulates any probability".into());
        }
        Ok(())
    }

    /// Index of the first bin whose cumulative probability exceeds `r`.
    /// Falls back to the last bin when rounding leaves the table short of 1.
    pub fn bin_for(&self, r: f64) -> usize {
        self.cumulative
            .iter()
            .position(|&p| p > r)
            .unwrap_or(self.cumulative.len().saturating_sub(1))
    }

    /// Sample a delay in hours.
    pub fn sample(&self, rng: &mut SimRng) -> f64 {
        let bin = self.bin_for(rng.unit());
        let within = rng.unit();
        self.offset_hours + (bin as f64 + within) * self.bin_hours
    }
}
