//! Simulation time model.
//!
//! # Design
//!
//! Virtual time is a real number of hours since the run's start date at
//! 00:00.  The mapping to calendar time is deliberately coarse:
//!
//!   hour_of_day = t mod 24
//!   day         = floor(t / 24)
//!
//! No timezone or daylight-saving handling is attempted.  Calendar fields in
//! the configuration are converted to hour offsets once, at build time.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

pub const HOURS_PER_DAY: f64 = 24.0;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute point on the virtual clock, in hours since run start.
///
/// Ordered with `f64::total_cmp`, so it can key a heap.  Constructors never
/// produce NaN; a NaN would sort after every finite time.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub fn hours(self) -> f64 {
        self.0
    }

    /// The time `delay` hours after `self`.  Negative delays are floored to
    /// zero so a process can never schedule into the past.
    #[inline]
    pub fn after(self, delay: f64) -> SimTime {
        SimTime(self.0 + delay.max(0.0))
    }

    /// Hour of the day in `[0, 24)`.
    #[inline]
    pub fn hour_of_day(self) -> f64 {
        self.0.rem_euclid(HOURS_PER_DAY)
    }

    /// Zero-based day index since run start.
    #[inline]
    pub fn day(self) -> u64 {
        (self.0.max(0.0) / HOURS_PER_DAY).floor() as u64
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.hour_of_day();
        write!(f, "t={:.3}h (day {} {:05.2})", self.0, self.day(), h)
    }
}

// ── Calendar conversion ───────────────────────────────────────────────────────

/// Hours from `origin` (00:00) to `date` (00:00).  Negative if `date` is
/// before the origin.
pub fn date_offset_hours(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64 * HOURS_PER_DAY
}

/// Hours from `origin` (00:00) to `at`, at second resolution.
pub fn datetime_offset_hours(origin: NaiveDate, at: NaiveDateTime) -> f64 {
    date_offset_hours(origin, at.date()) + at.time().num_seconds_from_midnight() as f64 / 3_600.0
}

// ── ShiftWindow ───────────────────────────────────────────────────────────────

/// When a resource is on duty: a daily hour window repeated over an
/// inclusive range of calendar days.
///
/// Both windows are expressed relative to run start, so `first_day` and
/// `last_day` are day indices (day 0 = start date).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShiftWindow {
    /// Daily start hour, `[0, 24)`.
    pub start_hour: f64,
    /// Daily end hour, `(start_hour, 24]`.
    pub end_hour:   f64,
    /// First working day index (may be negative if it predates the run).
    pub first_day:  i64,
    /// Last working day index, inclusive.
    pub last_day:   i64,
}

impl ShiftWindow {
    /// A window covering every hour of every day in `[first_day, last_day]`.
    pub fn all_day(first_day: i64, last_day: i64) -> Self {
        Self { start_hour: 0.0, end_hour: HOURS_PER_DAY, first_day, last_day }
    }

    /// Is `now` inside both the calendar window and the daily hour window?
    pub fn on_shift(&self, now: SimTime) -> bool {
        let day = (now.0 / HOURS_PER_DAY).floor() as i64;
        let hour = now.hour_of_day();
        day >= self.first_day
            && day <= self.last_day
            && self.start_hour <= hour
            && hour < self.end_hour
    }

    /// Hours until the next shift boundary at which the resource comes on
    /// duty, or `None` if no shift starts at or after `now`.
    ///
    /// Returns `Some(0.0)` when already on shift.
    pub fn hold_until(&self, now: SimTime) -> Option<f64> {
        if self.on_shift(now) {
            return Some(0.0);
        }
        let today = (now.0 / HOURS_PER_DAY).floor() as i64;
        let hour = now.hour_of_day();

        let next_day = if today < self.first_day {
            self.first_day
        } else if hour < self.start_hour {
            today
        } else {
            today + 1
        };
        if next_day > self.last_day {
            return None;
        }
        let next_start = next_day as f64 * HOURS_PER_DAY + self.start_hour;
        Some((next_start - now.0).max(0.0))
    }

    /// Absolute end time of the shift on `day`.
    #[inline]
    pub fn shift_end(&self, day: i64) -> SimTime {
        SimTime(day as f64 * HOURS_PER_DAY + self.end_hour)
    }

    /// Earliest on-duty instant at or after time zero, if any.
    pub fn first_start(&self) -> Option<SimTime> {
        self.hold_until(SimTime::ZERO).map(SimTime)
    }
}
