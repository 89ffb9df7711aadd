//! Plain data row types written by output backends.

use cs_core::EventRecord;

/// One event record, flattened to text columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub run:          u32,
    pub rep:          u32,
    /// Hours since run start.
    pub time:         f64,
    pub district:     u16,
    /// Empty for resource-level records.
    pub household:    Option<u32>,
    pub subject_type: String,
    pub kind:         &'static str,
    pub detail:       String,
}

impl From<&EventRecord> for EventRow {
    fn from(r: &EventRecord) -> Self {
        Self {
            run:          r.run,
            rep:          r.rep,
            time:         r.time.hours(),
            district:     r.district.0,
            household:    r.household.map(|h| h.0),
            subject_type: r.subject_type.as_deref().unwrap_or_default().to_string(),
            kind:         r.kind.name(),
            detail:       r.kind.detail(),
        }
    }
}

/// Outcome counts of one household type in one district.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryRow {
    pub run:            u32,
    pub rep:            u32,
    pub district:       u16,
    pub household_type: String,

    pub returns_digital: u32,
    pub returns_paper:   u32,
    pub early_responses: u32,
    pub non_responses:   u32,

    pub visits:            u32,
    pub visit_contacts:    u32,
    pub visit_out:         u32,
    pub visit_success:     u32,
    pub visit_wasted:      u32,
    pub visit_unnecessary: u32,
    pub visit_assist:      u32,
    pub visit_paper:       u32,

    pub calls:         u32,
    pub call_contacts: u32,
    pub call_reneges:  u32,
    pub call_paper:    u32,
    /// Mean of the recorded positive waits, `0` if nobody waited.
    pub mean_call_wait: f64,

    pub letters_sent:          u32,
    pub letters_received:      u32,
    pub reminders_wasted:      u32,
    pub reminders_unnecessary: u32,
}

/// Cumulative returns at the end of one simulated day, next to the returns
/// self-responders alone would have produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRow {
    pub run:     u32,
    pub rep:     u32,
    pub day:     u32,
    pub returns: u32,
    /// Returns as a percentage of every household of the run.
    pub rate:    f64,
    pub passive_returns: u32,
    pub passive_rate:    f64,
}
