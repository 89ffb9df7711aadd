//! Per-household-type outcome counts and the daily return curve.

use std::collections::BTreeMap;

use cs_core::{Channel, EventKind, EventRecord, HOURS_PER_DAY};

use crate::{DailyRow, SummaryRow};

#[derive(Debug, Clone, Default, PartialEq)]
struct Counts {
    returns_digital: u32,
    returns_paper:   u32,
    early_responses: u32,
    non_responses:   u32,

    visits:            u32,
    visit_contacts:    u32,
    visit_out:         u32,
    visit_success:     u32,
    visit_wasted:      u32,
    visit_unnecessary: u32,
    visit_assist:      u32,
    visit_paper:       u32,

    calls:         u32,
    call_contacts: u32,
    call_reneges:  u32,
    call_paper:    u32,
    call_waits:    u32,
    wait_hours:    f64,

    letters_sent:          u32,
    letters_received:      u32,
    reminders_wasted:      u32,
    reminders_unnecessary: u32,
}

/// Running aggregation of one replication's record stream.
///
/// Counts are keyed by `(district, household type)`; records without a
/// household type (utilisation, travel, warnings) only feed `warnings`.
#[derive(Debug, Default)]
pub struct Tally {
    counts:   BTreeMap<(u16, String), Counts>,
    /// Hours at which each return was received.
    returns:  Vec<f64>,
    /// Hours at which each self-responder's return would have arrived with
    /// no campaign.
    passive:  Vec<f64>,
    warnings: u32,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, r: &EventRecord) {
        match r.kind {
            EventKind::ReturnReceived { .. } => self.returns.push(r.time.hours()),
            EventKind::InitialAction { passive_return_hours: Some(at), .. } => self.passive.push(at),
            _ => {}
        }
        let Some(subject) = r.subject_type.as_deref() else {
            if let EventKind::Warning { .. } = r.kind {
                self.warnings += 1;
            }
            return;
        };
        let c = self.counts.entry((r.district.0, subject.to_string())).or_default();

        match &r.kind {
            EventKind::ReturnReceived { channel: Channel::Digital } => c.returns_digital += 1,
            EventKind::ReturnReceived { channel: Channel::Paper }   => c.returns_paper += 1,
            EventKind::Responded { early, .. } => {
                if *early {
                    c.early_responses += 1;
                }
            }
            EventKind::NonResponse      => c.non_responses += 1,
            EventKind::Visit            => c.visits += 1,
            EventKind::VisitContact     => c.visit_contacts += 1,
            EventKind::VisitOut         => c.visit_out += 1,
            EventKind::VisitSuccess     => c.visit_success += 1,
            EventKind::VisitWasted      => c.visit_wasted += 1,
            EventKind::VisitUnnecessary => c.visit_unnecessary += 1,
            EventKind::VisitAssist      => c.visit_assist += 1,
            EventKind::VisitPaper       => c.visit_paper += 1,
            EventKind::Call             => c.calls += 1,
            EventKind::CallContact      => c.call_contacts += 1,
            EventKind::CallRenege       => c.call_reneges += 1,
            EventKind::CallPaper        => c.call_paper += 1,
            EventKind::CallWait { wait_hours } => {
                c.call_waits += 1;
                c.wait_hours += wait_hours;
            }
            EventKind::LetterSent { .. }          => c.letters_sent += 1,
            EventKind::LetterReceived { .. }      => c.letters_received += 1,
            EventKind::ReminderWasted { .. }      => c.reminders_wasted += 1,
            EventKind::ReminderUnnecessary { .. } => c.reminders_unnecessary += 1,
            EventKind::Warning { .. } => self.warnings += 1,
            EventKind::InitialAction { .. }
            | EventKind::ResponsePlanned
            | EventKind::DoNothing
            | EventKind::EnumeratorUtil { .. }
            | EventKind::EnumeratorTravel { .. } => {}
        }
    }

    /// Total returns received so far.
    pub fn returns(&self) -> u32 {
        self.returns.len() as u32
    }

    /// Households that would have returned with no campaign.
    pub fn passive_returns(&self) -> u32 {
        self.passive.len() as u32
    }

    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    /// One row per `(district, household type)` seen, in key order.
    pub fn summary_rows(&self, run: u32, rep: u32) -> Vec<SummaryRow> {
        self.counts
            .iter()
            .map(|((district, name), c)| SummaryRow {
                run,
                rep,
                district: *district,
                household_type: name.clone(),
                returns_digital: c.returns_digital,
                returns_paper: c.returns_paper,
                early_responses: c.early_responses,
                non_responses: c.non_responses,
                visits: c.visits,
                visit_contacts: c.visit_contacts,
                visit_out: c.visit_out,
                visit_success: c.visit_success,
                visit_wasted: c.visit_wasted,
                visit_unnecessary: c.visit_unnecessary,
                visit_assist: c.visit_assist,
                visit_paper: c.visit_paper,
                calls: c.calls,
                call_contacts: c.call_contacts,
                call_reneges: c.call_reneges,
                call_paper: c.call_paper,
                mean_call_wait: if c.call_waits == 0 { 0.0 } else { c.wait_hours / c.call_waits as f64 },
                letters_sent: c.letters_sent,
                letters_received: c.letters_received,
                reminders_wasted: c.reminders_wasted,
                reminders_unnecessary: c.reminders_unnecessary,
            })
            .collect()
    }

    /// Cumulative returns at the end of each of `days` days, actual and
    /// passive, as counts and as percentages of `households`.
    pub fn daily_rows(&self, run: u32, rep: u32, days: u32, households: u32) -> Vec<DailyRow> {
        let actual = cumulative_by_day(&self.returns, days);
        let passive = cumulative_by_day(&self.passive, days);
        let percent = |n: u32| if households == 0 { 0.0 } else { n as f64 * 100.0 / households as f64 };

        (1..=days)
            .zip(actual.into_iter().zip(passive))
            .map(|(day, (returns, passive_returns))| DailyRow {
                run,
                rep,
                day,
                returns,
                rate: percent(returns),
                passive_returns,
                passive_rate: percent(passive_returns),
            })
            .collect()
    }
}

/// Count of `times` strictly before the end of each day `1..=days`.
fn cumulative_by_day(times: &[f64], days: u32) -> Vec<u32> {
    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut seen = 0usize;
    (1..=days)
        .map(|day| {
            let cutoff = day as f64 * HOURS_PER_DAY;
            while seen < sorted.len() && sorted[seen] < cutoff {
                seen += 1;
            }
            seen as u32
        })
        .collect()
}
