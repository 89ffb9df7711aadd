//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `events.csv`: one row per event record
//! - `summary.csv`: outcome counts per district and household type
//! - `daily_returns.csv`: cumulative actual and passive returns per
//!   simulated day

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{DailyRow, EventRow, OutputResult, SummaryRow};

pub const EVENTS_FILE: &str = "events.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const DAILY_FILE: &str = "daily_returns.csv";

const EVENT_HEADER: [&str; 8] =
    ["run", "rep", "time", "district", "household", "subject_type", "kind", "detail"];

const SUMMARY_HEADER: [&str; 25] = [
    "run", "rep", "district", "household_type",
    "returns_digital", "returns_paper", "early_responses", "non_responses",
    "visits", "visit_contacts", "visit_out", "visit_success", "visit_wasted",
    "visit_unnecessary", "visit_assist", "visit_paper",
    "calls", "call_contacts", "call_reneges", "call_paper", "mean_call_wait",
    "letters_sent", "letters_received", "reminders_wasted", "reminders_unnecessary",
];

const DAILY_HEADER: [&str; 7] =
    ["run", "rep", "day", "returns", "rate", "passive_returns", "passive_rate"];

/// Writes one replication's output to three CSV files.
pub struct CsvWriter {
    events:   Writer<File>,
    summary:  Writer<File>,
    daily:    Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the three files and write header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut events = Writer::from_path(dir.join(EVENTS_FILE))?;
        events.write_record(EVENT_HEADER)?;

        let mut summary = Writer::from_path(dir.join(SUMMARY_FILE))?;
        summary.write_record(SUMMARY_HEADER)?;

        let mut daily = Writer::from_path(dir.join(DAILY_FILE))?;
        daily.write_record(DAILY_HEADER)?;

        Ok(Self { events, summary, daily, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.events.write_record(&[
            row.run.to_string(),
            row.rep.to_string(),
            format!("{:.6}", row.time),
            row.district.to_string(),
            row.household.map(|h| h.to_string()).unwrap_or_default(),
            row.subject_type.clone(),
            row.kind.to_string(),
            row.detail.clone(),
        ])?;
        Ok(())
    }

    fn write_summary(&mut self, rows: &[SummaryRow]) -> OutputResult<()> {
        for row in rows {
            let counts = [
                row.returns_digital, row.returns_paper, row.early_responses, row.non_responses,
                row.visits, row.visit_contacts, row.visit_out, row.visit_success, row.visit_wasted,
                row.visit_unnecessary, row.visit_assist, row.visit_paper,
                row.calls, row.call_contacts, row.call_reneges, row.call_paper,
            ];
            let letters = [
                row.letters_sent, row.letters_received, row.reminders_wasted, row.reminders_unnecessary,
            ];

            let mut record = vec![
                row.run.to_string(),
                row.rep.to_string(),
                row.district.to_string(),
                row.household_type.clone(),
            ];
            record.extend(counts.iter().map(u32::to_string));
            record.push(format!("{:.6}", row.mean_call_wait));
            record.extend(letters.iter().map(u32::to_string));
            self.summary.write_record(&record)?;
        }
        Ok(())
    }

    fn write_daily(&mut self, rows: &[DailyRow]) -> OutputResult<()> {
        for row in rows {
            self.daily.write_record(&[
                row.run.to_string(),
                row.rep.to_string(),
                row.day.to_string(),
                row.returns.to_string(),
                format!("{:.4}", row.rate),
                row.passive_returns.to_string(),
                format!("{:.4}", row.passive_rate),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.summary.flush()?;
        self.daily.flush()?;
        Ok(())
    }
}
