//! The `OutputWriter` trait implemented by backend writers.

use crate::{DailyRow, EventRow, OutputResult, SummaryRow};

/// Destination of one replication's output.
pub trait OutputWriter {
    /// Append one event row.
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()>;

    /// Write the per-type summary, once, at the end of the run.
    fn write_summary(&mut self, rows: &[SummaryRow]) -> OutputResult<()>;

    /// Write the daily return curve, once, at the end of the run.
    fn write_daily(&mut self, rows: &[DailyRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
