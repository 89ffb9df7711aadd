//! `OutputSink<W>`: bridges `cs_sim::EventSink` to an `OutputWriter`.

use cs_core::EventRecord;
use cs_sim::EventSink;

use crate::row::EventRow;
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult, Tally};

/// An [`EventSink`] that writes every record through an [`OutputWriter`]
/// and tallies it.
///
/// A record the writer rejects is reported back to the simulation, which
/// counts and skips it; the record is then left out of the tally too.  The
/// summary and daily curve are written by [`finish`][EventSink::finish].
pub struct OutputSink<W: OutputWriter> {
    writer:     W,
    tally:      Tally,
    run:        u32,
    rep:        u32,
    days:       u32,
    households: u32,
    finished:   bool,
}

impl<W: OutputWriter> OutputSink<W> {
    /// `days` and `households` size the daily return curve.
    pub fn new(writer: W, run: u32, rep: u32, days: u32, households: u32) -> Self {
        Self { writer, tally: Tally::new(), run, rep, days, households, finished: false }
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn write_tail(&mut self) -> OutputResult<()> {
        let summary = self.tally.summary_rows(self.run, self.rep);
        self.writer.write_summary(&summary)?;
        let daily = self.tally.daily_rows(self.run, self.rep, self.days, self.households);
        self.writer.write_daily(&daily)?;
        self.writer.finish()
    }
}

impl<W: OutputWriter> EventSink for OutputSink<W> {
    type Error = OutputError;

    fn record(&mut self, record: EventRecord) -> Result<(), OutputError> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.writer.write_event(&EventRow::from(&record))?;
        self.tally.record(&record);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.write_tail()
    }
}
