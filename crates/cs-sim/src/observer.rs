//! Event sinks: where the simulation hands its records.

use std::convert::Infallible;

use cs_core::EventRecord;

/// Receiver of the append-only record stream of one run.
///
/// The simulation never formats or persists records itself.  A record the
/// sink rejects is logged, counted in
/// [`RunSummary::dropped_records`][crate::RunSummary::dropped_records] and
/// skipped; the run carries on.
///
/// # Example: counting sink
///
/// ```rust,ignore
/// struct Count(usize);
///
/// impl EventSink for Count {
///     type Error = std::convert::Infallible;
///     fn record(&mut self, _r: EventRecord) -> Result<(), Self::Error> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait EventSink {
    type Error: std::error::Error;

    /// Accept one record.
    fn record(&mut self, record: EventRecord) -> Result<(), Self::Error>;

    /// Called once after the final record of the run.
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// An [`EventSink`] that discards everything.
pub struct NoopSink;

impl EventSink for NoopSink {
    type Error = Infallible;

    fn record(&mut self, _record: EventRecord) -> Result<(), Infallible> {
        Ok(())
    }
}

/// An [`EventSink`] that keeps every record in memory.
#[derive(Default, Debug)]
pub struct VecSink {
    pub records: Vec<EventRecord>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for VecSink {
    type Error = Infallible;

    fn record(&mut self, record: EventRecord) -> Result<(), Infallible> {
        self.records.push(record);
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    type Error = S::Error;

    fn record(&mut self, record: EventRecord) -> Result<(), Self::Error> {
        (**self).record(record)
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        (**self).finish()
    }
}
