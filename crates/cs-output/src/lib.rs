//! `cs-output`: output aggregation for the census simulator.
//!
//! | Type             | Role                                                     |
//! |------------------|----------------------------------------------------------|
//! | [`CsvWriter`]    | `events.csv`, `summary.csv`, `daily_returns.csv`         |
//! | [`Tally`]        | per-district, per-household-type outcome counts          |
//! | [`OutputSink`]   | `cs_sim::EventSink` feeding a writer and a tally         |
//!
//! # Usage
//!
//! ```rust,ignore
//! use cs_output::{CsvWriter, OutputSink};
//!
//! let writer = CsvWriter::new(Path::new("./output/run_0/rep_0"))?;
//! let mut sink = OutputSink::new(writer, 0, 0, days, households);
//! let summary = sim.run(&mut sink)?;
//! ```

pub mod csv;
pub mod error;
pub mod row;
pub mod sink;
pub mod tally;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use row::{DailyRow, EventRow, SummaryRow};
pub use sink::OutputSink;
pub use tally::Tally;
pub use writer::OutputWriter;
