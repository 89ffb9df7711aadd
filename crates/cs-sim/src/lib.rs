//! `cs-sim`: household, field-visit, call-centre and letter processes.
//!
//! # Event loop
//!
//! ```text
//! build:
//!   ① Resources  : enumerators and advisers, first shift booked.
//!   ② Schedules  : coordinator ticks and letter phases booked.
//!   ③ Households : preference and first decision drawn; early responders
//!                   recorded and dropped; the live roster shuffled.
//! run:
//!   while next action is before the end date:
//!     pop (time, action) → dispatch → flush records to the sink
//!   record NonResponse for every live household that never responded
//! ```
//!
//! Each process (household, enumerator, adviser, coordinator, letter phase)
//! is a set of [`Action`][sim::Action] variants.  A handler runs one step,
//! mutates the run state and books the process's next step; nothing else
//! holds state between steps.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use cs_core::load_runs;
//! use cs_sim::{SimBuilder, VecSink};
//!
//! let runs = load_runs("configs/sample.json".as_ref())?;
//! let mut sim = SimBuilder::new(&runs[&1], 1, 1).build()?;
//! let mut sink = VecSink::new();
//! let summary = sim.run(&mut sink)?;
//! ```

pub mod adviser;
pub mod builder;
pub mod coordinator;
pub mod district;
pub mod enumerator;
pub mod error;
pub mod household;
pub mod letter;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use adviser::{Adviser, PoolClaim};
pub use builder::SimBuilder;
pub use district::{District, HouseholdType, initial_separation, separation};
pub use enumerator::{Enumerator, EnumeratorState, VisitStep};
pub use error::{SimError, SimResult};
pub use household::{Household, PendingCall};
pub use letter::LetterPhase;
pub use observer::{EventSink, NoopSink, VecSink};
pub use sim::{RunSummary, Sim};
