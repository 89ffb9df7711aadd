//! `cs-engine`: discrete-event primitives.
//!
//! # Crate layout
//!
//! | Module           | Contents                                               |
//! |------------------|--------------------------------------------------------|
//! | [`scheduler`]    | `Scheduler<A>` (virtual clock + `(time, seq)` min-heap) |
//! | [`pool`]         | `ResourcePool<T, W>`, `Acquire`, `Grant`, `Ticket`     |
//! | [`visit_queue`]  | `VisitQueue<K>` (stable priority order)                |
//! | [`error`]        | `PoolError`, `PoolResult<T>`                           |
//!
//! # Process model (summary)
//!
//! Processes are plain state machines.  A process suspends by handing the
//! scheduler an action to resume with (a timed wait) or by parking a ticket
//! in a pool (a resource wait).  The scheduler knows nothing about what an
//! action means; `cs-sim` owns the dispatch.
//!
//! ```text
//! loop {
//!     (now, action) = scheduler.pop()     // earliest time, FIFO on ties
//!     dispatch(action)                    // may schedule / acquire / release
//! }
//! ```

pub mod error;
pub mod pool;
pub mod scheduler;
pub mod visit_queue;


pub use error::{PoolError, PoolResult};
pub use pool::{Acquire, Filter, Grant, ResourcePool, Ticket};
pub use scheduler::Scheduler;
pub use visit_queue::VisitQueue;
