//! `cs-core`: foundational types for the census field-operations simulator.
//!
//! This crate is a dependency of every other `cs-*` crate and has no `cs-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `HouseholdId`, `DistrictId`, `EnumeratorId`, `AdviserId`   |
//! | [`time`]        | `SimTime`, `ShiftWindow`, calendar-to-hours conversion     |
//! | [`rng`]         | `SimRng` (one per run), `derive_seed`                      |
//! | [`profile`]     | `CumulativeProfile` lookup tables                          |
//! | [`config`]      | `RunConfig` and its district / type / resource sections    |
//! | [`event`]       | `EventRecord`, `EventKind`, `InitialAction`, `Reminder`    |
//! | [`error`]       | `CsError`, `CsResult`                                      |

pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod profile;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    Behaviour, BehaviourTable, Behaviours, ChannelDelays, ChannelProfiles, DistrictConfig,
    EnumeratorConfig, HouseholdTypeConfig, LetterPhaseConfig, RunConfig, ShiftConfig, load_runs,
    parse_runs,
};
pub use error::{CsError, CsResult};
pub use event::{Channel, EventKind, EventRecord, InitialAction, Reminder};
pub use ids::{AdviserId, DistrictId, EnumeratorId, HouseholdId};
pub use profile::CumulativeProfile;
pub use rng::{SimRng, derive_seed};
pub use time::{HOURS_PER_DAY, ShiftWindow, SimTime, date_offset_hours, datetime_offset_hours};
