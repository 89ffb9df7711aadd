//! Typed event records emitted by the simulation.
//!
//! The simulator hands every record to an injected sink; it never formats
//! or persists them itself.  Record kinds form a closed enum so consumers
//! match exhaustively; adding a kind is a compile error at every tally.

use std::fmt;
use std::sync::Arc;

use crate::{DistrictId, EnumeratorId, HouseholdId, SimTime};

/// Response channel of a household.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Digital,
    Paper,
}

impl Channel {
    #[inline]
    pub fn from_digital(digital: bool) -> Self {
        if digital { Channel::Digital } else { Channel::Paper }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Digital => "digital",
            Channel::Paper   => "paper",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a household received through the post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reminder {
    /// A letter from a configured phase.
    Letter { phase: Arc<str> },
    /// A paper questionnaire sent on request after a call.
    PaperQuestionnaire,
}

impl Reminder {
    pub fn label(&self) -> &str {
        match self {
            Reminder::Letter { phase } => phase,
            Reminder::PaperQuestionnaire => "pq",
        }
    }
}

/// What a household was set to do when it was created, before any
/// campaign interaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InitialAction {
    /// Responds before the first interaction; never goes live.
    Early,
    /// Plans to respond, but only after the campaign has started.
    Late,
    /// Plans to phone the call centre.
    Help,
    DoNothing,
}

impl InitialAction {
    pub fn as_str(self) -> &'static str {
        match self {
            InitialAction::Early     => "early",
            InitialAction::Late      => "late",
            InitialAction::Help      => "help",
            InitialAction::DoNothing => "do_nothing",
        }
    }

    /// Would the household return with no intervention at all?
    #[inline]
    pub fn self_responds(self) -> bool {
        matches!(self, InitialAction::Early | InitialAction::Late)
    }
}

impl fmt::Display for InitialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of an [`EventRecord`] together with its kind-specific payload.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    // ── Household decisions ──────────────────────────────────────────────
    /// Recorded once per household at creation, early responders included.
    /// `passive_return_hours` is when the return would arrive with no
    /// campaign at all; `None` unless the household self-responds.
    InitialAction {
        action:               InitialAction,
        channel:              Channel,
        paper_allowed:        bool,
        planned_hours:        f64,
        passive_return_hours: Option<f64>,
    },
    ResponsePlanned,
    /// The household sent its response.  `early` marks responders that were
    /// short-circuited at district creation.
    Responded { channel: Channel, early: bool },
    /// The response reached the census office.
    ReturnReceived { channel: Channel },
    DoNothing,
    /// Recorded once at simulation end for each live household that never
    /// responded.
    NonResponse,

    // ── Field visits ─────────────────────────────────────────────────────
    Visit,
    VisitContact,
    VisitOut,
    VisitWasted,
    VisitUnnecessary,
    VisitSuccess,
    VisitAssist,
    VisitPaper,

    // ── Call centre ──────────────────────────────────────────────────────
    Call,
    CallContact,
    CallRenege,
    CallWait { wait_hours: f64 },
    /// Paper granted on request without an adviser.
    CallPaper,

    // ── Letters ──────────────────────────────────────────────────────────
    LetterSent { reminder: Reminder },
    LetterReceived { reminder: Reminder },
    ReminderWasted { reminder: Reminder },
    ReminderUnnecessary { reminder: Reminder },

    // ── Resources ────────────────────────────────────────────────────────
    EnumeratorUtil { working: u32 },
    EnumeratorTravel {
        enumerator:        EnumeratorId,
        distance:          f64,
        travel_time:       f64,
        total_distance:    f64,
        total_travel_time: f64,
    },

    /// A recoverable anomaly (e.g. a clamped division by zero).
    Warning { message: String },
}

impl EventKind {
    /// Stable snake_case name, used as the category column by output sinks.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::InitialAction { .. }     => "initial_action",
            EventKind::ResponsePlanned          => "response_planned",
            EventKind::Responded { .. }         => "responded",
            EventKind::ReturnReceived { .. }    => "return_received",
            EventKind::DoNothing                => "do_nothing",
            EventKind::NonResponse              => "non_response",
            EventKind::Visit                    => "visit",
            EventKind::VisitContact             => "visit_contact",
            EventKind::VisitOut                 => "visit_out",
            EventKind::VisitWasted              => "visit_wasted",
            EventKind::VisitUnnecessary         => "visit_unnecessary",
            EventKind::VisitSuccess             => "visit_success",
            EventKind::VisitAssist              => "visit_assist",
            EventKind::VisitPaper               => "visit_paper",
            EventKind::Call                     => "call",
            EventKind::CallContact              => "call_contact",
            EventKind::CallRenege               => "call_renege",
            EventKind::CallWait { .. }          => "call_wait",
            EventKind::CallPaper                => "call_paper",
            EventKind::LetterSent { .. }        => "letter_sent",
            EventKind::LetterReceived { .. }    => "letter_received",
            EventKind::ReminderWasted { .. }    => "reminder_wasted",
            EventKind::ReminderUnnecessary { .. } => "reminder_unnecessary",
            EventKind::EnumeratorUtil { .. }    => "enumerator_util",
            EventKind::EnumeratorTravel { .. }  => "enumerator_travel",
            EventKind::Warning { .. }           => "warning",
        }
    }

    /// Free-form detail column (channel, reminder label, numeric payload).
    pub fn detail(&self) -> String {
        match self {
            EventKind::Responded { channel, early } => {
                if *early { format!("{channel};early") } else { channel.to_string() }
            }
            EventKind::ReturnReceived { channel } => channel.to_string(),
            EventKind::InitialAction { action, channel, paper_allowed, planned_hours, .. } => {
                format!("{action};{channel};paper_allowed={paper_allowed};{planned_hours:.4}")
            }
            EventKind::CallWait { wait_hours } => format!("{wait_hours:.4}"),
            EventKind::LetterSent { reminder }
            | EventKind::LetterReceived { reminder }
            | EventKind::ReminderWasted { reminder }
            | EventKind::ReminderUnnecessary { reminder } => reminder.label().to_owned(),
            EventKind::EnumeratorUtil { working } => working.to_string(),
            EventKind::EnumeratorTravel {
                enumerator, distance, travel_time, total_distance, total_travel_time,
            } => format!(
                "{enumerator};{distance:.4};{travel_time:.4};{total_distance:.4};{total_travel_time:.4}"
            ),
            EventKind::Warning { message } => message.clone(),
            EventKind::ResponsePlanned
            | EventKind::DoNothing
            | EventKind::NonResponse
            | EventKind::Visit
            | EventKind::VisitContact
            | EventKind::VisitOut
            | EventKind::VisitWasted
            | EventKind::VisitUnnecessary
            | EventKind::VisitSuccess
            | EventKind::VisitAssist
            | EventKind::VisitPaper
            | EventKind::Call
            | EventKind::CallContact
            | EventKind::CallRenege
            | EventKind::CallPaper => String::new(),
        }
    }
}

/// One append-only output record.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub run:          u32,
    pub rep:          u32,
    pub time:         SimTime,
    pub district:     DistrictId,
    /// `None` for resource-level records (utilisation, travel, warnings).
    pub household:    Option<HouseholdId>,
    /// Household type name, when the record concerns a household.
    pub subject_type: Option<Arc<str>>,
    pub kind:         EventKind,
}
