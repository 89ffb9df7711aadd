//! Run configuration.
//!
//! A configuration file is a JSON object mapping run ids to [`RunConfig`]s.
//! Each run describes its calendar window, its districts and, per district,
//! the household types, field/call resources and letter phases.  Calendar
//! fields use `chrono` dates and are converted to hour offsets by the
//! simulation builder.
//!
//! Missing keys are rejected by `serde`; [`RunConfig::validate`] then checks
//! the semantic constraints.  Both paths are fatal (see [`CsError::Config`]).

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::profile::CumulativeProfile;
use crate::time::{ShiftWindow, date_offset_hours};
use crate::{CsError, CsResult, derive_seed};

fn default_replications() -> u32 {
    1
}

fn default_update_days() -> f64 {
    1.0
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Configuration of one run (all of its replications share it).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Day 0 of the virtual clock (00:00).
    pub start_date: NaiveDate,
    /// Simulation end (00:00, exclusive).
    pub end_date:   NaiveDate,

    #[serde(default = "default_replications")]
    pub replications: u32,

    /// Base for seeds of replications not listed in `replication_seeds`.
    #[serde(default)]
    pub base_seed: u64,

    /// Pinned per-replication seeds.
    #[serde(default)]
    pub replication_seeds: BTreeMap<u32, u64>,

    /// Coordinator refresh cadence, in days.
    #[serde(default = "default_update_days")]
    pub coordinator_update_days: f64,

    /// Delay between deciding to call and calling.
    pub call_time: CumulativeProfile,

    pub districts: BTreeMap<String, DistrictConfig>,
}

impl RunConfig {
    /// Parse a single run from JSON text and validate it.
    pub fn from_json_str(text: &str) -> CsResult<Self> {
        let cfg: RunConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Simulated horizon in hours.
    pub fn sim_hours(&self) -> f64 {
        date_offset_hours(self.start_date, self.end_date)
    }

    /// Seed for replication `rep` of run `run`: pinned if listed, derived
    /// otherwise.
    pub fn seed_for(&self, run: u32, rep: u32) -> u64 {
        self.replication_seeds
            .get(&rep)
            .copied()
            .unwrap_or_else(|| derive_seed(self.base_seed, run, rep))
    }

    /// Check every semantic constraint.  The first defect aborts.
    pub fn validate(&self) -> CsResult<()> {
        if self.end_date <= self.start_date {
            return Err(CsError::Run(format!(
                "end date {} is not after start date {}",
                self.end_date, self.start_date
            )));
        }
        if !(self.coordinator_update_days > 0.0 && self.coordinator_update_days.is_finite()) {
            return Err(CsError::Run(format!(
                "coordinator update cadence {} days must be positive",
                self.coordinator_update_days
            )));
        }
        self.call_time
            .check()
            .map_err(|r| CsError::Run(format!("call time profile: {r}")))?;
        if self.districts.is_empty() {
            return Err(CsError::Run("no districts configured".into()));
        }
        for (name, district) in &self.districts {
            district.validate(name)?;
        }
        Ok(())
    }
}

/// Load a configuration file: `{ "<run id>": RunConfig, ... }`.
pub fn load_runs(path: &Path) -> CsResult<BTreeMap<u32, RunConfig>> {
    let text = std::fs::read_to_string(path)?;
    parse_runs(&text)
}

/// Parse and validate the text of a configuration file.
pub fn parse_runs(text: &str) -> CsResult<BTreeMap<u32, RunConfig>> {
    let raw: BTreeMap<String, RunConfig> = serde_json::from_str(text)?;
    let mut runs = BTreeMap::new();
    for (key, cfg) in raw {
        let id: u32 = key
            .trim()
            .parse()
            .map_err(|_| CsError::Run(format!("run id '{key}' is not a non-negative integer")))?;
        cfg.validate()?;
        runs.insert(id, cfg);
    }
    Ok(runs)
}

// ── DistrictConfig ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistrictConfig {
    /// Area of the district; units only need to match enumerator speed.
    pub district_area: f64,

    /// Hours for a paper questionnaire requested by phone to arrive.
    #[serde(default)]
    pub postal_delay: f64,

    /// Paper is granted on request only while the district return rate (%)
    /// is below this trigger.
    #[serde(default)]
    pub paper_trigger: f64,

    pub households: BTreeMap<String, HouseholdTypeConfig>,

    #[serde(default)]
    pub enumerators: BTreeMap<String, EnumeratorConfig>,

    #[serde(default)]
    pub advisers: BTreeMap<String, ShiftConfig>,

    #[serde(default)]
    pub letter_phases: BTreeMap<String, LetterPhaseConfig>,
}

impl DistrictConfig {
    fn validate(&self, district: &str) -> CsResult<()> {
        if !(self.district_area >= 0.0 && self.district_area.is_finite()) {
            return Err(CsError::config(district, "district_area", "must be finite and non-negative"));
        }
        if self.postal_delay < 0.0 {
            return Err(CsError::config(district, "postal_delay", "must be non-negative"));
        }
        for (name, hh) in &self.households {
            hh.validate(district, name)?;
        }
        for (name, enu) in &self.enumerators {
            enu.shift.validate(district, &format!("enumerator type '{name}'"))?;
            if !(enu.travel_speed > 0.0 && enu.travel_speed.is_finite()) {
                return Err(CsError::config(
                    district,
                    format!("enumerator type '{name}'"),
                    "travel_speed must be positive",
                ));
            }
        }
        for (name, ad) in &self.advisers {
            ad.validate(district, &format!("adviser type '{name}'"))?;
        }
        for (name, letter) in &self.letter_phases {
            let subject = format!("letter phase '{name}'");
            if letter.delay < 0.0 {
                return Err(CsError::config(district, subject, "delay must be non-negative"));
            }
            for target in &letter.targets {
                if !self.households.contains_key(target) {
                    return Err(CsError::config(
                        district,
                        subject,
                        format!("targets unknown household type '{target}'"),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn advisers_total(&self) -> u32 {
        self.advisers.values().map(|a| a.number).sum()
    }
}

// ── Households ────────────────────────────────────────────────────────────────

/// Per-household-type counts, rates and behaviour tables.
///
/// All rates and probabilities are percentages in `[0, 100]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HouseholdTypeConfig {
    pub number: u32,

    /// Whether paper questionnaires are available from the outset.
    pub paper_allowed: bool,
    /// Share of households preferring paper when paper is allowed up front.
    pub paper_prop_pf: f64,
    /// Share of households preferring paper in a digital-first type.
    pub paper_prop_df: f64,
    /// Paper can be requested by phone.
    #[serde(default)]
    pub paper_on_request: bool,

    /// Initial visit-queue sort key (lower visits first).
    #[serde(default)]
    pub priority: i64,

    /// Field follow-up enabled for this type.
    pub fu_on:      bool,
    /// Hours after run start from which the type may be visited.
    pub fu_start:   f64,
    pub max_visits: u32,
    #[serde(default)]
    pub paper_after_max_visits: bool,

    pub contact_rate:    f64,
    pub conversion_rate: f64,
    /// Digital-assist thresholds: persuade to digital below `eff`, grant
    /// paper in `[eff, eff + flex)`, otherwise offer other assistance.
    pub dig_assist_eff:  f64,
    pub dig_assist_flex: f64,

    /// Mean patience (hours) of a caller waiting for an adviser.
    #[serde(default)]
    pub renege_hours: f64,

    /// Channel-specific delay between responding and the return arriving.
    pub delay:         ChannelDelays,
    /// Channel-specific delay between deciding to respond and responding.
    pub response_time: ChannelProfiles,
    pub behaviours:    Behaviours,
}

impl HouseholdTypeConfig {
    /// Share of households preferring paper, picked by `paper_allowed`.
    #[inline]
    pub fn paper_prop(&self) -> f64 {
        if self.paper_allowed { self.paper_prop_pf } else { self.paper_prop_df }
    }

    fn validate(&self, district: &str, name: &str) -> CsResult<()> {
        let subject = format!("household type '{name}'");
        let percentages = [
            ("paper_prop_pf", self.paper_prop_pf),
            ("paper_prop_df", self.paper_prop_df),
            ("contact_rate", self.contact_rate),
            ("conversion_rate", self.conversion_rate),
            ("dig_assist_eff", self.dig_assist_eff),
            ("dig_assist_flex", self.dig_assist_flex),
        ];
        for (key, value) in percentages {
            if !(0.0..=100.0).contains(&value) {
                return Err(CsError::config(
                    district,
                    subject.as_str(),
                    format!("{key} = {value} is outside [0, 100]"),
                ));
            }
        }
        if self.fu_start < 0.0 || self.renege_hours < 0.0 {
            return Err(CsError::config(district, subject, "fu_start and renege_hours must be non-negative"));
        }
        if self.delay.digital < 0.0 || self.delay.paper < 0.0 {
            return Err(CsError::config(district, subject, "channel delays must be non-negative"));
        }
        for (channel, profile) in [("digital", &self.response_time.digital), ("paper", &self.response_time.paper)] {
            profile.check().map_err(|r| {
                CsError::config(district, subject.as_str(), format!("{channel} response time: {r}"))
            })?;
        }
        self.behaviours.default.validate(district, &subject, "default")?;
        self.behaviours.alt.validate(district, &subject, "alt")?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelDelays {
    pub digital: f64,
    pub paper:   f64,
}

impl ChannelDelays {
    #[inline]
    pub fn for_channel(&self, digital: bool) -> f64 {
        if digital { self.digital } else { self.paper }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfiles {
    pub digital: CumulativeProfile,
    pub paper:   CumulativeProfile,
}

impl ChannelProfiles {
    #[inline]
    pub fn for_channel(&self, digital: bool) -> &CumulativeProfile {
        if digital { &self.digital } else { &self.paper }
    }
}

/// Which behaviour column to read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Behaviour {
    Response,
    Help,
}

/// Behaviour tables: `default` applies to households that can respond on
/// their preferred channel, `alt` to paper-preferrers without paper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Behaviours {
    pub default: BehaviourTable,
    pub alt:     BehaviourTable,
}

impl Behaviours {
    #[inline]
    pub fn table(&self, channel_ok: bool) -> &BehaviourTable {
        if channel_ok { &self.default } else { &self.alt }
    }
}

/// Probabilities (%) indexed by the number of prior interactions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviourTable {
    pub response: Vec<f64>,
    pub help:     Vec<f64>,
}

impl BehaviourTable {
    /// Rate after `interactions` prior interactions, clamped to the last
    /// entry once the table is exhausted.
    pub fn level(&self, which: Behaviour, interactions: u32) -> f64 {
        let column = match which {
            Behaviour::Response => &self.response,
            Behaviour::Help     => &self.help,
        };
        let idx = (interactions as usize).min(column.len().saturating_sub(1));
        column.get(idx).copied().unwrap_or(0.0)
    }

    fn validate(&self, district: &str, subject: &str, which: &str) -> CsResult<()> {
        if self.response.is_empty() || self.help.is_empty() {
            return Err(CsError::config(
                district,
                subject,
                format!("'{which}' behaviour table needs at least one response and help entry"),
            ));
        }
        if let Some(bad) = self.response.iter().chain(&self.help).find(|v| !(0.0..=100.0).contains(*v)) {
            return Err(CsError::config(
                district,
                subject,
                format!("'{which}' behaviour rate {bad} is outside [0, 100]"),
            ));
        }
        Ok(())
    }
}

// ── Resources ─────────────────────────────────────────────────────────────────

/// Head count and duty window of one resource type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftConfig {
    pub number:     u32,
    pub start_hour: f64,
    pub end_hour:   f64,
    pub start_date: NaiveDate,
    pub end_date:   NaiveDate,
}

impl ShiftConfig {
    fn validate(&self, district: &str, subject: &str) -> CsResult<()> {
        if !(0.0..24.0).contains(&self.start_hour)
            || !(self.end_hour > self.start_hour && self.end_hour <= 24.0)
        {
            return Err(CsError::config(
                district,
                subject,
                format!("shift {}-{} is not a window within one day", self.start_hour, self.end_hour),
            ));
        }
        if self.end_date < self.start_date {
            return Err(CsError::config(district, subject, "end_date precedes start_date"));
        }
        Ok(())
    }

    /// The duty window relative to the run start date.
    pub fn window(&self, run_start: NaiveDate) -> ShiftWindow {
        ShiftWindow {
            start_hour: self.start_hour,
            end_hour:   self.end_hour,
            first_day:  (self.start_date - run_start).num_days(),
            last_day:   (self.end_date - run_start).num_days(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnumeratorConfig {
    #[serde(flatten)]
    pub shift:        ShiftConfig,
    /// Distance units per hour.
    pub travel_speed: f64,
}

// ── Letters ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LetterPhaseConfig {
    /// When the phase is posted.
    pub date:     NaiveDateTime,
    /// Household types the phase is addressed to.
    pub targets:  Vec<String>,
    /// Percentage points added to the response level on delivery.
    #[serde(default)]
    pub effect:   f64,
    /// Postal delay in hours.
    pub delay:    f64,
    /// Send only to households that have not responded.
    pub targeted: bool,
    /// The letter carries a paper questionnaire.
    #[serde(default)]
    pub pq:       bool,
}
