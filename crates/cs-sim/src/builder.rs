//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use cs_core::{
    AdviserId, Channel, DistrictId, EnumeratorId, EventKind, HouseholdId, InitialAction, RunConfig,
    SimRng, SimTime, datetime_offset_hours,
};
use cs_engine::{ResourcePool, Scheduler, VisitQueue};
use tracing::debug;

use crate::adviser::Adviser;
use crate::district::{District, HouseholdType, initial_separation};
use crate::enumerator::{Enumerator, EnumeratorState};
use crate::household::{Household, behaviour_levels};
use crate::letter::LetterPhase;
use crate::sim::{Action, RunSummary};
use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`RunConfig`]: calendar, districts, household types, resources
/// - run id and replication number
///
/// # Optional inputs (have defaults)
///
/// | Method      | Default                                   |
/// |-------------|-------------------------------------------|
/// | `.seed(s)`  | `RunConfig::seed_for(run, rep)`           |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(&config, 0, 3).build()?;
/// let summary = sim.run(&mut VecSink::new())?;
/// ```
pub struct SimBuilder<'a> {
    config: &'a RunConfig,
    run:    u32,
    rep:    u32,
    seed:   Option<u64>,
}

/// What a household does first, drawn while the roster is built.
enum Initial {
    /// Responds before any campaign interaction; no live instance.
    Early { at: f64 },
    Respond { at: f64 },
    Call { at: f64 },
    Nothing,
}

impl Initial {
    /// The creation record: action, planned time and, for households that
    /// respond unprompted, when their return would arrive.
    fn record(&self, digital: bool, paper_allowed: bool, delay: f64) -> EventKind {
        let (action, planned_hours) = match *self {
            Initial::Early { at }   => (InitialAction::Early, at),
            Initial::Respond { at } => (InitialAction::Late, at),
            Initial::Call { at }    => (InitialAction::Help, at),
            Initial::Nothing        => (InitialAction::DoNothing, 0.0),
        };
        EventKind::InitialAction {
            action,
            channel: Channel::from_digital(digital),
            paper_allowed,
            planned_hours,
            passive_return_hours: action.self_responds().then_some(planned_hours + delay),
        }
    }
}

impl<'a> SimBuilder<'a> {
    pub fn new(config: &'a RunConfig, run: u32, rep: u32) -> Self {
        Self { config, run, rep, seed: None }
    }

    /// Override the replication seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration, create every district with its resources
    /// and households, and return a ready-to-run [`Sim`].
    ///
    /// Start-up actions are scheduled in a fixed order (resources, then
    /// coordinators and letters, then households) so ties at `t = 0` replay
    /// identically.
    pub fn build(self) -> SimResult<Sim> {
        let cfg = self.config;
        cfg.validate()?;
        let seed = self.seed.unwrap_or_else(|| cfg.seed_for(self.run, self.rep));
        let end = SimTime(cfg.sim_hours());

        let mut sim = Sim {
            run: self.run,
            rep: self.rep,
            seed,
            end,
            scheduler: Scheduler::new(),
            rng: SimRng::new(seed),
            call_time: cfg.call_time.clone(),
            districts: Vec::with_capacity(cfg.districts.len()),
            households: Vec::new(),
            enumerators: Vec::new(),
            advisers: Vec::new(),
            pending: Vec::new(),
            summary: RunSummary { run: self.run, rep: self.rep, seed, ..RunSummary::default() },
        };

        let mut next_household = 0u32;
        for (index, (name, district_cfg)) in cfg.districts.iter().enumerate() {
            let id = DistrictId::try_from(index)
                .map_err(|_| SimError::Config(format!("too many districts ({index})")))?;
            let d = sim.districts.len();

            // ── Resources ─────────────────────────────────────────────────
            let mut enumerators = Vec::new();
            for enu_cfg in district_cfg.enumerators.values() {
                let window = enu_cfg.shift.window(cfg.start_date);
                for _ in 0..enu_cfg.shift.number {
                    let e = sim.enumerators.len();
                    sim.enumerators.push(Enumerator {
                        id: EnumeratorId(e as u32),
                        district: d,
                        window,
                        travel_speed: enu_cfg.travel_speed,
                        state: EnumeratorState::OffShift,
                        visits: 0,
                        total_distance: 0.0,
                        total_travel_time: 0.0,
                        wasted_on_arrival: false,
                    });
                    enumerators.push(e);
                    if let Some(start) = window.first_start() {
                        sim.scheduler.schedule(start, Action::EnumeratorStep(e));
                    }
                }
            }

            let mut advisers = Vec::new();
            for ad_cfg in district_cfg.advisers.values() {
                let window = ad_cfg.window(cfg.start_date);
                for _ in 0..ad_cfg.number {
                    let a = sim.advisers.len();
                    sim.advisers.push(Adviser {
                        id: AdviserId(a as u32),
                        district: d,
                        window,
                        pending_removal: None,
                    });
                    advisers.push(a);
                    if let Some(start) = window.first_start() {
                        sim.scheduler.schedule(start, Action::AdviserOn(a));
                    }
                }
            }

            // ── Household types and letters ───────────────────────────────
            let types: Vec<HouseholdType> = district_cfg
                .households
                .iter()
                .map(|(type_name, hh_cfg)| HouseholdType { name: Arc::from(type_name.as_str()), cfg: hh_cfg.clone() })
                .collect();

            let mut letters = Vec::new();
            for (phase_name, letter_cfg) in &district_cfg.letter_phases {
                let targets = letter_cfg
                    .targets
                    .iter()
                    .filter_map(|t| types.iter().position(|ty| ty.name.as_ref() == t.as_str()))
                    .collect();
                letters.push(LetterPhase {
                    name:     Arc::from(phase_name.as_str()),
                    at:       datetime_offset_hours(cfg.start_date, letter_cfg.date),
                    targets,
                    effect:   letter_cfg.effect,
                    delay:    letter_cfg.delay,
                    targeted: letter_cfg.targeted,
                    pq:       letter_cfg.pq,
                });
            }

            let sim_hours = end.hours();
            let first_visit = enumerators
                .iter()
                .filter_map(|&e| sim.enumerators[e].window.first_start())
                .map(SimTime::hours)
                .fold(sim_hours, f64::min);
            let first_letter = letters.iter().map(|l| l.at).fold(sim_hours, f64::min);

            if !enumerators.is_empty() {
                let first_tick = (first_visit / cs_core::HOURS_PER_DAY).floor() * cs_core::HOURS_PER_DAY;
                sim.scheduler.schedule(SimTime(first_tick), Action::CoordinatorTick(d));
            }
            for (phase, letter) in letters.iter().enumerate() {
                sim.scheduler.schedule(SimTime(letter.at), Action::LetterFire { district: d, phase });
            }

            sim.districts.push(District {
                id,
                name: name.clone(),
                postal_delay: district_cfg.postal_delay,
                paper_trigger: district_cfg.paper_trigger,
                types,
                households: Vec::new(),
                total_households: 0,
                responses: 0,
                live_returns: 0,
                early_responders: 0,
                initial_separation: 0.0,
                separation: 0.0,
                first_interaction: first_visit.min(first_letter),
                visit_queue: VisitQueue::new(),
                enumerators,
                parked: Vec::new(),
                working: 0,
                update_hours: cfg.coordinator_update_days * cs_core::HOURS_PER_DAY,
                adviser_pool: ResourcePool::new(advisers.len()),
                advisers,
                letters,
            });

            // ── Households ────────────────────────────────────────────────
            sim.create_households(d, &mut next_household);

            let live = sim.districts[d].households.len();
            let area = district_cfg.district_area;
            match initial_separation(area, live) {
                Some(sep) => {
                    sim.districts[d].initial_separation = sep;
                    sim.districts[d].separation = sep;
                }
                None => sim.warn_district(
                    d,
                    format!("household separation undefined for area {area} and {live} live households; set to zero"),
                ),
            }
            debug!(
                district = %name,
                households = sim.districts[d].total_households,
                early = sim.districts[d].early_responders,
                live,
                first_interaction = sim.districts[d].first_interaction,
                "district built"
            );
        }

        sim.summary.households = next_household;
        Ok(sim)
    }
}

impl Sim {
    /// Create the roster of district `d`: one preference and one initial
    /// decision per household, type by type in name order, then shuffle.
    fn create_households(&mut self, d: usize, next_id: &mut u32) {
        let has_advisers = self.districts[d].has_advisers();
        let first_interaction = self.districts[d].first_interaction;
        let type_count = self.districts[d].types.len();

        for t in 0..type_count {
            let cfg = self.districts[d].types[t].cfg.clone();
            for _ in 0..cfg.number {
                let id = HouseholdId(*next_id);
                *next_id += 1;
                self.districts[d].total_households += 1;

                let digital = self.rng.percent() > cfg.paper_prop();
                let channel_ok = digital || cfg.paper_allowed;
                let (resp, help) = behaviour_levels(&cfg, channel_ok, has_advisers, 0);

                let test = self.rng.percent();
                let initial = if test <= resp {
                    let at = cfg.response_time.for_channel(digital).sample(&mut self.rng);
                    let delay = cfg.delay.for_channel(digital);
                    if channel_ok && at + delay <= first_interaction {
                        Initial::Early { at }
                    } else {
                        Initial::Respond { at }
                    }
                } else if test <= help {
                    Initial::Call { at: self.call_time.sample(&mut self.rng) }
                } else {
                    Initial::Nothing
                };

                let created = initial.record(digital, cfg.paper_allowed, cfg.delay.for_channel(digital));

                if let Initial::Early { at } = initial {
                    let channel = Channel::from_digital(digital);
                    let district = self.districts[d].id;
                    let name = Arc::clone(&self.districts[d].types[t].name);
                    self.emit_raw(SimTime::ZERO, district, Some(id), Some(Arc::clone(&name)), created);
                    self.emit_raw(
                        SimTime(at),
                        district,
                        Some(id),
                        Some(Arc::clone(&name)),
                        EventKind::Responded { channel, early: true },
                    );
                    self.emit_raw(
                        SimTime(at + cfg.delay.for_channel(digital)),
                        district,
                        Some(id),
                        Some(name),
                        EventKind::ReturnReceived { channel },
                    );
                    let district = &mut self.districts[d];
                    district.responses += 1;
                    district.early_responders += 1;
                    self.summary.responses += 1;
                    self.summary.early_responses += 1;
                    continue;
                }

                let hh = self.households.len();
                self.households.push(Household {
                    id,
                    district: d,
                    hh_type: t,
                    digital,
                    paper_allowed: cfg.paper_allowed,
                    priority: cfg.priority,
                    resp_level: resp,
                    help_level: help,
                    visits: 0,
                    calls: 0,
                    resp_planned: false,
                    responded: false,
                    returned: false,
                    call: None,
                });
                self.districts[d].households.push(hh);
                self.emit_household_at(SimTime::ZERO, hh, created);

                match initial {
                    Initial::Respond { at } => {
                        self.households[hh].resp_planned = true;
                        self.emit_household_at(SimTime::ZERO, hh, EventKind::ResponsePlanned);
                        self.scheduler.schedule(SimTime(at), Action::Respond(hh));
                    }
                    Initial::Call { at } => self.scheduler.schedule(SimTime(at), Action::Call(hh)),
                    Initial::Nothing => self.emit_household_at(SimTime::ZERO, hh, EventKind::DoNothing),
                    Initial::Early { .. } => {}
                }
            }
        }

        let mut roster = std::mem::take(&mut self.districts[d].households);
        self.rng.shuffle(&mut roster);
        self.districts[d].households = roster;
    }
}
