//! Integration tests for cs-sim.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;
use cs_core::{
    BehaviourTable, Behaviours, Channel, ChannelDelays, ChannelProfiles, CumulativeProfile,
    DistrictConfig, EnumeratorConfig, EventKind, EventRecord, HouseholdId, HouseholdTypeConfig,
    InitialAction, LetterPhaseConfig, RunConfig, ShiftConfig,
};

use crate::{EventSink, SimBuilder, VecSink};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 3, day).unwrap()
}

fn table(response: &[f64], help: &[f64]) -> BehaviourTable {
    BehaviourTable { response: response.to_vec(), help: help.to_vec() }
}

/// A digital-only household type with the given behaviour and a fixed
/// response time; no follow-up, instant returns.
fn household_type(number: u32, behaviour: BehaviourTable, response_hours: f64) -> HouseholdTypeConfig {
    HouseholdTypeConfig {
        number,
        paper_allowed:          false,
        paper_prop_pf:          0.0,
        paper_prop_df:          0.0,
        paper_on_request:       false,
        priority:               0,
        fu_on:                  false,
        fu_start:               0.0,
        max_visits:             0,
        paper_after_max_visits: false,
        contact_rate:           0.0,
        conversion_rate:        0.0,
        dig_assist_eff:         0.0,
        dig_assist_flex:        0.0,
        renege_hours:           0.0,
        delay:                  ChannelDelays { digital: 0.0, paper: 0.0 },
        response_time:          ChannelProfiles {
            digital: CumulativeProfile::fixed(response_hours),
            paper:   CumulativeProfile::fixed(response_hours),
        },
        behaviours: Behaviours { default: behaviour.clone(), alt: behaviour },
    }
}

fn district(households: Vec<(&str, HouseholdTypeConfig)>) -> DistrictConfig {
    DistrictConfig {
        district_area: 100.0,
        postal_delay:  0.0,
        paper_trigger: 0.0,
        households:    households.into_iter().map(|(n, h)| (n.to_string(), h)).collect(),
        enumerators:   BTreeMap::new(),
        advisers:      BTreeMap::new(),
        letter_phases: BTreeMap::new(),
    }
}

fn shift(number: u32, start_hour: f64, end_hour: f64, first: u32, last: u32) -> ShiftConfig {
    ShiftConfig { number, start_hour, end_hour, start_date: date(first), end_date: date(last) }
}

fn run_config(end_day: u32, district: DistrictConfig) -> RunConfig {
    RunConfig {
        start_date:              date(1),
        end_date:                date(end_day),
        replications:            1,
        base_seed:               5,
        replication_seeds:       BTreeMap::new(),
        coordinator_update_days: 1.0,
        call_time:               CumulativeProfile::fixed(0.0),
        districts:               BTreeMap::from([("north".to_string(), district)]),
    }
}

/// A district exercising every process: two household types, follow-up,
/// a call centre and two letter phases.
fn busy_config() -> RunConfig {
    let mut a = household_type(40, table(&[30.0, 20.0, 10.0], &[20.0, 10.0]), 0.0);
    a.paper_prop_df = 30.0;
    a.paper_on_request = true;
    a.fu_on = true;
    a.fu_start = 48.0;
    a.max_visits = 3;
    a.paper_after_max_visits = true;
    a.contact_rate = 60.0;
    a.conversion_rate = 40.0;
    a.dig_assist_eff = 20.0;
    a.dig_assist_flex = 30.0;
    a.renege_hours = 0.5;
    a.delay = ChannelDelays { digital: 0.0, paper: 72.0 };
    a.response_time = ChannelProfiles {
        digital: CumulativeProfile { offset_hours: 0.0, bin_hours: 24.0, cumulative: vec![0.3, 0.7, 1.0] },
        paper:   CumulativeProfile { offset_hours: 0.0, bin_hours: 24.0, cumulative: vec![0.1, 1.0] },
    };
    a.behaviours.alt = table(&[10.0, 5.0], &[10.0, 5.0]);

    let mut b = a.clone();
    b.number = 20;
    b.paper_allowed = true;
    b.paper_prop_pf = 50.0;
    b.priority = 1;

    let mut d = district(vec![("A", a), ("B", b)]);
    d.postal_delay = 48.0;
    d.paper_trigger = 50.0;
    d.enumerators.insert("field".into(), EnumeratorConfig { shift: shift(2, 9.0, 17.0, 3, 20), travel_speed: 10.0 });
    d.advisers.insert("phone".into(), shift(1, 8.0, 20.0, 1, 20));
    d.letter_phases.insert("reminder".into(), LetterPhaseConfig {
        date:     date(6).and_hms_opt(9, 0, 0).unwrap(),
        targets:  vec!["A".into(), "B".into()],
        effect:   10.0,
        delay:    24.0,
        targeted: true,
        pq:       false,
    });
    d.letter_phases.insert("questionnaire".into(), LetterPhaseConfig {
        date:     date(11).and_hms_opt(9, 0, 0).unwrap(),
        targets:  vec!["A".into()],
        effect:   0.0,
        delay:    24.0,
        targeted: true,
        pq:       true,
    });

    let mut cfg = run_config(22, d);
    cfg.call_time = CumulativeProfile { offset_hours: 0.0, bin_hours: 1.0, cumulative: vec![0.5, 1.0] };
    cfg
}

fn run(cfg: &RunConfig, seed: u64) -> (crate::Sim, crate::RunSummary, Vec<EventRecord>) {
    let mut sim = SimBuilder::new(cfg, 0, 0).seed(seed).build().unwrap();
    let mut sink = VecSink::new();
    let summary = sim.run(&mut sink).unwrap();
    (sim, summary, sink.records)
}

fn count(records: &[EventRecord], pred: impl Fn(&EventKind) -> bool) -> usize {
    records.iter().filter(|r| pred(&r.kind)).count()
}

/// `(household, action, planned hours, passive return hours)` of every
/// initial-action record.
fn initial_actions(records: &[EventRecord]) -> Vec<(HouseholdId, InitialAction, f64, Option<f64>)> {
    records
        .iter()
        .filter_map(|r| match r.kind {
            EventKind::InitialAction { action, planned_hours, passive_return_hours, .. } => {
                Some((r.household?, action, planned_hours, passive_return_hours))
            }
            _ => None,
        })
        .collect()
}

// ── Building ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn early_responders_never_go_live() {
        let cfg = run_config(5, district(vec![("A", household_type(10, table(&[100.0], &[0.0]), 0.0))]));
        let (sim, summary, records) = run(&cfg, 1);

        assert!(sim.households().is_empty());
        assert_eq!(summary.households, 10);
        assert_eq!(summary.responses, 10);
        assert_eq!(summary.early_responses, 10);
        assert_eq!(count(&records, |k| matches!(k, EventKind::Responded { early: true, .. })), 10);
        assert_eq!(count(&records, |k| matches!(k, EventKind::ReturnReceived { .. })), 10);
        // No live households leaves the separation undefined.
        assert_eq!(count(&records, |k| matches!(k, EventKind::Warning { .. })), 1);
        assert_eq!(count(&records, |k| matches!(k, EventKind::NonResponse)), 0);
    }

    #[test]
    fn every_household_records_its_initial_action() {
        let mut early = household_type(4, table(&[100.0], &[0.0]), 0.0);
        early.delay.digital = 6.0;
        let cfg = run_config(3, district(vec![
            ("A", early),
            ("B", household_type(3, table(&[0.0], &[0.0]), 0.0)),
        ]));
        let (_, summary, records) = run(&cfg, 2);

        let created = initial_actions(&records);
        assert_eq!(created.len() as u32, summary.households);
        let mut ids: Vec<u32> = created.iter().map(|(id, ..)| id.0).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 7);

        for (_, action, planned, passive) in &created {
            match action {
                InitialAction::Early => assert_eq!(*passive, Some(6.0)),
                InitialAction::DoNothing => {
                    assert_eq!(*planned, 0.0);
                    assert_eq!(*passive, None);
                }
                other => panic!("unexpected initial action {other}"),
            }
        }
        assert_eq!(created.iter().filter(|c| c.1 == InitialAction::Early).count(), 4);

        // The creation record of an early responder comes before its response.
        let first_created = records.iter().position(|r| matches!(r.kind, EventKind::InitialAction { .. })).unwrap();
        let first_early = records
            .iter()
            .position(|r| matches!(r.kind, EventKind::Responded { early: true, .. }))
            .unwrap();
        assert!(first_created < first_early);
    }

    #[test]
    fn household_ids_are_serial_across_types() {
        let cfg = run_config(3, district(vec![
            ("A", household_type(3, table(&[0.0], &[0.0]), 0.0)),
            ("B", household_type(2, table(&[0.0], &[0.0]), 0.0)),
        ]));
        let sim = SimBuilder::new(&cfg, 0, 0).build().unwrap();
        let mut ids: Vec<u32> = sim.households().iter().map(|h| h.id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(sim.districts()[0].total_households, 5);
    }

    #[test]
    fn default_seed_comes_from_config() {
        let cfg = run_config(3, district(vec![("A", household_type(1, table(&[0.0], &[0.0]), 0.0))]));
        let sim = SimBuilder::new(&cfg, 2, 4).build().unwrap();
        assert_eq!(sim.seed(), cfg.seed_for(2, 4));
    }

    #[test]
    fn invalid_config_rejected() {
        let mut cfg = run_config(3, district(vec![("A", household_type(1, table(&[0.0], &[0.0]), 0.0))]));
        cfg.end_date = cfg.start_date;
        assert!(SimBuilder::new(&cfg, 0, 0).build().is_err());
    }

    #[test]
    fn initial_separation_uses_live_households() {
        let cfg = run_config(3, district(vec![("A", household_type(4, table(&[0.0], &[0.0]), 0.0))]));
        let sim = SimBuilder::new(&cfg, 0, 0).build().unwrap();
        let expected = 2.0 * (100.0_f64 / 4.0 / std::f64::consts::PI).sqrt();
        assert!((sim.districts()[0].initial_separation - expected).abs() < 1e-9);
    }
}

// ── Field visits ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod visit_tests {
    use super::*;

    fn always_converts() -> RunConfig {
        let mut hh = household_type(1, table(&[0.0], &[0.0]), 0.0);
        hh.fu_on = true;
        hh.max_visits = 2;
        hh.contact_rate = 100.0;
        hh.conversion_rate = 100.0;
        let mut d = district(vec![("A", hh)]);
        d.enumerators.insert("field".into(), EnumeratorConfig { shift: shift(1, 0.0, 24.0, 1, 3), travel_speed: 10.0 });
        run_config(4, d)
    }

    #[test]
    fn successful_visit_leads_to_response() {
        let (sim, summary, records) = run(&always_converts(), 3);

        let success = records.iter().position(|r| r.kind == EventKind::VisitSuccess).unwrap();
        let responded = records
            .iter()
            .position(|r| matches!(r.kind, EventKind::Responded { early: false, .. }))
            .unwrap();
        assert!(success < responded);
        assert!(sim.households()[0].responded);
        assert_eq!(sim.households()[0].visits, 1);
        assert_eq!(summary.responses, 1);

        // Conversion takes half an hour after travel.
        let travel = sim.districts()[0].initial_separation / 10.0;
        let at = records[responded].time.hours();
        assert!((at - (travel + 0.5)).abs() < 1e-9);
    }

    #[test]
    fn travel_is_charged_per_visit() {
        let (sim, summary, records) = run(&always_converts(), 3);
        let enu = &sim.enumerators()[0];
        assert_eq!(enu.visits, 1);
        assert!((enu.total_distance - sim.districts()[0].initial_separation).abs() < 1e-9);
        assert!((summary.travel_distance - enu.total_distance).abs() < 1e-9);
        assert_eq!(count(&records, |k| matches!(k, EventKind::EnumeratorTravel { .. })), 1);
    }

    #[test]
    fn unanswered_doors_stop_at_visit_cap() {
        let mut cfg = always_converts();
        let hh = cfg.districts.get_mut("north").unwrap().households.get_mut("A").unwrap();
        hh.contact_rate = 0.0;
        hh.max_visits = 3;
        let (sim, _, records) = run(&cfg, 9);

        assert_eq!(sim.households()[0].visits, 3);
        assert_eq!(count(&records, |k| *k == EventKind::Visit), 3);
        assert_eq!(count(&records, |k| *k == EventKind::VisitOut), 3);
        assert_eq!(count(&records, |k| *k == EventKind::NonResponse), 1);
    }

    /// Five paper-preferring households without paper, always answering.
    fn paper_preferring(eff: f64, flex: f64) -> RunConfig {
        let mut cfg = always_converts();
        let hh = cfg.districts.get_mut("north").unwrap().households.get_mut("A").unwrap();
        hh.number = 5;
        hh.paper_prop_df = 100.0;
        hh.dig_assist_eff = eff;
        hh.dig_assist_flex = flex;
        cfg
    }

    fn responded_by(records: &[EventRecord], channel: Channel) -> usize {
        count(records, |k| matches!(k, EventKind::Responded { channel: c, early: false } if *c == channel))
    }

    #[test]
    fn assisted_household_is_persuaded_online() {
        let (sim, _, records) = run(&paper_preferring(100.0, 0.0), 3);

        assert_eq!(count(&records, |k| *k == EventKind::VisitSuccess), 5);
        assert_eq!(responded_by(&records, Channel::Digital), 5);
        assert_eq!(count(&records, |k| *k == EventKind::VisitPaper), 0);
        assert_eq!(count(&records, |k| *k == EventKind::VisitAssist), 0);
        assert!(sim.households().iter().all(|h| h.digital && !h.paper_allowed && h.visits == 1));
    }

    #[test]
    fn assisted_household_is_granted_paper() {
        let (sim, _, records) = run(&paper_preferring(0.0, 100.0), 3);

        assert_eq!(count(&records, |k| *k == EventKind::VisitPaper), 5);
        assert_eq!(count(&records, |k| *k == EventKind::VisitSuccess), 5);
        assert_eq!(responded_by(&records, Channel::Paper), 5);
        assert!(sim.households().iter().all(|h| !h.digital && h.paper_allowed));
    }

    #[test]
    fn other_assistance_requeues_until_cap() {
        let (sim, summary, records) = run(&paper_preferring(0.0, 0.0), 3);

        // Two visits each, both ending in other assistance.
        assert_eq!(count(&records, |k| *k == EventKind::Visit), 10);
        assert_eq!(count(&records, |k| *k == EventKind::VisitAssist), 10);
        assert_eq!(count(&records, |k| *k == EventKind::VisitSuccess), 0);
        assert_eq!(count(&records, |k| *k == EventKind::NonResponse), 5);
        assert_eq!(summary.responses, 0);
        assert!(sim.households().iter().all(|h| h.visits == 2 && !h.paper_allowed));
    }

    #[test]
    fn paper_left_at_visit_cap_returns_to_decision() {
        let mut cfg = paper_preferring(0.0, 0.0);
        let hh = cfg.districts.get_mut("north").unwrap().households.get_mut("A").unwrap();
        hh.number = 3;
        hh.contact_rate = 0.0;
        hh.paper_after_max_visits = true;
        // Only a household able to use paper responds on its own.
        hh.behaviours.default = table(&[100.0], &[0.0]);
        let (sim, _, records) = run(&cfg, 5);

        assert_eq!(count(&records, |k| *k == EventKind::VisitOut), 6);
        assert_eq!(count(&records, |k| *k == EventKind::VisitPaper), 3);
        assert_eq!(responded_by(&records, Channel::Paper), 3);
        for h in sim.households() {
            assert!(h.paper_allowed && h.responded);
            let paper = records
                .iter()
                .position(|r| r.household == Some(h.id) && r.kind == EventKind::VisitPaper)
                .unwrap();
            let responded = records
                .iter()
                .position(|r| r.household == Some(h.id) && matches!(r.kind, EventKind::Responded { .. }))
                .unwrap();
            assert!(paper < responded);
        }
    }

    #[test]
    fn separation_clamps_once_every_live_household_returns() {
        // Four late responders, all returned by hour 10.
        let mut hh = household_type(4, table(&[100.0], &[0.0]), 10.0);
        hh.fu_on = true;
        hh.max_visits = 1;
        let mut d = district(vec![("A", hh)]);
        d.enumerators.insert("field".into(), EnumeratorConfig { shift: shift(1, 0.0, 24.0, 1, 3), travel_speed: 10.0 });
        let (sim, summary, records) = run(&run_config(4, d), 3);

        assert_eq!(summary.early_responses, 0);
        assert_eq!(summary.responses, 4);
        let warnings: Vec<f64> = records
            .iter()
            .filter(|r| matches!(r.kind, EventKind::Warning { .. }))
            .map(|r| r.time.hours())
            .collect();
        assert_eq!(warnings, vec![24.0, 48.0]);
        assert_eq!(sim.districts()[0].separation, 0.0);
    }

    #[test]
    fn follow_up_waits_for_start() {
        let mut cfg = always_converts();
        cfg.districts.get_mut("north").unwrap().households.get_mut("A").unwrap().fu_start = 30.0;
        let (_, _, records) = run(&cfg, 3);
        let first_visit = records.iter().find(|r| r.kind == EventKind::Visit).unwrap();
        // First eligible coordinator tick after hour 30 is at hour 48.
        assert!(first_visit.time.hours() >= 48.0);
    }
}

// ── Call centre ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod call_tests {
    use super::*;

    /// Two households phone at once; one adviser; callers hang up at once.
    fn busy_line() -> RunConfig {
        let mut d = district(vec![("A", household_type(2, table(&[0.0], &[100.0, 0.0]), 0.0))]);
        d.advisers.insert("phone".into(), shift(1, 0.0, 24.0, 1, 2));
        run_config(3, d)
    }

    #[test]
    fn second_caller_reneges() {
        let (sim, _, records) = run(&busy_line(), 4);
        assert_eq!(count(&records, |k| *k == EventKind::Call), 2);
        assert_eq!(count(&records, |k| *k == EventKind::CallContact), 1);
        assert_eq!(count(&records, |k| *k == EventKind::CallRenege), 1);
        // Nobody waited a positive time.
        assert_eq!(count(&records, |k| matches!(k, EventKind::CallWait { .. })), 0);
        assert!(sim.households().iter().all(|h| h.call.is_none()));
    }

    #[test]
    fn patient_caller_waits_for_adviser() {
        let mut cfg = busy_line();
        cfg.districts.get_mut("north").unwrap().households.get_mut("A").unwrap().renege_hours = 1e9;
        let (_, _, records) = run(&cfg, 4);

        assert_eq!(count(&records, |k| *k == EventKind::CallContact), 2);
        assert_eq!(count(&records, |k| *k == EventKind::CallRenege), 0);
        let waits: Vec<f64> = records
            .iter()
            .filter_map(|r| match r.kind {
                EventKind::CallWait { wait_hours } => Some(wait_hours),
                _ => None,
            })
            .collect();
        assert_eq!(waits.len(), 1);
        assert!((waits[0] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn letter_while_on_hold_keeps_one_call() {
        // A gets the adviser; B is on hold when its letter lands.
        let mut caller = household_type(1, table(&[0.0], &[100.0, 0.0]), 0.0);
        caller.renege_hours = 1e9;
        let mut d = district(vec![("A", caller.clone()), ("B", caller)]);
        d.advisers.insert("phone".into(), shift(1, 0.0, 24.0, 1, 2));
        d.letter_phases.insert("nudge".into(), LetterPhaseConfig {
            date:     date(1).and_hms_opt(0, 3, 0).unwrap(),
            targets:  vec!["B".into()],
            effect:   0.0,
            delay:    0.0,
            targeted: false,
            pq:       false,
        });
        let (sim, _, records) = run(&run_config(3, d), 4);

        assert_eq!(count(&records, |k| matches!(k, EventKind::LetterReceived { .. })), 1);
        assert_eq!(count(&records, |k| *k == EventKind::Call), 2);
        assert_eq!(count(&records, |k| *k == EventKind::CallContact), 2);
        assert!(sim.households().iter().all(|h| h.calls == 1 && h.call.is_none()));
        assert!(sim.districts()[0].adviser_pool.is_balanced());
    }

    #[test]
    fn adviser_serves_callers_on_hold_before_leaving() {
        // A one-hour shift; three callers ring just before it ends.
        let mut caller = household_type(3, table(&[0.0], &[100.0, 0.0]), 0.0);
        caller.renege_hours = 1e9;
        let mut d = district(vec![("A", caller)]);
        d.advisers.insert("phone".into(), shift(1, 0.0, 1.0, 1, 1));
        let mut cfg = run_config(3, d);
        cfg.call_time = CumulativeProfile::fixed(0.95);
        let (sim, _, records) = run(&cfg, 4);

        let contacts: Vec<f64> = records
            .iter()
            .filter(|r| r.kind == EventKind::CallContact)
            .map(|r| r.time.hours())
            .collect();
        assert_eq!(contacts.len(), 3);
        for (at, expected) in contacts.iter().zip([0.95, 1.05, 1.15]) {
            assert!((at - expected).abs() < 1e-9);
        }
        assert_eq!(count(&records, |k| *k == EventKind::CallRenege), 0);
        // The shift-end claim went through after the last call.
        let pool = &sim.districts()[0].adviser_pool;
        assert_eq!(pool.available_len(), 0);
        assert_eq!(pool.in_use(), 0);
        assert!(sim.advisers()[0].pending_removal.is_none());
    }

    #[test]
    fn callers_record_a_help_action() {
        let (_, _, records) = run(&busy_line(), 4);
        let created = initial_actions(&records);
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|(_, action, planned, passive)| {
            *action == InitialAction::Help && *planned == 0.0 && passive.is_none()
        }));
    }

    #[test]
    fn no_call_centre_means_no_calls() {
        let cfg = run_config(3, district(vec![("A", household_type(5, table(&[0.0], &[100.0]), 0.0))]));
        let (_, _, records) = run(&cfg, 4);
        assert_eq!(count(&records, |k| *k == EventKind::Call), 0);
        assert_eq!(count(&records, |k| *k == EventKind::DoNothing), 5);
    }

    #[test]
    fn paper_requested_by_phone_is_posted() {
        let mut hh = household_type(1, table(&[0.0], &[100.0, 0.0]), 0.0);
        hh.paper_prop_df = 100.0;
        hh.paper_on_request = true;
        hh.behaviours.default = table(&[0.0], &[0.0]);
        let mut d = district(vec![("A", hh)]);
        d.paper_trigger = 50.0;
        d.postal_delay = 48.0;
        d.advisers.insert("phone".into(), shift(1, 0.0, 24.0, 1, 5));
        let (sim, _, records) = run(&run_config(6, d), 4);

        assert_eq!(count(&records, |k| *k == EventKind::CallPaper), 1);
        assert_eq!(count(&records, |k| *k == EventKind::CallContact), 0);
        let delivered = records
            .iter()
            .find(|r| matches!(r.kind, EventKind::LetterReceived { .. }))
            .unwrap();
        assert_eq!(delivered.time.hours(), 48.0);
        assert!(sim.households()[0].paper_allowed);
    }
}

// ── Letters ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod letter_tests {
    use super::*;

    fn letters_config() -> RunConfig {
        // A: respond at hour 50, after the first letter so not early.
        // B: never respond on their own.
        let mut d = district(vec![
            ("A", household_type(2, table(&[100.0], &[0.0]), 50.0)),
            ("B", household_type(3, table(&[0.0], &[0.0]), 0.0)),
        ]);
        d.letter_phases.insert("prime".into(), LetterPhaseConfig {
            date:     date(1).and_hms_opt(5, 0, 0).unwrap(),
            targets:  vec!["B".into()],
            effect:   0.0,
            delay:    24.0,
            targeted: false,
            pq:       false,
        });
        d.letter_phases.insert("final".into(), LetterPhaseConfig {
            date:     date(5).and_hms_opt(4, 0, 0).unwrap(),
            targets:  vec!["A".into(), "B".into()],
            effect:   0.0,
            delay:    24.0,
            targeted: true,
            pq:       false,
        });
        run_config(10, d)
    }

    fn phase(kind: &EventKind) -> Option<&str> {
        match kind {
            EventKind::LetterSent { reminder } | EventKind::LetterReceived { reminder } => Some(reminder.label()),
            _ => None,
        }
    }

    #[test]
    fn targeted_letter_skips_responders() {
        let (_, summary, records) = run(&letters_config(), 6);
        assert_eq!(summary.early_responses, 0);

        let received: Vec<&EventRecord> = records
            .iter()
            .filter(|r| matches!(r.kind, EventKind::LetterReceived { .. }) && phase(&r.kind) == Some("final"))
            .collect();
        assert_eq!(received.len(), 3);
        for r in received {
            assert_eq!(r.time.hours(), 124.0);
            assert_eq!(r.subject_type.as_deref(), Some("B"));
        }
    }

    #[test]
    fn untargeted_letter_reaches_every_listed_type() {
        let (_, _, records) = run(&letters_config(), 6);
        let sent = records
            .iter()
            .filter(|r| matches!(r.kind, EventKind::LetterSent { .. }) && phase(&r.kind) == Some("prime"))
            .count();
        assert_eq!(sent, 3);
    }

    #[test]
    fn late_responders_carry_passive_return() {
        let (_, _, records) = run(&letters_config(), 6);
        for (_, action, planned, passive) in initial_actions(&records) {
            match action {
                InitialAction::Late => {
                    assert_eq!(planned, 50.0);
                    assert_eq!(passive, Some(50.0));
                }
                InitialAction::DoNothing => assert_eq!(passive, None),
                other => panic!("unexpected initial action {other}"),
            }
        }
    }

    #[test]
    fn letters_to_committed_households_are_tallied() {
        // A plans to respond at hour 50: letters at 10 and 60 find it
        // planned and then done.
        let mut d = district(vec![("A", household_type(2, table(&[100.0], &[0.0]), 50.0))]);
        for (name, day, hour) in [("before", 1, 10), ("after", 3, 12)] {
            d.letter_phases.insert(name.into(), LetterPhaseConfig {
                date:     date(day).and_hms_opt(hour, 0, 0).unwrap(),
                targets:  vec!["A".into()],
                effect:   0.0,
                delay:    0.0,
                targeted: false,
                pq:       false,
            });
        }
        let (_, summary, records) = run(&run_config(5, d), 6);

        assert_eq!(summary.early_responses, 0);
        assert_eq!(count(&records, |k| matches!(k, EventKind::LetterReceived { .. })), 4);
        let unnecessary: Vec<&EventRecord> = records
            .iter()
            .filter(|r| matches!(r.kind, EventKind::ReminderUnnecessary { .. }))
            .collect();
        let wasted: Vec<&EventRecord> = records
            .iter()
            .filter(|r| matches!(r.kind, EventKind::ReminderWasted { .. }))
            .collect();
        assert_eq!(unnecessary.len(), 2);
        assert_eq!(wasted.len(), 2);
        assert!(unnecessary.iter().all(|r| r.time.hours() == 10.0));
        assert!(wasted.iter().all(|r| r.time.hours() == 60.0));
    }

    #[test]
    fn letter_effect_prompts_response() {
        let mut cfg = letters_config();
        let phases = &mut cfg.districts.get_mut("north").unwrap().letter_phases;
        phases.get_mut("prime").unwrap().effect = 100.0;
        let (_, _, records) = run(&cfg, 6);
        let b_responses = records
            .iter()
            .filter(|r| matches!(r.kind, EventKind::Responded { .. }) && r.subject_type.as_deref() == Some("B"))
            .count();
        assert_eq!(b_responses, 3);
    }
}

// ── Whole runs ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn same_seed_same_records() {
        let cfg = busy_config();
        let (_, first_summary, first) = run(&cfg, 42);
        let (_, second_summary, second) = run(&cfg, 42);
        assert_eq!(first, second);
        assert_eq!(first_summary, second_summary);
    }

    #[test]
    fn different_seeds_diverge() {
        let cfg = busy_config();
        let (_, _, first) = run(&cfg, 1);
        let (_, _, second) = run(&cfg, 2);
        assert_ne!(first, second);
    }

    #[test]
    fn each_household_responds_at_most_once() {
        let (_, summary, records) = run(&busy_config(), 7);
        let mut responded: HashMap<HouseholdId, usize> = HashMap::new();
        let mut returned: HashMap<HouseholdId, usize> = HashMap::new();
        for r in &records {
            let Some(id) = r.household else { continue };
            match r.kind {
                EventKind::Responded { .. }      => *responded.entry(id).or_default() += 1,
                EventKind::ReturnReceived { .. } => *returned.entry(id).or_default() += 1,
                _ => {}
            }
        }
        assert!(responded.values().all(|&n| n == 1));
        assert!(returned.values().all(|&n| n == 1));
        assert_eq!(returned.len() as u32, summary.responses);
    }

    #[test]
    fn records_are_time_ordered_apart_from_early_responders() {
        let (_, _, records) = run(&busy_config(), 8);
        // Early responders are recorded at build time, stamped with their
        // own response and return times.
        let early: Vec<HouseholdId> = records
            .iter()
            .filter(|r| matches!(r.kind, EventKind::Responded { early: true, .. }))
            .filter_map(|r| r.household)
            .collect();
        let times: Vec<f64> = records
            .iter()
            .filter(|r| r.household.is_none_or(|id| !early.contains(&id)))
            .map(|r| r.time.hours())
            .collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn visit_cap_and_pool_balance_hold() {
        let (sim, _, records) = run(&busy_config(), 11);
        let mut visits: HashMap<HouseholdId, u32> = HashMap::new();
        for r in records.iter().filter(|r| r.kind == EventKind::Visit) {
            *visits.entry(r.household.unwrap()).or_default() += 1;
        }
        assert!(visits.values().all(|&n| n <= 3));
        assert!(sim.households().iter().all(|h| h.visits <= 3));
        for d in sim.districts() {
            assert!(d.adviser_pool.is_balanced());
        }
    }

    #[test]
    fn every_silent_household_gets_non_response() {
        let (sim, _, records) = run(&busy_config(), 12);
        let silent = sim.households().iter().filter(|h| !h.responded).count();
        assert_eq!(count(&records, |k| *k == EventKind::NonResponse), silent);
    }

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("refused")
        }
    }

    impl std::error::Error for Refused {}

    /// Accepts every other record.
    #[derive(Default)]
    struct Flaky {
        seen: u64,
    }

    impl EventSink for Flaky {
        type Error = Refused;

        fn record(&mut self, _record: EventRecord) -> Result<(), Refused> {
            self.seen += 1;
            if self.seen % 2 == 0 { Err(Refused) } else { Ok(()) }
        }
    }

    #[test]
    fn rejected_records_are_counted_and_skipped() {
        let mut sim = SimBuilder::new(&busy_config(), 0, 0).seed(3).build().unwrap();
        let mut sink = Flaky::default();
        let summary = sim.run(&mut sink).unwrap();
        assert_eq!(summary.records + summary.dropped_records, sink.seen);
        assert_eq!(summary.dropped_records, sink.seen / 2);
    }
}

// ── Separation ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod separation_tests {
    use proptest::prelude::*;

    use crate::{initial_separation, separation};

    #[test]
    fn undefined_cases() {
        assert_eq!(initial_separation(100.0, 0), None);
        assert_eq!(separation(5.0, 1.0), None);
        assert_eq!(separation(5.0, 0.0), Some(5.0));
    }

    proptest! {
        #[test]
        fn separation_grows_with_response_rate(
            initial in 0.0f64..1e4,
            low in 0.0f64..0.99,
            step in 0.0f64..0.009,
        ) {
            let a = separation(initial, low).unwrap();
            let b = separation(initial, low + step).unwrap();
            prop_assert!(a >= initial);
            prop_assert!(b >= a);
        }
    }
}
