//! Integration tests for the materials lab against real storage.
//!
//! Exercises: file store → notebook → lab runs → completion → snapshot.

use std::cell::RefCell;
use std::rc::Rc;

use careersim_core::completion::{CompletionHook, CompletionPayload};
use careersim_core::config::SimConfig;
use careersim_core::noise::RngNoise;
use careersim_core::notebook::{LabNotebook, CSV_HEADER, NOTEBOOK_KEY};
use careersim_core::persistence::{load_snapshot, save_snapshot};
use careersim_core::session::{
    GovernmentSession, MaterialsLab, SessionError, LAB_ENTITY_ID, LAB_SCENARIO_ID,
};
use careersim_core::storage::{FileStore, KeyValueStore, MemoryStore};
use careersim_logic::attempts::{Outcome, Transition};
use careersim_logic::experiment::{
    Additive, CoolingMethod, ExperimentVariables, NoNoise, Precursor,
};
use careersim_logic::scenario::Phase;

// ── Helpers ────────────────────────────────────────────────────────────

fn recording_hook() -> (CompletionHook, Rc<RefCell<Vec<CompletionPayload>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let hook = CompletionHook::new(move |p| sink.borrow_mut().push(p));
    (hook, seen)
}

fn poor_settings() -> ExperimentVariables {
    ExperimentVariables {
        precursor: Precursor::NitrateSolGel,
        temperature_c: 700.0,
        time_hours: 2.0,
        cooling: CoolingMethod::RapidQuench,
        additive: Additive::Graphite,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn notebook_survives_reopen_in_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = SimConfig::default();

    let first_id = {
        let store = FileStore::open(dir.path()).unwrap();
        let mut lab = MaterialsLab::open(Box::new(store), NoNoise, &config, CompletionHook::none());
        lab.begin();
        lab.set_hypothesis("Higher temperature means higher purity");
        lab.run(ExperimentVariables::default(), "baseline").unwrap().entry_id
    };

    let store = FileStore::open(dir.path()).unwrap();
    assert!(store.load(NOTEBOOK_KEY).unwrap().is_some());
    let lab = MaterialsLab::open(Box::new(store), NoNoise, &config, CompletionHook::none());
    assert_eq!(lab.notebook().len(), 1);
    assert_eq!(lab.notebook().entries()[0].id, first_id);
    assert_eq!(
        lab.notebook().hypothesis(),
        "Higher temperature means higher purity"
    );
    // attempts are per session, the notebook is not
    assert_eq!(lab.runs_remaining(), 4);
}

#[test]
fn full_lab_failure_then_report() {
    let (hook, seen) = recording_hook();
    let mut lab = MaterialsLab::open(
        Box::new(MemoryStore::new()),
        NoNoise,
        &SimConfig::default(),
        hook,
    );
    lab.begin();
    for i in 0..3 {
        let run = lab.run(poor_settings(), &format!("try {}", i)).unwrap();
        assert!(matches!(run.transition, Transition::RetryAvailable { .. }));
        assert_eq!(run.output.purity, 20.0);
    }
    assert!(seen.borrow().is_empty());
    let last = lab.run(poor_settings(), "try 3").unwrap();
    assert_eq!(last.transition, Transition::Exhausted);
    assert_eq!(lab.scenario().phase(), Phase::Results);

    let payloads = seen.borrow();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].outcomes[LAB_ENTITY_ID], Outcome::Failure);
    assert_eq!(payloads[0].attempts, 4);
    assert_eq!(payloads[0].free_text_artifacts[LAB_ENTITY_ID].len(), 4);
}

#[test]
fn quota_failure_keeps_entries_in_memory() {
    let mut lab = MaterialsLab::open(
        Box::new(MemoryStore::with_quota(32)),
        NoNoise,
        &SimConfig::default(),
        CompletionHook::none(),
    );
    lab.begin();
    let run = lab.run(ExperimentVariables::default(), "won't fit").unwrap();
    assert!(!run.persisted);
    assert_eq!(lab.notebook().len(), 1);
    assert!(lab.store().load(NOTEBOOK_KEY).unwrap().is_none());
}

#[test]
fn unavailable_store_still_runs() {
    let mut lab = MaterialsLab::open(
        Box::new(MemoryStore::unavailable()),
        NoNoise,
        &SimConfig::default(),
        CompletionHook::none(),
    );
    lab.begin();
    let run = lab.run(ExperimentVariables::optimal(), "").unwrap();
    assert!(!run.persisted);
    assert_eq!(run.transition, Transition::Succeeded);
}

#[test]
fn seeded_noise_is_reproducible_across_labs() {
    let config = SimConfig {
        seed: Some(2024),
        ..SimConfig::default()
    };
    let outputs = |seed| {
        let mut lab = MaterialsLab::open(
            Box::new(MemoryStore::new()),
            RngNoise::new(seed),
            &config,
            CompletionHook::none(),
        );
        lab.begin();
        (0..3)
            .filter_map(|_| lab.run(ExperimentVariables::default(), "").ok())
            .map(|r| r.output)
            .collect::<Vec<_>>()
    };
    assert_eq!(outputs(config.seed), outputs(config.seed));
}

#[test]
fn csv_export_matches_notebook() {
    let mut lab = MaterialsLab::open(
        Box::new(MemoryStore::new()),
        NoNoise,
        &SimConfig::default(),
        CompletionHook::none(),
    );
    lab.begin();
    lab.run(ExperimentVariables::default(), "plain").unwrap();
    lab.run(poor_settings(), "has, a comma").unwrap();
    let csv = lab.export_csv();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].ends_with(",88.0,5.52,\"plain\""));
    assert!(lines[2].ends_with("\"has, a comma\""));
}

#[test]
fn snapshot_resume_continues_attempts() {
    let mut lab = MaterialsLab::open(
        Box::new(MemoryStore::new()),
        NoNoise,
        &SimConfig::default(),
        CompletionHook::none(),
    );
    lab.begin();
    lab.run(poor_settings(), "first").unwrap();
    lab.set_hypothesis("Quenching is too fast");

    let mut bytes = Vec::new();
    save_snapshot(&mut bytes, &lab.snapshot()).unwrap();
    let snapshot = load_snapshot(&mut bytes.as_slice()).unwrap();

    let (hook, seen) = recording_hook();
    let mut resumed = MaterialsLab::resume(
        snapshot,
        Box::new(MemoryStore::new()),
        NoNoise,
        &SimConfig::default(),
        hook,
    )
    .unwrap();
    assert_eq!(resumed.runs_remaining(), 3);
    assert_eq!(resumed.notebook().hypothesis(), "Quenching is too fast");
    // the snapshot's notebook is written to the new store
    assert_eq!(LabNotebook::load(resumed.store()).len(), 1);

    let run = resumed.run(ExperimentVariables::optimal(), "fixed it").unwrap();
    assert_eq!(run.transition, Transition::Succeeded);
    assert_eq!(seen.borrow().len(), 1);
    assert!(seen.borrow()[0].passed);
    assert_eq!(seen.borrow()[0].attempts, 2);
}

#[test]
fn government_snapshot_cannot_resume_as_lab() {
    let mut government =
        GovernmentSession::from_config(&SimConfig::default(), CompletionHook::none());
    government.begin();
    let snapshot = government.snapshot();

    let (hook, seen) = recording_hook();
    let result = MaterialsLab::resume(
        snapshot,
        Box::new(MemoryStore::new()),
        NoNoise,
        &SimConfig::default(),
        hook,
    );
    match result {
        Err(SessionError::WrongScenario { expected, found }) => {
            assert_eq!(expected, LAB_SCENARIO_ID);
            assert_eq!(found, government.scenario().id());
        }
        Err(other) => panic!("expected wrong scenario, got {other}"),
        Ok(_) => panic!("government snapshot resumed as a lab"),
    }
    assert!(seen.borrow().is_empty());
}

#[test]
fn resumed_finished_lab_keeps_completion_time() {
    let mut lab = MaterialsLab::open(
        Box::new(MemoryStore::new()),
        NoNoise,
        &SimConfig::default(),
        CompletionHook::none(),
    );
    lab.begin();
    lab.run(ExperimentVariables::optimal(), "done").unwrap();
    let original = lab.completion().unwrap().completed_at;

    let mut bytes = Vec::new();
    save_snapshot(&mut bytes, &lab.snapshot()).unwrap();
    let snapshot = load_snapshot(&mut bytes.as_slice()).unwrap();
    assert_eq!(snapshot.completed_at, Some(original));

    let (hook, seen) = recording_hook();
    let resumed = MaterialsLab::resume(
        snapshot,
        Box::new(MemoryStore::new()),
        NoNoise,
        &SimConfig::default(),
        hook,
    )
    .unwrap();
    assert_eq!(resumed.completion().unwrap().completed_at, original);
    assert!(seen.borrow().is_empty());
}
