//! Engine sessions: one running scenario plus everything around it.
//!
//! A session owns the [`Scenario`] state, scores submissions, logs phase
//! changes and delivers the completion payload exactly once when results
//! are reached.
//!
//! - [`GovernmentSession`] scores free-text pitches against the
//!   stakeholder rule table.
//! - [`MaterialsLab`] runs synthesis experiments, keeps the lab notebook
//!   in the injected store and treats each run as one attempt.

use careersim_logic::attempts::{EntitySpec, Transition};
use careersim_logic::experiment::{
    evaluate_run, run_experiment, validate_variables, ExperimentGoal, ExperimentOutput,
    ExperimentVariables, Noise, VariableIssue,
};
use careersim_logic::government::{
    government_roster, government_rules, RuleTable, GOVERNMENT_SCENARIO_ID,
};
use careersim_logic::scenario::{Phase, Scenario, ScenarioAggregate};
use careersim_logic::scoring::{evaluate, Evaluation};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::completion::{reserved_ids, CompletionHook, CompletionPayload};
use crate::config::SimConfig;
use crate::notebook::LabNotebook;
use crate::persistence::SessionSnapshot;
use crate::storage::KeyValueStore;

pub const LAB_SCENARIO_ID: &str = "materials_lab";
pub const LAB_ENTITY_ID: &str = "superconductor_synthesis";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no scoring rule for: {}", .0.join(", "))]
    MissingRules(Vec<String>),

    #[error("entity ids clash with completion fields: {}", .0.join(", "))]
    ReservedIds(Vec<String>),

    #[error("snapshot is for scenario '{found}', expected '{expected}'")]
    WrongScenario { expected: String, found: String },

    #[error("snapshot roster [{}] is not a lab roster", .0.join(", "))]
    WrongRoster(Vec<String>),
}

#[derive(Debug, Error)]
pub enum LabError {
    #[error("lab has not been started")]
    NotStarted,

    #[error("no runs remaining")]
    Finished,

    #[error("invalid experiment variables: {0:?}")]
    InvalidVariables(Vec<VariableIssue>),
}

/// Fire the hook the first time `scenario` reports complete.
fn settle(
    scenario: &Scenario,
    hook: &mut CompletionHook,
    completion: &mut Option<CompletionPayload>,
) {
    if completion.is_some() || !scenario.is_complete() {
        return;
    }
    let payload = CompletionPayload::from_scenario(scenario, Utc::now());
    log::info!(
        "scenario '{}' complete: {} successes, {} attempts, passed={}",
        scenario.id(),
        payload.successes(),
        payload.attempts,
        payload.passed
    );
    hook.fire(payload.clone());
    *completion = Some(payload);
}

/// Payload for a scenario restored after results. The host already saw it,
/// so keep its timestamp when the snapshot recorded one.
fn restored_completion(
    scenario: &Scenario,
    completed_at: Option<DateTime<Utc>>,
) -> Option<CompletionPayload> {
    scenario.is_complete().then(|| {
        CompletionPayload::from_scenario(scenario, completed_at.unwrap_or_else(Utc::now))
    })
}

fn log_phase_change(scenario: &Scenario, before: Phase) {
    let after = scenario.phase();
    if after == before {
        return;
    }
    match (after, scenario.current_spec()) {
        (Phase::Interaction { index }, Some(spec)) => log::info!(
            "'{}': now talking to {} ({}/{})",
            scenario.id(),
            spec.display_name,
            index + 1,
            scenario.roster().len()
        ),
        _ => log::info!("'{}': {:?} -> {:?}", scenario.id(), before, after),
    }
}

// ── Government ─────────────────────────────────────────────────────────

/// Stakeholder persuasion session.
#[derive(Debug)]
pub struct GovernmentSession {
    scenario: Scenario,
    rules: RuleTable,
    hook: CompletionHook,
    completion: Option<CompletionPayload>,
}

impl GovernmentSession {
    /// Session over `scenario`; every roster entry needs a rule and an id
    /// that does not shadow a completion field.
    pub fn new(
        scenario: Scenario,
        rules: RuleTable,
        hook: CompletionHook,
    ) -> Result<Self, SessionError> {
        Self::build(scenario, rules, hook, None)
    }

    /// Rebuild a session from a snapshot. A completed snapshot keeps its
    /// original `completedAt` and is not delivered to the host again.
    pub fn resume(
        snapshot: SessionSnapshot,
        rules: RuleTable,
        hook: CompletionHook,
    ) -> Result<Self, SessionError> {
        Self::build(snapshot.scenario, rules, hook, snapshot.completed_at)
    }

    fn build(
        scenario: Scenario,
        rules: RuleTable,
        hook: CompletionHook,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, SessionError> {
        let missing = rules.missing_for(scenario.roster());
        if !missing.is_empty() {
            return Err(SessionError::MissingRules(missing));
        }
        let reserved = reserved_ids(scenario.roster());
        if !reserved.is_empty() {
            return Err(SessionError::ReservedIds(reserved));
        }
        let completion = restored_completion(&scenario, completed_at);
        Ok(Self {
            scenario,
            rules,
            hook,
            completion,
        })
    }

    /// The five-stakeholder city policy scenario.
    pub fn standard(pass_threshold: usize, hook: CompletionHook) -> Self {
        Self {
            scenario: Scenario::new(GOVERNMENT_SCENARIO_ID, government_roster(), pass_threshold),
            rules: government_rules(),
            hook,
            completion: None,
        }
    }

    pub fn from_config(config: &SimConfig, hook: CompletionHook) -> Self {
        Self::standard(config.government_pass_threshold, hook)
    }

    pub fn begin(&mut self) -> Phase {
        let before = self.scenario.phase();
        let phase = self.scenario.begin();
        log_phase_change(&self.scenario, before);
        phase
    }

    /// Score `text` for the current stakeholder.
    ///
    /// `None` when nobody is being addressed (welcome or results).
    pub fn respond(&mut self, text: &str) -> Option<Transition> {
        let (id, attempt) = {
            let current = self.scenario.current()?;
            (current.id.clone(), current.next_attempt())
        };
        let rule = self.rules.get(&id)?;
        let evaluation = evaluate(rule, text, attempt);
        log::debug!(
            "{} attempt {}: success={}",
            id,
            attempt,
            evaluation.success
        );

        let before = self.scenario.phase();
        let transition = self.scenario.submit(text, evaluation)?;
        log_phase_change(&self.scenario, before);
        settle(&self.scenario, &mut self.hook, &mut self.completion);
        Some(transition)
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn aggregate(&self) -> ScenarioAggregate {
        self.scenario.aggregate()
    }

    pub fn completion(&self) -> Option<&CompletionPayload> {
        self.completion.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(self.scenario.clone(), Vec::new(), String::new())
            .with_completed_at(self.completion.as_ref().map(|p| p.completed_at))
    }
}

// ── Materials lab ──────────────────────────────────────────────────────

/// Outcome of one lab run.
#[derive(Debug, Clone, PartialEq)]
pub struct LabRun {
    pub entry_id: Uuid,
    pub output: ExperimentOutput,
    pub evaluation: Evaluation,
    pub transition: Transition,
    /// False when the notebook could only be kept in memory.
    pub persisted: bool,
}

/// Superconductor synthesis lab.
pub struct MaterialsLab<N: Noise> {
    scenario: Scenario,
    notebook: LabNotebook,
    store: Box<dyn KeyValueStore>,
    noise: N,
    goal: ExperimentGoal,
    hook: CompletionHook,
    completion: Option<CompletionPayload>,
}

impl<N: Noise> MaterialsLab<N> {
    /// Open a lab, loading any notebook already in `store`.
    pub fn open(
        store: Box<dyn KeyValueStore>,
        noise: N,
        config: &SimConfig,
        hook: CompletionHook,
    ) -> Self {
        let notebook = LabNotebook::load(store.as_ref());
        let roster = vec![EntitySpec::new(
            LAB_ENTITY_ID,
            "Superconductor synthesis",
            config.lab_max_runs,
        )];
        Self {
            scenario: Scenario::new(LAB_SCENARIO_ID, roster, 1),
            notebook,
            store,
            noise,
            goal: config.goal(),
            hook,
            completion: None,
        }
    }

    /// Rebuild a lab from a saved snapshot. The snapshot's notebook
    /// replaces whatever the store holds.
    ///
    /// Only snapshots taken from a lab are accepted: the scenario id must
    /// be [`LAB_SCENARIO_ID`] and the roster exactly one
    /// [`LAB_ENTITY_ID`] entry. The store is untouched on rejection.
    pub fn resume(
        snapshot: SessionSnapshot,
        store: Box<dyn KeyValueStore>,
        noise: N,
        config: &SimConfig,
        hook: CompletionHook,
    ) -> Result<Self, SessionError> {
        let scenario = snapshot.scenario;
        if scenario.id() != LAB_SCENARIO_ID {
            return Err(SessionError::WrongScenario {
                expected: LAB_SCENARIO_ID.to_string(),
                found: scenario.id().to_string(),
            });
        }
        match scenario.roster() {
            [only] if only.id == LAB_ENTITY_ID => {}
            roster => {
                return Err(SessionError::WrongRoster(
                    roster.iter().map(|e| e.id.clone()).collect(),
                ))
            }
        }

        let completion = restored_completion(&scenario, snapshot.completed_at);
        let mut lab = Self {
            scenario,
            notebook: LabNotebook::from_parts(snapshot.notebook_entries, snapshot.hypothesis),
            store,
            noise,
            goal: config.goal(),
            hook,
            completion,
        };
        lab.persist();
        Ok(lab)
    }

    pub fn begin(&mut self) -> Phase {
        let before = self.scenario.phase();
        let phase = self.scenario.begin();
        log_phase_change(&self.scenario, before);
        phase
    }

    /// Run one experiment and count it as an attempt.
    ///
    /// The run is recorded in the notebook before it is scored, so even
    /// a failed persist leaves the entry available in memory.
    pub fn run(&mut self, vars: ExperimentVariables, comment: &str) -> Result<LabRun, LabError> {
        match self.scenario.phase() {
            Phase::Welcome => return Err(LabError::NotStarted),
            Phase::Results => return Err(LabError::Finished),
            Phase::Interaction { .. } => {}
        }
        let issues = validate_variables(&vars);
        if !issues.is_empty() {
            return Err(LabError::InvalidVariables(issues));
        }

        let output = run_experiment(&vars, &mut self.noise);
        let evaluation = evaluate_run(&output, &self.goal);
        log::debug!(
            "lab run: purity {:.1}, levitation {:.2}, success={}",
            output.purity,
            output.levitation_height,
            evaluation.success
        );

        let entry_id = self.notebook.record(vars, output, comment).id;
        let persisted = self.persist();

        let before = self.scenario.phase();
        let transition = self
            .scenario
            .submit(comment, evaluation.clone())
            .ok_or(LabError::Finished)?;
        log_phase_change(&self.scenario, before);
        settle(&self.scenario, &mut self.hook, &mut self.completion);

        Ok(LabRun {
            entry_id,
            output,
            evaluation,
            transition,
            persisted,
        })
    }

    /// Replace the hypothesis. Returns whether it reached the store.
    pub fn set_hypothesis(&mut self, text: &str) -> bool {
        self.notebook.set_hypothesis(text);
        self.persist()
    }

    /// Delete a notebook entry. Returns false if no entry had that id.
    pub fn delete_entry(&mut self, id: Uuid) -> bool {
        if !self.notebook.delete(id) {
            return false;
        }
        self.persist();
        true
    }

    pub fn export_csv(&self) -> String {
        self.notebook.to_csv()
    }

    pub fn notebook(&self) -> &LabNotebook {
        &self.notebook
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn goal(&self) -> ExperimentGoal {
        self.goal
    }

    pub fn runs_remaining(&self) -> u32 {
        self.scenario
            .entity(LAB_ENTITY_ID)
            .map(|e| e.attempts_remaining())
            .unwrap_or(0)
    }

    pub fn completion(&self) -> Option<&CompletionPayload> {
        self.completion.as_ref()
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(
            self.scenario.clone(),
            self.notebook.entries().to_vec(),
            self.notebook.hypothesis().to_string(),
        )
        .with_completed_at(self.completion.as_ref().map(|p| p.completed_at))
    }

    fn persist(&mut self) -> bool {
        self.notebook.persist(self.store.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use careersim_logic::attempts::Outcome;
    use careersim_logic::experiment::NoNoise;
    use std::cell::Cell;
    use std::rc::Rc;

    fn lab(config: &SimConfig) -> MaterialsLab<NoNoise> {
        MaterialsLab::open(
            Box::new(MemoryStore::new()),
            NoNoise,
            config,
            CompletionHook::none(),
        )
    }

    #[test]
    fn lab_requires_begin() {
        let mut l = lab(&SimConfig::default());
        assert!(matches!(
            l.run(ExperimentVariables::optimal(), ""),
            Err(LabError::NotStarted)
        ));
    }

    #[test]
    fn optimal_run_succeeds_first_time() {
        let mut l = lab(&SimConfig::default());
        l.begin();
        let run = l.run(ExperimentVariables::optimal(), "textbook").unwrap();
        assert_eq!(run.transition, Transition::Succeeded);
        assert!(run.persisted);
        assert_eq!(l.scenario().phase(), Phase::Results);
        assert!(l.completion().unwrap().passed);
        assert!(matches!(
            l.run(ExperimentVariables::optimal(), ""),
            Err(LabError::Finished)
        ));
    }

    #[test]
    fn default_runs_exhaust_attempts() {
        let config = SimConfig {
            lab_max_runs: 2,
            ..SimConfig::default()
        };
        let mut l = lab(&config);
        l.begin();
        let first = l.run(ExperimentVariables::default(), "baseline").unwrap();
        assert_eq!(first.transition, Transition::RetryAvailable { remaining: 1 });
        assert_eq!(l.runs_remaining(), 1);
        let second = l.run(ExperimentVariables::default(), "again").unwrap();
        assert_eq!(second.transition, Transition::Exhausted);
        let payload = l.completion().unwrap();
        assert_eq!(payload.outcomes[LAB_ENTITY_ID], Outcome::Failure);
        assert!(!payload.passed);
        assert_eq!(l.notebook().len(), 2);
    }

    #[test]
    fn invalid_variables_do_not_use_an_attempt() {
        let mut l = lab(&SimConfig::default());
        l.begin();
        let vars = ExperimentVariables {
            temperature_c: 5000.0,
            ..ExperimentVariables::optimal()
        };
        assert!(matches!(
            l.run(vars, ""),
            Err(LabError::InvalidVariables(_))
        ));
        assert_eq!(l.runs_remaining(), 4);
        assert!(l.notebook().is_empty());
    }

    #[test]
    fn delete_and_hypothesis_persist() {
        let mut l = lab(&SimConfig::default());
        l.begin();
        let id = l.run(ExperimentVariables::default(), "x").unwrap().entry_id;
        assert!(l.set_hypothesis("Silver oxide helps"));
        assert!(l.delete_entry(id));
        assert!(!l.delete_entry(id));
        let reloaded = LabNotebook::load(l.store());
        assert!(reloaded.is_empty());
        assert_eq!(reloaded.hypothesis(), "Silver oxide helps");
    }

    #[test]
    fn government_hook_fires_once() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let hook = CompletionHook::new(move |_| c.set(c.get() + 1));
        let mut s = GovernmentSession::standard(3, hook);
        assert_eq!(s.respond("hello"), None);
        s.begin();
        while !s.scenario().is_complete() {
            s.respond("not much to say");
        }
        assert_eq!(s.respond("too late"), None);
        assert_eq!(count.get(), 1);
        assert!(!s.completion().unwrap().passed);
    }

    #[test]
    fn missing_rules_rejected() {
        let scenario = Scenario::new("x", government_roster(), 3);
        let err = GovernmentSession::new(scenario, RuleTable::default(), CompletionHook::none())
            .unwrap_err();
        match err {
            SessionError::MissingRules(ids) => assert_eq!(ids.len(), 5),
            other => panic!("expected missing rules, got {other}"),
        }
    }

    #[test]
    fn entity_ids_must_not_shadow_payload_fields() {
        let roster = vec![
            EntitySpec::new("mayor", "Mayor", 1),
            EntitySpec::new("attempts", "Attempts Office", 2),
        ];
        let mut rules = government_rules();
        let mut shadow = rules.get("mayor").unwrap().clone();
        shadow.entity_id = "attempts".into();
        rules.rules.push(shadow);
        let scenario = Scenario::new("x", roster, 1);
        match GovernmentSession::new(scenario, rules, CompletionHook::none()) {
            Err(SessionError::ReservedIds(ids)) => assert_eq!(ids, vec!["attempts"]),
            other => panic!("expected reserved ids, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn lab_rejects_foreign_roster() {
        let roster = vec![
            EntitySpec::new(LAB_ENTITY_ID, "Synthesis", 4),
            EntitySpec::new("mayor", "Mayor", 1),
        ];
        let snapshot = SessionSnapshot::new(
            Scenario::new(LAB_SCENARIO_ID, roster, 1),
            Vec::new(),
            String::new(),
        );
        let result = MaterialsLab::resume(
            snapshot,
            Box::new(MemoryStore::new()),
            NoNoise,
            &SimConfig::default(),
            CompletionHook::none(),
        );
        match result {
            Err(SessionError::WrongRoster(ids)) => {
                assert_eq!(ids, vec![LAB_ENTITY_ID, "mayor"]);
            }
            other => panic!("expected wrong roster, got {:?}", other.map(|_| ())),
        }
    }
}
