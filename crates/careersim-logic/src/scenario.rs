//! Scenario progression: welcome → one entity at a time → results.
//!
//! A [`Scenario`] owns the attempt state of every entity in its roster and
//! only moves to the next entity once the current one is terminal. When
//! the last entity is terminal the scenario enters [`Phase::Results`] and
//! the [`ScenarioAggregate`] becomes final.
//!
//! ```
//! use careersim_logic::attempts::EntitySpec;
//! use careersim_logic::scenario::{Phase, Scenario};
//! use careersim_logic::scoring::Evaluation;
//!
//! let roster = vec![EntitySpec::new("a", "A", 1), EntitySpec::new("b", "B", 1)];
//! let mut s = Scenario::new("demo", roster, 1);
//! s.begin();
//! s.submit("first answer", Evaluation::pass("ok"));
//! assert_eq!(s.phase(), Phase::Interaction { index: 1 });
//! s.submit("second answer", Evaluation::fail("no"));
//! assert!(s.is_complete());
//! assert!(s.aggregate().passed);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::attempts::{EntitySpec, EntityState, Outcome, Transition};
use crate::scoring::Evaluation;

/// Which screen the scenario is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Welcome,
    Interaction { index: usize },
    Results,
}

/// Final per-entity line in the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: String,
    pub result: Outcome,
    pub attempts: u32,
}

/// Counts of entities by result plus the pass/fail verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioAggregate {
    pub scenario_id: String,
    pub successes: usize,
    pub failures: usize,
    pub pending: usize,
    pub total_attempts: u32,
    pub pass_threshold: usize,
    pub passed: bool,
    pub entities: Vec<EntitySummary>,
}

/// Pass/fail verdict from a list of results.
pub fn passes_threshold(results: &[Outcome], threshold: usize) -> bool {
    results.iter().filter(|r| **r == Outcome::Success).count() >= threshold
}

/// Linear scenario over a fixed roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    id: String,
    roster: Vec<EntitySpec>,
    entities: Vec<EntityState>,
    phase: Phase,
    pass_threshold: usize,
    /// entity id → free-text submissions in order.
    artifacts: BTreeMap<String, Vec<String>>,
}

impl Scenario {
    pub fn new(id: &str, roster: Vec<EntitySpec>, pass_threshold: usize) -> Self {
        let entities = roster.iter().map(EntityState::from_spec).collect();
        Self {
            id: id.to_string(),
            roster,
            entities,
            phase: Phase::Welcome,
            pass_threshold,
            artifacts: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn roster(&self) -> &[EntitySpec] {
        &self.roster
    }

    pub fn entities(&self) -> &[EntityState] {
        &self.entities
    }

    pub fn entity(&self, id: &str) -> Option<&EntityState> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn artifacts(&self) -> &BTreeMap<String, Vec<String>> {
        &self.artifacts
    }

    pub fn pass_threshold(&self) -> usize {
        self.pass_threshold
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Results
    }

    /// Leave the welcome screen. No-op in any other phase.
    pub fn begin(&mut self) -> Phase {
        if self.phase == Phase::Welcome {
            self.phase = self.first_open_from(0);
        }
        self.phase
    }

    /// Entity currently being interacted with.
    pub fn current(&self) -> Option<&EntityState> {
        match self.phase {
            Phase::Interaction { index } => self.entities.get(index),
            _ => None,
        }
    }

    /// Spec of the entity currently being interacted with.
    pub fn current_spec(&self) -> Option<&EntitySpec> {
        match self.phase {
            Phase::Interaction { index } => self.roster.get(index),
            _ => None,
        }
    }

    /// Record a submission for the current entity.
    ///
    /// Returns `None` when no entity is active (welcome or results).
    /// Advances the phase once the current entity is terminal.
    pub fn submit(&mut self, artifact: &str, evaluation: Evaluation) -> Option<Transition> {
        let index = match self.phase {
            Phase::Interaction { index } => index,
            _ => return None,
        };
        let entity = self.entities.get_mut(index)?;
        let transition = entity.submit(evaluation);

        if transition != Transition::Ignored {
            self.artifacts
                .entry(entity.id.clone())
                .or_default()
                .push(artifact.to_string());
        }

        if entity.is_terminal() {
            self.phase = self.first_open_from(index + 1);
        }
        Some(transition)
    }

    /// First non-terminal entity at or after `start`, or results.
    fn first_open_from(&self, start: usize) -> Phase {
        self.entities
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, e)| !e.is_terminal())
            .map(|(index, _)| Phase::Interaction { index })
            .unwrap_or(Phase::Results)
    }

    /// Snapshot of outcomes so far; final once [`is_complete`](Self::is_complete).
    pub fn aggregate(&self) -> ScenarioAggregate {
        let mut successes = 0;
        let mut failures = 0;
        let mut pending = 0;
        for e in &self.entities {
            match e.result {
                Outcome::Success => successes += 1,
                Outcome::Failure => failures += 1,
                Outcome::Pending => pending += 1,
            }
        }
        ScenarioAggregate {
            scenario_id: self.id.clone(),
            successes,
            failures,
            pending,
            total_attempts: self.entities.iter().map(|e| e.attempt_count).sum(),
            pass_threshold: self.pass_threshold,
            passed: successes >= self.pass_threshold,
            entities: self
                .entities
                .iter()
                .map(|e| EntitySummary {
                    id: e.id.clone(),
                    result: e.result,
                    attempts: e.attempt_count,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five() -> Vec<EntitySpec> {
        (0..5)
            .map(|i| EntitySpec::new(&format!("e{}", i), &format!("E{}", i), 2))
            .collect()
    }

    #[test]
    fn starts_on_welcome() {
        let s = Scenario::new("s", five(), 3);
        assert_eq!(s.phase(), Phase::Welcome);
        assert!(s.current().is_none());
    }

    #[test]
    fn submit_before_begin_is_rejected() {
        let mut s = Scenario::new("s", five(), 3);
        assert_eq!(s.submit("x", Evaluation::pass("ok")), None);
        assert!(s.artifacts().is_empty());
    }

    #[test]
    fn empty_roster_goes_straight_to_results() {
        let mut s = Scenario::new("s", vec![], 0);
        assert_eq!(s.begin(), Phase::Results);
        assert!(s.aggregate().passed);
    }

    #[test]
    fn retry_stays_on_entity() {
        let mut s = Scenario::new("s", five(), 3);
        s.begin();
        assert_eq!(
            s.submit("a", Evaluation::fail("no")),
            Some(Transition::RetryAvailable { remaining: 1 })
        );
        assert_eq!(s.phase(), Phase::Interaction { index: 0 });
        assert_eq!(s.submit("b", Evaluation::fail("no")), Some(Transition::Exhausted));
        assert_eq!(s.phase(), Phase::Interaction { index: 1 });
        assert_eq!(s.artifacts()["e0"], vec!["a".to_string(), "b".to_string()]);
    }

    fn run(outcomes: &[bool], threshold: usize) -> ScenarioAggregate {
        let roster = (0..outcomes.len())
            .map(|i| EntitySpec::new(&format!("e{}", i), "E", 1))
            .collect();
        let mut s = Scenario::new("s", roster, threshold);
        s.begin();
        for &ok in outcomes {
            let eval = if ok {
                Evaluation::pass("ok")
            } else {
                Evaluation::fail("no")
            };
            s.submit("answer", eval);
        }
        assert!(s.is_complete());
        s.aggregate()
    }

    #[test]
    fn three_of_five_passes() {
        let agg = run(&[true, false, true, false, true], 3);
        assert_eq!(agg.successes, 3);
        assert_eq!(agg.failures, 2);
        assert_eq!(agg.pending, 0);
        assert!(agg.passed);
        assert_eq!(agg.total_attempts, 5);
    }

    #[test]
    fn two_of_five_fails() {
        let agg = run(&[true, false, false, false, true], 3);
        assert!(!agg.passed);
    }

    #[test]
    fn all_sequences_match_threshold() {
        for mask in 0u32..32 {
            let outcomes: Vec<bool> = (0..5).map(|i| mask & (1 << i) != 0).collect();
            let agg = run(&outcomes, 3);
            assert_eq!(agg.passed, mask.count_ones() >= 3, "mask {:05b}", mask);
        }
    }

    #[test]
    fn submissions_after_results_ignored() {
        let mut s = Scenario::new("s", vec![EntitySpec::new("a", "A", 1)], 1);
        s.begin();
        s.submit("x", Evaluation::pass("ok"));
        assert!(s.is_complete());
        assert_eq!(s.submit("y", Evaluation::pass("ok")), None);
        assert_eq!(s.aggregate().total_attempts, 1);
    }

    #[test]
    fn passes_threshold_helper() {
        use Outcome::*;
        assert!(passes_threshold(&[Success, Success, Success, Failure, Failure], 3));
        assert!(!passes_threshold(&[Success, Success, Pending, Failure, Failure], 3));
    }
}
