//! Per-entity attempt counting and retry state.
//!
//! An entity (stakeholder or experiment) starts [`Outcome::Pending`] and
//! moves to a terminal state either on the first successful submission or
//! when its attempt allowance runs out. Terminal entities ignore further
//! submissions.
//!
//! ```
//! use careersim_logic::attempts::{EntityState, Outcome, Transition};
//! use careersim_logic::scoring::Evaluation;
//!
//! let mut e = EntityState::new("mayor", 2);
//! assert_eq!(e.submit(Evaluation::fail("no")), Transition::RetryAvailable { remaining: 1 });
//! assert_eq!(e.submit(Evaluation::pass("yes")), Transition::Succeeded);
//! assert_eq!(e.result, Outcome::Success);
//! assert_eq!(e.submit(Evaluation::pass("again")), Transition::Ignored);
//! ```

use serde::{Deserialize, Serialize};

use crate::scoring::{evaluate, Evaluation, ScoringRule};

/// Smallest and largest attempt allowance an entity can have.
pub const MIN_ATTEMPTS: u32 = 1;
pub const MAX_ATTEMPTS: u32 = 4;

/// Line appended to the history when the allowance runs out.
pub const EXHAUSTED_FEEDBACK: &str = "No attempts remaining.";

/// Tri-state entity result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pending,
    Success,
    Failure,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

/// What a submission did to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Submission passed; entity is now terminal-success.
    Succeeded,
    /// Submission failed but the entity can be tried again.
    RetryAvailable { remaining: u32 },
    /// Submission failed and no attempts remain; terminal-failure.
    Exhausted,
    /// Entity was already terminal; nothing changed.
    Ignored,
}

/// Static description of an entity in a scenario roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub id: String,
    pub display_name: String,
    pub max_attempts: u32,
}

impl EntitySpec {
    pub fn new(id: &str, display_name: &str, max_attempts: u32) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            max_attempts,
        }
    }
}

/// Mutable attempt state of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: String,
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub result: Outcome,
    /// Append-only.
    pub feedback_history: Vec<String>,
}

impl EntityState {
    /// New pending entity. `max_attempts` is clamped to 1–4.
    pub fn new(id: &str, max_attempts: u32) -> Self {
        Self {
            id: id.to_string(),
            attempt_count: 0,
            max_attempts: max_attempts.clamp(MIN_ATTEMPTS, MAX_ATTEMPTS),
            result: Outcome::Pending,
            feedback_history: Vec::new(),
        }
    }

    pub fn from_spec(spec: &EntitySpec) -> Self {
        Self::new(&spec.id, spec.max_attempts)
    }

    pub fn is_terminal(&self) -> bool {
        self.result.is_terminal()
    }

    pub fn attempts_remaining(&self) -> u32 {
        if self.is_terminal() {
            0
        } else {
            self.max_attempts.saturating_sub(self.attempt_count)
        }
    }

    /// 1-based number the next submission would carry.
    pub fn next_attempt(&self) -> u32 {
        self.attempt_count + 1
    }

    /// Most recent feedback line, if any.
    pub fn latest_feedback(&self) -> Option<&str> {
        self.feedback_history.last().map(|s| s.as_str())
    }

    /// Apply an already-computed evaluation as the next attempt.
    pub fn submit(&mut self, evaluation: Evaluation) -> Transition {
        if self.is_terminal() || self.attempt_count >= self.max_attempts {
            return Transition::Ignored;
        }

        self.attempt_count += 1;
        self.feedback_history.push(evaluation.feedback);

        if evaluation.success {
            self.result = Outcome::Success;
            return Transition::Succeeded;
        }

        let remaining = self.max_attempts - self.attempt_count;
        if remaining == 0 {
            self.result = Outcome::Failure;
            self.feedback_history.push(EXHAUSTED_FEEDBACK.to_string());
            Transition::Exhausted
        } else {
            Transition::RetryAvailable { remaining }
        }
    }

    /// Score `text` against `rule` for the next attempt and apply it.
    pub fn submit_response(&mut self, rule: &ScoringRule, text: &str) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }
        let evaluation = evaluate(rule, text, self.next_attempt());
        self.submit(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Requirement;

    #[test]
    fn clamps_max_attempts() {
        assert_eq!(EntityState::new("a", 0).max_attempts, 1);
        assert_eq!(EntityState::new("a", 9).max_attempts, 4);
        assert_eq!(EntityState::new("a", 3).max_attempts, 3);
    }

    #[test]
    fn attempt_count_never_exceeds_max() {
        for max in 1..=4 {
            for n in 0..8u32 {
                let mut e = EntityState::new("x", max);
                for _ in 0..n {
                    e.submit(Evaluation::fail("nope"));
                }
                assert_eq!(e.attempt_count, n.min(max));
            }
        }
    }

    #[test]
    fn success_is_terminal() {
        let mut e = EntityState::new("x", 3);
        assert_eq!(e.submit(Evaluation::pass("ok")), Transition::Succeeded);
        assert_eq!(e.submit(Evaluation::fail("late")), Transition::Ignored);
        assert_eq!(e.result, Outcome::Success);
        assert_eq!(e.attempt_count, 1);
        assert_eq!(e.feedback_history, vec!["ok".to_string()]);
    }

    #[test]
    fn exhaustion_is_terminal_failure() {
        let mut e = EntityState::new("x", 2);
        assert_eq!(
            e.submit(Evaluation::fail("one")),
            Transition::RetryAvailable { remaining: 1 }
        );
        assert_eq!(e.submit(Evaluation::fail("two")), Transition::Exhausted);
        assert_eq!(e.result, Outcome::Failure);
        assert_eq!(e.latest_feedback(), Some(EXHAUSTED_FEEDBACK));
        assert_eq!(e.submit(Evaluation::pass("three")), Transition::Ignored);
        assert_eq!(e.result, Outcome::Failure);
        assert_eq!(e.attempts_remaining(), 0);
    }

    #[test]
    fn single_chance_entity() {
        let mut e = EntityState::new("x", 1);
        assert_eq!(e.submit(Evaluation::fail("no")), Transition::Exhausted);
    }

    #[test]
    fn history_is_append_only() {
        let mut e = EntityState::new("x", 3);
        e.submit(Evaluation::fail("a"));
        e.submit(Evaluation::fail("b"));
        e.submit(Evaluation::pass("c"));
        assert_eq!(e.feedback_history, vec!["a", "b", "c"]);
    }

    #[test]
    fn submit_response_uses_attempt_number() {
        let rule = ScoringRule::new("x", Requirement::keywords(&["plan"], 1, 1)).with_override(
            crate::scoring::AttemptOverride::from_attempt(2).min_words(3),
        );
        let mut e = EntityState::new("x", 3);
        // attempt 1 fails on keywords
        assert!(matches!(
            e.submit_response(&rule, "nothing"),
            Transition::RetryAvailable { .. }
        ));
        // attempt 2 now needs 3 words
        assert!(matches!(
            e.submit_response(&rule, "a plan"),
            Transition::RetryAvailable { .. }
        ));
        assert_eq!(e.submit_response(&rule, "a good plan"), Transition::Succeeded);
    }

    #[test]
    fn remaining_counts_down() {
        let mut e = EntityState::new("x", 4);
        assert_eq!(e.attempts_remaining(), 4);
        e.submit(Evaluation::fail("a"));
        assert_eq!(e.attempts_remaining(), 3);
        assert_eq!(e.next_attempt(), 2);
    }
}
