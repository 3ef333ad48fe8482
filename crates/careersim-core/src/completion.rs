//! Completion boundary between a scenario and its host.
//!
//! When a scenario reaches its results screen the host is handed a
//! [`CompletionPayload`] exactly once. The payload serializes to the JSON
//! shape the host page expects:
//!
//! ```json
//! {
//!   "mayor": "success",
//!   "city_council": "failure",
//!   "attempts": 7,
//!   "freeTextArtifacts": { "mayor": ["..."] },
//!   "passed": true,
//!   "completedAt": "2026-03-14T09:30:00Z"
//! }
//! ```
//!
//! Entity ids share the top level with the fixed fields, so the ids in
//! [`RESERVED_KEYS`] cannot be used in a roster.

use careersim_logic::attempts::{EntitySpec, Outcome};
use careersim_logic::scenario::Scenario;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed top-level payload keys.
pub const RESERVED_KEYS: [&str; 4] = ["attempts", "freeTextArtifacts", "passed", "completedAt"];

/// Roster ids that would collide with a fixed payload key.
pub fn reserved_ids(roster: &[EntitySpec]) -> Vec<String> {
    roster
        .iter()
        .filter(|e| RESERVED_KEYS.contains(&e.id.as_str()))
        .map(|e| e.id.clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    /// entity id → final outcome, inlined at the top level.
    #[serde(flatten)]
    pub outcomes: BTreeMap<String, Outcome>,
    pub attempts: u32,
    pub free_text_artifacts: BTreeMap<String, Vec<String>>,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

impl CompletionPayload {
    pub fn from_scenario(scenario: &Scenario, completed_at: DateTime<Utc>) -> Self {
        let aggregate = scenario.aggregate();
        Self {
            outcomes: aggregate
                .entities
                .iter()
                .map(|e| (e.id.clone(), e.result))
                .collect(),
            attempts: aggregate.total_attempts,
            free_text_artifacts: scenario.artifacts().clone(),
            passed: aggregate.passed,
            completed_at,
        }
    }

    pub fn successes(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| **o == Outcome::Success)
            .count()
    }
}

type Callback = Box<dyn FnOnce(CompletionPayload)>;

/// One-shot completion callback.
pub struct CompletionHook {
    callback: Option<Callback>,
    fired: bool,
}

impl CompletionHook {
    pub fn new(callback: impl FnOnce(CompletionPayload) + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            fired: false,
        }
    }

    /// Hook with no host attached; firing only flips the flag.
    pub fn none() -> Self {
        Self {
            callback: None,
            fired: false,
        }
    }

    /// Deliver the payload. Returns false if the hook already fired.
    pub fn fire(&mut self, payload: CompletionPayload) -> bool {
        if self.fired {
            log::debug!("completion already delivered, ignoring");
            return false;
        }
        self.fired = true;
        if let Some(callback) = self.callback.take() {
            callback(payload);
        }
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl Default for CompletionHook {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for CompletionHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHook")
            .field("attached", &self.callback.is_some())
            .field("fired", &self.fired)
            .finish()
    }
}
