//! Government simulation: stakeholder roster and scoring table.
//!
//! The student drafts responses to five stakeholders about a proposed
//! clean-transit ordinance. Each stakeholder has its own keyword set,
//! thresholds and allowance. These are intentionally not unified:
//! some require a greeting, the council requires a vote count, and
//! later attempts may demand specific phrases.
//!
//! | Stakeholder | Attempts | Extra requirements |
//! |-------------|----------|--------------------|
//! | Mayor | 1 | — |
//! | Environmental Coalition | 3 | phrase from attempt 2 |
//! | Business Association | 2 | 3 keywords + phrase from attempt 2 |
//! | Residents Association | 3 | greeting; 20 words from attempt 3 |
//! | City Council | 2 | vote count |

use serde::{Deserialize, Serialize};

use crate::attempts::EntitySpec;
use crate::scoring::{AttemptOverride, Marker, Requirement, ScoringRule};

/// Successes (out of five) needed to pass the government scenario.
pub const GOVERNMENT_PASS_THRESHOLD: usize = 3;

/// Scenario id reported in completion payloads.
pub const GOVERNMENT_SCENARIO_ID: &str = "government_policy";

/// Lookup table from entity id to scoring rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub rules: Vec<ScoringRule>,
}

impl RuleTable {
    pub fn get(&self, entity_id: &str) -> Option<&ScoringRule> {
        self.rules.iter().find(|r| r.entity_id == entity_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Ids present in `roster` that have no rule.
    pub fn missing_for(&self, roster: &[EntitySpec]) -> Vec<String> {
        roster
            .iter()
            .filter(|e| self.get(&e.id).is_none())
            .map(|e| e.id.clone())
            .collect()
    }
}

/// Stakeholders in the order they are approached.
pub fn government_roster() -> Vec<EntitySpec> {
    vec![
        EntitySpec::new("mayor", "Mayor", 1),
        EntitySpec::new("environmental_coalition", "Environmental Coalition", 3),
        EntitySpec::new("business_association", "Business Association", 2),
        EntitySpec::new("residents_association", "Residents Association", 3),
        EntitySpec::new("city_council", "City Council", 2),
    ]
}

/// Scoring rules for every stakeholder in [`government_roster`].
pub fn government_rules() -> RuleTable {
    let mayor = ScoringRule::new(
        "mayor",
        Requirement::keywords(
            &["budget", "cost", "jobs", "economy", "community", "benefit", "plan"],
            2,
            10,
        ),
    )
    .with_feedback(
        "The Mayor appreciates the focus on costs and local benefits and will back the proposal.",
        "The Mayor wants to hear how this affects the city budget and jobs.",
    );

    let environmental = ScoringRule::new(
        "environmental_coalition",
        Requirement::keywords(
            &[
                "emissions",
                "sustainable",
                "environment",
                "green",
                "climate",
                "pollution",
                "renewable",
            ],
            2,
            10,
        ),
    )
    .with_override(AttemptOverride::from_attempt(2).marker(Marker::phrases(
        &["carbon reduction", "air quality", "clean energy"],
        1,
    )))
    .with_feedback(
        "The coalition is convinced the ordinance delivers real environmental gains.",
        "Be concrete about measurable outcomes such as air quality or carbon reduction.",
    );

    let business = ScoringRule::new(
        "business_association",
        Requirement::keywords(
            &[
                "tax",
                "incentive",
                "revenue",
                "growth",
                "investment",
                "jobs",
                "partnership",
            ],
            2,
            12,
        ),
    )
    .with_override(
        AttemptOverride::from_attempt(2)
            .min_keywords(3)
            .marker(Marker::phrases(
                &["tax incentive", "public-private partnership", "small business"],
                1,
            )),
    )
    .with_feedback(
        "The Business Association sees a path to growth and signs on.",
        "Explain what is in it for local firms, e.g. a tax incentive or small business support.",
    );

    let residents = ScoringRule::new(
        "residents_association",
        Requirement::keywords(
            &[
                "safety",
                "neighborhood",
                "families",
                "traffic",
                "parks",
                "community",
                "residents",
            ],
            2,
            10,
        )
        .with_marker(Marker::Greeting),
    )
    .with_override(AttemptOverride::from_attempt(3).min_words(20))
    .with_feedback(
        "The residents feel heard and support the plan.",
        "Residents expect a courteous tone and detail on neighborhood impact.",
    );

    let council = ScoringRule::new(
        "city_council",
        Requirement::keywords(
            &[
                "vote",
                "majority",
                "amendment",
                "ordinance",
                "approve",
                "support",
                "council",
            ],
            2,
            10,
        )
        .with_marker(Marker::VoteCount),
    )
    .with_feedback(
        "The council schedules the ordinance for a vote with a clear majority.",
        "Show your whip count: how many votes do you expect?",
    );

    RuleTable {
        rules: vec![mayor, environmental, business, residents, council],
    }
}
