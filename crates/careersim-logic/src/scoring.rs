//! Keyword-based scoring rules for free-text submissions.
//!
//! Every stakeholder (or any other text-scored entity) is described by a
//! [`ScoringRule`]: a base [`Requirement`] plus optional per-attempt
//! overrides. A single generic [`evaluate`] function turns a submission and
//! a 1-based attempt number into an [`Evaluation`].
//!
//! Matching is purely surface-level: case-insensitive substring hits for
//! keywords and phrases, whitespace word counts, and a few structural
//! markers (greetings, numeric vote counts).
//!
//! ```
//! use careersim_logic::scoring::{evaluate, Requirement, ScoringRule};
//!
//! let rule = ScoringRule::new(
//!     "mayor",
//!     Requirement::keywords(&["budget", "jobs", "plan"], 2, 5),
//! );
//! let eval = evaluate(&rule, "Our plan protects the budget and creates jobs", 1);
//! assert!(eval.success);
//! ```

use serde::{Deserialize, Serialize};

/// Words and phrases accepted as a greeting.
pub const GREETING_WORDS: [&str; 4] = ["hello", "hi", "dear", "greetings"];
pub const GREETING_PHRASES: [&str; 4] = [
    "good morning",
    "good afternoon",
    "good evening",
    "thank you",
];

/// A structural requirement on top of keyword and word counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    /// The submission opens politely somewhere (hello, dear, thank you...).
    Greeting,
    /// The submission mentions a vote and contains a number.
    VoteCount,
    /// At least `min` of the listed phrases appear.
    Phrases { any_of: Vec<String>, min: usize },
}

impl Marker {
    /// Build a phrase marker from string slices.
    pub fn phrases(any_of: &[&str], min: usize) -> Self {
        Marker::Phrases {
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
            min,
        }
    }

    /// Whether `text` satisfies this marker.
    pub fn is_met(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        match self {
            Marker::Greeting => {
                let has_word = tokens(&lower).any(|t| GREETING_WORDS.contains(&t));
                has_word || GREETING_PHRASES.iter().any(|p| lower.contains(p))
            }
            Marker::VoteCount => {
                lower.contains("vote")
                    && tokens(&lower).any(|t| t.chars().any(|c| c.is_ascii_digit()))
            }
            Marker::Phrases { any_of, min } => {
                let hits = any_of
                    .iter()
                    .filter(|p| lower.contains(&p.to_lowercase()))
                    .count();
                hits >= *min
            }
        }
    }

    /// Short human-readable description used in feedback.
    pub fn describe(&self) -> String {
        match self {
            Marker::Greeting => "open with a courteous greeting".to_string(),
            Marker::VoteCount => "state the expected vote count".to_string(),
            Marker::Phrases { any_of, min } => {
                if *min <= 1 {
                    format!("mention one of: {}", any_of.join(", "))
                } else {
                    format!("mention at least {} of: {}", min, any_of.join(", "))
                }
            }
        }
    }
}

/// Punctuation-stripped tokens of an already lower-cased string.
fn tokens(lower: &str) -> impl Iterator<Item = &str> {
    lower
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
}

/// Thresholds a submission must meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub keywords: Vec<String>,
    pub min_keywords: usize,
    pub min_words: usize,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl Requirement {
    /// Keyword/word-count requirement with no structural markers.
    pub fn keywords(keywords: &[&str], min_keywords: usize, min_words: usize) -> Self {
        Self {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            min_keywords,
            min_words,
            markers: Vec::new(),
        }
    }

    /// Add a structural marker.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }
}

/// Stricter thresholds from a given attempt onwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptOverride {
    /// First attempt (1-based) this override applies to.
    pub from_attempt: u32,
    #[serde(default)]
    pub min_keywords: Option<usize>,
    #[serde(default)]
    pub min_words: Option<usize>,
    #[serde(default)]
    pub extra_markers: Vec<Marker>,
}

impl AttemptOverride {
    pub fn from_attempt(attempt: u32) -> Self {
        Self {
            from_attempt: attempt,
            min_keywords: None,
            min_words: None,
            extra_markers: Vec::new(),
        }
    }

    pub fn min_keywords(mut self, n: usize) -> Self {
        self.min_keywords = Some(n);
        self
    }

    pub fn min_words(mut self, n: usize) -> Self {
        self.min_words = Some(n);
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.extra_markers.push(marker);
        self
    }
}

/// Declarative scoring rule for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub entity_id: String,
    pub base: Requirement,
    #[serde(default)]
    pub overrides: Vec<AttemptOverride>,
    #[serde(default)]
    pub success_feedback: String,
    #[serde(default)]
    pub retry_hint: String,
}

impl ScoringRule {
    pub fn new(entity_id: &str, base: Requirement) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            base,
            overrides: Vec::new(),
            success_feedback: String::new(),
            retry_hint: String::new(),
        }
    }

    pub fn with_override(mut self, o: AttemptOverride) -> Self {
        self.overrides.push(o);
        self
    }

    pub fn with_feedback(mut self, success: &str, retry_hint: &str) -> Self {
        self.success_feedback = success.to_string();
        self.retry_hint = retry_hint.to_string();
        self
    }
}

/// Result of scoring one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub success: bool,
    pub feedback: String,
}

impl Evaluation {
    pub fn pass(feedback: impl Into<String>) -> Self {
        Self {
            success: true,
            feedback: feedback.into(),
        }
    }

    pub fn fail(feedback: impl Into<String>) -> Self {
        Self {
            success: false,
            feedback: feedback.into(),
        }
    }
}

/// Raw measurements behind an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub keyword_hits: usize,
    pub words: usize,
    pub missing_markers: Vec<Marker>,
    pub requirement: Requirement,
}

impl Diagnostics {
    pub fn satisfied(&self) -> bool {
        self.keyword_hits >= self.requirement.min_keywords
            && self.words >= self.requirement.min_words
            && self.missing_markers.is_empty()
    }
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of distinct keywords present (case-insensitive substring match).
pub fn keyword_hits(text: &str, keywords: &[String]) -> usize {
    let lower = text.to_lowercase();
    let mut seen: Vec<String> = Vec::new();
    for kw in keywords {
        let k = kw.to_lowercase();
        if !k.is_empty() && !seen.contains(&k) && lower.contains(&k) {
            seen.push(k);
        }
    }
    seen.len()
}

/// Effective requirement for a 1-based attempt number.
///
/// The applicable override with the highest `from_attempt` wins for
/// thresholds; extra markers from every applicable override accumulate.
pub fn requirement_for(rule: &ScoringRule, attempt: u32) -> Requirement {
    let mut req = rule.base.clone();
    let mut applicable: Vec<&AttemptOverride> = rule
        .overrides
        .iter()
        .filter(|o| attempt >= o.from_attempt)
        .collect();
    applicable.sort_by_key(|o| o.from_attempt);

    for o in applicable {
        if let Some(n) = o.min_keywords {
            req.min_keywords = n;
        }
        if let Some(n) = o.min_words {
            req.min_words = n;
        }
        for m in &o.extra_markers {
            if !req.markers.contains(m) {
                req.markers.push(m.clone());
            }
        }
    }
    req
}

/// Measure a submission against the rule for `attempt`.
pub fn diagnose(rule: &ScoringRule, text: &str, attempt: u32) -> Diagnostics {
    let requirement = requirement_for(rule, attempt);
    let missing_markers = requirement
        .markers
        .iter()
        .filter(|m| !m.is_met(text))
        .cloned()
        .collect();
    Diagnostics {
        keyword_hits: keyword_hits(text, &requirement.keywords),
        words: word_count(text),
        missing_markers,
        requirement,
    }
}

/// Score a submission. Always returns a definite outcome.
pub fn evaluate(rule: &ScoringRule, text: &str, attempt: u32) -> Evaluation {
    let d = diagnose(rule, text, attempt);
    if d.satisfied() {
        let msg = if rule.success_feedback.is_empty() {
            format!("{} is satisfied with your response.", rule.entity_id)
        } else {
            rule.success_feedback.clone()
        };
        return Evaluation::pass(msg);
    }

    let mut gaps = Vec::new();
    if d.keyword_hits < d.requirement.min_keywords {
        gaps.push(format!(
            "address more of their concerns ({} of {} key points covered)",
            d.keyword_hits, d.requirement.min_keywords
        ));
    }
    if d.words < d.requirement.min_words {
        gaps.push(format!(
            "give more detail ({} of {} words)",
            d.words, d.requirement.min_words
        ));
    }
    for m in &d.missing_markers {
        gaps.push(m.describe());
    }

    let mut feedback = format!("Not convinced yet. You need to {}.", gaps.join("; "));
    if !rule.retry_hint.is_empty() {
        feedback.push(' ');
        feedback.push_str(&rule.retry_hint);
    }
    Evaluation::fail(feedback)
}
