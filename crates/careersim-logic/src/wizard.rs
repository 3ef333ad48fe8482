//! Multi-step form tasks.
//!
//! Every career task is a wizard: a sequence of steps, each with a few
//! fields. A step can only be left forwards once its required fields are
//! filled (non-empty after trimming) and valid for their kind. This is the
//! same gate the UI uses to enable or disable its "Next" button.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Career track a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Track {
    Marketing,
    Finance,
    Government,
    MaterialsScience,
}

impl Track {
    pub const ALL: [Track; 4] = [
        Track::Marketing,
        Track::Finance,
        Track::Government,
        Track::MaterialsScience,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Track::Marketing => "Marketing",
            Track::Finance => "Finance",
            Track::Government => "Government",
            Track::MaterialsScience => "Materials Science",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldKind {
    FreeText { min_chars: usize },
    Choice { options: Vec<String> },
    Number { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub fn text(key: &str, label: &str, min_chars: usize) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::FreeText { min_chars },
            required: true,
        }
    }

    pub fn choice(key: &str, label: &str, options: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Choice {
                options: options.iter().map(|s| s.to_string()).collect(),
            },
            required: true,
        }
    }

    pub fn number(key: &str, label: &str, min: f64, max: f64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Number { min, max },
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Check one value against this field.
    pub fn check(&self, value: Option<&str>) -> Option<FieldIssue> {
        let trimmed = value.map(str::trim).unwrap_or("");
        if trimmed.is_empty() {
            return if self.required {
                Some(FieldIssue::new(&self.key, IssueKind::Missing))
            } else {
                None
            };
        }
        let kind = match &self.kind {
            FieldKind::FreeText { min_chars } => {
                let n = trimmed.chars().count();
                (n < *min_chars).then_some(IssueKind::TooShort {
                    min_chars: *min_chars,
                    actual: n,
                })
            }
            FieldKind::Choice { options } => (!options.iter().any(|o| o == trimmed))
                .then(|| IssueKind::NotAnOption(trimmed.to_string())),
            FieldKind::Number { min, max } => match trimmed.parse::<f64>() {
                Ok(v) if v >= *min && v <= *max => None,
                Ok(v) => Some(IssueKind::OutOfRange {
                    min: *min,
                    max: *max,
                    actual: v,
                }),
                Err(_) => Some(IssueKind::NotANumber),
            },
        };
        kind.map(|k| FieldIssue::new(&self.key, k))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IssueKind {
    Missing,
    TooShort { min_chars: usize, actual: usize },
    NotAnOption(String),
    NotANumber,
    OutOfRange { min: f64, max: f64, actual: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub key: String,
    pub kind: IssueKind,
}

impl FieldIssue {
    fn new(key: &str, kind: IssueKind) -> Self {
        Self {
            key: key.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    pub fields: Vec<Field>,
}

impl Step {
    pub fn new(title: &str, fields: Vec<Field>) -> Self {
        Self {
            title: title.to_string(),
            fields,
        }
    }
}

/// Answers collected by a finished wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSubmission {
    pub track: Track,
    pub task: String,
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskWizard {
    track: Track,
    task: String,
    steps: Vec<Step>,
    answers: BTreeMap<String, String>,
    current: usize,
}

impl TaskWizard {
    pub fn new(track: Track, task: &str, steps: Vec<Step>) -> Self {
        Self {
            track,
            task: task.to_string(),
            steps,
            answers: BTreeMap::new(),
            current: 0,
        }
    }

    pub fn track(&self) -> Track {
        self.track
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn step(&self) -> Option<&Step> {
        self.steps.get(self.current)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    /// Store an answer. Unknown keys are rejected.
    pub fn set_answer(&mut self, key: &str, value: &str) -> bool {
        let known = self
            .steps
            .iter()
            .any(|s| s.fields.iter().any(|f| f.key == key));
        if known {
            self.answers.insert(key.to_string(), value.to_string());
        }
        known
    }

    pub fn answer(&self, key: &str) -> Option<&str> {
        self.answers.get(key).map(|s| s.as_str())
    }

    pub fn issues_for_step(&self, index: usize) -> Vec<FieldIssue> {
        self.steps
            .get(index)
            .map(|s| {
                s.fields
                    .iter()
                    .filter_map(|f| f.check(self.answer(&f.key)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn can_advance(&self) -> bool {
        self.issues_for_step(self.current).is_empty()
    }

    /// Move forward one step if the current step is valid.
    pub fn advance(&mut self) -> Result<usize, Vec<FieldIssue>> {
        let issues = self.issues_for_step(self.current);
        if !issues.is_empty() {
            return Err(issues);
        }
        if !self.is_last_step() {
            self.current += 1;
        }
        Ok(self.current)
    }

    pub fn back(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    /// Validate every step and hand back the trimmed answers.
    pub fn finish(&self) -> Result<WizardSubmission, Vec<FieldIssue>> {
        let issues: Vec<FieldIssue> = (0..self.steps.len())
            .flat_map(|i| self.issues_for_step(i))
            .collect();
        if !issues.is_empty() {
            return Err(issues);
        }
        let answers = self
            .answers
            .iter()
            .map(|(k, v)| (k.clone(), v.trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        Ok(WizardSubmission {
            track: self.track,
            task: self.task.clone(),
            answers,
        })
    }
}

/// Marketing: plan a product launch campaign.
pub fn marketing_campaign_brief() -> TaskWizard {
    TaskWizard::new(
        Track::Marketing,
        "campaign_brief",
        vec![
            Step::new(
                "Audience",
                vec![
                    Field::text("target_audience", "Who is the campaign for?", 10),
                    Field::choice(
                        "channel",
                        "Primary channel",
                        &["Social Media", "Email", "Events", "Print"],
                    ),
                ],
            ),
            Step::new(
                "Message",
                vec![
                    Field::text("key_message", "Key message", 15),
                    Field::text("slogan", "Slogan", 3).optional(),
                ],
            ),
            Step::new(
                "Budget",
                vec![Field::number("budget", "Campaign budget ($)", 500.0, 50_000.0)],
            ),
        ],
    )
}

/// Finance: allocate a quarterly department budget.
pub fn finance_budget_plan() -> TaskWizard {
    TaskWizard::new(
        Track::Finance,
        "budget_plan",
        vec![
            Step::new(
                "Allocation",
                vec![
                    Field::number("salaries_pct", "Salaries (%)", 0.0, 100.0),
                    Field::number("operations_pct", "Operations (%)", 0.0, 100.0),
                    Field::number("reserve_pct", "Reserve (%)", 0.0, 100.0),
                ],
            ),
            Step::new(
                "Justification",
                vec![Field::text("rationale", "Explain your allocation", 30)],
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_required_blocks_advance() {
        let mut w = marketing_campaign_brief();
        assert!(!w.can_advance());
        let issues = w.advance().unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::Missing));
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let mut w = marketing_campaign_brief();
        w.set_answer("target_audience", "     ");
        w.set_answer("channel", "Email");
        let issues = w.issues_for_step(0);
        assert_eq!(issues, vec![FieldIssue::new("target_audience", IssueKind::Missing)]);
    }

    #[test]
    fn walk_through_marketing() {
        let mut w = marketing_campaign_brief();
        w.set_answer("target_audience", "University students in the city");
        w.set_answer("channel", "Social Media");
        assert_eq!(w.advance(), Ok(1));
        w.set_answer("key_message", "Sustainable style that lasts");
        assert_eq!(w.advance(), Ok(2));
        w.set_answer("budget", "abc");
        assert_eq!(
            w.advance(),
            Err(vec![FieldIssue::new("budget", IssueKind::NotANumber)])
        );
        w.set_answer("budget", " 2500 ");
        assert!(w.is_last_step());
        assert_eq!(w.advance(), Ok(2));
        let sub = w.finish().unwrap();
        assert_eq!(sub.track, Track::Marketing);
        assert_eq!(sub.answers["budget"], "2500");
        assert!(!sub.answers.contains_key("slogan"));
    }

    #[test]
    fn unknown_choice_rejected() {
        let f = Field::choice("c", "C", &["A", "B"]);
        assert_eq!(
            f.check(Some("Z")),
            Some(FieldIssue::new("c", IssueKind::NotAnOption("Z".into())))
        );
        assert_eq!(f.check(Some(" A ")), None);
    }

    #[test]
    fn number_range() {
        let f = Field::number("n", "N", 0.0, 100.0);
        assert!(f.check(Some("50")).is_none());
        assert!(matches!(
            f.check(Some("150")).unwrap().kind,
            IssueKind::OutOfRange { .. }
        ));
    }

    #[test]
    fn text_min_chars() {
        let f = Field::text("t", "T", 5);
        assert!(matches!(
            f.check(Some("abc")).unwrap().kind,
            IssueKind::TooShort { min_chars: 5, actual: 3 }
        ));
    }

    #[test]
    fn unknown_key_ignored() {
        let mut w = finance_budget_plan();
        assert!(!w.set_answer("nope", "x"));
        assert!(w.answer("nope").is_none());
    }

    #[test]
    fn back_stops_at_zero() {
        let mut w = finance_budget_plan();
        assert_eq!(w.back(), 0);
    }

    #[test]
    fn finish_reports_all_steps() {
        let w = finance_budget_plan();
        assert_eq!(w.finish().unwrap_err().len(), 4);
    }
}
