//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```
//! use careersim_core::config::SimConfig;
//!
//! let cfg = SimConfig::from_json_str(r#"{ "seed": 7, "labMaxRuns": 3 }"#).unwrap();
//! assert_eq!(cfg.seed, Some(7));
//! assert_eq!(cfg.lab_max_runs, 3);
//! assert!(cfg.noise);
//! ```

use careersim_logic::attempts::{MAX_ATTEMPTS, MIN_ATTEMPTS};
use careersim_logic::experiment::{
    ExperimentGoal, DEFAULT_LAB_RUNS, LEVITATION_RANGE, PURITY_RANGE,
};
use careersim_logic::government::{government_roster, GOVERNMENT_PASS_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::noise::SessionNoise;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    /// Seed for experiment noise; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Whether lab runs carry random variance at all.
    pub noise: bool,
    /// Directory for the file-backed store; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub government_pass_threshold: usize,
    pub lab_max_runs: u32,
    pub goal_min_purity: f32,
    pub goal_min_levitation: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        let goal = ExperimentGoal::default();
        Self {
            seed: None,
            noise: true,
            data_dir: None,
            government_pass_threshold: GOVERNMENT_PASS_THRESHOLD,
            lab_max_runs: DEFAULT_LAB_RUNS,
            goal_min_purity: goal.min_purity,
            goal_min_levitation: goal.min_levitation,
        }
    }
}

/// A configuration value outside its allowed range.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    PassThresholdOutOfRange { value: usize, roster: usize },
    LabRunsOutOfRange(u32),
    PurityGoalOutOfRange(f32),
    LevitationGoalOutOfRange(f32),
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::PassThresholdOutOfRange { value, roster } => write!(
                f,
                "government pass threshold {} must be between 1 and {}",
                value, roster
            ),
            ConfigIssue::LabRunsOutOfRange(n) => write!(
                f,
                "lab max runs {} must be between {} and {}",
                n, MIN_ATTEMPTS, MAX_ATTEMPTS
            ),
            ConfigIssue::PurityGoalOutOfRange(p) => write!(
                f,
                "purity goal {} must be within {}..={}",
                p, PURITY_RANGE.0, PURITY_RANGE.1
            ),
            ConfigIssue::LevitationGoalOutOfRange(l) => write!(
                f,
                "levitation goal {} must be within {}..={}",
                l, LEVITATION_RANGE.0, LEVITATION_RANGE.1
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SimConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: SimConfig = serde_json::from_str(raw)?;
        let issues = cfg.validate();
        if !issues.is_empty() {
            return Err(ConfigError::Invalid(issues));
        }
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref())?;
        log::debug!("loaded config from {}", path.as_ref().display());
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let roster = government_roster().len();
        if self.government_pass_threshold == 0 || self.government_pass_threshold > roster {
            issues.push(ConfigIssue::PassThresholdOutOfRange {
                value: self.government_pass_threshold,
                roster,
            });
        }
        if !(MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(&self.lab_max_runs) {
            issues.push(ConfigIssue::LabRunsOutOfRange(self.lab_max_runs));
        }
        if !(PURITY_RANGE.0..=PURITY_RANGE.1).contains(&self.goal_min_purity) {
            issues.push(ConfigIssue::PurityGoalOutOfRange(self.goal_min_purity));
        }
        if !(LEVITATION_RANGE.0..=LEVITATION_RANGE.1).contains(&self.goal_min_levitation) {
            issues.push(ConfigIssue::LevitationGoalOutOfRange(
                self.goal_min_levitation,
            ));
        }
        issues
    }

    pub fn goal(&self) -> ExperimentGoal {
        ExperimentGoal {
            min_purity: self.goal_min_purity,
            min_levitation: self.goal_min_levitation,
        }
    }

    pub fn session_noise(&self) -> SessionNoise {
        SessionNoise::from_config(self.noise, self.seed)
    }
}
