//! Lab notebook: the append-only log of experiment runs.
//!
//! Entries are created once and never edited; they can only be deleted
//! wholesale by id. The notebook and the student's hypothesis live under
//! two storage keys:
//!
//! | Key | Value |
//! |-----|-------|
//! | `labNotebook` | JSON array of [`LabNotebookEntry`] |
//! | `labHypothesis` | JSON string |
//!
//! Missing or malformed stored data loads as an empty notebook. Failed
//! writes are logged and reported, never fatal.

use careersim_logic::experiment::{ExperimentOutput, ExperimentVariables};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{load_json, save_json, KeyValueStore};

pub const NOTEBOOK_KEY: &str = "labNotebook";
pub const HYPOTHESIS_KEY: &str = "labHypothesis";

/// CSV header, in column order.
pub const CSV_HEADER: &str =
    "id,timestamp,precursor,temperature,time,cooling,additive,purity,levitationHeight,comment";

/// One recorded experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabNotebookEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub variables: ExperimentVariables,
    pub purity: f32,
    pub levitation_height: f32,
    #[serde(default)]
    pub comment: String,
}

impl LabNotebookEntry {
    /// One CSV row. Only the comment is quoted.
    pub fn to_csv_row(&self) -> String {
        let v = &self.variables;
        format!(
            "{},{},{},{},{},{},{},{:.1},{:.2},{}",
            self.id,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            v.precursor.label(),
            v.temperature_c,
            v.time_hours,
            v.cooling.label(),
            v.additive.label(),
            self.purity,
            self.levitation_height,
            quote_comment(&self.comment),
        )
    }
}

/// Wrap in double quotes, doubling any inner quote.
pub fn quote_comment(comment: &str) -> String {
    format!("\"{}\"", comment.replace('"', "\"\""))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabNotebook {
    entries: Vec<LabNotebookEntry>,
    hypothesis: String,
}

impl LabNotebook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(entries: Vec<LabNotebookEntry>, hypothesis: String) -> Self {
        Self {
            entries,
            hypothesis,
        }
    }

    /// Load from a store; anything unusable becomes empty.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let entries: Vec<LabNotebookEntry> = load_json(store, NOTEBOOK_KEY).unwrap_or_default();
        let hypothesis: String = load_json(store, HYPOTHESIS_KEY).unwrap_or_default();
        log::debug!("loaded lab notebook with {} entries", entries.len());
        Self {
            entries,
            hypothesis,
        }
    }

    /// Write entries and hypothesis. Returns whether both writes succeeded.
    pub fn persist(&self, store: &mut dyn KeyValueStore) -> bool {
        let mut ok = true;
        if let Err(e) = save_json(store, NOTEBOOK_KEY, &self.entries) {
            log::warn!("lab notebook not persisted, continuing in memory: {}", e);
            ok = false;
        }
        if let Err(e) = save_json(store, HYPOTHESIS_KEY, &self.hypothesis) {
            log::warn!("hypothesis not persisted, continuing in memory: {}", e);
            ok = false;
        }
        ok
    }

    /// Append a run stamped with a fresh id and the current time.
    pub fn record(
        &mut self,
        variables: ExperimentVariables,
        output: ExperimentOutput,
        comment: &str,
    ) -> &LabNotebookEntry {
        self.record_at(variables, output, comment, Uuid::new_v4(), Utc::now())
    }

    /// Append a run with an explicit id and timestamp.
    pub fn record_at(
        &mut self,
        variables: ExperimentVariables,
        output: ExperimentOutput,
        comment: &str,
        id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> &LabNotebookEntry {
        self.entries.push(LabNotebookEntry {
            id,
            timestamp,
            variables,
            purity: output.purity,
            levitation_height: output.levitation_height,
            comment: comment.to_string(),
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Remove an entry. Returns false if no entry had that id.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn get(&self, id: Uuid) -> Option<&LabNotebookEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[LabNotebookEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hypothesis(&self) -> &str {
        &self.hypothesis
    }

    pub fn set_hypothesis(&mut self, text: &str) {
        self.hypothesis = text.to_string();
    }

    /// Entry with the highest purity (ties go to the earlier run).
    pub fn best_run(&self) -> Option<&LabNotebookEntry> {
        self.entries.iter().fold(None, |best: Option<&LabNotebookEntry>, e| match best {
            Some(b) if b.purity >= e.purity => Some(b),
            _ => Some(e),
        })
    }

    /// Header plus one row per entry, newline-terminated.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(CSV_HEADER.len() + 1 + self.entries.len() * 128);
        out.push_str(CSV_HEADER);
        out.push('\n');
        for e in &self.entries {
            out.push_str(&e.to_csv_row());
            out.push('\n');
        }
        out
    }
}
