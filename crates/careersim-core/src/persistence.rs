//! Save/Load of in-progress sessions.
//!
//! Uses bincode for a compact binary snapshot of the scenario state plus
//! the lab notebook. Snapshots carry a format version and are rejected on
//! mismatch rather than migrated.

use careersim_logic::scenario::Scenario;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

use crate::notebook::LabNotebookEntry;

/// Snapshot format version (increment when the layout changes).
pub const SAVE_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub scenario: Scenario,
    /// Empty for scenarios without a lab.
    pub notebook_entries: Vec<LabNotebookEntry>,
    pub hypothesis: String,
    /// When the host was notified, if it already was.
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn new(
        scenario: Scenario,
        notebook_entries: Vec<LabNotebookEntry>,
        hypothesis: String,
    ) -> Self {
        Self {
            version: SAVE_VERSION,
            scenario,
            notebook_entries,
            hypothesis,
            completed_at: None,
        }
    }

    pub fn with_completed_at(mut self, completed_at: Option<DateTime<Utc>>) -> Self {
        self.completed_at = completed_at;
        self
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("save encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Write a snapshot.
pub fn save_snapshot<W: Write>(
    writer: &mut W,
    snapshot: &SessionSnapshot,
) -> Result<(), SaveError> {
    bincode::serialize_into(&mut *writer, snapshot)?;
    writer.flush()?;
    log::info!(
        "saved session '{}' ({} notebook entries)",
        snapshot.scenario.id(),
        snapshot.notebook_entries.len()
    );
    Ok(())
}

/// Read a snapshot, checking its version.
pub fn load_snapshot<R: Read>(reader: &mut R) -> Result<SessionSnapshot, SaveError> {
    let snapshot: SessionSnapshot = bincode::deserialize_from(reader)?;
    if snapshot.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: snapshot.version,
        });
    }
    log::info!("loaded session '{}'", snapshot.scenario.id());
    Ok(snapshot)
}
