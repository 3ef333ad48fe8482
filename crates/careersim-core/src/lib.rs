//! CareerSim Core - scenario engine
//!
//! Runs the pure rules from `careersim-logic` against the outside world:
//! injected key/value storage, wall-clock timestamps, random noise and the
//! host's completion callback.
//!
//! # Architecture
//!
//! - **Sessions** ([`session`]) own a scenario and drive it from welcome to
//!   results, firing the [`completion`] hook once.
//! - **Notebook** ([`notebook`]) records every lab run under the
//!   `labNotebook` key of a [`storage::KeyValueStore`].
//! - **Persistence** ([`persistence`]) saves and restores whole sessions.
//!
//! # Example
//!
//! ```rust
//! use careersim_core::prelude::*;
//! use careersim_logic::experiment::{ExperimentVariables, NoNoise};
//!
//! let config = SimConfig::default();
//! let mut lab = MaterialsLab::open(
//!     Box::new(MemoryStore::new()),
//!     NoNoise,
//!     &config,
//!     CompletionHook::none(),
//! );
//! lab.begin();
//! let run = lab.run(ExperimentVariables::optimal(), "first try").unwrap();
//! assert!(run.evaluation.success);
//! assert!(lab.completion().unwrap().passed);
//! ```

pub mod completion;
pub mod config;
pub mod noise;
pub mod notebook;
pub mod persistence;
pub mod session;
pub mod storage;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::completion::{CompletionHook, CompletionPayload};
    pub use crate::config::SimConfig;
    pub use crate::noise::{RngNoise, SessionNoise};
    pub use crate::notebook::{LabNotebook, LabNotebookEntry};
    pub use crate::session::{GovernmentSession, LabError, LabRun, MaterialsLab};
    pub use crate::storage::{FileStore, KeyValueStore, MemoryStore};
}
