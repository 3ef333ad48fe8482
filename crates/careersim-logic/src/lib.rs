//! Pure scenario logic for CareerSim.
//!
//! This crate contains all scoring and progression logic that is
//! independent of storage, clocks, randomness sources or any UI. Functions
//! take plain data and return results, so everything is unit-testable and
//! can be driven from the engine crate, the headless harness, or a web
//! front end alike.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`attempts`] | Per-entity attempt counters and pending/success/failure states |
//! | [`experiment`] | Superconductor synthesis scoring table with injectable noise |
//! | [`government`] | Stakeholder roster and declarative scoring rule table |
//! | [`negotiation`] | Branching negotiation dialogue tree with rapport |
//! | [`office`] | Office floor navigation (BFS over doors) and track unlocks |
//! | [`quiz`] | Periodic-table symbol/name matching quiz |
//! | [`scenario`] | Welcome → interaction → results progression and aggregates |
//! | [`scoring`] | Keyword/word-count/marker rules and the generic evaluator |
//! | [`wizard`] | Multi-step form tasks with submission gating |

pub mod attempts;
pub mod experiment;
pub mod government;
pub mod negotiation;
pub mod office;
pub mod quiz;
pub mod scenario;
pub mod scoring;
pub mod wizard;
