//! Pond population and biomass accounting engine.
//!
//! The crate exposes:
//! - [`PondEngine`]: per-pond-locked registry plus the three append-only
//!   ledgers (population, sampling, harvest).
//! - [`classify`]: pure density/status classifier over count and biomass.
//! - [`project`]: pure growth and harvest projection.
//! - Collaborator traits for the feed-record, feed-sizing, and sale-ledger
//!   systems that live outside the engine.

pub mod classify;
pub mod collaborators;
pub mod engine;
pub mod error;
pub mod projection;
pub mod sampling;

pub use classify::classify;
pub use collaborators::{FeedRecords, FeedSizing, SaleLedger, SaleLedgerError};
pub use engine::{CommitHook, CommitHookError, PondEngine, PondState, StagedMutation};
pub use error::{EngineError, Result};
pub use projection::project;
pub use sampling::{fish_per_kg_from_grams, grams_from_fish_per_kg, latest_sampling};
