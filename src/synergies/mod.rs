//! Synergies - bonus effects unlocked by combinations.
//!
//! ## Key Components
//!
//! - [`SynergyDefinition`]: requirements, match policy and bonus effects
//! - [`match_synergy`]: `Subset` and `Exact` (distinct-collectible) matching
//! - [`SynergyEngine`]: change-triggered recompute with activation diff
//! - [`SynergyStatus`]: per-synergy progress for UI

mod definition;
mod engine;
mod matcher;

pub use definition::{MatchPolicy, Requirement, SynergyDefinition, SynergyId};
pub use engine::{satisfied_synergies, synergy_status, SynergyDiff, SynergyEngine, SynergyStatus};
pub use matcher::{match_synergy, MatchResult};
