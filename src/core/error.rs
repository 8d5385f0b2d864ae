//! Error taxonomy.
//!
//! Only catalog loading, snapshot restore and bad host arguments surface as
//! `Err` to the host. Everything that can go wrong while effects run
//! (`DescriptorError`, `CapacityError`, `ConsistencyError`) is isolated to a
//! single effect, logged, and counted in the engine diagnostics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{EntityId, ModifierId};
use crate::items::InstanceId;
use crate::runes::{CollectibleId, EffectId};
use crate::synergies::SynergyId;

/// A malformed script or catalog entry. Fails one evaluation only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The script body could not be decoded (e.g. unknown instruction).
    #[error("malformed script: {0}")]
    Malformed(String),

    #[error("unknown local `{0}`")]
    UnknownLocal(String),

    #[error("payload value index {index} out of range ({len} values)")]
    PayloadIndex { index: usize, len: usize },

    #[error("event has no target entity")]
    NoTarget,

    #[error("loop entity referenced outside a for-each")]
    NoLoopEntity,

    #[error("{0} does not exist in the simulation")]
    UnknownEntity(EntityId),

    #[error("division by zero")]
    DivisionByZero,

    #[error("expression produced a non-finite value")]
    NonFinite,

    #[error("empty stat name")]
    EmptyStat,

    #[error("blocks nested {depth} deep (limit {limit})")]
    TooDeep { depth: usize, limit: usize },
}

/// A bounded resource was exhausted. Work is truncated, never aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityError {
    #[error("query matched more than {limit} entities; truncated")]
    QueryTruncated { limit: usize },

    #[error("script exceeded its budget of {limit} steps")]
    StepBudget { limit: usize },

    #[error("spawn count {requested} clamped to {limit}")]
    SpawnClamped { requested: u64, limit: usize },

    #[error("follow-up chain exceeded depth {limit}; {dropped} events dropped")]
    ChainDepth { limit: usize, dropped: usize },
}

/// The modifier ledger and the stat model disagree. Indicates a resolver bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("{modifier} not found on {entity}")]
    ModifierMissing { entity: EntityId, modifier: ModifierId },

    #[error("{0} has no stat block")]
    UnknownEntity(EntityId),
}

/// Catalog load failure. Returned to the host at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate effect id {0}")]
    DuplicateEffect(EffectId),

    #[error("duplicate collectible id {0}")]
    DuplicateCollectible(CollectibleId),

    #[error("duplicate synergy id {0}")]
    DuplicateSynergy(SynergyId),

    #[error("{owner} references unknown effect {effect}")]
    UnknownEffect { owner: String, effect: EffectId },

    #[error("{synergy} requires unknown collectible {collectible}")]
    UnknownCollectible { synergy: SynergyId, collectible: CollectibleId },

    #[error("{0} has no requirements")]
    EmptySynergy(SynergyId),

    #[error("a global catalog is already installed")]
    AlreadyInstalled,
}

/// Bad arguments to loadout operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadoutError {
    #[error("unknown collectible {0}")]
    UnknownCollectible(CollectibleId),

    #[error("unknown instance {0}")]
    UnknownInstance(InstanceId),
}

/// Loadout snapshot could not be restored.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot references unknown collectible {0}")]
    UnknownCollectible(CollectibleId),

    #[error("snapshot lists {0} twice")]
    DuplicateInstance(InstanceId),

    /// Each collectible owns at most one instance; extra copies are stacks.
    #[error("snapshot lists collectible {0} in more than one instance")]
    DuplicateCollectible(CollectibleId),

    #[error("{0} leaves no room for further pickups")]
    CounterOverflow(InstanceId),

    #[error("{instance} has invalid stack count {stacks}")]
    InvalidStacks { instance: InstanceId, stacks: u32 },

    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] bincode::Error),

    #[error("failed to decode snapshot json: {0}")]
    Json(#[from] serde_json::Error),
}
