//! Core types: entity ids, stat model, simulation boundary, RNG,
//! configuration and the error taxonomy.
//!
//! Nothing in here knows about runes or synergies; the higher modules build
//! on these pieces.

pub mod entity;
pub mod rng;
pub mod config;
pub mod error;
pub mod stats;
pub mod world;

pub use entity::EntityId;
pub use rng::EffectRng;
pub use config::EngineConfig;
pub use error::{
    CapacityError, CatalogError, ConsistencyError, DescriptorError, LoadoutError, SnapshotError,
};
pub use stats::{round_half_up, Modifier, ModifierId, ModifierKind, StatBlock};
pub use world::{EntityRecord, Faction, Relation, SimWorld, Simulation};
