//! # rune-engine
//!
//! Effect resolution core for an action roguelike: runes and items the
//! player collects, the scripts behind their effects, stacking, synergies
//! and the trigger dispatch that runs them.
//!
//! ## Design Principles
//!
//! 1. **Data-Driven**: Effects are descriptors with a small interpreted
//!    script, loaded from JSON. Adding a rune never needs new Rust code.
//!
//! 2. **Host Owns the World**: The engine reads stats and applies stat
//!    modifiers through the [`Simulation`](core::Simulation) trait. Damage,
//!    spawns and cues come back as [`HostCommand`]s for the host to carry out.
//!
//! 3. **Deterministic**: Dispatch order is total (priority, acquisition,
//!    id) and every random roll comes from a seeded, forkable RNG.
//!
//! 4. **Nothing Leaks**: Every stat change an effect makes is recorded in a
//!    ledger and reverted exactly when the effect leaves the active set.
//!
//! ## Modules
//!
//! - `core`: Entity IDs, stat model, simulation boundary, RNG, config, errors
//! - `runes`: Effect descriptors, collectibles and the catalog
//! - `rune_script`: Script AST and interpreter
//! - `items`: Loadout, active effect set, modifier ledger, snapshots
//! - `synergies`: Combination bonuses
//! - `triggers`: Event kinds, dispatcher and follow-up queue
//! - `engine`: The per-player [`EffectEngine`]

pub mod core;
pub mod runes;
pub mod rune_script;
pub mod items;
pub mod synergies;
pub mod triggers;
pub mod engine;

// Re-export commonly used types
pub use crate::core::{
    EntityId, EffectRng, EngineConfig,
    Modifier, ModifierId, ModifierKind, StatBlock,
    Faction, SimWorld, Simulation,
    CapacityError, CatalogError, ConsistencyError, DescriptorError, LoadoutError, SnapshotError,
};

pub use crate::runes::{
    Catalog, CatalogBuilder, load_catalog,
    CollectibleDefinition, CollectibleId, CollectibleKind,
    EffectDescriptor, EffectId, StackingPolicy,
};

pub use crate::rune_script::{
    EffectOutcome, EntityRef, EvaluationContext, Expr, Instr, Interpreter, Query, Script,
};

pub use crate::items::{
    ActiveEffect, ActiveEffectSet, AddOutcome, InstanceId,
    Loadout, LoadoutSnapshot, ModifierLedger, RemoveOutcome,
};

pub use crate::synergies::{
    MatchPolicy, Requirement, SynergyDefinition, SynergyId, SynergyStatus,
};

pub use crate::triggers::{Dispatcher, Payload, TriggerEvent, TriggerKind};

pub use crate::engine::{Diagnostics, EffectEngine, FireReport, HostCommand, LoadoutChange};
