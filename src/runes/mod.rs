//! Runes, items and their effect descriptors.
//!
//! ## Key Components
//!
//! - [`EffectDescriptor`]: trigger + priority + script + stacking policy
//! - [`StackingPolicy`]: how repeated copies combine, and the magnitude table
//! - [`CollectibleDefinition`]: a rune or item granting effects, with tags
//! - [`Catalog`]: validated, read-only store of all of the above plus synergies
//! - [`load_catalog`]: JSON loader with per-script failure isolation

mod catalog;
mod collectible;
mod descriptor;
mod loader;

pub use catalog::{Catalog, CatalogBuilder};
pub use collectible::{CollectibleDefinition, CollectibleId, CollectibleKind};
pub use descriptor::{EffectDescriptor, EffectId, ScriptBody, StackingPolicy};
pub use loader::load_catalog;
