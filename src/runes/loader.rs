//! JSON catalog loading.
//!
//! File layout:
//!
//! ```json
//! {
//!   "effects": [
//!     { "id": 1, "name": "Bloodlust", "trigger": "on_kill",
//!       "stacking": { "policy": "stack_linear", "max": 3 },
//!       "script": [ { "apply_modifier": { "stat": "damage", "value": { "const": 5.0 } } } ] }
//!   ],
//!   "collectibles": [ { "id": 1, "kind": "rune", "name": "Red Rune", "effects": [1] } ],
//!   "synergies": []
//! }
//! ```
//!
//! Each script is decoded on its own. A script that does not decode (an
//! unknown instruction, a missing field) marks only that descriptor as
//! malformed; a file that is not valid JSON, or whose ids and references do
//! not line up, fails the whole load.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::catalog::Catalog;
use super::collectible::CollectibleDefinition;
use super::descriptor::{EffectDescriptor, EffectId, StackingPolicy};
use crate::core::{CatalogError, DescriptorError};
use crate::rune_script::Script;
use crate::synergies::SynergyDefinition;
use crate::triggers::TriggerKind;

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    effects: Vec<EffectEntry>,
    #[serde(default)]
    collectibles: Vec<CollectibleDefinition>,
    #[serde(default)]
    synergies: Vec<SynergyDefinition>,
}

#[derive(Deserialize)]
struct EffectEntry {
    id: EffectId,
    name: String,
    #[serde(default)]
    description: String,
    trigger: TriggerKind,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    stacking: StackingPolicy,
    /// Kept undecoded so one bad script cannot fail the file.
    #[serde(default)]
    script: Option<Value>,
}

impl EffectEntry {
    fn into_descriptor(self) -> EffectDescriptor {
        let descriptor = EffectDescriptor::new(self.id, self.name, self.trigger)
            .with_description(self.description)
            .with_priority(self.priority)
            .with_stacking(self.stacking);

        match self.script.map(serde_json::from_value::<Script>) {
            None => descriptor,
            Some(Ok(script)) => descriptor.with_script(script),
            Some(Err(err)) => descriptor.with_defect(DescriptorError::Malformed(err.to_string())),
        }
    }
}

impl Catalog {
    /// Parse and validate a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Catalog, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;

        let mut builder = Catalog::builder();
        for entry in file.effects {
            builder = builder.effect(entry.into_descriptor());
        }
        for collectible in file.collectibles {
            builder = builder.collectible(collectible);
        }
        for synergy in file.synergies {
            builder = builder.synergy(synergy);
        }
        builder.build()
    }
}

/// Read and validate a catalog file.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let text = fs::read_to_string(path.as_ref())?;
    Catalog::from_json(&text)
}
