//! Effect descriptor store.
//!
//! The `Catalog` holds every effect descriptor, collectible and synergy
//! known to the game. It is built once, validated as a whole, and read-only
//! afterwards. Descriptors are handed out as `Arc`s so active effect sets
//! can share them without copying.

use std::sync::{Arc, OnceLock};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use super::collectible::{CollectibleDefinition, CollectibleId};
use super::descriptor::{EffectDescriptor, EffectId, ScriptBody};
use crate::core::CatalogError;
use crate::synergies::{Requirement, SynergyDefinition, SynergyId};

static GLOBAL: OnceLock<Arc<Catalog>> = OnceLock::new();

/// Validated, immutable catalog of effects, collectibles and synergies.
///
/// ## Example
///
/// ```
/// use rune_engine::runes::{Catalog, CollectibleDefinition, CollectibleId, EffectDescriptor, EffectId};
/// use rune_engine::triggers::TriggerKind;
///
/// let catalog = Catalog::builder()
///     .effect(EffectDescriptor::new(EffectId::new(1), "Spark", TriggerKind::OnHit))
///     .collectible(CollectibleDefinition::rune(CollectibleId::new(1), "Spark Rune").with_effect(EffectId::new(1)))
///     .build()
///     .unwrap();
///
/// assert_eq!(catalog.collectible(CollectibleId::new(1)).unwrap().name, "Spark Rune");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    effects: FxHashMap<EffectId, Arc<EffectDescriptor>>,
    collectibles: FxHashMap<CollectibleId, CollectibleDefinition>,
    /// Sorted by id.
    synergies: Vec<SynergyDefinition>,
}

impl Catalog {
    /// Start building a catalog.
    #[must_use]
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Get an effect descriptor by ID.
    #[must_use]
    pub fn effect(&self, id: EffectId) -> Option<&Arc<EffectDescriptor>> {
        self.effects.get(&id)
    }

    /// Get a collectible by ID.
    #[must_use]
    pub fn collectible(&self, id: CollectibleId) -> Option<&CollectibleDefinition> {
        self.collectibles.get(&id)
    }

    /// Get a synergy by ID.
    #[must_use]
    pub fn synergy(&self, id: SynergyId) -> Option<&SynergyDefinition> {
        self.synergies
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &self.synergies[i])
    }

    /// All synergies, ordered by id.
    #[must_use]
    pub fn synergies(&self) -> &[SynergyDefinition] {
        &self.synergies
    }

    /// Iterate over all effect descriptors (unordered).
    pub fn effects(&self) -> impl Iterator<Item = &Arc<EffectDescriptor>> {
        self.effects.values()
    }

    /// Iterate over all collectibles (unordered).
    pub fn collectibles(&self) -> impl Iterator<Item = &CollectibleDefinition> {
        self.collectibles.values()
    }

    /// Check if a collectible ID is registered.
    #[must_use]
    pub fn contains(&self, id: CollectibleId) -> bool {
        self.collectibles.contains_key(&id)
    }

    /// How many copies of a collectible one loadout can hold.
    ///
    /// The largest stack cap among its effects; 1 if none of them stack,
    /// 0 if the collectible is unknown.
    #[must_use]
    pub fn pickup_cap(&self, id: CollectibleId) -> u32 {
        let Some(collectible) = self.collectible(id) else {
            return 0;
        };
        collectible
            .effects
            .iter()
            .filter_map(|e| self.effect(*e))
            .map(|d| d.stacking.max_stacks())
            .max()
            .unwrap_or(1)
    }

    /// Install this catalog as the process-wide registry.
    ///
    /// Fails if one is already installed.
    pub fn install_global(self) -> Result<Arc<Catalog>, CatalogError> {
        let shared = Arc::new(self);
        GLOBAL
            .set(Arc::clone(&shared))
            .map_err(|_| CatalogError::AlreadyInstalled)?;
        Ok(shared)
    }

    /// The process-wide registry, if one was installed.
    #[must_use]
    pub fn global() -> Option<Arc<Catalog>> {
        GLOBAL.get().cloned()
    }
}

/// Collects definitions, then validates them together in [`build`].
///
/// [`build`]: CatalogBuilder::build
#[derive(Clone, Debug, Default)]
pub struct CatalogBuilder {
    effects: Vec<EffectDescriptor>,
    collectibles: Vec<CollectibleDefinition>,
    synergies: Vec<SynergyDefinition>,
}

impl CatalogBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect descriptor.
    #[must_use]
    pub fn effect(mut self, descriptor: EffectDescriptor) -> Self {
        self.effects.push(descriptor);
        self
    }

    /// Add a collectible.
    #[must_use]
    pub fn collectible(mut self, collectible: CollectibleDefinition) -> Self {
        self.collectibles.push(collectible);
        self
    }

    /// Add a synergy.
    #[must_use]
    pub fn synergy(mut self, synergy: SynergyDefinition) -> Self {
        self.synergies.push(synergy);
        self
    }

    /// Validate and freeze.
    ///
    /// Duplicate ids and dangling references are errors. Scripts that fail
    /// static validation are not: the descriptor is kept, marked malformed,
    /// and only its own evaluations fail.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut effects = FxHashMap::default();
        for mut descriptor in self.effects {
            if effects.contains_key(&descriptor.id) {
                return Err(CatalogError::DuplicateEffect(descriptor.id));
            }
            if let ScriptBody::Compiled(script) = &descriptor.script {
                if let Err(err) = script.validate() {
                    descriptor.script = ScriptBody::Malformed(err);
                }
            }
            if let ScriptBody::Malformed(err) = &descriptor.script {
                warn!(effect = %descriptor.id, name = %descriptor.name, error = %err, "malformed effect script");
            }
            effects.insert(descriptor.id, Arc::new(descriptor));
        }

        let mut collectibles = FxHashMap::default();
        for collectible in self.collectibles {
            if collectibles.contains_key(&collectible.id) {
                return Err(CatalogError::DuplicateCollectible(collectible.id));
            }
            if let Some(missing) = collectible.effects.iter().find(|e| !effects.contains_key(*e)) {
                return Err(CatalogError::UnknownEffect {
                    owner: collectible.id.to_string(),
                    effect: *missing,
                });
            }
            collectibles.insert(collectible.id, collectible);
        }

        let mut seen = FxHashSet::default();
        let mut synergies = self.synergies;
        for synergy in &synergies {
            if !seen.insert(synergy.id) {
                return Err(CatalogError::DuplicateSynergy(synergy.id));
            }
            if synergy.requirements.is_empty() {
                return Err(CatalogError::EmptySynergy(synergy.id));
            }
            for requirement in &synergy.requirements {
                if let Requirement::Collectible(id) = requirement {
                    if !collectibles.contains_key(id) {
                        return Err(CatalogError::UnknownCollectible {
                            synergy: synergy.id,
                            collectible: *id,
                        });
                    }
                }
            }
            if let Some(missing) = synergy.bonus.iter().find(|e| !effects.contains_key(*e)) {
                return Err(CatalogError::UnknownEffect {
                    owner: synergy.id.to_string(),
                    effect: *missing,
                });
            }
        }
        synergies.sort_by_key(|s| s.id);

        debug!(
            effects = effects.len(),
            collectibles = collectibles.len(),
            synergies = synergies.len(),
            "catalog built"
        );

        Ok(Catalog {
            effects,
            collectibles,
            synergies,
        })
    }
}
