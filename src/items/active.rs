//! The active effect set.
//!
//! Derived state: for the current loadout and satisfied synergies, which
//! effect descriptors are live, who grants them, and at how many stacks.
//! Exactly one entry exists per descriptor id no matter how many sources
//! grant it.
//!
//! The set is an `im::OrdMap`, so cloning it for a UI snapshot or for the
//! start of a firing is O(1) and never aliases the live state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use im::OrdMap;
use smallvec::SmallVec;

use super::instance::InstanceId;
use super::loadout::Loadout;
use crate::runes::{Catalog, EffectDescriptor, EffectId};
use crate::synergies::SynergyId;

/// What grants an active effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectSource {
    Instance(InstanceId),
    /// Synergy grants mark presence only; they never add stacks.
    Synergy(SynergyId),
}

/// One live effect.
#[derive(Clone, Debug)]
pub struct ActiveEffect {
    pub descriptor: Arc<EffectDescriptor>,
    pub sources: SmallVec<[EffectSource; 2]>,
    /// Combined stack count, within `1..=max`.
    pub stacks: u32,
    /// Earliest acquisition among the sources; `u64::MAX` when only
    /// synergies grant the effect.
    pub acquired: u64,
}

impl ActiveEffect {
    /// Create an entry with a single source.
    #[must_use]
    pub fn new(
        descriptor: Arc<EffectDescriptor>,
        source: EffectSource,
        stacks: u32,
        acquired: u64,
    ) -> Self {
        let mut sources = SmallVec::new();
        sources.push(source);
        Self {
            descriptor,
            sources,
            stacks,
            acquired,
        }
    }

    /// The descriptor's ID.
    #[must_use]
    pub fn id(&self) -> EffectId {
        self.descriptor.id
    }

    /// Whether a loadout instance (not only a synergy) grants the effect.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn has_instance_source(&self) -> bool {
        self.sources
            .iter()
            .any(|s| matches!(s, EffectSource::Instance(_)))
    }
}

/// Changes between two active sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveDiff {
    pub added: Vec<EffectId>,
    pub removed: Vec<EffectId>,
    /// `(effect, old stacks, new stacks)`.
    pub restacked: Vec<(EffectId, u32, u32)>,
}

impl ActiveDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.restacked.is_empty()
    }
}

fn grant(
    entries: &mut BTreeMap<EffectId, ActiveEffect>,
    descriptor: &Arc<EffectDescriptor>,
    source: EffectSource,
    acquired: u64,
) {
    match entries.get_mut(&descriptor.id) {
        Some(entry) => {
            if !entry.sources.contains(&source) {
                entry.sources.push(source);
            }
            entry.acquired = entry.acquired.min(acquired);
        }
        None => {
            entries.insert(
                descriptor.id,
                ActiveEffect::new(Arc::clone(descriptor), source, 1, acquired),
            );
        }
    }
}

/// Persistent map of live effects, keyed and ordered by effect id.
#[derive(Clone, Debug, Default)]
pub struct ActiveEffectSet {
    effects: OrdMap<EffectId, ActiveEffect>,
}

impl ActiveEffectSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the set from a loadout and the satisfied synergies.
    ///
    /// Per-instance stack counts are combined with the descriptor's policy;
    /// synergy sources contribute presence only.
    #[must_use]
    pub fn build(catalog: &Catalog, loadout: &Loadout, satisfied: &BTreeSet<SynergyId>) -> Self {
        let mut entries: BTreeMap<EffectId, ActiveEffect> = BTreeMap::new();
        let mut counts: BTreeMap<EffectId, SmallVec<[u32; 2]>> = BTreeMap::new();

        for instance in loadout.iter() {
            let Some(collectible) = catalog.collectible(instance.collectible) else {
                continue;
            };
            for effect in &collectible.effects {
                let Some(descriptor) = catalog.effect(*effect) else {
                    continue;
                };
                grant(&mut entries, descriptor, EffectSource::Instance(instance.id), instance.acquired);
                counts.entry(*effect).or_default().push(instance.stacks);
            }
        }

        for synergy_id in satisfied {
            let Some(synergy) = catalog.synergy(*synergy_id) else {
                continue;
            };
            for effect in &synergy.bonus {
                if let Some(descriptor) = catalog.effect(*effect) {
                    grant(&mut entries, descriptor, EffectSource::Synergy(*synergy_id), u64::MAX);
                }
            }
        }

        for (id, entry) in entries.iter_mut() {
            let sources = counts.remove(id).unwrap_or_default();
            entry.stacks = entry.descriptor.stacking.combine(sources);
        }

        Self {
            effects: entries.into_iter().collect(),
        }
    }

    /// Insert or replace an entry.
    #[cfg(test)]
    pub(crate) fn insert(&mut self, effect: ActiveEffect) {
        self.effects.insert(effect.id(), effect);
    }

    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&ActiveEffect> {
        self.effects.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EffectId) -> bool {
        self.effects.contains_key(&id)
    }

    /// Iterate in effect id order.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.values()
    }

    /// Effect ids in order.
    pub fn ids(&self) -> impl Iterator<Item = EffectId> + '_ {
        self.effects.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// What changed going from `self` to `next`.
    #[must_use]
    pub fn diff(&self, next: &ActiveEffectSet) -> ActiveDiff {
        let mut diff = ActiveDiff::default();
        for (id, old) in self.effects.iter() {
            match next.effects.get(id) {
                None => diff.removed.push(*id),
                Some(new) if new.stacks != old.stacks => {
                    diff.restacked.push((*id, old.stacks, new.stacks));
                }
                Some(_) => {}
            }
        }
        for id in next.effects.keys() {
            if !self.effects.contains_key(id) {
                diff.added.push(*id);
            }
        }
        diff
    }
}
