//! Synergy recomputation.
//!
//! Satisfied synergies are a pure function of the owned collectible
//! multiset. The `SynergyEngine` keeps the last result so each loadout
//! change can report which synergies switched on or off.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::definition::{Requirement, SynergyId};
use super::matcher::match_synergy;
use crate::runes::{Catalog, CollectibleDefinition, CollectibleId};

/// Synergies that changed state on a recompute.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynergyDiff {
    pub activated: Vec<SynergyId>,
    pub deactivated: Vec<SynergyId>,
}

impl SynergyDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activated.is_empty() && self.deactivated.is_empty()
    }
}

/// Progress towards one synergy, for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynergyStatus {
    pub id: SynergyId,
    pub name: String,
    pub satisfied: bool,
    pub matched: usize,
    pub required: usize,
    pub missing: Vec<Requirement>,
    /// Exactly one requirement away.
    pub near: bool,
}

fn owned<'c>(
    catalog: &'c Catalog,
    counts: &BTreeMap<CollectibleId, u32>,
) -> Vec<&'c CollectibleDefinition> {
    counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .filter_map(|(id, _)| catalog.collectible(*id))
        .collect()
}

/// Synergies satisfied by `counts`, ordered by id.
#[must_use]
pub fn satisfied_synergies(
    catalog: &Catalog,
    counts: &BTreeMap<CollectibleId, u32>,
) -> BTreeSet<SynergyId> {
    let owned = owned(catalog, counts);
    catalog
        .synergies()
        .iter()
        .filter(|s| match_synergy(s, &owned).satisfied())
        .map(|s| s.id)
        .collect()
}

/// Per-synergy progress for `counts`, ordered by id.
#[must_use]
pub fn synergy_status(catalog: &Catalog, counts: &BTreeMap<CollectibleId, u32>) -> Vec<SynergyStatus> {
    let owned = owned(catalog, counts);
    catalog
        .synergies()
        .iter()
        .map(|synergy| {
            let result = match_synergy(synergy, &owned);
            SynergyStatus {
                id: synergy.id,
                name: synergy.name.clone(),
                satisfied: result.satisfied(),
                matched: result.matched,
                required: result.required,
                near: result.missing.len() == 1,
                missing: result.missing,
            }
        })
        .collect()
}

/// Tracks which synergies are currently satisfied.
#[derive(Clone, Debug, Default)]
pub struct SynergyEngine {
    satisfied: BTreeSet<SynergyId>,
}

impl SynergyEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute from the collectible multiset and report what changed.
    pub fn recompute(
        &mut self,
        catalog: &Catalog,
        counts: &BTreeMap<CollectibleId, u32>,
    ) -> SynergyDiff {
        let next = satisfied_synergies(catalog, counts);
        let diff = SynergyDiff {
            activated: next.difference(&self.satisfied).copied().collect(),
            deactivated: self.satisfied.difference(&next).copied().collect(),
        };
        for id in &diff.activated {
            debug!(synergy = %id, "synergy activated");
        }
        for id in &diff.deactivated {
            debug!(synergy = %id, "synergy deactivated");
        }
        self.satisfied = next;
        diff
    }

    /// Currently satisfied synergies.
    #[must_use]
    pub fn satisfied(&self) -> &BTreeSet<SynergyId> {
        &self.satisfied
    }

    #[must_use]
    pub fn is_satisfied(&self, id: SynergyId) -> bool {
        self.satisfied.contains(&id)
    }

    /// Forget all state (e.g. before a snapshot restore).
    pub fn reset(&mut self) {
        self.satisfied.clear();
    }
}
