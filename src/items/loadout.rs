//! The player's loadout.
//!
//! Tracks owned instances in acquisition order and applies the pickup
//! rules:
//!
//! - New collectible: a fresh single-stack instance.
//! - Stacking collectible below its cap: one more stack.
//! - Stacking collectible at its cap: the pickup is converted into a
//!   [`Refund`] carrying the collectible's refund value.
//! - Non-stacking collectible already owned: no-op, duplicate counted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::instance::{InstanceId, LoadoutInstance};
use crate::core::LoadoutError;
use crate::runes::{CollectibleDefinition, CollectibleId};

/// Value paid out for a pickup that could not stack further.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub collectible: CollectibleId,
    pub value: u32,
}

/// Result of a pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddOutcome {
    Added { instance: InstanceId },
    Stacked { instance: InstanceId, stacks: u32 },
    /// Non-stacking duplicate; nothing changed but the duplicate counter.
    AlreadyPresent { instance: InstanceId },
    /// Over the cap; nothing changed but a refund is owed.
    Converted { instance: InstanceId, refund: Refund },
}

impl AddOutcome {
    /// The instance the pickup landed on.
    #[must_use]
    pub fn instance(&self) -> InstanceId {
        match self {
            Self::Added { instance }
            | Self::Stacked { instance, .. }
            | Self::AlreadyPresent { instance }
            | Self::Converted { instance, .. } => *instance,
        }
    }

    /// Whether the loadout changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(self, Self::Added { .. } | Self::Stacked { .. })
    }
}

/// Result of a removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoveOutcome {
    Decremented { instance: InstanceId, stacks: u32 },
    Removed { instance: InstanceId, collectible: CollectibleId },
}

/// Owned instances, in acquisition order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    instances: Vec<LoadoutInstance>,
    next_instance: u32,
    next_acquired: u64,
}

impl Loadout {
    /// Create an empty loadout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a loadout from stored parts. Callers validate the parts.
    pub(crate) fn from_parts(
        instances: Vec<LoadoutInstance>,
        next_instance: u32,
        next_acquired: u64,
    ) -> Self {
        Self {
            instances,
            next_instance,
            next_acquired,
        }
    }

    /// Pick up one copy of `collectible`, holding at most `cap` stacks.
    pub fn add(&mut self, collectible: &CollectibleDefinition, cap: u32) -> AddOutcome {
        if let Some(existing) = self
            .instances
            .iter_mut()
            .find(|i| i.collectible == collectible.id)
        {
            let instance = existing.id;
            if cap <= 1 {
                existing.duplicates += 1;
                return AddOutcome::AlreadyPresent { instance };
            }
            if existing.stacks < cap {
                existing.stacks += 1;
                return AddOutcome::Stacked {
                    instance,
                    stacks: existing.stacks,
                };
            }
            return AddOutcome::Converted {
                instance,
                refund: Refund {
                    collectible: collectible.id,
                    value: collectible.refund,
                },
            };
        }

        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        let acquired = self.next_acquired;
        self.next_acquired += 1;

        self.instances
            .push(LoadoutInstance::new(id, collectible.id, acquired));
        AddOutcome::Added { instance: id }
    }

    /// Remove one stack of an instance, destroying it at zero.
    pub fn remove(&mut self, id: InstanceId) -> Result<RemoveOutcome, LoadoutError> {
        let index = self
            .instances
            .iter()
            .position(|i| i.id == id)
            .ok_or(LoadoutError::UnknownInstance(id))?;

        let instance = &mut self.instances[index];
        if instance.stacks > 1 {
            instance.stacks -= 1;
            return Ok(RemoveOutcome::Decremented {
                instance: id,
                stacks: instance.stacks,
            });
        }

        let removed = self.instances.remove(index);
        Ok(RemoveOutcome::Removed {
            instance: id,
            collectible: removed.collectible,
        })
    }

    /// Get an instance by ID.
    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&LoadoutInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// The instance holding `collectible`, if owned.
    #[must_use]
    pub fn find(&self, collectible: CollectibleId) -> Option<&LoadoutInstance> {
        self.instances.iter().find(|i| i.collectible == collectible)
    }

    /// Iterate in acquisition order.
    pub fn iter(&self) -> impl Iterator<Item = &LoadoutInstance> {
        self.instances.iter()
    }

    /// Stack count per owned collectible.
    #[must_use]
    pub fn collectible_counts(&self) -> BTreeMap<CollectibleId, u32> {
        let mut counts = BTreeMap::new();
        for instance in &self.instances {
            *counts.entry(instance.collectible).or_insert(0) += instance.stacks;
        }
        counts
    }

    /// Next instance id to be assigned.
    #[must_use]
    pub fn next_instance(&self) -> u32 {
        self.next_instance
    }

    /// Next acquisition number to be assigned.
    #[must_use]
    pub fn next_acquired(&self) -> u64 {
        self.next_acquired
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
