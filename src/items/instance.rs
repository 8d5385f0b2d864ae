//! Loadout instances - owned copies of collectibles.
//!
//! A `LoadoutInstance` is created on the first pickup of a collectible and
//! destroyed when its last stack is removed. Further pickups of a stacking
//! collectible raise `stacks` on the same instance.

use serde::{Deserialize, Serialize};

use crate::runes::CollectibleId;

/// Unique identifier for an instance within one loadout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

impl InstanceId {
    /// Create a new instance ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.0)
    }
}

/// An owned rune or item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadoutInstance {
    pub id: InstanceId,
    pub collectible: CollectibleId,
    /// Always in `1..=cap`.
    pub stacks: u32,
    /// Acquisition order; strictly increasing across a loadout's lifetime.
    pub acquired: u64,
    /// Redundant pickups of a non-stacking collectible.
    #[serde(default)]
    pub duplicates: u32,
}

impl LoadoutInstance {
    /// Create a single-stack instance.
    #[must_use]
    pub fn new(id: InstanceId, collectible: CollectibleId, acquired: u64) -> Self {
        Self {
            id,
            collectible,
            stacks: 1,
            acquired,
            duplicates: 0,
        }
    }

    /// Set the stack count (builder pattern).
    #[must_use]
    pub fn with_stacks(mut self, stacks: u32) -> Self {
        self.stacks = stacks;
        self
    }
}
