//! Loadout snapshots for save/load.
//!
//! A snapshot is the loadout and nothing else: instances in acquisition
//! order plus the id counters. Everything derived (active effects,
//! synergies, committed modifiers) is recomputed on restore.

use serde::{Deserialize, Serialize};

use super::instance::{InstanceId, LoadoutInstance};
use super::loadout::Loadout;
use crate::core::SnapshotError;
use crate::runes::{Catalog, CollectibleId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub instance: InstanceId,
    pub collectible: CollectibleId,
    pub stacks: u32,
    pub acquired: u64,
}

/// Serializable loadout state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutSnapshot {
    /// In acquisition order.
    pub entries: Vec<SnapshotEntry>,
    pub next_instance: u32,
    pub next_acquired: u64,
}

impl LoadoutSnapshot {
    /// Capture a loadout.
    #[must_use]
    pub fn capture(loadout: &Loadout) -> Self {
        Self {
            entries: loadout
                .iter()
                .map(|i| SnapshotEntry {
                    instance: i.id,
                    collectible: i.collectible,
                    stacks: i.stacks,
                    acquired: i.acquired,
                })
                .collect(),
            next_instance: loadout.next_instance(),
            next_acquired: loadout.next_acquired(),
        }
    }

    /// Rebuild a loadout, checking every entry against `catalog`.
    pub fn restore(&self, catalog: &Catalog) -> Result<Loadout, SnapshotError> {
        let mut instances: Vec<LoadoutInstance> = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            if !catalog.contains(entry.collectible) {
                return Err(SnapshotError::UnknownCollectible(entry.collectible));
            }
            if instances.iter().any(|i| i.id == entry.instance) {
                return Err(SnapshotError::DuplicateInstance(entry.instance));
            }
            if instances.iter().any(|i| i.collectible == entry.collectible) {
                return Err(SnapshotError::DuplicateCollectible(entry.collectible));
            }
            let cap = catalog.pickup_cap(entry.collectible);
            if entry.stacks == 0 || entry.stacks > cap {
                return Err(SnapshotError::InvalidStacks {
                    instance: entry.instance,
                    stacks: entry.stacks,
                });
            }
            instances.push(
                LoadoutInstance::new(entry.instance, entry.collectible, entry.acquired)
                    .with_stacks(entry.stacks),
            );
        }

        // Counters must stay ahead of restored ids so new pickups never collide.
        let mut next_instance = self.next_instance;
        let mut next_acquired = self.next_acquired;
        for instance in &instances {
            let overflow = || SnapshotError::CounterOverflow(instance.id);
            next_instance = next_instance.max(instance.id.raw().checked_add(1).ok_or_else(overflow)?);
            next_acquired = next_acquired.max(instance.acquired.checked_add(1).ok_or_else(overflow)?);
        }

        Ok(Loadout::from_parts(instances, next_instance, next_acquired))
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Human-readable encoding.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runes::{CollectibleDefinition, EffectDescriptor, EffectId, StackingPolicy};
    use crate::triggers::TriggerKind;

    fn catalog() -> Catalog {
        Catalog::builder()
            .effect(
                EffectDescriptor::new(EffectId(1), "Fury", TriggerKind::OnKill)
                    .with_stacking(StackingPolicy::StackLinear(3)),
            )
            .effect(EffectDescriptor::new(EffectId(2), "Ward", TriggerKind::Passive))
            .collectible(CollectibleDefinition::rune(CollectibleId(1), "A").with_effect(EffectId(1)))
            .collectible(CollectibleDefinition::item(CollectibleId(2), "B").with_effect(EffectId(2)))
            .build()
            .unwrap()
    }

    fn loadout(catalog: &Catalog) -> Loadout {
        let mut loadout = Loadout::new();
        let a = catalog.collectible(CollectibleId(1)).unwrap();
        let b = catalog.collectible(CollectibleId(2)).unwrap();
        loadout.add(b, 1);
        loadout.add(a, 3);
        loadout.add(a, 3);
        loadout
    }

    #[test]
    fn test_restore_preserves_order_and_stacks() {
        let catalog = catalog();
        let original = loadout(&catalog);
        let snapshot = LoadoutSnapshot::capture(&original);

        let restored = snapshot.restore(&catalog).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_binary_encoding() {
        let catalog = catalog();
        let snapshot = LoadoutSnapshot::capture(&loadout(&catalog));

        let bytes = snapshot.to_bytes().unwrap();
        assert_eq!(LoadoutSnapshot::from_bytes(&bytes).unwrap(), snapshot);
        assert!(matches!(
            LoadoutSnapshot::from_bytes(&bytes[..3]),
            Err(SnapshotError::Decode(_))
        ));
    }

    #[test]
    fn test_json_encoding() {
        let catalog = catalog();
        let snapshot = LoadoutSnapshot::capture(&loadout(&catalog));

        let json = snapshot.to_json().unwrap();
        assert_eq!(LoadoutSnapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_restore_rejects_unknown() {
        let snapshot = LoadoutSnapshot {
            entries: vec![SnapshotEntry {
                instance: InstanceId(0),
                collectible: CollectibleId(42),
                stacks: 1,
                acquired: 0,
            }],
            ..LoadoutSnapshot::default()
        };
        assert!(matches!(
            snapshot.restore(&catalog()),
            Err(SnapshotError::UnknownCollectible(CollectibleId(42)))
        ));
    }

    #[test]
    fn test_restore_rejects_bad_stacks() {
        let entry = |instance, stacks| SnapshotEntry {
            instance: InstanceId(instance),
            collectible: CollectibleId(1),
            stacks,
            acquired: 0,
        };

        let over = LoadoutSnapshot {
            entries: vec![entry(0, 4)],
            ..LoadoutSnapshot::default()
        };
        assert!(matches!(
            over.restore(&catalog()),
            Err(SnapshotError::InvalidStacks { stacks: 4, .. })
        ));

        let twice = LoadoutSnapshot {
            entries: vec![entry(0, 1), entry(0, 1)],
            ..LoadoutSnapshot::default()
        };
        assert!(matches!(
            twice.restore(&catalog()),
            Err(SnapshotError::DuplicateInstance(InstanceId(0)))
        ));
    }

    #[test]
    fn test_restore_rejects_split_collectible() {
        let snapshot = LoadoutSnapshot {
            entries: vec![
                SnapshotEntry {
                    instance: InstanceId(0),
                    collectible: CollectibleId(1),
                    stacks: 1,
                    acquired: 0,
                },
                SnapshotEntry {
                    instance: InstanceId(1),
                    collectible: CollectibleId(1),
                    stacks: 2,
                    acquired: 1,
                },
            ],
            ..LoadoutSnapshot::default()
        };
        assert!(matches!(
            snapshot.restore(&catalog()),
            Err(SnapshotError::DuplicateCollectible(CollectibleId(1)))
        ));
    }

    #[test]
    fn test_restore_rejects_exhausted_counters() {
        let entry = |instance, acquired| SnapshotEntry {
            instance: InstanceId(instance),
            collectible: CollectibleId(2),
            stacks: 1,
            acquired,
        };

        let late = LoadoutSnapshot {
            entries: vec![entry(0, u64::MAX)],
            ..LoadoutSnapshot::default()
        };
        assert!(matches!(
            late.restore(&catalog()),
            Err(SnapshotError::CounterOverflow(InstanceId(0)))
        ));

        let last_id = LoadoutSnapshot {
            entries: vec![entry(u32::MAX, 0)],
            ..LoadoutSnapshot::default()
        };
        assert!(matches!(
            last_id.restore(&catalog()),
            Err(SnapshotError::CounterOverflow(InstanceId(u32::MAX)))
        ));
    }

    #[test]
    fn test_counters_stay_ahead() {
        let snapshot = LoadoutSnapshot {
            entries: vec![SnapshotEntry {
                instance: InstanceId(5),
                collectible: CollectibleId(2),
                stacks: 1,
                acquired: 8,
            }],
            next_instance: 0,
            next_acquired: 0,
        };
        let restored = snapshot.restore(&catalog()).unwrap();

        assert_eq!(restored.next_instance(), 6);
        assert_eq!(restored.next_acquired(), 9);
    }
}
