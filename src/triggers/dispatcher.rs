//! Trigger dispatcher.
//!
//! The dispatcher holds, per trigger kind, the ordered list of active effects
//! bound to it. The list is rebuilt from scratch from the `ActiveEffectSet`
//! on every loadout change, never patched incrementally, so its order is a
//! pure function of the active set.
//!
//! Order within a kind: ascending priority, then earliest acquisition, then
//! effect id.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::items::ActiveEffectSet;
use crate::runes::EffectId;

use super::event::TriggerKind;

/// One subscription of an active effect to a trigger kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub effect: EffectId,
    pub priority: i32,
    /// Acquisition order of the earliest source granting the effect.
    pub acquired: u64,
}

impl Binding {
    fn sort_key(&self) -> (i32, u64, EffectId) {
        (self.priority, self.acquired, self.effect)
    }
}

/// Ordered subscriber lists, keyed by trigger kind.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    bindings: FxHashMap<TriggerKind, Vec<Binding>>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild every subscriber list from the active set.
    pub fn rebuild(&mut self, active: &ActiveEffectSet) {
        self.bindings.clear();

        for entry in active.iter() {
            let trigger = entry.descriptor.trigger;
            if !trigger.is_event() {
                continue;
            }
            self.bindings.entry(trigger).or_default().push(Binding {
                effect: entry.descriptor.id,
                priority: entry.descriptor.priority,
                acquired: entry.acquired,
            });
        }

        for list in self.bindings.values_mut() {
            list.sort_by_key(Binding::sort_key);
        }
    }

    /// Bindings for a trigger kind, in dispatch order.
    #[must_use]
    pub fn bound(&self, kind: TriggerKind) -> &[Binding] {
        self.bindings.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Total bindings across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    /// Check if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::items::{ActiveEffect, EffectSource, InstanceId};
    use crate::runes::EffectDescriptor;

    fn entry(id: u32, trigger: TriggerKind, priority: i32, acquired: u64) -> ActiveEffect {
        let descriptor = EffectDescriptor::new(EffectId(id), format!("effect{}", id), trigger)
            .with_priority(priority);
        ActiveEffect::new(
            Arc::new(descriptor),
            EffectSource::Instance(InstanceId(id)),
            1,
            acquired,
        )
    }

    #[test]
    fn test_priority_then_acquisition() {
        let mut active = ActiveEffectSet::new();
        active.insert(entry(1, TriggerKind::OnKill, 5, 0));
        active.insert(entry(2, TriggerKind::OnKill, 0, 3));
        active.insert(entry(3, TriggerKind::OnKill, 0, 1));
        active.insert(entry(4, TriggerKind::OnKill, 0, 2));

        let mut dispatcher = Dispatcher::new();
        dispatcher.rebuild(&active);

        let order: Vec<_> = dispatcher
            .bound(TriggerKind::OnKill)
            .iter()
            .map(|b| b.effect)
            .collect();
        assert_eq!(order, vec![EffectId(3), EffectId(4), EffectId(2), EffectId(1)]);
    }

    #[test]
    fn test_passive_not_bound() {
        let mut active = ActiveEffectSet::new();
        active.insert(entry(1, TriggerKind::Passive, 0, 0));
        active.insert(entry(2, TriggerKind::OnHit, 0, 1));

        let mut dispatcher = Dispatcher::new();
        dispatcher.rebuild(&active);

        assert_eq!(dispatcher.len(), 1);
        assert!(dispatcher.bound(TriggerKind::Passive).is_empty());
        assert_eq!(dispatcher.bound(TriggerKind::OnHit).len(), 1);
    }

    #[test]
    fn test_rebuild_replaces() {
        let mut active = ActiveEffectSet::new();
        active.insert(entry(1, TriggerKind::OnTick, 0, 0));

        let mut dispatcher = Dispatcher::new();
        dispatcher.rebuild(&active);
        assert_eq!(dispatcher.bound(TriggerKind::OnTick).len(), 1);

        dispatcher.rebuild(&ActiveEffectSet::new());
        assert!(dispatcher.is_empty());
        assert!(dispatcher.bound(TriggerKind::OnTick).is_empty());
    }
}
