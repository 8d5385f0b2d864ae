//! Modifier ledger - what each effect wrote to the stat model.
//!
//! Every modifier the engine commits is recorded under
//! `(effect, entity, stat, kind)` with its unscaled magnitude, stack count,
//! expiry tick and the handle the simulation returned. Reverting an effect
//! removes exactly those handles, which is what makes add-then-remove leave
//! stats bit-for-bit where they started.
//!
//! The ledger also remembers every `(entity, effect)` pair it ever wrote,
//! so a full recompute can wipe contributions even if an entry was lost.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{ConsistencyError, EntityId, Modifier, ModifierId, ModifierKind, Simulation};
use crate::rune_script::ModifierRequest;
use crate::runes::{EffectId, StackingPolicy};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub effect: EffectId,
    pub entity: EntityId,
    pub stat: String,
    pub kind: ModifierKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub modifier: ModifierId,
    /// Unscaled magnitude from the script.
    pub base: f64,
    pub stacks: u32,
    /// Magnitude actually written, after stacking.
    pub applied: f64,
    /// Tick at which the modifier is removed.
    pub expires: Option<u64>,
}

/// How a commit chooses the stack count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commit {
    /// Triggered re-application: one more stack, up to the cap.
    Increment,
    /// Passive application at a resolved stack count.
    Set(u32),
}

#[derive(Clone, Debug, Default)]
pub struct ModifierLedger {
    entries: BTreeMap<LedgerKey, LedgerEntry>,
    touched: BTreeSet<(EntityId, EffectId)>,
}

impl ModifierLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write (or rewrite) one modifier for `effect`.
    ///
    /// An existing entry under the same key is replaced: its modifier is
    /// removed and the new magnitude applied, so value and duration refresh.
    /// Returns the stack count now recorded.
    pub fn commit(
        &mut self,
        world: &mut dyn Simulation,
        effect: EffectId,
        policy: StackingPolicy,
        request: &ModifierRequest,
        mode: Commit,
        now: u64,
    ) -> Result<u32, ConsistencyError> {
        let key = LedgerKey {
            effect,
            entity: request.entity,
            stat: request.stat.clone(),
            kind: request.kind,
        };

        let previous = self.entries.remove(&key);
        let stacks = match (mode, &previous) {
            (Commit::Increment, Some(entry)) => policy.next(entry.stacks),
            (Commit::Increment, None) => 1,
            (Commit::Set(n), _) => n.clamp(1, policy.max_stacks()),
        };
        if let Some(entry) = previous {
            world.remove_modifier(key.entity, entry.modifier)?;
        }

        let applied = policy.scale(request.kind, request.value, stacks);
        let modifier = world.apply_modifier(
            key.entity,
            Modifier::new(request.stat.clone(), request.kind, applied, effect),
        )?;
        trace!(%effect, entity = %key.entity, stat = %key.stat, applied, stacks, "modifier committed");

        self.touched.insert((key.entity, effect));
        self.entries.insert(
            key,
            LedgerEntry {
                modifier,
                base: request.value,
                stacks,
                applied,
                expires: request.duration.map(|ticks| now + u64::from(ticks)),
            },
        );
        Ok(stacks)
    }

    /// Remove everything `effect` wrote.
    ///
    /// Entities that no longer exist are skipped. Every entry is dropped
    /// from the ledger even if a removal fails; the first failure is
    /// returned.
    pub fn revert_effect(
        &mut self,
        world: &mut dyn Simulation,
        effect: EffectId,
    ) -> Result<usize, ConsistencyError> {
        let keys: Vec<LedgerKey> = self
            .entries
            .keys()
            .filter(|k| k.effect == effect)
            .cloned()
            .collect();
        self.remove_keys(world, keys)
    }

    /// Remove entries whose expiry tick has been reached. Returns the
    /// number removed.
    pub fn expire(&mut self, world: &mut dyn Simulation, now: u64) -> Result<usize, ConsistencyError> {
        let keys: Vec<LedgerKey> = self
            .entries
            .iter()
            .filter(|(_, e)| e.expires.is_some_and(|at| at <= now))
            .map(|(k, _)| k.clone())
            .collect();
        self.remove_keys(world, keys)
    }

    fn remove_keys(
        &mut self,
        world: &mut dyn Simulation,
        keys: Vec<LedgerKey>,
    ) -> Result<usize, ConsistencyError> {
        let mut first_error = None;
        let mut removed = 0;

        for key in keys {
            let Some(entry) = self.entries.remove(&key) else {
                continue;
            };
            removed += 1;
            if !world.contains(key.entity) {
                continue;
            }
            if let Err(err) = world.remove_modifier(key.entity, entry.modifier) {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }

    /// Strip every modifier any recorded effect ever wrote and clear the
    /// ledger. Returns the number of modifiers removed from the world.
    pub fn wipe(&mut self, world: &mut dyn Simulation) -> usize {
        let removed = self
            .touched
            .iter()
            .map(|(entity, effect)| world.remove_modifiers_from(*entity, *effect))
            .sum();
        self.entries.clear();
        self.touched.clear();
        removed
    }

    /// Highest stack count recorded for `effect`.
    #[must_use]
    pub fn stacks(&self, effect: EffectId) -> Option<u32> {
        self.entries_for(effect).map(|(_, e)| e.stacks).max()
    }

    /// Entries written by `effect`.
    pub fn entries_for(&self, effect: EffectId) -> impl Iterator<Item = (&LedgerKey, &LedgerEntry)> {
        self.entries.iter().filter(move |(k, _)| k.effect == effect)
    }

    /// Look up one entry.
    #[must_use]
    pub fn get(&self, key: &LedgerKey) -> Option<&LedgerEntry> {
        self.entries.get(key)
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
