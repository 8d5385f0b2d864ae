//! Stat blocks and composable modifiers.
//!
//! A `StatBlock` never stores a mutated value. It stores base values plus an
//! ordered list of modifiers and folds them on read:
//!
//! ```text
//! value = last override, if any
//!       else (base + Σ additive) × Π multiplicative
//! ```
//!
//! Because the value is always derived, removing a modifier is exactly the
//! inverse of applying it, in any order. Reads are `f64`; the committed
//! integer value (`get`) is rounded half-up once, at the end of the fold.
//!
//! ```
//! use rune_engine::core::{Modifier, ModifierKind, StatBlock};
//! use rune_engine::runes::EffectId;
//!
//! let mut stats = StatBlock::new().with_base("damage", 10.0);
//! let id = stats.apply(Modifier::new("damage", ModifierKind::Additive, 2.5, EffectId(1)));
//! assert_eq!(stats.get("damage"), 13); // 12.5 rounds half-up
//!
//! stats.remove(id).unwrap();
//! assert_eq!(stats.get("damage"), 10);
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::runes::EffectId;

/// Handle for one applied modifier. Unique within a stat block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModifierId(pub u64);

impl std::fmt::Display for ModifierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Modifier({})", self.0)
    }
}

/// How a modifier combines with the base value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Added to the base before multipliers.
    Additive,
    /// Multiplies the additive sum (1.1 = +10%).
    Multiplicative,
    /// Replaces the folded value. The most recently applied override wins.
    Override,
}

/// A single stat modifier, tagged with the effect that applied it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub stat: String,
    pub kind: ModifierKind,
    pub value: f64,
    pub source: EffectId,
}

impl Modifier {
    /// Create a modifier.
    pub fn new(stat: impl Into<String>, kind: ModifierKind, value: f64, source: EffectId) -> Self {
        Self {
            stat: stat.into(),
            kind,
            value,
            source,
        }
    }
}

/// Round half-up (towards positive infinity): 2.5 → 3, -2.5 → -2.
#[must_use]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Base stats plus the modifiers currently applied on top of them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    base: FxHashMap<String, f64>,
    /// Application order matters for overrides only.
    modifiers: Vec<(ModifierId, Modifier)>,
    next_id: u64,
}

impl StatBlock {
    /// Create an empty stat block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a base value (builder pattern).
    #[must_use]
    pub fn with_base(mut self, stat: impl Into<String>, value: f64) -> Self {
        self.set_base(stat, value);
        self
    }

    /// Set a base value.
    pub fn set_base(&mut self, stat: impl Into<String>, value: f64) {
        self.base.insert(stat.into(), value);
    }

    /// Base value of a stat (0 when unset).
    #[must_use]
    pub fn base(&self, stat: &str) -> f64 {
        self.base.get(stat).copied().unwrap_or(0.0)
    }

    /// Apply a modifier and return its handle.
    pub fn apply(&mut self, modifier: Modifier) -> ModifierId {
        let id = ModifierId(self.next_id);
        self.next_id += 1;
        self.modifiers.push((id, modifier));
        id
    }

    /// Remove a modifier by handle.
    ///
    /// Returns `None` if no such modifier is applied.
    pub fn remove(&mut self, id: ModifierId) -> Option<Modifier> {
        let index = self.modifiers.iter().position(|(mid, _)| *mid == id)?;
        Some(self.modifiers.remove(index).1)
    }

    /// Remove every modifier applied by `source`. Returns how many were removed.
    pub fn remove_source(&mut self, source: EffectId) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|(_, m)| m.source != source);
        before - self.modifiers.len()
    }

    /// Folded value of a stat, unrounded.
    #[must_use]
    pub fn raw(&self, stat: &str) -> f64 {
        let mut additive = 0.0;
        let mut multiplier = 1.0;
        let mut last_override = None;

        for (_, modifier) in self.modifiers.iter().filter(|(_, m)| m.stat == stat) {
            match modifier.kind {
                ModifierKind::Additive => additive += modifier.value,
                ModifierKind::Multiplicative => multiplier *= modifier.value,
                ModifierKind::Override => last_override = Some(modifier.value),
            }
        }

        last_override.unwrap_or_else(|| (self.base(stat) + additive) * multiplier)
    }

    /// Committed value of a stat: the fold rounded half-up once.
    #[must_use]
    pub fn get(&self, stat: &str) -> i64 {
        round_half_up(self.raw(stat))
    }

    /// Net contribution of one source to a stat (`raw` with vs. without it).
    #[must_use]
    pub fn contribution(&self, stat: &str, source: EffectId) -> f64 {
        let mut without = self.clone();
        without.remove_source(source);
        self.raw(stat) - without.raw(stat)
    }

    /// Look up an applied modifier.
    #[must_use]
    pub fn modifier(&self, id: ModifierId) -> Option<&Modifier> {
        self.modifiers.iter().find(|(mid, _)| *mid == id).map(|(_, m)| m)
    }

    /// Iterate applied modifiers in application order.
    pub fn modifiers(&self) -> impl Iterator<Item = (ModifierId, &Modifier)> {
        self.modifiers.iter().map(|(id, m)| (*id, m))
    }

    /// Number of applied modifiers.
    #[must_use]
    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }
}
