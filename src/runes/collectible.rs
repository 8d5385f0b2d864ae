//! Collectible definitions: runes and items.
//!
//! A collectible is what the player picks up. It grants one or more effect
//! descriptors and carries tags that synergies can match on. Runes and items
//! share this definition; `kind` only matters for display and for synergies
//! that name exact collectibles.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::descriptor::EffectId;

/// Unique identifier for a collectible definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectibleId(pub u32);

impl CollectibleId {
    /// Create a new collectible ID.
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

impl std::fmt::Display for CollectibleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Collectible({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    Rune,
    Item,
}

/// Static collectible data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectibleDefinition {
    pub id: CollectibleId,
    pub kind: CollectibleKind,
    pub name: String,
    #[serde(default)]
    pub tags: SmallVec<[String; 2]>,
    pub effects: SmallVec<[EffectId; 2]>,
    /// Paid out when a pickup over the stack cap is converted.
    #[serde(default)]
    pub refund: u32,
}

impl CollectibleDefinition {
    /// Create a collectible with no effects.
    pub fn new(id: CollectibleId, kind: CollectibleKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            tags: SmallVec::new(),
            effects: SmallVec::new(),
            refund: 0,
        }
    }

    /// Create a rune.
    pub fn rune(id: CollectibleId, name: impl Into<String>) -> Self {
        Self::new(id, CollectibleKind::Rune, name)
    }

    /// Create an item.
    pub fn item(id: CollectibleId, name: impl Into<String>) -> Self {
        Self::new(id, CollectibleKind::Item, name)
    }

    /// Grant an effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: EffectId) -> Self {
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
        self
    }

    /// Add a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.has_tag(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Set the overflow refund (builder pattern).
    #[must_use]
    pub fn with_refund(mut self, refund: u32) -> Self {
        self.refund = refund;
        self
    }

    /// Check for a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
