//! Synergy definitions.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::runes::{CollectibleDefinition, CollectibleId, EffectId};

/// Unique identifier for a synergy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SynergyId(pub u32);

impl SynergyId {
    /// Create a new synergy ID.
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

impl std::fmt::Display for SynergyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Synergy({})", self.0)
    }
}

/// One slot of a synergy recipe.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// A specific collectible.
    Collectible(CollectibleId),
    /// Any collectible carrying this tag.
    Tag(String),
}

impl Requirement {
    /// Whether `collectible` fills this slot.
    #[must_use]
    pub fn matches(&self, collectible: &CollectibleDefinition) -> bool {
        match self {
            Self::Collectible(id) => collectible.id == *id,
            Self::Tag(tag) => collectible.has_tag(tag),
        }
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collectible(id) => write!(f, "{}", id),
            Self::Tag(tag) => write!(f, "#{}", tag),
        }
    }
}

/// How requirements are matched against owned collectibles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Every requirement is met by some owned collectible; one collectible
    /// may satisfy several requirements.
    #[default]
    Subset,
    /// Every requirement is met by a different owned collectible.
    Exact,
}

/// A combination of collectibles that unlocks bonus effects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynergyDefinition {
    pub id: SynergyId,
    pub name: String,
    pub requirements: SmallVec<[Requirement; 4]>,
    #[serde(default)]
    pub policy: MatchPolicy,
    pub bonus: SmallVec<[EffectId; 2]>,
}

impl SynergyDefinition {
    /// Create a synergy with no requirements.
    pub fn new(id: SynergyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            requirements: SmallVec::new(),
            policy: MatchPolicy::default(),
            bonus: SmallVec::new(),
        }
    }

    /// Require a specific collectible (builder pattern).
    #[must_use]
    pub fn requires(mut self, collectible: CollectibleId) -> Self {
        self.requirements.push(Requirement::Collectible(collectible));
        self
    }

    /// Require any collectible with a tag (builder pattern).
    #[must_use]
    pub fn requires_tag(mut self, tag: impl Into<String>) -> Self {
        self.requirements.push(Requirement::Tag(tag.into()));
        self
    }

    /// Set the match policy (builder pattern).
    #[must_use]
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Grant a bonus effect while satisfied (builder pattern).
    #[must_use]
    pub fn with_bonus(mut self, effect: EffectId) -> Self {
        if !self.bonus.contains(&effect) {
            self.bonus.push(effect);
        }
        self
    }
}
