//! Entity identification.
//!
//! Every simulation object the effect core talks about (the player, enemies,
//! spawned projectiles) is addressed by an `EntityId`. The core never owns
//! entities; ids are allocated by the host simulation.
//!
//! ```
//! use rune_engine::core::EntityId;
//!
//! let player = EntityId::new(1);
//! assert_eq!(player.raw(), 1);
//! assert_eq!(format!("{}", player), "Entity(1)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a simulation entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create an entity ID.
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

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
