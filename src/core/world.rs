//! The simulation boundary.
//!
//! The effect core does not own entities, positions or stat blocks. Hosts
//! implement [`Simulation`] over their own entity model; scripts see it
//! read-only during evaluation and the engine writes to it only through
//! inverse-safe modifier calls.
//!
//! [`SimWorld`] is a small in-memory implementation used by tests and
//! headless tools.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::error::ConsistencyError;
use super::stats::{Modifier, ModifierId, StatBlock};
use super::EntityId;
use crate::runes::EffectId;

/// Which side of a fight an entity is on. Queries filter relative to the
/// querying entity's faction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Player,
    Hostile,
    Neutral,
}

/// Relation filter for spatial queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Entities of a different, non-neutral faction.
    Enemies,
    /// Entities of the same faction (excluding the origin).
    Allies,
}

/// Entity and stat model exposed by the host simulation.
pub trait Simulation {
    /// Folded (unrounded) value of a stat, or `None` if the entity is unknown.
    fn get_stat(&self, entity: EntityId, stat: &str) -> Option<f64>;

    /// Apply a modifier to an entity's stat block.
    fn apply_modifier(
        &mut self,
        entity: EntityId,
        modifier: Modifier,
    ) -> Result<ModifierId, ConsistencyError>;

    /// Remove a previously applied modifier. Must be the exact inverse of
    /// `apply_modifier`.
    fn remove_modifier(
        &mut self,
        entity: EntityId,
        id: ModifierId,
    ) -> Result<Modifier, ConsistencyError>;

    /// Remove every modifier `source` applied to `entity`. Used when the
    /// engine rebuilds stat contributions from scratch.
    fn remove_modifiers_from(&mut self, entity: EntityId, source: EffectId) -> usize;

    /// Entities within `radius` of `origin` matching `relation`, nearest
    /// first, at most `limit` of them.
    fn entities_in_radius(
        &self,
        origin: EntityId,
        radius: f64,
        relation: Relation,
        limit: usize,
    ) -> Vec<EntityId>;

    /// Whether the entity exists.
    fn contains(&self, entity: EntityId) -> bool;
}

/// One entity in a [`SimWorld`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub faction: Faction,
    pub position: [f64; 2],
    pub stats: StatBlock,
}

/// In-memory simulation: factions, 2D positions and stat blocks.
#[derive(Clone, Debug, Default)]
pub struct SimWorld {
    entities: FxHashMap<EntityId, EntityRecord>,
    next_id: u32,
}

impl SimWorld {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an entity and return its ID.
    pub fn spawn(&mut self, faction: Faction, position: [f64; 2], stats: StatBlock) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(
            id,
            EntityRecord {
                faction,
                position,
                stats,
            },
        );
        id
    }

    /// Remove an entity (e.g. it died).
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityRecord> {
        self.entities.remove(&id)
    }

    /// Get an entity's stat block.
    #[must_use]
    pub fn stats(&self, id: EntityId) -> Option<&StatBlock> {
        self.entities.get(&id).map(|e| &e.stats)
    }

    /// Get an entity's stat block for editing (e.g. host-side damage).
    pub fn stats_mut(&mut self, id: EntityId) -> Option<&mut StatBlock> {
        self.entities.get_mut(&id).map(|e| &mut e.stats)
    }

    /// Get an entity record.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    /// Move an entity.
    pub fn set_position(&mut self, id: EntityId, position: [f64; 2]) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.position = position;
        }
    }

    /// Committed (rounded) stat value, 0 for unknown entities.
    #[must_use]
    pub fn stat(&self, id: EntityId, stat: &str) -> i64 {
        self.stats(id).map_or(0, |s| s.get(stat))
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the world is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn relation_matches(origin: Faction, other: Faction, relation: Relation) -> bool {
        match relation {
            Relation::Enemies => {
                origin != other && origin != Faction::Neutral && other != Faction::Neutral
            }
            Relation::Allies => origin == other,
        }
    }
}

impl Simulation for SimWorld {
    fn get_stat(&self, entity: EntityId, stat: &str) -> Option<f64> {
        self.stats(entity).map(|s| s.raw(stat))
    }

    fn apply_modifier(
        &mut self,
        entity: EntityId,
        modifier: Modifier,
    ) -> Result<ModifierId, ConsistencyError> {
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(ConsistencyError::UnknownEntity(entity))?;
        Ok(record.stats.apply(modifier))
    }

    fn remove_modifier(
        &mut self,
        entity: EntityId,
        id: ModifierId,
    ) -> Result<Modifier, ConsistencyError> {
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(ConsistencyError::UnknownEntity(entity))?;
        record
            .stats
            .remove(id)
            .ok_or(ConsistencyError::ModifierMissing { entity, modifier: id })
    }

    fn remove_modifiers_from(&mut self, entity: EntityId, source: EffectId) -> usize {
        self.entities
            .get_mut(&entity)
            .map_or(0, |e| e.stats.remove_source(source))
    }

    fn entities_in_radius(
        &self,
        origin: EntityId,
        radius: f64,
        relation: Relation,
        limit: usize,
    ) -> Vec<EntityId> {
        let Some(center) = self.entities.get(&origin) else {
            return Vec::new();
        };
        let radius_sq = radius * radius;

        let mut found: Vec<(f64, EntityId)> = self
            .entities
            .iter()
            .filter(|(id, _)| **id != origin)
            .filter(|(_, e)| Self::relation_matches(center.faction, e.faction, relation))
            .filter_map(|(id, e)| {
                let dx = e.position[0] - center.position[0];
                let dy = e.position[1] - center.position[1];
                let dist_sq = dx * dx + dy * dy;
                (dist_sq <= radius_sq).then_some((dist_sq, *id))
            })
            .collect();

        // Nearest first, ties by id so results never depend on hash order.
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        found.into_iter().take(limit).map(|(_, id)| id).collect()
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ModifierKind;

    fn arena() -> (SimWorld, EntityId) {
        let mut world = SimWorld::new();
        let player = world.spawn(Faction::Player, [0.0, 0.0], StatBlock::new());
        world.spawn(Faction::Hostile, [3.0, 0.0], StatBlock::new());
        world.spawn(Faction::Hostile, [1.0, 0.0], StatBlock::new());
        world.spawn(Faction::Hostile, [50.0, 0.0], StatBlock::new());
        world.spawn(Faction::Neutral, [0.5, 0.0], StatBlock::new());
        world.spawn(Faction::Player, [0.2, 0.0], StatBlock::new());
        (world, player)
    }

    #[test]
    fn test_enemies_nearest_first() {
        let (world, player) = arena();
        let found = world.entities_in_radius(player, 10.0, Relation::Enemies, 10);
        assert_eq!(found, vec![EntityId(2), EntityId(1)]);
    }

    #[test]
    fn test_query_limit() {
        let (world, player) = arena();
        let found = world.entities_in_radius(player, 100.0, Relation::Enemies, 2);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_allies_exclude_origin() {
        let (world, player) = arena();
        let found = world.entities_in_radius(player, 10.0, Relation::Allies, 10);
        assert_eq!(found, vec![EntityId(5)]);
    }

    #[test]
    fn test_unknown_origin() {
        let (world, _) = arena();
        assert!(world
            .entities_in_radius(EntityId(99), 10.0, Relation::Enemies, 10)
            .is_empty());
    }

    #[test]
    fn test_modifier_round_trip() {
        let (mut world, player) = arena();
        let id = world
            .apply_modifier(
                player,
                Modifier::new("damage", ModifierKind::Additive, 4.0, EffectId(1)),
            )
            .unwrap();
        assert_eq!(world.get_stat(player, "damage"), Some(4.0));

        world.remove_modifier(player, id).unwrap();
        assert_eq!(world.get_stat(player, "damage"), Some(0.0));

        let err = world.remove_modifier(player, id).unwrap_err();
        assert_eq!(
            err,
            ConsistencyError::ModifierMissing {
                entity: player,
                modifier: id
            }
        );
    }

    #[test]
    fn test_unknown_entity_errors() {
        let mut world = SimWorld::new();
        let err = world
            .apply_modifier(
                EntityId(4),
                Modifier::new("hp", ModifierKind::Additive, 1.0, EffectId(1)),
            )
            .unwrap_err();
        assert_eq!(err, ConsistencyError::UnknownEntity(EntityId(4)));
        assert_eq!(world.get_stat(EntityId(4), "hp"), None);
    }
}
