//! Trigger kinds and event payloads.
//!
//! The set of triggers is closed: effects bind to one `TriggerKind`, and the
//! host fires events of those kinds with a `Payload` describing what
//! happened.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::EntityId;

/// Simulation event an effect can bind to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// The owner hit something. `target` = victim, `amount` = damage dealt.
    OnHit,
    /// The owner killed something. `target` = victim.
    OnKill,
    /// Once per simulation step. `amount` = frame delta.
    OnTick,
    /// The current room was cleared.
    OnRoomClear,
    /// The owner entered a room.
    OnEnter,
    /// A collectible was picked up. `values[0]` = collectible id.
    OnPickup,
    /// A collectible is about to be removed. `values[0]` = collectible id.
    OnRemove,
    /// A projectile spawn was requested (usually a follow-up).
    OnSpawnProjectile,
    /// Not an event: applied while active, reverted when deactivated.
    Passive,
}

impl TriggerKind {
    /// Every trigger kind, in declaration order.
    pub const ALL: [TriggerKind; 9] = [
        TriggerKind::OnHit,
        TriggerKind::OnKill,
        TriggerKind::OnTick,
        TriggerKind::OnRoomClear,
        TriggerKind::OnEnter,
        TriggerKind::OnPickup,
        TriggerKind::OnRemove,
        TriggerKind::OnSpawnProjectile,
        TriggerKind::Passive,
    ];

    /// Whether effects of this kind are dispatched by events.
    #[must_use]
    pub const fn is_event(self) -> bool {
        !matches!(self, TriggerKind::Passive)
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TriggerKind::OnHit => "on_hit",
            TriggerKind::OnKill => "on_kill",
            TriggerKind::OnTick => "on_tick",
            TriggerKind::OnRoomClear => "on_room_clear",
            TriggerKind::OnEnter => "on_enter",
            TriggerKind::OnPickup => "on_pickup",
            TriggerKind::OnRemove => "on_remove",
            TriggerKind::OnSpawnProjectile => "on_spawn_projectile",
            TriggerKind::Passive => "passive",
        };
        f.write_str(name)
    }
}

/// Event data handed to scripts.
///
/// - `source`: who caused the event (if any)
/// - `target`: who was affected (if any)
/// - `amount`: the headline number (damage, frame delta, ...)
/// - `values`: extra numbers; the trigger kind defines each index
/// - `tags`: string labels for filtering ("crit", "fire", ...)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub source: Option<EntityId>,
    pub target: Option<EntityId>,
    pub amount: f64,
    #[serde(default)]
    pub values: SmallVec<[f64; 4]>,
    #[serde(default)]
    pub tags: SmallVec<[String; 2]>,
}

impl Payload {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A hit on `target` for `damage`.
    #[must_use]
    pub fn hit(target: EntityId, damage: f64) -> Self {
        Self::new().with_target(target).with_amount(damage)
    }

    /// A kill of `target`.
    #[must_use]
    pub fn kill(target: EntityId) -> Self {
        Self::new().with_target(target)
    }

    /// A simulation step of `delta` seconds.
    #[must_use]
    pub fn tick(delta: f64) -> Self {
        Self::new().with_amount(delta)
    }

    /// Set the source entity (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the target entity (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the headline amount (builder pattern).
    #[must_use]
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    /// Add an indexed value (builder pattern).
    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.values.push(value);
        self
    }

    /// Add a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Check if the payload carries a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// One event travelling through a firing, with its chain depth.
///
/// The event the host fires has depth 0; follow-ups emitted while handling
/// an event of depth `d` have depth `d + 1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub kind: TriggerKind,
    pub actor: EntityId,
    pub payload: Payload,
    pub depth: usize,
}

impl TriggerEvent {
    /// A host-fired event.
    #[must_use]
    pub fn root(kind: TriggerKind, actor: EntityId, payload: Payload) -> Self {
        Self {
            kind,
            actor,
            payload,
            depth: 0,
        }
    }

    /// A follow-up emitted while handling `self`.
    #[must_use]
    pub fn follow_up(&self, kind: TriggerKind, payload: Payload) -> Self {
        Self {
            kind,
            actor: self.actor,
            payload,
            depth: self.depth + 1,
        }
    }
}
