//! What one evaluation asks the engine to do.

use serde::{Deserialize, Serialize};

use crate::core::{CapacityError, EntityId, ModifierKind};
use crate::runes::EffectId;
use crate::triggers::{Payload, TriggerKind};

/// A stat modifier to commit, at its unscaled magnitude.
///
/// The engine scales `value` by the effect's stacking policy before writing
/// it to the stat model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierRequest {
    pub entity: EntityId,
    pub stat: String,
    pub kind: ModifierKind,
    pub value: f64,
    /// Ticks until expiry, or `None` for as long as the effect is active.
    pub duration: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageRequest {
    pub target: EntityId,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub kind: String,
    pub at: EntityId,
    pub count: u32,
}

/// A follow-up event to queue after the current one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub kind: TriggerKind,
    pub payload: Payload,
}

/// Result of evaluating one effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectOutcome {
    pub effect: EffectId,
    pub modifiers: Vec<ModifierRequest>,
    pub damage: Vec<DamageRequest>,
    pub spawns: Vec<SpawnRequest>,
    pub follow_ups: Vec<FollowUp>,
    pub cues: Vec<String>,
    /// The effect asked for its source to be removed.
    pub consume_self: bool,
    /// Limits hit during evaluation. The outcome is still usable.
    pub capacity: Vec<CapacityError>,
    pub steps: usize,
}

impl EffectOutcome {
    /// An outcome that does nothing.
    #[must_use]
    pub fn empty(effect: EffectId) -> Self {
        Self {
            effect,
            modifiers: Vec::new(),
            damage: Vec::new(),
            spawns: Vec::new(),
            follow_ups: Vec::new(),
            cues: Vec::new(),
            consume_self: false,
            capacity: Vec::new(),
            steps: 0,
        }
    }

    /// Whether the outcome requests nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
            && self.damage.is_empty()
            && self.spawns.is_empty()
            && self.follow_ups.is_empty()
            && self.cues.is_empty()
            && !self.consume_self
    }

    /// Modifier requests combined per `(entity, stat, kind)`, in first-seen
    /// order, so each target is committed once per evaluation.
    ///
    /// Values fold the way the stat model folds them, except that the last
    /// override wins. The longest duration is kept; a permanent request
    /// outlasts any timed one.
    #[must_use]
    pub fn merged_modifiers(&self) -> Vec<ModifierRequest> {
        let mut merged: Vec<ModifierRequest> = Vec::with_capacity(self.modifiers.len());
        for request in &self.modifiers {
            let existing = merged.iter_mut().find(|m| {
                m.entity == request.entity && m.kind == request.kind && m.stat == request.stat
            });
            let Some(existing) = existing else {
                merged.push(request.clone());
                continue;
            };
            existing.value = match request.kind {
                ModifierKind::Additive => existing.value + request.value,
                ModifierKind::Multiplicative => existing.value * request.value,
                ModifierKind::Override => request.value,
            };
            existing.duration = match (existing.duration, request.duration) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            };
        }
        merged
    }

    pub(crate) fn record(&mut self, error: CapacityError) {
        if !self.capacity.contains(&error) {
            self.capacity.push(error);
        }
    }
}
