//! What the engine hands back to the host.

use serde::{Deserialize, Serialize};

use crate::core::{CapacityError, EntityId};
use crate::items::InstanceId;
use crate::runes::EffectId;
use crate::synergies::SynergyDiff;

/// A request the host carries out: the core never deals damage, spawns
/// entities or plays audio itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HostCommand {
    Damage {
        source: EffectId,
        target: EntityId,
        amount: f64,
    },
    Spawn {
        source: EffectId,
        kind: String,
        at: EntityId,
        count: u32,
    },
    Cue {
        source: EffectId,
        name: String,
    },
}

/// Result of one `fire` (including every follow-up it chained into).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FireReport {
    /// Evaluations attempted.
    pub evaluated: usize,
    /// Evaluations that failed with a descriptor error.
    pub failed: usize,
    /// Effects that evaluated successfully, in execution order.
    pub fired: Vec<EffectId>,
    /// Host commands, in execution order.
    pub commands: Vec<HostCommand>,
    /// Limits hit during the firing.
    pub capacity: Vec<CapacityError>,
    /// Instances removed after the dispatch pass by `consume_self`.
    pub consumed: Vec<InstanceId>,
}

impl FireReport {
    /// Damage commands only.
    pub fn damage(&self) -> impl Iterator<Item = (EntityId, f64)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            HostCommand::Damage { target, amount, .. } => Some((*target, *amount)),
            _ => None,
        })
    }

    /// Cue names only.
    pub fn cues(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            HostCommand::Cue { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Whether the follow-up chain was cut short.
    #[must_use]
    pub fn chain_truncated(&self) -> bool {
        self.capacity
            .iter()
            .any(|c| matches!(c, CapacityError::ChainDepth { .. }))
    }

    pub(crate) fn absorb(&mut self, other: FireReport) {
        self.evaluated += other.evaluated;
        self.failed += other.failed;
        self.fired.extend(other.fired);
        self.commands.extend(other.commands);
        self.capacity.extend(other.capacity);
        self.consumed.extend(other.consumed);
    }
}

/// Result of a loadout change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadoutChange<T> {
    pub outcome: T,
    /// Synergies switched on or off by the change.
    pub synergies: SynergyDiff,
    /// The `on_pickup` / `on_remove` firing that accompanied the change.
    pub report: FireReport,
}
