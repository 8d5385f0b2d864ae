//! Read-only evaluation context.

use crate::core::{EffectRng, EntityId, Simulation};
use crate::triggers::Payload;

/// Everything one evaluation may read.
///
/// The world handle is shared and read-only: scripts describe mutations in
/// their outcome and the engine commits them afterwards. The context is
/// consumed by the evaluation that uses it, so its RNG stream is never
/// reused.
pub struct EvaluationContext<'a> {
    pub actor: EntityId,
    pub payload: &'a Payload,
    pub world: &'a dyn Simulation,
    /// Resolved stack count of the effect being evaluated.
    pub stacks: u32,
    pub rng: EffectRng,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context at one stack with a seed-0 RNG.
    pub fn new(actor: EntityId, payload: &'a Payload, world: &'a dyn Simulation) -> Self {
        Self {
            actor,
            payload,
            world,
            stacks: 1,
            rng: EffectRng::new(0),
        }
    }

    /// Set the resolved stack count (builder pattern).
    #[must_use]
    pub fn with_stacks(mut self, stacks: u32) -> Self {
        self.stacks = stacks;
        self
    }

    /// Set the RNG stream (builder pattern).
    #[must_use]
    pub fn with_rng(mut self, rng: EffectRng) -> Self {
        self.rng = rng;
        self
    }
}

impl std::fmt::Debug for EvaluationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("actor", &self.actor)
            .field("payload", &self.payload)
            .field("stacks", &self.stacks)
            .finish_non_exhaustive()
    }
}
