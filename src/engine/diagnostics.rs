//! Error and event counters.
//!
//! Nothing that goes wrong while effects run is returned to the host; it
//! is logged and counted here instead.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::runes::EffectId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub evaluations: u64,
    pub descriptor_errors: u64,
    pub capacity_errors: u64,
    /// Firings whose follow-up chain hit the depth cap.
    pub chain_truncations: u64,
    pub consistency_errors: u64,
    pub full_recomputes: u64,
    pub refunds: u64,
    pub duplicates: u64,
    pub expired_modifiers: u64,
    /// Descriptors whose failure has already been logged.
    #[serde(skip)]
    reported: BTreeSet<EffectId>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a descriptor failure. Returns `true` the first time `effect`
    /// fails, which is the only time it should be logged.
    pub fn descriptor_failed(&mut self, effect: EffectId) -> bool {
        self.descriptor_errors += 1;
        self.reported.insert(effect)
    }

    /// Descriptors that have failed at least once.
    pub fn failed_effects(&self) -> impl Iterator<Item = EffectId> + '_ {
        self.reported.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_failed_once() {
        let mut diagnostics = Diagnostics::new();

        assert!(diagnostics.descriptor_failed(EffectId(3)));
        assert!(!diagnostics.descriptor_failed(EffectId(3)));
        assert!(diagnostics.descriptor_failed(EffectId(4)));

        assert_eq!(diagnostics.descriptor_errors, 3);
        assert_eq!(
            diagnostics.failed_effects().collect::<Vec<_>>(),
            vec![EffectId(3), EffectId(4)]
        );
    }
}
