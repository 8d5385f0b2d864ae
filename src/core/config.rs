//! Engine configuration.
//!
//! Hosts configure the effect core at startup with an `EngineConfig`, either
//! through the builder methods or by deserializing a JSON document. Every
//! field has a default, so partial documents are fine.
//!
//! ```
//! use rune_engine::core::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "max_chain_depth": 4 }"#).unwrap();
//! assert_eq!(config.max_chain_depth, 4);
//! assert_eq!(config.max_query_entities, EngineConfig::default().max_query_entities);
//! ```

use serde::{Deserialize, Serialize};

/// Default cap on follow-up event chains.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 8;

/// Default cap on entities a single query may yield.
pub const DEFAULT_MAX_QUERY_ENTITIES: usize = 16;

/// Default cap on instructions executed by one evaluation.
pub const DEFAULT_MAX_SCRIPT_STEPS: usize = 512;

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum follow-up depth below the root event of a firing.
    ///
    /// Follow-ups that would land deeper are dropped with a single warning.
    pub max_chain_depth: usize,

    /// Maximum entities returned to a script by a spatial query.
    pub max_query_entities: usize,

    /// Maximum instructions (including loop iterations) one evaluation runs.
    pub max_script_steps: usize,

    /// Seed for the per-player effect RNG.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            max_query_entities: DEFAULT_MAX_QUERY_ENTITIES,
            max_script_steps: DEFAULT_MAX_SCRIPT_STEPS,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Set the follow-up chain depth cap.
    #[must_use]
    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    /// Set the spatial query cap.
    #[must_use]
    pub fn with_max_query_entities(mut self, max: usize) -> Self {
        self.max_query_entities = max;
        self
    }

    /// Set the per-evaluation instruction budget.
    #[must_use]
    pub fn with_max_script_steps(mut self, steps: usize) -> Self {
        self.max_script_steps = steps.max(1);
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_chain_depth, 8);
        assert_eq!(config.max_query_entities, 16);
        assert_eq!(config.max_script_steps, 512);
        assert_eq!(config.seed, 0);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_max_chain_depth(3)
            .with_max_query_entities(4)
            .with_max_script_steps(0)
            .with_seed(99);

        assert_eq!(config.max_chain_depth, 3);
        assert_eq!(config.max_query_entities, 4);
        // A zero budget would make every script a no-op; clamp to one step.
        assert_eq!(config.max_script_steps, 1);
        assert_eq!(config.seed, 99);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{ "seed": 7, "max_query_entities": 2 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_query_entities, 2);
        assert_eq!(config.max_chain_depth, DEFAULT_MAX_CHAIN_DEPTH);
    }

    #[test]
    fn test_bad_json() {
        assert!(EngineConfig::from_json("{ not json").is_err());
    }
}
