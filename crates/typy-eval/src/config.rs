//! Resource limits for a run.

use serde::{Deserialize, Serialize};

/// Evaluator limits. Every field has a default, so a partial JSON object
/// (or `{}`) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum number of evaluated statements and expressions.
    pub step_limit: u64,
    /// Maximum depth of nested function and method calls.
    pub max_call_depth: usize,
    /// Allocations between two collections of the instance arena.
    pub gc_threshold: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            step_limit: 10_000_000,
            max_call_depth: 1_000,
            gc_threshold: 1_024,
        }
    }
}

impl EvalConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn with_gc_threshold(mut self, gc_threshold: usize) -> Self {
        self.gc_threshold = gc_threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        assert_eq!(EvalConfig::from_json("{}").unwrap(), EvalConfig::default());
    }

    #[test]
    fn partial_json_overrides_named_fields() {
        let config = EvalConfig::from_json(r#"{"max_call_depth": 8}"#).unwrap();
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.step_limit, EvalConfig::default().step_limit);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(EvalConfig::from_json(r#"{"step_limit": "many"}"#).is_err());
    }
}
