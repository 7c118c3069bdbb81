//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{RanklistError, Result};

/// Knobs for validation and computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unknown indicator fields are errors instead of warnings.
    pub strict: bool,
    /// Categories a mixed-ranks indicator may select before a warning (default 3).
    pub max_selected_ranks: usize,
    /// Two special operations on one target are an error (default) or a warning.
    pub reject_duplicate_targets: bool,
    /// Upper bound applied to a standard indicator's `topN`.
    pub max_top_n: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict: false,
            max_selected_ranks: 3,
            reject_duplicate_targets: true,
            max_top_n: None,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_selected_ranks == 0 {
            return Err(RanklistError::invalid_config(
                "max_selected_ranks must be > 0",
            ));
        }

        if self.max_top_n == Some(0) {
            return Err(RanklistError::invalid_config(
                "max_top_n must be > 0 when set",
            ));
        }

        Ok(())
    }

    /// Builder method: set strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Builder method: set the selected-category limit
    pub fn with_max_selected_ranks(mut self, max: usize) -> Self {
        self.max_selected_ranks = max;
        self
    }

    /// Builder method: reject or tolerate duplicate special-operation targets
    pub fn with_reject_duplicate_targets(mut self, reject: bool) -> Self {
        self.reject_duplicate_targets = reject;
        self
    }

    /// Builder method: cap standard-mode `topN`
    pub fn with_max_top_n(mut self, max: Option<usize>) -> Self {
        self.max_top_n = max;
        self
    }

    /// Apply `max_top_n` to an indicator's `topN`.
    pub fn cap_top_n(&self, top_n: Option<usize>) -> Option<usize> {
        match (top_n, self.max_top_n) {
            (Some(n), Some(max)) => Some(n.min(max)),
            (None, Some(max)) => Some(max),
            (n, None) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::default().with_max_selected_ranks(0).validate().is_err());
        assert!(EngineConfig::default().with_max_top_n(Some(0)).validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "strict": true }"#).unwrap();
        assert!(cfg.strict);
        assert_eq!(cfg.max_selected_ranks, 3);
        assert!(cfg.reject_duplicate_targets);

        assert!(EngineConfig::from_json(r#"{ "max_selected_ranks": 0 }"#).is_err());
        assert!(matches!(
            EngineConfig::from_json("{"),
            Err(RanklistError::Serialization { .. })
        ));
    }

    #[test]
    fn test_cap_top_n() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.cap_top_n(Some(50)), Some(50));
        assert_eq!(cfg.cap_top_n(None), None);

        let cfg = cfg.with_max_top_n(Some(20));
        assert_eq!(cfg.cap_top_n(Some(50)), Some(20));
        assert_eq!(cfg.cap_top_n(Some(5)), Some(5));
        assert_eq!(cfg.cap_top_n(None), Some(20));
    }
}
