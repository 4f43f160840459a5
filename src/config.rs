//! Resolver thresholds
//!
//! Defaults are starting points tuned against the builtin scenario corpus.
//! Callers can override any of them from a TOML document:
//!
//! ```
//! use intent_core::config::ResolverConfig;
//!
//! let config = ResolverConfig::from_toml_str("tie_margin = 0.2").unwrap();
//! assert_eq!(config.tie_margin, 0.2);
//! assert_eq!(config.score_floor, 0.45);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Candidates scoring below this never survive matching
pub const DEFAULT_SCORE_FLOOR: f64 = 0.45;
/// Top candidate must beat the runner-up by this much to win outright
pub const DEFAULT_TIE_MARGIN: f64 = 0.15;
/// Minimum per-word similarity for two words to align
pub const DEFAULT_TOKEN_MATCH_FLOOR: f64 = 0.70;
/// Upper bound on options offered in one clarification round
pub const DEFAULT_MAX_CLARIFICATION_OPTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub score_floor: f64,
    pub tie_margin: f64,
    pub token_match_floor: f64,
    pub max_clarification_options: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            score_floor: DEFAULT_SCORE_FLOOR,
            tie_margin: DEFAULT_TIE_MARGIN,
            token_match_floor: DEFAULT_TOKEN_MATCH_FLOOR,
            max_clarification_options: DEFAULT_MAX_CLARIFICATION_OPTIONS,
        }
    }
}

impl ResolverConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fractions = [
            ("score_floor", self.score_floor),
            ("tie_margin", self.tie_margin),
            ("token_match_floor", self.token_match_floor),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if self.max_clarification_options < 2 {
            return Err(ConfigError::TooFewOptions(self.max_clarification_options));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ResolverConfig::default();
        config.validate().unwrap();
        assert_eq!(config.score_floor, DEFAULT_SCORE_FLOOR);
        assert_eq!(config.tie_margin, DEFAULT_TIE_MARGIN);
    }

    #[test]
    fn test_partial_override() {
        let config = ResolverConfig::from_toml_str(
            "score_floor = 0.6\nmax_clarification_options = 3\n",
        )
        .unwrap();
        assert_eq!(config.score_floor, 0.6);
        assert_eq!(config.max_clarification_options, 3);
        assert_eq!(config.token_match_floor, DEFAULT_TOKEN_MATCH_FLOOR);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = ResolverConfig::from_toml_str("tie_margin = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "tie_margin", .. }));
    }

    #[test]
    fn test_nan_rejected() {
        let config = ResolverConfig {
            score_floor: f64::NAN,
            ..ResolverConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_too_few_options() {
        let err = ResolverConfig::from_toml_str("max_clarification_options = 1").unwrap_err();
        assert!(matches!(err, ConfigError::TooFewOptions(1)));
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let err = ResolverConfig::from_toml_str("floor = 0.5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
