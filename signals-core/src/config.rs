//! Configuration types

use crate::{ConfigError, SignalsError, SignalsResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generative provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub provider_type: String,
    pub model: String,
    pub endpoint: Option<String>,
}

/// Engine configuration. Defaults mirror the request limits the discovery
/// surface advertises; `from_env` overrides individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Primary candidate query limit.
    pub candidate_limit: usize,
    /// Cap for the secondary all-signals query when the primary query
    /// yields nothing. Kept below `candidate_limit`.
    pub fallback_candidate_limit: usize,
    /// Default number of ranked matches returned by discovery.
    pub default_result_limit: usize,
    /// Hard ceiling on requested result limits.
    pub max_result_limit: usize,
    /// Maximum proposals drafted per discovery call.
    pub max_proposals: usize,
    /// How long a fresh activation context stays valid.
    pub activation_ttl: Duration,
    /// Activation contexts older than this are reaped regardless of status.
    pub activation_retention: Duration,
    /// Include raw per-signal platform sets in validation reports.
    pub debug_mode: bool,
    pub provider: Option<ProviderSettings>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 50,
            fallback_candidate_limit: 25,
            default_result_limit: 5,
            max_result_limit: 100,
            max_proposals: 5,
            activation_ttl: Duration::from_secs(24 * 3600),
            activation_retention: Duration::from_secs(7 * 24 * 3600),
            debug_mode: false,
            provider: None,
        }
    }
}

impl EngineConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `SIGNALS_CANDIDATE_LIMIT`: primary candidate query limit (default: 50)
    /// - `SIGNALS_FALLBACK_CANDIDATE_LIMIT`: secondary query cap (default: 25)
    /// - `SIGNALS_DEFAULT_RESULT_LIMIT`: default discovery result count (default: 5)
    /// - `SIGNALS_MAX_RESULT_LIMIT`: result count ceiling (default: 100)
    /// - `SIGNALS_MAX_PROPOSALS`: proposals per discovery call (default: 5)
    /// - `SIGNALS_ACTIVATION_TTL_HOURS`: activation validity window (default: 24)
    /// - `SIGNALS_ACTIVATION_RETENTION_DAYS`: reap window (default: 7)
    /// - `SIGNALS_DEBUG_MODE`: "1" enables validation debug info
    /// - `GEMINI_API_KEY`: presence enables the Gemini ranking provider
    pub fn from_env() -> Self {
        let defaults = Self::default();

        fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        }

        Self {
            candidate_limit: parse_var("SIGNALS_CANDIDATE_LIMIT", defaults.candidate_limit),
            fallback_candidate_limit: parse_var(
                "SIGNALS_FALLBACK_CANDIDATE_LIMIT",
                defaults.fallback_candidate_limit,
            ),
            default_result_limit: parse_var(
                "SIGNALS_DEFAULT_RESULT_LIMIT",
                defaults.default_result_limit,
            ),
            max_result_limit: parse_var("SIGNALS_MAX_RESULT_LIMIT", defaults.max_result_limit),
            max_proposals: parse_var("SIGNALS_MAX_PROPOSALS", defaults.max_proposals),
            activation_ttl: Duration::from_secs(
                parse_var("SIGNALS_ACTIVATION_TTL_HOURS", 24u64) * 3600,
            ),
            activation_retention: Duration::from_secs(
                parse_var("SIGNALS_ACTIVATION_RETENTION_DAYS", 7u64) * 24 * 3600,
            ),
            debug_mode: std::env::var("SIGNALS_DEBUG_MODE").ok().as_deref() == Some("1"),
            provider: std::env::var("GEMINI_API_KEY").ok().map(|_| ProviderSettings {
                provider_type: "gemini".to_string(),
                model: std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
                endpoint: None,
            }),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SignalsResult<()> {
        if self.candidate_limit == 0 {
            return Err(SignalsError::Config(ConfigError::InvalidValue {
                field: "candidate_limit".to_string(),
                value: self.candidate_limit.to_string(),
                reason: "candidate_limit must be greater than 0".to_string(),
            }));
        }

        if self.fallback_candidate_limit > self.candidate_limit {
            return Err(SignalsError::Config(ConfigError::InvalidValue {
                field: "fallback_candidate_limit".to_string(),
                value: self.fallback_candidate_limit.to_string(),
                reason: "fallback cap must not exceed the primary candidate limit".to_string(),
            }));
        }

        if self.default_result_limit == 0 || self.default_result_limit > self.max_result_limit {
            return Err(SignalsError::Config(ConfigError::InvalidValue {
                field: "default_result_limit".to_string(),
                value: self.default_result_limit.to_string(),
                reason: "default_result_limit must be in 1..=max_result_limit".to_string(),
            }));
        }

        if self.max_proposals == 0 {
            return Err(SignalsError::Config(ConfigError::InvalidValue {
                field: "max_proposals".to_string(),
                value: self.max_proposals.to_string(),
                reason: "max_proposals must be greater than 0".to_string(),
            }));
        }

        if self.activation_ttl.is_zero() {
            return Err(SignalsError::Config(ConfigError::InvalidValue {
                field: "activation_ttl".to_string(),
                value: format!("{:?}", self.activation_ttl),
                reason: "activation_ttl must be positive".to_string(),
            }));
        }

        if self.activation_retention.is_zero() {
            return Err(SignalsError::Config(ConfigError::InvalidValue {
                field: "activation_retention".to_string(),
                value: format!("{:?}", self.activation_retention),
                reason: "activation_retention must be positive".to_string(),
            }));
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_candidate_limit_rejected() {
        let config = EngineConfig {
            candidate_limit: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SignalsError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_fallback_cap_must_stay_below_primary() {
        let config = EngineConfig {
            candidate_limit: 10,
            fallback_candidate_limit: 20,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_result_limit_bounds() {
        let config = EngineConfig {
            default_result_limit: 200,
            max_result_limit: 100,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retention_rejected() {
        let config = EngineConfig {
            activation_retention: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
