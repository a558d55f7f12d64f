//! Engine configuration.
//!
//! Defaults live in the `Default` impl; the YAML file may set any subset of
//! keys and the rest fall back per-field via `#[serde(default)]`.

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Alphabet size K of the quantizer. Needs at least 2 bins for the
    /// decision rule to separate up-moves from down-moves.
    pub num_bins: i32,

    /// Window length L: depth of the sequences trained and queried.
    pub sequence_length: usize,

    /// Confidence gate τ for BUY/SELL in the per-node decision rule.
    pub confidence_threshold: f64,

    /// Profitability scan horizon H, in bars.
    pub lookahead_days: usize,

    /// Favorable move θ required within the horizon for a side to count as
    /// profitable.
    pub take_profit_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_bins: 10,
            sequence_length: 5,
            confidence_threshold: 0.70,
            lookahead_days: 5,
            take_profit_threshold: 0.02,
        }
    }
}

impl EngineConfig {
    /// Load from a YAML file.
    ///
    /// A missing or unreadable file, or one that fails to parse, logs a
    /// warning and falls back to the full defaults.
    pub fn from_yaml_file(path: &str) -> EngineConfig {
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                warn!(path, error = %e, "config file unavailable, using defaults");
                return EngineConfig::default();
            }
        };

        match serde_yaml::from_str(&raw) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path, error = %e, "config file failed to parse, using defaults");
                EngineConfig::default()
            }
        }
    }

    /// Reject parameter values the engine cannot make sense of.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_bins < 2 {
            return Err(format!("num_bins must be >= 2, got {}", self.num_bins));
        }
        if self.sequence_length == 0 {
            return Err("sequence_length must be positive".to_string());
        }
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold < 1.0) {
            return Err(format!(
                "confidence_threshold must be in (0, 1), got {}",
                self.confidence_threshold
            ));
        }
        if self.lookahead_days == 0 {
            return Err("lookahead_days must be positive".to_string());
        }
        if self.take_profit_threshold <= 0.0 {
            return Err(format!(
                "take_profit_threshold must be positive, got {}",
                self.take_profit_threshold
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.num_bins, 10);
        assert_eq!(cfg.sequence_length, 5);
        assert_eq!(cfg.confidence_threshold, 0.70);
        assert_eq!(cfg.lookahead_days, 5);
        assert_eq!(cfg.take_profit_threshold, 0.02);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_yaml_overrides_single_fields() {
        let cfg: EngineConfig = serde_yaml::from_str("num_bins: 8\nlookahead_days: 3\n").unwrap();
        assert_eq!(cfg.num_bins, 8);
        assert_eq!(cfg.lookahead_days, 3);
        assert_eq!(cfg.sequence_length, 5);
        assert_eq!(cfg.confidence_threshold, 0.70);
    }

    #[test]
    fn validate_rejects_degenerate_parameters() {
        let bad = [
            EngineConfig {
                num_bins: 1,
                ..EngineConfig::default()
            },
            EngineConfig {
                confidence_threshold: 1.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                sequence_length: 0,
                ..EngineConfig::default()
            },
            EngineConfig {
                lookahead_days: 0,
                ..EngineConfig::default()
            },
            EngineConfig {
                take_profit_threshold: 0.0,
                ..EngineConfig::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err());
        }
    }
}
