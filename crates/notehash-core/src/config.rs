//! Configuration parameters for fingerprinting and classification

use crate::error::FingerprintError;
use crate::fingerprint::HashVariant;
use crate::matching::SelfMatch;
use crate::melody::MelodySignal;
use serde::{Deserialize, Serialize};

/// Largest accepted fan-out
pub const MAX_FAN_OUT: usize = 64;

/// Algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    // Fingerprint generation
    pub hash_variant: HashVariant,
    pub fan_out: usize,

    // Melody channel analysis
    /// Restrict peak extraction to the chosen melody channel
    pub melody_only: bool,
    pub melody_signal: MelodySignal,
    /// Inter-onset gaps at or above this many ticks are ignored
    pub max_onset_gap: i64,
    /// Largest stride for repeated pitch-delta runs
    pub consecutive_strides: usize,

    // Matching and scoring
    pub self_match: SelfMatch,
    pub primary_label: String,
    pub secondary_label: String,

    // Bar-interval path
    /// Extra bars allowed between two matched downbeats
    pub bar_tolerance: i64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            hash_variant: HashVariant::TimeDiff,
            fan_out: 5,

            melody_only: false,
            melody_signal: MelodySignal::Consensus,
            max_onset_gap: 1000,
            consecutive_strides: 5,

            self_match: SelfMatch::Include,
            primary_label: "classical".to_string(),
            secondary_label: "rock".to_string(),

            bar_tolerance: 1,
        }
    }
}

impl ClassifierConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), FingerprintError> {
        if self.fan_out == 0 {
            return Err(FingerprintError::InvalidConfig("fan_out must be > 0".into()));
        }
        if self.fan_out > MAX_FAN_OUT {
            return Err(FingerprintError::InvalidConfig(format!(
                "fan_out must be <= {}",
                MAX_FAN_OUT
            )));
        }
        if self.consecutive_strides == 0 {
            return Err(FingerprintError::InvalidConfig(
                "consecutive_strides must be > 0".into(),
            ));
        }
        if self.primary_label.is_empty() || self.secondary_label.is_empty() {
            return Err(FingerprintError::InvalidConfig("labels must not be empty".into()));
        }
        if self.primary_label == self.secondary_label {
            return Err(FingerprintError::InvalidConfig(
                "primary and secondary labels must differ".into(),
            ));
        }
        if self.bar_tolerance < 0 {
            return Err(FingerprintError::InvalidConfig("bar_tolerance must be >= 0".into()));
        }
        Ok(())
    }

    /// Same settings with another fan-out
    pub fn with_fan_out(&self, fan_out: usize) -> Self {
        Self {
            fan_out,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ClassifierConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_fan_out() {
        let config = ClassifierConfig::default().with_fan_out(0);
        assert!(matches!(
            config.validate(),
            Err(FingerprintError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_fan_out() {
        assert!(ClassifierConfig::default().with_fan_out(MAX_FAN_OUT).validate().is_ok());
        assert!(ClassifierConfig::default()
            .with_fan_out(MAX_FAN_OUT + 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_rejects_identical_labels() {
        let config = ClassifierConfig {
            secondary_label: "classical".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
