//! Fan-out fingerprint hashing
//!
//! Every peak is paired with the next `fan_out` peaks. Each pair yields an
//! integer key that ignores absolute position (time-diff) or folds some
//! position/pitch information into the key (the other variants).

use crate::config::ClassifierConfig;
use crate::peaks::PeakSequence;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer fingerprint key
pub type FingerprintKey = i64;

/// Scale applied to the onset difference in percentile keys
pub const PERCENTILE_SCALE: i64 = 100;

/// The four supported key functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashVariant {
    /// `onset[i+j] - onset[i]`
    TimeDiff,
    /// `(onset[i+j] - onset[i]) * 100 + floor(onset[i] / total * 100)`
    #[serde(rename = "time-diff+percentile")]
    TimeDiffPercentile,
    /// `onset[i+j] - onset[i] * 1000 + pitch`
    #[serde(rename = "time-diff+pitch")]
    TimeDiffPitch,
    /// `onset[i+j] - onset[i] * 10 + floor(pitch / 127 * 10)`
    #[serde(rename = "time-diff+pitch-percentile")]
    TimeDiffPitchPercentile,
}

impl HashVariant {
    pub const ALL: [HashVariant; 4] = [
        HashVariant::TimeDiff,
        HashVariant::TimeDiffPercentile,
        HashVariant::TimeDiffPitch,
        HashVariant::TimeDiffPitchPercentile,
    ];

    /// Variant selected by a command-line index (0..=3)
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        match self {
            HashVariant::TimeDiff => 0,
            HashVariant::TimeDiffPercentile => 1,
            HashVariant::TimeDiffPitch => 2,
            HashVariant::TimeDiffPitchPercentile => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashVariant::TimeDiff => "time-diff",
            HashVariant::TimeDiffPercentile => "time-diff+percentile",
            HashVariant::TimeDiffPitch => "time-diff+pitch",
            HashVariant::TimeDiffPitchPercentile => "time-diff+pitch-percentile",
        }
    }

    /// Key for the anchor/target pair.
    ///
    /// The pitch variants keep the literal `target - anchor * scale` form so
    /// keys stay compatible with indexes built the same way.
    pub fn key(&self, anchor: i64, target: i64, pitch: u8, total_length: i64) -> FingerprintKey {
        match self {
            HashVariant::TimeDiff => target - anchor,
            HashVariant::TimeDiffPercentile => {
                encode_percentile_key(target - anchor, position_percentile(anchor, total_length))
            }
            HashVariant::TimeDiffPitch => target - anchor * 1000 + pitch as i64,
            HashVariant::TimeDiffPitchPercentile => {
                let bucket = (pitch as f64 / 127.0 * 10.0).floor() as i64;
                target - anchor * 10 + bucket
            }
        }
    }
}

impl Default for HashVariant {
    fn default() -> Self {
        HashVariant::TimeDiff
    }
}

impl fmt::Display for HashVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = s.parse::<usize>() {
            return Self::from_index(index)
                .ok_or_else(|| format!("hash variant index must be in 0..{}", Self::ALL.len()));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.name() == s)
            .ok_or_else(|| format!("unknown hash variant: {}", s))
    }
}

/// Floor of `onset / total_length * 100`; 0 when the length is 0.
pub fn position_percentile(onset: i64, total_length: i64) -> i64 {
    if total_length <= 0 {
        return 0;
    }
    (onset as f64 / total_length as f64 * 100.0).floor() as i64
}

/// Pack an onset difference and a percentile (0..=99) into one key.
pub fn encode_percentile_key(delta: i64, percentile: i64) -> FingerprintKey {
    delta * PERCENTILE_SCALE + percentile
}

/// Inverse of [`encode_percentile_key`] for percentiles in 0..=99.
pub fn decode_percentile_key(key: FingerprintKey) -> (i64, i64) {
    (
        key.div_euclid(PERCENTILE_SCALE),
        key.rem_euclid(PERCENTILE_SCALE),
    )
}

/// A key anchored at a peak onset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub key: FingerprintKey,
    /// Onset of the anchor peak
    pub onset: i64,
}

/// Fingerprint generator
#[derive(Debug, Clone, Copy)]
pub struct FingerprintGenerator {
    variant: HashVariant,
    fan_out: usize,
}

impl FingerprintGenerator {
    pub fn new(variant: HashVariant, fan_out: usize) -> Self {
        Self { variant, fan_out }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.hash_variant, config.fan_out)
    }

    pub fn variant(&self) -> HashVariant {
        self.variant
    }

    pub fn fan_out(&self) -> usize {
        self.fan_out
    }

    /// Generate `(key, anchor onset)` pairs.
    ///
    /// Anchors run over `0..len - (fan_out + 1)`, so sequences of at most
    /// `fan_out + 1` peaks produce nothing.
    pub fn generate(&self, peaks: &PeakSequence) -> Vec<Fingerprint> {
        let notes = peaks.notes();
        let anchors = notes.len().saturating_sub(self.fan_out.saturating_add(1));
        let total_length = peaks.total_length();

        let mut fingerprints = Vec::with_capacity(anchors.saturating_mul(self.fan_out));
        for i in 0..anchors {
            let anchor = &notes[i];
            for j in 1..=self.fan_out {
                let target = &notes[i + j];
                fingerprints.push(Fingerprint {
                    key: self
                        .variant
                        .key(anchor.onset, target.onset, anchor.pitch, total_length),
                    onset: anchor.onset,
                });
            }
        }

        fingerprints
    }
}
