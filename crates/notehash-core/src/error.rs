//! Error taxonomy for fingerprinting a single file
//!
//! Every variant is local to one file: callers driving a corpus log it and
//! move on to the next file.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    /// No notes to extract a peak sequence from
    #[error("no note events to extract peaks from")]
    EmptyInput,

    /// Ticks-per-bar cannot be derived without a time signature
    #[error("time signature not found for {}", path.display())]
    MissingTimeSignature { path: PathBuf },

    /// File is not a metrical standard MIDI file
    #[error("unsupported song format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FingerprintError {
    /// True for conditions that mean "skip this file" rather than a broken run
    pub fn is_skip(&self) -> bool {
        !matches!(self, FingerprintError::InvalidConfig(_))
    }
}
