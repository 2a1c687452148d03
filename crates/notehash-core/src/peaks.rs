//! Peak extraction
//!
//! MIDI carries no amplitude, so the "peak frequency" of a file is taken to
//! be its most frequent pitch. The peak sequence is every note at that pitch,
//! with repeated onsets collapsed.

use crate::error::FingerprintError;
use crate::midi::NoteEvent;
use serde::{Deserialize, Serialize};

/// Ordered notes at a single peak pitch.
///
/// Onsets are non-decreasing and no two consecutive entries share an onset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakSequence {
    pitch: u8,
    notes: Vec<NoteEvent>,
}

impl PeakSequence {
    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn onsets(&self) -> impl Iterator<Item = i64> + '_ {
        self.notes.iter().map(|n| n.onset)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Onset of the last peak; the "total length" used for percentiles
    pub fn total_length(&self) -> i64 {
        self.notes.last().map(|n| n.onset).unwrap_or(0)
    }

    /// Build a sequence from raw onsets at one pitch (channel 0, unit length).
    pub fn from_onsets(pitch: u8, onsets: &[i64]) -> Self {
        let notes: Vec<NoteEvent> = onsets
            .iter()
            .map(|&onset| NoteEvent::new(onset, pitch, 1, 100, 0))
            .collect();
        Self {
            pitch,
            notes: collapse_onsets(notes.into_iter()),
        }
    }
}

/// Most frequent pitch in the notes.
///
/// Ties go to the lowest pitch value.
pub fn most_frequent_pitch(notes: &[NoteEvent]) -> Result<u8, FingerprintError> {
    if notes.is_empty() {
        return Err(FingerprintError::EmptyInput);
    }

    let mut counts = [0usize; 128];
    for note in notes {
        counts[(note.pitch & 0x7F) as usize] += 1;
    }

    let mut best = 0usize;
    for pitch in 1..counts.len() {
        if counts[pitch] > counts[best] {
            best = pitch;
        }
    }

    Ok(best as u8)
}

/// Extract the peak sequence from a full note list.
pub fn extract_peaks(notes: &[NoteEvent]) -> Result<PeakSequence, FingerprintError> {
    let pitch = most_frequent_pitch(notes)?;
    let peaks = collapse_onsets(notes.iter().copied().filter(|n| n.pitch == pitch));

    log::trace!("peak pitch {} with {} peaks", pitch, peaks.len());

    Ok(PeakSequence {
        pitch,
        notes: peaks,
    })
}

/// Extract the peak sequence from the notes of one channel only.
pub fn extract_channel_peaks(
    notes: &[NoteEvent],
    channel: u8,
) -> Result<PeakSequence, FingerprintError> {
    let melody: Vec<NoteEvent> = notes
        .iter()
        .copied()
        .filter(|n| n.channel == channel)
        .collect();
    extract_peaks(&melody)
}

/// Keep the first note at each run of equal onsets.
fn collapse_onsets(notes: impl Iterator<Item = NoteEvent>) -> Vec<NoteEvent> {
    let mut out: Vec<NoteEvent> = Vec::new();
    for note in notes {
        if out.last().map_or(true, |last| last.onset != note.onset) {
            out.push(note);
        }
    }
    out
}
