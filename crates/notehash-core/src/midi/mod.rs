//! Symbolic music decoding
//!
//! Turns standard MIDI files into a flat, onset-ordered list of note events
//! plus the ticks-per-bar value derived from the time signature.

mod decoder;

pub use decoder::{decode_bytes, decode_song, DecodedSong};

use crate::error::FingerprintError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single decoded note. Never mutated after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Onset in ticks
    pub onset: i64,
    /// MIDI pitch (0..=127)
    pub pitch: u8,
    /// Duration in ticks
    pub duration: i64,
    pub velocity: u8,
    pub channel: u8,
}

impl NoteEvent {
    pub fn new(onset: i64, pitch: u8, duration: i64, velocity: u8, channel: u8) -> Self {
        Self {
            onset,
            pitch,
            duration,
            velocity,
            channel,
        }
    }
}

/// Supported symbolic song formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongFormat {
    Midi,
    Unknown,
}

impl SongFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("mid") | Some("midi") | Some("smf") => SongFormat::Midi,
            _ => SongFormat::Unknown,
        }
    }
}

/// Supplier of decoded note sequences
pub trait NoteSource: Send + Sync {
    /// Ordered note events of the file
    fn decode(&self, path: &Path) -> Result<Vec<NoteEvent>>;

    /// Ticks per bar from the time signature; fails with
    /// [`FingerprintError::MissingTimeSignature`] when there is none.
    fn ticks_per_bar(&self, path: &Path) -> Result<u32>;

    /// Notes and ticks-per-bar together
    fn load(&self, path: &Path) -> Result<(Vec<NoteEvent>, u32)> {
        let ticks_per_bar = self.ticks_per_bar(path)?;
        Ok((self.decode(path)?, ticks_per_bar))
    }
}

/// [`NoteSource`] backed by standard MIDI files
#[derive(Debug, Default, Clone, Copy)]
pub struct MidiSource;

impl MidiSource {
    pub fn new() -> Self {
        Self
    }

    fn decode_checked(&self, path: &Path) -> Result<DecodedSong> {
        if SongFormat::from_path(path) == SongFormat::Unknown {
            return Err(FingerprintError::UnsupportedFormat {
                path: path.to_path_buf(),
            }
            .into());
        }
        decode_song(path)
    }
}

impl NoteSource for MidiSource {
    fn decode(&self, path: &Path) -> Result<Vec<NoteEvent>> {
        Ok(self.decode_checked(path)?.notes)
    }

    fn ticks_per_bar(&self, path: &Path) -> Result<u32> {
        self.load(path).map(|(_, ticks_per_bar)| ticks_per_bar)
    }

    /// Decode once and return both notes and ticks-per-bar.
    fn load(&self, path: &Path) -> Result<(Vec<NoteEvent>, u32)> {
        let song = self.decode_checked(path)?;
        let ticks_per_bar = song
            .ticks_per_bar()
            .ok_or_else(|| FingerprintError::MissingTimeSignature {
                path: path.to_path_buf(),
            })?;
        Ok((song.notes, ticks_per_bar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(SongFormat::from_path(Path::new("a/b.mid")), SongFormat::Midi);
        assert_eq!(SongFormat::from_path(Path::new("b.MIDI")), SongFormat::Midi);
        assert_eq!(SongFormat::from_path(Path::new("b.wav")), SongFormat::Unknown);
        assert_eq!(SongFormat::from_path(Path::new("noext")), SongFormat::Unknown);
    }

    #[test]
    fn test_unknown_format_is_skip_error() {
        let err = MidiSource::new()
            .decode(Path::new("song.txt"))
            .unwrap_err();
        let err = err.downcast_ref::<FingerprintError>().unwrap();
        assert!(matches!(err, FingerprintError::UnsupportedFormat { .. }));
        assert!(err.is_skip());
    }

    #[test]
    fn test_missing_time_signature_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("untimed.mid");
        std::fs::write(&path, super::decoder::tests::build_midi(false)).unwrap();

        let source = MidiSource::new();
        assert_eq!(source.decode(&path).unwrap().len(), 3);

        let err = source.ticks_per_bar(&path).unwrap_err();
        let err = err.downcast_ref::<FingerprintError>().unwrap();
        assert!(matches!(err, FingerprintError::MissingTimeSignature { .. }));
        assert!(err.is_skip());
        assert!(source.load(&path).is_err());
    }

    #[test]
    fn test_load_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timed.midi");
        std::fs::write(&path, super::decoder::tests::build_midi(true)).unwrap();

        let (notes, ticks_per_bar) = MidiSource::new().load(&path).unwrap();
        assert_eq!(ticks_per_bar, 1920);
        assert_eq!(notes[0], NoteEvent::new(0, 60, 480, 100, 0));
    }
}
