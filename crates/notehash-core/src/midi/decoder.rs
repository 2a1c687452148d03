//! Standard MIDI file decoding

use super::NoteEvent;
use crate::error::FingerprintError;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Decoded song: notes plus the timing information needed for bars
#[derive(Debug, Clone)]
pub struct DecodedSong {
    /// Notes sorted by (onset, pitch, channel)
    pub notes: Vec<NoteEvent>,
    pub ticks_per_beat: u16,
    /// Numerator of the first time signature in the first track
    pub beats_per_bar: Option<u8>,
}

impl DecodedSong {
    pub fn ticks_per_bar(&self) -> Option<u32> {
        self.beats_per_bar
            .filter(|&beats| beats > 0)
            .map(|beats| beats as u32 * self.ticks_per_beat as u32)
    }
}

/// Decode a MIDI file from disk
pub fn decode_song(path: &Path) -> Result<DecodedSong> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read MIDI file: {}", path.display()))?;
    decode_bytes(&data).map_err(|e| match e.downcast::<FingerprintError>() {
        Ok(FingerprintError::UnsupportedFormat { .. }) => FingerprintError::UnsupportedFormat {
            path: path.to_path_buf(),
        }
        .into(),
        Ok(other) => other.into(),
        Err(e) => e.context(format!("Failed to decode MIDI file: {}", path.display())),
    })
}

/// Decode an in-memory MIDI image
pub fn decode_bytes(data: &[u8]) -> Result<DecodedSong> {
    let smf = midly::Smf::parse(data)?;

    let ticks_per_beat = match smf.header.timing {
        midly::Timing::Metrical(tpb) => tpb.as_int(),
        midly::Timing::Timecode(..) => {
            return Err(FingerprintError::UnsupportedFormat {
                path: Default::default(),
            }
            .into())
        }
    };

    // Time signature lives in the first track for type-1 files
    let beats_per_bar = smf.tracks.first().and_then(|track| {
        track.iter().find_map(|event| match event.kind {
            midly::TrackEventKind::Meta(midly::MetaMessage::TimeSignature(num, ..)) => Some(num),
            _ => None,
        })
    });

    let mut notes: Vec<NoteEvent> = Vec::new();

    for track in &smf.tracks {
        let mut current_tick: i64 = 0;
        // (channel, pitch) -> (velocity, start_tick)
        let mut active: HashMap<(u8, u8), (u8, i64)> = HashMap::new();

        for event in track {
            current_tick += event.delta.as_int() as i64;

            let midly::TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let ch = channel.as_int();

            match message {
                midly::MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    let pitch = key.as_int();
                    // Re-strike closes the sounding note first
                    if let Some((old_vel, start)) = active.remove(&(ch, pitch)) {
                        notes.push(NoteEvent::new(start, pitch, current_tick - start, old_vel, ch));
                    }
                    active.insert((ch, pitch), (vel.as_int(), current_tick));
                }
                midly::MidiMessage::NoteOn { key, .. } | midly::MidiMessage::NoteOff { key, .. } => {
                    let pitch = key.as_int();
                    if let Some((vel, start)) = active.remove(&(ch, pitch)) {
                        notes.push(NoteEvent::new(start, pitch, current_tick - start, vel, ch));
                    }
                }
                _ => {}
            }
        }

        // Dangling notes end at the track's last tick
        for ((ch, pitch), (vel, start)) in active.drain() {
            notes.push(NoteEvent::new(start, pitch, current_tick - start, vel, ch));
        }
    }

    notes.sort_by_key(|n| (n.onset, n.pitch, n.channel, n.duration, n.velocity));

    Ok(DecodedSong {
        notes,
        ticks_per_beat,
        beats_per_bar,
    })
}
