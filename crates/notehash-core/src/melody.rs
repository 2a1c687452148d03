//! Melody channel selection
//!
//! Four per-channel statistics each vote for the channel that maximises
//! them; a fifth consensus vote picks the most common of the four.

use crate::midi::NoteEvent;
use serde::{Deserialize, Serialize};

/// Statistics for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel: u8,
    pub pitch_variance: f64,
    pub pitch_delta_variance: f64,
    pub onset_delta_variance: f64,
    /// Longest run of a repeated pitch delta, relative to the delta count
    pub max_run_ratio: f64,
}

/// Which vote decides the melody channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MelodySignal {
    PitchVariance,
    PitchDeltaVariance,
    OnsetDeltaVariance,
    LongestRun,
    Consensus,
}

impl MelodySignal {
    pub const ALL: [MelodySignal; 5] = [
        MelodySignal::PitchVariance,
        MelodySignal::PitchDeltaVariance,
        MelodySignal::OnsetDeltaVariance,
        MelodySignal::LongestRun,
        MelodySignal::Consensus,
    ];
}

/// The five votes, in signal order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelodyVotes {
    pub pitch_variance: u8,
    pub pitch_delta_variance: u8,
    pub onset_delta_variance: u8,
    pub longest_run: u8,
    pub consensus: u8,
}

impl MelodyVotes {
    pub fn get(&self, signal: MelodySignal) -> u8 {
        match signal {
            MelodySignal::PitchVariance => self.pitch_variance,
            MelodySignal::PitchDeltaVariance => self.pitch_delta_variance,
            MelodySignal::OnsetDeltaVariance => self.onset_delta_variance,
            MelodySignal::LongestRun => self.longest_run,
            MelodySignal::Consensus => self.consensus,
        }
    }
}

/// Per-channel statistics in order of each channel's first note.
pub fn analyze_channels(
    notes: &[NoteEvent],
    max_onset_gap: i64,
    consecutive_strides: usize,
) -> Vec<ChannelStats> {
    // (channel, onsets, pitches), first-appearance order
    let mut channels: Vec<(u8, Vec<i64>, Vec<i64>)> = Vec::new();
    for note in notes {
        let slot = match channels.iter().position(|(c, _, _)| *c == note.channel) {
            Some(slot) => slot,
            None => {
                channels.push((note.channel, Vec::new(), Vec::new()));
                channels.len() - 1
            }
        };
        channels[slot].1.push(note.onset);
        channels[slot].2.push(note.pitch as i64);
    }

    channels
        .into_iter()
        .map(|(channel, onsets, pitches)| ChannelStats {
            channel,
            pitch_variance: round2(variance(&pitches)),
            pitch_delta_variance: round2(variance(&adjacent_deltas(&pitches, max_onset_gap))),
            onset_delta_variance: round2(variance(&adjacent_deltas(&onsets, max_onset_gap))),
            max_run_ratio: max_run_ratio(&pitches, consecutive_strides),
        })
        .collect()
}

/// Cast all five votes. `None` when there are no channels.
pub fn melody_votes(stats: &[ChannelStats]) -> Option<MelodyVotes> {
    let pitch_variance = argmax(stats, |s| s.pitch_variance)?;
    let pitch_delta_variance = argmax(stats, |s| s.pitch_delta_variance)?;
    let onset_delta_variance = argmax(stats, |s| s.onset_delta_variance)?;
    let longest_run = argmax(stats, |s| s.max_run_ratio)?;

    let consensus = most_common(&[
        pitch_variance,
        pitch_delta_variance,
        onset_delta_variance,
        longest_run,
    ]);

    Some(MelodyVotes {
        pitch_variance,
        pitch_delta_variance,
        onset_delta_variance,
        longest_run,
        consensus,
    })
}

/// Pure melody-channel choice from per-channel statistics.
pub fn choose_melody_channel(stats: &[ChannelStats], signal: MelodySignal) -> Option<u8> {
    melody_votes(stats).map(|votes| votes.get(signal))
}

/// Channel with the largest statistic; the earliest channel wins ties.
fn argmax(stats: &[ChannelStats], value: impl Fn(&ChannelStats) -> f64) -> Option<u8> {
    let mut best: Option<(&ChannelStats, f64)> = None;
    for s in stats {
        let v = value(s);
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ => best = Some((s, v)),
        }
    }
    best.map(|(s, _)| s.channel)
}

/// Most frequent value; ties go to the value that occurs first.
fn most_common(votes: &[u8]) -> u8 {
    let mut winner = votes[0];
    let mut winner_count = 0;
    for &candidate in votes {
        let count = votes.iter().filter(|&&v| v == candidate).count();
        if count > winner_count {
            winner = candidate;
            winner_count = count;
        }
    }
    winner
}

fn adjacent_deltas(values: &[i64], max_gap: i64) -> Vec<i64> {
    values
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&d| d < max_gap)
        .collect()
}

/// Population variance; 0 for empty input.
fn variance(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n
}

/// Longest run of repeated stride-`c` pitch deltas over every stride and offset.
fn max_run_ratio(pitches: &[i64], consecutive_strides: usize) -> f64 {
    let mut best = 0.0f64;
    for stride in 1..=consecutive_strides {
        for offset in 0..stride {
            let deltas: Vec<i64> = (offset + stride..pitches.len())
                .step_by(stride)
                .map(|k| pitches[k] - pitches[k - stride])
                .collect();
            if deltas.is_empty() {
                continue;
            }

            let mut longest = 0usize;
            let mut run = 0usize;
            for pair in deltas.windows(2) {
                if pair[1] == pair[0] {
                    run += 1;
                    longest = longest.max(run);
                } else {
                    run = 0;
                }
            }

            best = best.max(round2(longest as f64 / deltas.len() as f64));
        }
    }
    best
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
