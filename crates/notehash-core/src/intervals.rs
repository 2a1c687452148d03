//! Bar-interval matching
//!
//! Each bar is reduced to the highest pitch sounding on its downbeat. A query
//! is walked bar to bar; every successive pair of downbeats is an interval,
//! and a reference title matches the interval when it contains the same
//! pitch pair on (nearly) consecutive bars.

use crate::midi::NoteEvent;
use crate::voting::{IntervalMatches, TitleMatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest pitch on one bar's downbeat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Downbeat {
    pub bar: i64,
    pub onset: i64,
    pub pitch: u8,
}

/// Downbeats in onset order; bars without a note on the downbeat are absent.
pub fn downbeats(notes: &[NoteEvent], ticks_per_bar: u32) -> Vec<Downbeat> {
    let ticks_per_bar = ticks_per_bar as i64;
    if ticks_per_bar <= 0 {
        return Vec::new();
    }

    let mut highest: BTreeMap<i64, u8> = BTreeMap::new();
    for note in notes.iter().filter(|n| n.onset % ticks_per_bar == 0) {
        let pitch = highest.entry(note.onset).or_insert(note.pitch);
        if note.pitch > *pitch {
            *pitch = note.pitch;
        }
    }

    highest
        .into_iter()
        .map(|(onset, pitch)| Downbeat {
            bar: onset / ticks_per_bar,
            onset,
            pitch,
        })
        .collect()
}

/// One downbeat of a reference title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarEntry {
    pub bar: i64,
    pub title: String,
    pub label: String,
}

/// Downbeat pitch -> reference occurrences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarIndex {
    table: BTreeMap<u8, Vec<BarEntry>>,
}

impl BarIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_song(&mut self, title: &str, label: &str, downbeats: &[Downbeat]) {
        for db in downbeats {
            self.table.entry(db.pitch).or_default().push(BarEntry {
                bar: db.bar,
                title: title.to_string(),
                label: label.to_string(),
            });
        }
    }

    pub fn lookup(&self, pitch: u8) -> &[BarEntry] {
        self.table.get(&pitch).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Walk the query's downbeats and collect matches per interval.
    ///
    /// A pair `(x, y)` of entries matches when both come from the same title
    /// and `0 <= y.bar - x.bar - 1 <= tolerance`.
    pub fn match_song(&self, query: &[Downbeat], tolerance: i64) -> IntervalMatches {
        let mut matches = IntervalMatches::new();

        for (i, pair) in query.windows(2).enumerate() {
            let interval = i + 1;
            let mut hits = Vec::new();

            for x in self.lookup(pair[0].pitch) {
                for y in self.lookup(pair[1].pitch) {
                    let gap = y.bar - x.bar - 1;
                    if x.title == y.title && (0..=tolerance).contains(&gap) {
                        hits.push(TitleMatch::new(x.title.clone(), x.label.clone()));
                    }
                }
            }

            matches.insert(interval, hits);
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::{classify_intervals, percentages, tally_intervals};

    fn bars(pitches: &[u8]) -> Vec<Downbeat> {
        pitches
            .iter()
            .enumerate()
            .map(|(bar, &pitch)| Downbeat {
                bar: bar as i64,
                onset: bar as i64 * 1920,
                pitch,
            })
            .collect()
    }

    #[test]
    fn test_downbeats_take_highest_pitch() {
        let notes = vec![
            NoteEvent::new(0, 48, 480, 90, 1),
            NoteEvent::new(0, 72, 480, 90, 0),
            NoteEvent::new(480, 80, 480, 90, 0),
            NoteEvent::new(3840, 50, 480, 90, 1),
        ];

        assert_eq!(
            downbeats(&notes, 1920),
            vec![
                Downbeat { bar: 0, onset: 0, pitch: 72 },
                Downbeat { bar: 2, onset: 3840, pitch: 50 },
            ]
        );
        assert!(downbeats(&notes, 0).is_empty());
    }

    #[test]
    fn test_interval_matching() {
        let mut index = BarIndex::new();
        index.add_song("a.mid", "classical", &bars(&[60, 62, 64, 60]));
        index.add_song("b.mid", "rock", &bars(&[40, 62, 45, 47]));

        let matches = index.match_song(&bars(&[60, 62, 64]), 0);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[&1], vec![TitleMatch::new("a.mid", "classical")]);
        assert_eq!(matches[&2], vec![TitleMatch::new("a.mid", "classical")]);

        let shares = percentages(&classify_intervals(&tally_intervals(&matches)));
        assert_eq!(shares.get("classical"), Some(&1.0));
        assert_eq!(shares.get("rock"), None);
    }

    #[test]
    fn test_tolerance_allows_skipped_bars() {
        let mut index = BarIndex::new();
        let song = vec![
            Downbeat { bar: 0, onset: 0, pitch: 60 },
            Downbeat { bar: 2, onset: 3840, pitch: 67 },
        ];
        index.add_song("a.mid", "classical", &song);
        let query = bars(&[60, 67]);

        assert!(index.match_song(&query, 0)[&1].is_empty());
        assert_eq!(index.match_song(&query, 1)[&1].len(), 1);
    }

    #[test]
    fn test_unknown_pitches_record_empty_interval() {
        let index = BarIndex::new();
        let matches = index.match_song(&bars(&[1, 2, 3]), 1);
        assert_eq!(matches.len(), 2);
        assert!(matches.values().all(Vec::is_empty));
        assert!(percentages(&classify_intervals(&tally_intervals(&matches))).is_empty());
    }
}
