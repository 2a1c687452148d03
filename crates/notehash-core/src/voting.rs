//! Genre voting and scoring
//!
//! Two strategies: a binary ratio over the raw label counts of one query,
//! and a per-interval majority vote where tied winners split the vote.
//! Zero votes never divide: the ratio is 0.0 and the percentages are empty.

use crate::matching::LabelCounts;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A reference title matched within one interval
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TitleMatch {
    pub title: String,
    pub label: String,
}

impl TitleMatch {
    pub fn new(title: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            label: label.into(),
        }
    }
}

/// Matches per interval number (1-based, in walk order)
pub type IntervalMatches = BTreeMap<usize, Vec<TitleMatch>>;

/// Label counts per interval number
pub type IntervalTally = BTreeMap<usize, LabelCounts>;

/// Fractional votes per label
pub type Classification = BTreeMap<String, f64>;

/// `count[primary] / (count[primary] + count[secondary])`.
///
/// 0 when `primary` is absent, 1 when only `primary` is present.
pub fn binary_ratio_score(tally: &LabelCounts, primary: &str, secondary: &str) -> f64 {
    let primary_count = match tally.get(primary) {
        Some(&count) if count > 0 => count,
        _ => return 0.0,
    };
    let secondary_count = match tally.get(secondary) {
        Some(&count) => count,
        None => return 1.0,
    };
    primary_count as f64 / (primary_count + secondary_count) as f64
}

/// Count labels per interval, each title at most once per interval.
pub fn tally_intervals(matches: &IntervalMatches) -> IntervalTally {
    matches
        .iter()
        .map(|(&interval, hits)| {
            let mut titles: BTreeSet<&str> = BTreeSet::new();
            let mut counts = LabelCounts::new();
            for hit in hits {
                if titles.insert(hit.title.as_str()) {
                    *counts.entry(hit.label.clone()).or_insert(0) += 1;
                }
            }
            (interval, counts)
        })
        .collect()
}

/// Majority vote per interval; `n` tied winners receive `1/n` each.
pub fn classify_intervals(tally: &IntervalTally) -> Classification {
    let mut classification = Classification::new();

    for counts in tally.values() {
        let Some(&maximum) = counts.values().max() else {
            continue;
        };
        let winners: Vec<&String> = counts
            .iter()
            .filter(|(_, &count)| count == maximum)
            .map(|(label, _)| label)
            .collect();

        let share = 1.0 / winners.len() as f64;
        for label in winners {
            *classification.entry(label.clone()).or_insert(0.0) += share;
        }
    }

    classification
}

/// Normalise votes to fractions rounded to 2 decimals.
///
/// Empty when there are no votes.
pub fn percentages(classification: &Classification) -> BTreeMap<String, f64> {
    let total: f64 = classification.values().sum();
    if total <= 0.0 {
        return BTreeMap::new();
    }

    classification
        .iter()
        .map(|(label, votes)| (label.clone(), (votes / total * 100.0).round() / 100.0))
        .collect()
}

/// Label with the highest share; ties go to the alphabetically first label.
pub fn top_label(percentages: &BTreeMap<String, f64>) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for (label, &share) in percentages {
        if best.map_or(true, |(_, b)| share > b) {
            best = Some((label, share));
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counts(pairs: &[(&str, usize)]) -> LabelCounts {
        pairs.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    #[test]
    fn test_binary_ratio() {
        assert_relative_eq!(
            binary_ratio_score(&counts(&[("classical", 3), ("rock", 1)]), "classical", "rock"),
            0.75
        );
        assert_relative_eq!(
            binary_ratio_score(&counts(&[("classical", 5)]), "classical", "rock"),
            1.0
        );
        assert_relative_eq!(binary_ratio_score(&counts(&[]), "classical", "rock"), 0.0);
        assert_relative_eq!(
            binary_ratio_score(&counts(&[("rock", 4)]), "classical", "rock"),
            0.0
        );
    }

    #[test]
    fn test_fractional_interval_votes() {
        let mut tally = IntervalTally::new();
        tally.insert(1, counts(&[("A", 2), ("B", 2)]));
        tally.insert(2, counts(&[("A", 3)]));

        let classification = classify_intervals(&tally);
        assert_relative_eq!(classification["A"], 1.5);
        assert_relative_eq!(classification["B"], 0.5);

        let shares = percentages(&classification);
        assert_relative_eq!(shares["A"], 0.75);
        assert_relative_eq!(shares["B"], 0.25);
        assert_eq!(top_label(&shares), Some("A"));
    }

    #[test]
    fn test_titles_counted_once_per_interval() {
        let mut matches = IntervalMatches::new();
        matches.insert(
            1,
            vec![
                TitleMatch::new("fur_elise.mid", "classical"),
                TitleMatch::new("fur_elise.mid", "classical"),
                TitleMatch::new("moonlight.mid", "classical"),
                TitleMatch::new("thunder.mid", "rock"),
            ],
        );
        matches.insert(2, vec![]);

        let tally = tally_intervals(&matches);
        assert_eq!(tally[&1], counts(&[("classical", 2), ("rock", 1)]));
        assert!(tally[&2].is_empty());
    }

    #[test]
    fn test_zero_votes_yield_empty_percentages() {
        let tally = tally_intervals(&IntervalMatches::new());
        let classification = classify_intervals(&tally);
        assert!(classification.is_empty());
        assert!(percentages(&classification).is_empty());
        assert_eq!(top_label(&BTreeMap::new()), None);
    }

    #[test]
    fn test_rounded_shares_may_not_sum_to_one() {
        let mut tally = IntervalTally::new();
        tally.insert(1, counts(&[("A", 1), ("B", 1), ("C", 1)]));

        let shares = percentages(&classify_intervals(&tally));
        for share in shares.values() {
            assert_relative_eq!(*share, 0.33);
        }
    }
}
