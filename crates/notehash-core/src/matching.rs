//! Matching a query against the fingerprint index
//!
//! Every query key is looked up in the index; each hit lands in the bucket
//! of the reference file it came from and bumps that file's label count.

use crate::fingerprint::Fingerprint;
use crate::index::FingerprintIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(test)]
mod tests;

/// Whether a query may match entries of its own source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfMatch {
    Include,
    /// Drop entries whose source equals the query identifier
    Exclude,
}

/// How label counts accumulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountMode {
    /// One count per matched entry
    PerEntry,
    /// One count per matched reference file
    PerSource,
}

/// Aligned match times between one reference file and the query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    training_times: Vec<i64>,
    sample_times: Vec<i64>,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, training_time: i64, sample_time: i64) {
        self.training_times.push(training_time);
        self.sample_times.push(sample_time);
    }

    /// Onsets of the matches within the reference file
    pub fn training_times(&self) -> &[i64] {
        &self.training_times
    }

    /// Onsets of the matches within the query file
    pub fn sample_times(&self) -> &[i64] {
        &self.sample_times
    }

    pub fn len(&self) -> usize {
        self.training_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.training_times.is_empty()
    }

    /// Most common `training - sample` offset and its support.
    ///
    /// Ties go to the smallest offset. `None` for an empty bucket.
    pub fn best_offset(&self) -> Option<(i64, usize)> {
        let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
        for (t, s) in self.training_times.iter().zip(&self.sample_times) {
            *histogram.entry(t - s).or_insert(0) += 1;
        }

        let mut best: Option<(i64, usize)> = None;
        for (offset, count) in histogram {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((offset, count));
            }
        }
        best
    }
}

/// Per-label match counts
pub type LabelCounts = BTreeMap<String, usize>;

/// Buckets keyed by reference source plus label counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub buckets: BTreeMap<String, Bucket>,
    pub tally: LabelCounts,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total matched entries across all buckets
    pub fn num_matches(&self) -> usize {
        self.buckets.values().map(Bucket::len).sum()
    }
}

/// Matcher over a borrowed index
pub struct Matcher<'a> {
    index: &'a FingerprintIndex,
    self_match: SelfMatch,
    count_mode: CountMode,
}

impl<'a> Matcher<'a> {
    pub fn new(index: &'a FingerprintIndex) -> Self {
        Self {
            index,
            self_match: SelfMatch::Include,
            count_mode: CountMode::PerEntry,
        }
    }

    pub fn with_self_match(mut self, self_match: SelfMatch) -> Self {
        self.self_match = self_match;
        self
    }

    pub fn with_count_mode(mut self, count_mode: CountMode) -> Self {
        self.count_mode = count_mode;
        self
    }

    /// Match the query fingerprints of `query_id` against the index
    pub fn match_query(&self, query_id: &str, query: &[Fingerprint]) -> MatchResult {
        let mut result = MatchResult::default();

        for fp in query {
            for entry in self.index.lookup(fp.key) {
                if self.self_match == SelfMatch::Exclude && entry.source == query_id {
                    continue;
                }

                let bucket = result.buckets.entry(entry.source.clone()).or_default();
                let first_hit = bucket.is_empty();
                bucket.push(entry.onset, fp.onset);

                if self.count_mode == CountMode::PerEntry || first_hit {
                    *result.tally.entry(entry.label.clone()).or_insert(0) += 1;
                }
            }
        }

        log::trace!(
            "{}: {} matches across {} sources",
            query_id,
            result.num_matches(),
            result.buckets.len()
        );

        result
    }
}
