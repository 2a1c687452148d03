//! Tests for matching algorithm

use super::*;
use crate::fingerprint::{FingerprintGenerator, HashVariant};
use crate::index::IndexEntry;
use crate::peaks::PeakSequence;

fn corpus_index() -> FingerprintIndex {
    let generator = FingerprintGenerator::new(HashVariant::TimeDiff, 2);
    let mut index = FingerprintIndex::new();

    let classical = PeakSequence::from_onsets(60, &[0, 4, 9, 13]);
    index.add_fingerprints("bach.mid", "classical", &generator.generate(&classical));

    let rock = PeakSequence::from_onsets(45, &[0, 5, 11, 16]);
    index.add_fingerprints("acdc.mid", "rock", &generator.generate(&rock));

    index
}

#[test]
fn test_matcher_basic() {
    let index = corpus_index();
    let generator = FingerprintGenerator::new(HashVariant::TimeDiff, 2);
    let query = generator.generate(&PeakSequence::from_onsets(60, &[0, 4, 9, 13]));

    let result = Matcher::new(&index).match_query("query.mid", &query);

    assert_eq!(result.buckets.len(), 1);
    let bucket = &result.buckets["bach.mid"];
    assert_eq!(bucket.training_times(), &[0, 0]);
    assert_eq!(bucket.sample_times(), &[0, 0]);
    assert_eq!(result.tally.get("classical"), Some(&2));
    assert_eq!(result.tally.get("rock"), None);
}

#[test]
fn test_no_common_keys() {
    let index = corpus_index();
    let query = vec![Fingerprint { key: 1000, onset: 0 }];

    let result = Matcher::new(&index).match_query("query.mid", &query);

    assert!(result.is_empty());
    assert!(result.tally.is_empty());
    assert_eq!(result.num_matches(), 0);
}

#[test]
fn test_self_match_policy() {
    let index = corpus_index();
    let query = vec![Fingerprint { key: 4, onset: 0 }];

    let included = Matcher::new(&index).match_query("bach.mid", &query);
    assert_eq!(included.tally.get("classical"), Some(&1));

    let excluded = Matcher::new(&index)
        .with_self_match(SelfMatch::Exclude)
        .match_query("bach.mid", &query);
    assert!(excluded.is_empty());
}

#[test]
fn test_count_modes() {
    let mut index = FingerprintIndex::new();
    index.insert(7, IndexEntry::new(0, "a.mid", "rock"));
    index.insert(7, IndexEntry::new(20, "a.mid", "rock"));
    index.insert(7, IndexEntry::new(3, "b.mid", "classical"));
    let query = vec![Fingerprint { key: 7, onset: 0 }, Fingerprint { key: 7, onset: 40 }];

    let per_entry = Matcher::new(&index).match_query("q", &query);
    assert_eq!(per_entry.tally["rock"], 4);
    assert_eq!(per_entry.tally["classical"], 2);
    assert_eq!(per_entry.buckets["a.mid"].len(), 4);

    let per_source = Matcher::new(&index)
        .with_count_mode(CountMode::PerSource)
        .match_query("q", &query);
    assert_eq!(per_source.tally["rock"], 1);
    assert_eq!(per_source.tally["classical"], 1);
    // buckets still record every hit
    assert_eq!(per_source.buckets["a.mid"].len(), 4);
}

#[test]
fn test_best_offset() {
    let mut bucket = Bucket::new();
    assert_eq!(bucket.best_offset(), None);

    bucket.push(100, 0);
    bucket.push(110, 10);
    bucket.push(120, 20);
    bucket.push(5, 0);
    assert_eq!(bucket.best_offset(), Some((100, 3)));

    let mut tied = Bucket::new();
    tied.push(10, 0);
    tied.push(0, 5);
    assert_eq!(tied.best_offset(), Some((-5, 1)));
}
