//! Inverted fingerprint index
//!
//! Maps a fingerprint key to every occurrence of that key in the reference
//! corpus. Entries are append-only and kept in insertion order.

use crate::fingerprint::{Fingerprint, FingerprintKey};
use notehash_fp::{StoredBucket, StoredEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One occurrence of a key inside one reference file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Anchor onset in the reference file
    pub onset: i64,
    /// Reference file identifier
    pub source: String,
    /// Genre label of the reference file
    pub label: String,
}

impl IndexEntry {
    pub fn new(onset: i64, source: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            onset,
            source: source.into(),
            label: label.into(),
        }
    }
}

/// Fingerprint index: key -> entries in insertion order.
///
/// No deduplication: fingerprinting the same file twice doubles its entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintIndex {
    buckets: BTreeMap<FingerprintKey, Vec<IndexEntry>>,
    num_entries: usize,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry under `key`
    pub fn insert(&mut self, key: FingerprintKey, entry: IndexEntry) {
        self.buckets.entry(key).or_default().push(entry);
        self.num_entries += 1;
    }

    /// Entries for `key`; empty for unknown keys
    pub fn lookup(&self, key: FingerprintKey) -> &[IndexEntry] {
        self.buckets.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Add every fingerprint of one reference file
    pub fn add_fingerprints(&mut self, source: &str, label: &str, fingerprints: &[Fingerprint]) {
        for fp in fingerprints {
            self.insert(fp.key, IndexEntry::new(fp.onset, source, label));
        }
    }

    /// Number of distinct keys
    pub fn num_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Number of entries across all keys
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    /// Keys in ascending order with their entries
    pub fn iter(&self) -> impl Iterator<Item = (FingerprintKey, &[IndexEntry])> {
        self.buckets.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Distinct source identifiers, in order of first appearance by key
    pub fn sources(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entries in self.buckets.values() {
            for entry in entries {
                if !seen.contains(&entry.source.as_str()) {
                    seen.push(&entry.source);
                }
            }
        }
        seen
    }

    pub fn to_stored(&self) -> Vec<StoredBucket> {
        self.buckets
            .iter()
            .map(|(key, entries)| StoredBucket {
                key: *key,
                entries: entries
                    .iter()
                    .map(|e| StoredEntry {
                        onset: e.onset,
                        source: e.source.clone(),
                        label: e.label.clone(),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn from_stored(buckets: Vec<StoredBucket>) -> Self {
        let mut index = Self::new();
        for bucket in buckets {
            for e in bucket.entries {
                index.insert(bucket.key, IndexEntry::new(e.onset, e.source, e.label));
            }
        }
        index
    }
}
