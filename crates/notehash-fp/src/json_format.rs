//! JSON / BSON format for index files
//!
//! Human-readable encoding of the inverted index. The same structure is
//! written as BSON when a compact but still self-describing file is needed.

use crate::format::{IndexMetadata, StoredBucket};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete JSON index file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexJsonFile {
    pub version: String,
    pub metadata: IndexMetadata,
    pub buckets: Vec<StoredBucket>,
}

impl IndexJsonFile {
    /// Create a new JSON index file
    pub fn new(metadata: IndexMetadata, buckets: Vec<StoredBucket>) -> Self {
        Self {
            version: "1.0".to_string(),
            metadata,
            buckets,
        }
    }

    /// Total number of entries across all keys
    pub fn num_entries(&self) -> usize {
        self.buckets.iter().map(|b| b.entries.len()).sum()
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json_str = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json_str)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let index_file: IndexJsonFile = serde_json::from_str(&json_str)
            .with_context(|| format!("Failed to parse JSON index {}", path.display()))?;
        Ok(index_file)
    }

    /// Save to BSON file
    pub fn save_bson(&self, path: &Path) -> Result<()> {
        let doc = bson::to_document(self).context("Failed to encode BSON index")?;
        let mut bytes = Vec::new();
        doc.to_writer(&mut bytes)?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Load from BSON file
    pub fn load_bson(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let doc = bson::Document::from_reader(bytes.as_slice())
            .with_context(|| format!("Failed to parse BSON index {}", path.display()))?;
        let index_file: IndexJsonFile = bson::from_document(doc)?;
        Ok(index_file)
    }

    /// Load JSON or BSON based on the file extension
    pub fn load_auto(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bson") => Self::load_bson(path),
            _ => Self::load(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::StoredEntry;

    fn sample() -> IndexJsonFile {
        IndexJsonFile::new(
            IndexMetadata::new("time-diff+percentile", 3, 1),
            vec![StoredBucket {
                key: 405,
                entries: vec![StoredEntry {
                    onset: 120,
                    source: "bach.mid".to_string(),
                    label: "classical".to_string(),
                }],
            }],
        )
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let original = sample();

        original.save(&path).unwrap();
        let loaded = IndexJsonFile::load_auto(&path).unwrap();

        assert_eq!(loaded, original);
        assert_eq!(loaded.num_entries(), 1);
    }

    #[test]
    fn test_bson_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bson");
        let original = sample();

        original.save_bson(&path).unwrap();
        let loaded = IndexJsonFile::load_auto(&path).unwrap();

        assert_eq!(loaded, original);
    }
}
