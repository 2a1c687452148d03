//! Storage backend trait and implementations
//!
//! Persists a [`FingerprintIndex`] under a name such as `pitches_hash0-3`.

use anyhow::Result;
use notehash_fp::{IndexFile, IndexJsonFile, IndexMetadata, IndexReader, IndexWriter};
use std::path::{Path, PathBuf};

use crate::index::FingerprintIndex;
use crate::storage_config::{FileFormat, FilesystemConfig};

/// Abstract index store
pub trait Store: Send + Sync {
    /// Persist an index under `name`, replacing any previous one
    fn save_index(&self, name: &str, index: &FingerprintIndex, metadata: &IndexMetadata) -> Result<()>;

    /// Load the index stored under `name` together with its metadata
    fn load_index(&self, name: &str) -> Result<(FingerprintIndex, IndexMetadata)>;

    /// Whether an index is stored under `name`
    fn exists(&self, name: &str) -> bool;
}

/// Filesystem-based store: one file per index under a base directory
pub struct FilesystemStore {
    base_dir: PathBuf,
    format: FileFormat,
}

impl FilesystemStore {
    /// Create a new filesystem store
    pub fn new(config: &FilesystemConfig) -> Self {
        Self {
            base_dir: PathBuf::from(&config.base_directory),
            format: config.format,
        }
    }

    /// Create from directory path and format
    pub fn from_path(base_dir: impl AsRef<Path>, format: FileFormat) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Determine file extension based on format
    fn get_extension(format: FileFormat) -> &'static str {
        match format {
            FileFormat::Json => "json",
            FileFormat::Bson => "bson",
            FileFormat::Binary => "nhx",
            FileFormat::Auto => "nhx", // New indexes are written in binary
        }
    }

    fn path_for(&self, name: &str, format: FileFormat) -> PathBuf {
        self.base_dir
            .join(format!("{}.{}", name, Self::get_extension(format)))
    }

    /// Find the stored file for `name` and the format it is in
    fn find_file(&self, name: &str) -> Option<(PathBuf, FileFormat)> {
        match self.format {
            FileFormat::Auto => [FileFormat::Json, FileFormat::Bson, FileFormat::Binary]
                .into_iter()
                .map(|format| (self.path_for(name, format), format))
                .find(|(path, _)| path.exists()),
            format => {
                let path = self.path_for(name, format);
                path.exists().then_some((path, format))
            }
        }
    }
}

impl Store for FilesystemStore {
    fn save_index(&self, name: &str, index: &FingerprintIndex, metadata: &IndexMetadata) -> Result<()> {
        let file_path = self.path_for(name, self.format);

        // Create directory if it doesn't exist
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let buckets = index.to_stored();
        match self.format {
            FileFormat::Json => IndexJsonFile::new(metadata.clone(), buckets).save(&file_path)?,
            FileFormat::Bson => IndexJsonFile::new(metadata.clone(), buckets).save_bson(&file_path)?,
            FileFormat::Binary | FileFormat::Auto => {
                IndexWriter::new().write(&file_path, &IndexFile::new(metadata.clone(), buckets))?
            }
        }

        log::info!(
            "Saved {} ({} keys, {} entries) to {}",
            name,
            index.num_keys(),
            index.num_entries(),
            file_path.display()
        );
        Ok(())
    }

    fn load_index(&self, name: &str) -> Result<(FingerprintIndex, IndexMetadata)> {
        let (file_path, format) = self.find_file(name).ok_or_else(|| {
            anyhow::anyhow!("Index not found: {} in {}", name, self.base_dir.display())
        })?;

        let (metadata, buckets) = match format {
            FileFormat::Binary | FileFormat::Auto => {
                let file = IndexReader::read(&file_path)?;
                (file.metadata, file.buckets)
            }
            _ => {
                let file = IndexJsonFile::load_auto(&file_path)?;
                (file.metadata, file.buckets)
            }
        };

        let index = FingerprintIndex::from_stored(buckets);
        log::info!(
            "Loaded {} ({}, fan-out {}) from {}",
            name,
            metadata.hash_variant,
            metadata.fan_out,
            file_path.display()
        );
        Ok((index, metadata))
    }

    fn exists(&self, name: &str) -> bool {
        self.find_file(name).is_some()
    }
}
