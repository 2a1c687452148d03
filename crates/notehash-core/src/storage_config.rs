//! Settings file for Notehash
//!
//! Provides TOML-based configuration for the index store, the labeled
//! corpus layout, the classifier and the feature export.

use crate::config::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotehashSettings {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Storage backend configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
}

/// Storage backend type
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
}

/// Filesystem backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesystemConfig {
    #[serde(default = "default_base_directory")]
    pub base_directory: String,
    #[serde(default)]
    pub format: FileFormat,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            format: FileFormat::default(),
        }
    }
}

fn default_base_directory() -> String {
    "./pickles".to_string()
}

/// File format for filesystem storage
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Json,
    Bson,
    Binary,
    #[default]
    Auto, // Resolve by existing file extension; writes binary
}

/// Labeled corpus layout: `<root>/<prefix><genre>/*.mid`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_genres")]
    pub genres: Vec<String>,
    #[serde(default = "default_directory_prefix")]
    pub directory_prefix: String,
    #[serde(default = "default_test_directory")]
    pub test_directory: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            genres: default_genres(),
            directory_prefix: default_directory_prefix(),
            test_directory: default_test_directory(),
        }
    }
}

fn default_root() -> String {
    ".".to_string()
}
fn default_genres() -> Vec<String> {
    vec!["classical".to_string(), "rock".to_string()]
}
fn default_directory_prefix() -> String {
    "midi-".to_string()
}
fn default_test_directory() -> String {
    "test-set".to_string()
}

impl CorpusConfig {
    /// Directory holding the reference files of one genre
    pub fn genre_dir(&self, genre: &str) -> PathBuf {
        Path::new(&self.root).join(format!("{}{}", self.directory_prefix, genre))
    }

    pub fn test_dir(&self) -> PathBuf {
        Path::new(&self.root).join(&self.test_directory)
    }
}

/// Feature export configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_features_file")]
    pub features_file: String,
    #[serde(default = "default_labels_file")]
    pub labels_file: String,
    #[serde(default = "default_test_file")]
    pub test_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            features_file: default_features_file(),
            labels_file: default_labels_file(),
            test_file: default_test_file(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}
fn default_features_file() -> String {
    "features.csv".to_string()
}
fn default_labels_file() -> String {
    "labels.csv".to_string()
}
fn default_test_file() -> String {
    "test.csv".to_string()
}

impl NotehashSettings {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let settings: NotehashSettings = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        settings.classifier.validate()?;
        Ok(settings)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::HashVariant;
    use crate::matching::SelfMatch;
    use crate::melody::MelodySignal;

    #[test]
    fn test_defaults() {
        let settings = NotehashSettings::default();
        assert_eq!(settings.storage.backend, StorageBackend::Filesystem);
        assert_eq!(settings.storage.filesystem.base_directory, "./pickles");
        assert_eq!(settings.storage.filesystem.format, FileFormat::Auto);
        assert_eq!(settings.corpus.genres, vec!["classical", "rock"]);
        assert_eq!(settings.classifier.fan_out, 5);
        assert_eq!(settings.export.delimiter, ',');
    }

    #[test]
    fn test_corpus_paths() {
        let corpus = CorpusConfig {
            root: "/data".to_string(),
            ..Default::default()
        };
        assert_eq!(corpus.genre_dir("rock"), PathBuf::from("/data/midi-rock"));
        assert_eq!(corpus.test_dir(), PathBuf::from("/data/test-set"));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [storage.filesystem]
            base_directory = "./indexes"
            format = "bson"

            [corpus]
            genres = ["classical", "rock", "videogame"]

            [classifier]
            hash_variant = "time-diff+percentile"
            fan_out = 3
            melody_only = true
            melody_signal = "onset-delta-variance"
            self_match = "exclude"

            [export]
            delimiter = ";"
        "#;

        let settings: NotehashSettings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.storage.filesystem.base_directory, "./indexes");
        assert_eq!(settings.storage.filesystem.format, FileFormat::Bson);
        assert_eq!(settings.corpus.genres.len(), 3);
        assert_eq!(settings.corpus.directory_prefix, "midi-");
        assert_eq!(settings.classifier.hash_variant, HashVariant::TimeDiffPercentile);
        assert_eq!(settings.classifier.fan_out, 3);
        assert!(settings.classifier.melody_only);
        assert_eq!(settings.classifier.melody_signal, MelodySignal::OnsetDeltaVariance);
        assert_eq!(settings.classifier.self_match, SelfMatch::Exclude);
        assert_eq!(settings.classifier.primary_label, "classical");
        assert_eq!(settings.export.delimiter, ';');
        assert_eq!(settings.export.features_file, "features.csv");
    }

    #[test]
    fn test_load_rejects_invalid_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[classifier]\nfan_out = 0\n").unwrap();
        assert!(NotehashSettings::load(&path).is_err());

        let missing = dir.path().join("missing.toml");
        assert_eq!(
            NotehashSettings::load_or_default(&missing).unwrap().classifier,
            ClassifierConfig::default()
        );
    }
}
