//! Shared plumbing for the notehash command-line tools

pub mod output;

use anyhow::Result;
use notehash_core::{
    one_hot_label, Classifier, Corpus, FeatureTable, HashVariant, NoteSource, NotehashSettings,
    QueryReport,
};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;

/// Default settings file looked up in the working directory
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Initialize logger
///
/// Default: no logs (clean JSON/CSV output for parsing).
/// Verbose: Info level. `RUST_LOG` still applies on top of either.
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// Load `--config` if given (must exist), else `config.toml` or defaults
pub fn load_settings(config: Option<&str>) -> Result<NotehashSettings> {
    match config {
        Some(path) => NotehashSettings::load(Path::new(path)),
        None => NotehashSettings::load_or_default(Path::new(DEFAULT_CONFIG)),
    }
}

/// Store name of the index built with `variant` at `fan_out`
pub fn index_name(variant: HashVariant, fan_out: usize) -> String {
    format!("pitches_hash{}-{}", variant.index(), fan_out)
}

/// Store name of the melody-channel index built with `variant` at `fan_out`
pub fn melody_index_name(variant: HashVariant, fan_out: usize) -> String {
    format!("melody_hash{}-{}", variant.index(), fan_out)
}

/// Classify every file in parallel, then append scores in corpus order.
///
/// Returns the ids of the files that were scored; failures are logged and
/// leave the table untouched.
pub fn score_corpus<S: NoteSource>(
    classifier: &Classifier,
    source: &S,
    corpus: &Corpus,
    table: &mut FeatureTable,
) -> Vec<String> {
    let reports: Vec<(String, Result<QueryReport>)> = corpus
        .files()
        .par_iter()
        .map(|file| (file.id(), classifier.classify_file(source, file)))
        .collect();

    let mut scored = Vec::with_capacity(reports.len());
    for (id, report) in reports {
        match report {
            Ok(report) => {
                table.push_score(&id, report.score);
                scored.push(id);
            }
            Err(e) => log::warn!("Skipping {}: {}", id, e),
        }
    }
    scored
}

/// Add one-hot label rows for the scored corpus files not labeled yet
pub fn label_scored(
    labels: &mut FeatureTable,
    corpus: &Corpus,
    scored: &[String],
    primary_label: &str,
) {
    let scored: BTreeSet<&str> = scored.iter().map(String::as_str).collect();
    for file in corpus.files() {
        let id = file.id();
        if scored.contains(id.as_str()) && labels.get(&id).is_none() {
            labels.insert(id, one_hot_label(&file.label, primary_label));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notehash_core::{ClassifierConfig, CorpusFile, FingerprintIndex, MidiSource};

    #[test]
    fn test_index_name() {
        assert_eq!(index_name(HashVariant::TimeDiff, 1), "pitches_hash0-1");
        assert_eq!(index_name(HashVariant::TimeDiffPitchPercentile, 4), "pitches_hash3-4");
    }

    #[test]
    fn test_melody_index_name_is_distinct() {
        assert_eq!(melody_index_name(HashVariant::TimeDiffPitch, 3), "melody_hash2-3");
        assert_ne!(
            melody_index_name(HashVariant::TimeDiff, 4),
            index_name(HashVariant::TimeDiff, 4)
        );
    }

    #[test]
    fn test_unscored_files_get_no_label_row() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.mid");
        std::fs::write(&broken, b"not a midi file").unwrap();
        let corpus = Corpus::new(vec![CorpusFile::new(&broken, "classical")]);

        let index = FingerprintIndex::new();
        let config = ClassifierConfig::default();
        let classifier = Classifier::new(&index, &config);

        let mut features = FeatureTable::new();
        let mut labels = FeatureTable::new();
        let scored = score_corpus(&classifier, &MidiSource::new(), &corpus, &mut features);
        label_scored(&mut labels, &corpus, &scored, &config.primary_label);

        assert!(scored.is_empty());
        assert_eq!(features.len(), 0);
        assert_eq!(labels.len(), features.len());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_settings(missing.to_str()).is_err());

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[classifier]\nfan_out = 3\n").unwrap();
        let settings = load_settings(path.to_str()).unwrap();
        assert_eq!(settings.classifier.fan_out, 3);
    }
}
