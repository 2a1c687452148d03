//! nhmatch - Score every corpus file against the stored indexes
//!
//! Usage: nhmatch [--config <path>] [--melody] <variant>
//!
//! Each setting contributes one binary-ratio score per file. Settings are the
//! fan-out values `1..fan_out`, or with `--melody` the five melody-channel
//! signals against the largest fan-out melody index (`nhindex --melody`).
//! Scores, one-hot labels and test-set scores are written as
//! delimiter-separated tables. Only files that were scored get a label row.

use anyhow::{Context, Result};
use clap::Parser;
use notehash_cli::output::print_json;
use notehash_cli::{
    index_name, init_logger, label_scored, load_settings, melody_index_name, score_corpus,
};
use notehash_core::{
    Classifier, ClassifierConfig, Corpus, FeatureTable, FilesystemStore, FingerprintIndex,
    HashVariant, MelodySignal, MidiSource, Store,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "nhmatch")]
#[command(about = "Build per-file feature tables from fingerprint matches", long_about = None)]
struct Args {
    /// Hash variant the indexes were built with (0..=3)
    variant: HashVariant,

    /// Path to configuration file (TOML). If not provided, uses config.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Use the melody-channel signals as settings
    #[arg(short, long)]
    melody: bool,

    /// Prefix every row with the file name
    #[arg(short, long)]
    names: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct MatchOutput {
    settings: Vec<String>,
    files: usize,
    test_files: usize,
    features_file: String,
    labels_file: String,
    test_file: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let settings = load_settings(args.config.as_deref())?;
    let corpus = Corpus::from_config(&settings.corpus)?;
    let test_set = if settings.corpus.test_dir().is_dir() {
        Corpus::test_set(&settings.corpus)?
    } else {
        log::info!("No test directory at {}", settings.corpus.test_dir().display());
        Corpus::default()
    };

    let runs = match_settings(&settings.classifier, args.variant, args.melody)?;
    let store = FilesystemStore::new(&settings.storage.filesystem);
    let source = MidiSource::new();

    let mut features = FeatureTable::new();
    let mut labels = FeatureTable::new();
    let mut test = FeatureTable::new();

    let mut loaded: BTreeMap<String, FingerprintIndex> = BTreeMap::new();
    for (name, config) in &runs {
        if !loaded.contains_key(name) {
            let (index, _) = store.load_index(name).with_context(|| {
                let melody = if args.melody { " --melody" } else { "" };
                format!("Run nhindex{} {} first", melody, args.variant.index())
            })?;
            loaded.insert(name.clone(), index);
        }
        let Some(index) = loaded.get(name) else {
            continue;
        };

        log::info!("Scoring against {} ({:?})", name, config.melody_signal);
        let classifier = Classifier::new(index, config);
        let scored = score_corpus(&classifier, &source, &corpus, &mut features);
        label_scored(&mut labels, &corpus, &scored, &settings.classifier.primary_label);
        score_corpus(&classifier, &source, &test_set, &mut test);
    }

    let export = &settings.export;
    write_table(&features, &export.features_file, export.delimiter, args.names)?;
    write_table(&labels, &export.labels_file, export.delimiter, args.names)?;
    write_table(&test, &export.test_file, export.delimiter, args.names)?;

    print_json(&MatchOutput {
        settings: runs
            .iter()
            .map(|(name, config)| {
                if args.melody {
                    format!("{}:{:?}", name, config.melody_signal)
                } else {
                    name.clone()
                }
            })
            .collect(),
        files: features.len(),
        test_files: test.len(),
        features_file: export.features_file.clone(),
        labels_file: export.labels_file.clone(),
        test_file: export.test_file.clone(),
    });
    Ok(())
}

/// (index name, classifier settings) for every feature column
fn match_settings(
    base: &ClassifierConfig,
    variant: HashVariant,
    melody: bool,
) -> Result<Vec<(String, ClassifierConfig)>> {
    if base.fan_out < 2 {
        anyhow::bail!("fan_out must be at least 2 to have any index setting");
    }

    let mut config = base.clone();
    config.hash_variant = variant;

    if melody {
        let fan_out = base.fan_out - 1;
        Ok(MelodySignal::ALL
            .iter()
            .map(|&signal| {
                let mut run = config.with_fan_out(fan_out);
                run.melody_only = true;
                run.melody_signal = signal;
                (melody_index_name(variant, fan_out), run)
            })
            .collect())
    } else {
        Ok((1..base.fan_out)
            .map(|fan_out| (index_name(variant, fan_out), config.with_fan_out(fan_out)))
            .collect())
    }
}

fn write_table(table: &FeatureTable, path: &str, delimiter: char, names: bool) -> Result<()> {
    let file = File::create(Path::new(path))
        .with_context(|| format!("Failed to create {}", path))?;
    let writer = BufWriter::new(file);
    if names {
        table.export(writer, delimiter)
    } else {
        table.export_values(writer, delimiter)
    }
}
