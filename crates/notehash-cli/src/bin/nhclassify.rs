//! nhclassify - Classify MIDI files against a stored index
//!
//! Usage: nhclassify [--config <path>] <index> <query>...
//!
//! The hash variant and fan-out are taken from the index metadata so queries
//! are always hashed the way the index was built.

use anyhow::Result;
use clap::Parser;
use notehash_cli::output::print_json_results;
use notehash_cli::{init_logger, load_settings};
use notehash_core::{
    Classifier, CorpusFile, FilesystemStore, HashVariant, MidiSource, Store, SAMPLE_LABEL,
};

#[derive(Parser, Debug)]
#[command(name = "nhclassify")]
#[command(about = "Classify MIDI files against a fingerprint index", long_about = None)]
struct Args {
    /// Stored index name, e.g. pitches_hash0-4
    index: String,

    /// Query MIDI files
    #[arg(required = true)]
    queries: Vec<String>,

    /// Path to configuration file (TOML). If not provided, uses config.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Restrict queries to their melody channel
    #[arg(short, long)]
    melody: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let settings = load_settings(args.config.as_deref())?;
    let store = FilesystemStore::new(&settings.storage.filesystem);
    let (index, metadata) = store.load_index(&args.index)?;

    let mut config = settings.classifier.with_fan_out(metadata.fan_out as usize);
    config.hash_variant = metadata
        .hash_variant
        .parse::<HashVariant>()
        .map_err(anyhow::Error::msg)?;
    config.melody_only |= args.melody;
    config.validate()?;

    log::info!(
        "Index {}: {} keys from {} files ({}, fan-out {})",
        args.index,
        index.num_keys(),
        metadata.num_files,
        config.hash_variant,
        config.fan_out
    );

    let source = MidiSource::new();
    let classifier = Classifier::new(&index, &config);

    let mut results = Vec::new();
    for query in &args.queries {
        let file = CorpusFile::new(query, SAMPLE_LABEL);
        match classifier.classify_file(&source, &file) {
            Ok(report) => results.push(report),
            Err(e) => log::warn!("Skipping {}: {}", query, e),
        }
    }

    print_json_results(&results);
    Ok(())
}
