//! nhindex - Build fingerprint indexes from the labeled corpus
//!
//! Usage: nhindex [--config <path>] [--melody] <variant>
//!
//! Builds one index per fan-out setting `1..fan_out` and stores it as
//! `pitches_hash<variant>-<fan_out>`, or with `--melody` from the consensus
//! melody channel only as `melody_hash<variant>-<fan_out>`. Settings whose
//! index already exists are skipped.

use anyhow::Result;
use clap::Parser;
use notehash_cli::output::print_json;
use notehash_cli::{index_name, init_logger, load_settings, melody_index_name};
use notehash_core::{
    Corpus, FilesystemStore, HashVariant, IndexBuilder, MelodySignal, MidiSource, Store,
};
use notehash_fp::IndexMetadata;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "nhindex")]
#[command(about = "Build fingerprint indexes from a labeled MIDI corpus", long_about = None)]
struct Args {
    /// Hash variant: 0 time-diff, 1 time-diff+percentile, 2 time-diff+pitch,
    /// 3 time-diff+pitch-percentile
    variant: HashVariant,

    /// Path to configuration file (TOML). If not provided, uses config.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Index only the consensus melody channel of every file
    #[arg(short, long)]
    melody: bool,

    /// Rebuild indexes that already exist
    #[arg(short, long)]
    force: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct IndexOutput {
    index: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    files_indexed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files_skipped: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_keys: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_sources: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let settings = load_settings(args.config.as_deref())?;
    let corpus = Corpus::from_config(&settings.corpus)?;
    let store = FilesystemStore::new(&settings.storage.filesystem);
    let source = MidiSource::new();

    let mut outputs = Vec::new();
    for fan_out in 1..settings.classifier.fan_out {
        let name = if args.melody {
            melody_index_name(args.variant, fan_out)
        } else {
            index_name(args.variant, fan_out)
        };
        if store.exists(&name) && !args.force {
            log::info!("{} already exists, skipping", name);
            outputs.push(IndexOutput {
                index: name,
                status: "exists",
                files_indexed: None,
                files_skipped: None,
                num_keys: None,
                num_entries: None,
                num_sources: None,
            });
            continue;
        }

        let mut config = settings.classifier.with_fan_out(fan_out);
        config.hash_variant = args.variant;
        if args.melody {
            config.melody_only = true;
            config.melody_signal = MelodySignal::Consensus;
        }

        let start = std::time::Instant::now();
        let (index, report) = IndexBuilder::new(&source, &config).build(&corpus)?;
        log::info!("Built {} in {:.2}s", name, start.elapsed().as_secs_f64());

        let metadata =
            IndexMetadata::new(args.variant.name(), fan_out as u32, report.indexed as u32);
        store.save_index(&name, &index, &metadata)?;

        outputs.push(IndexOutput {
            index: name,
            status: "built",
            files_indexed: Some(report.indexed),
            files_skipped: Some(report.skipped),
            num_keys: Some(index.num_keys()),
            num_entries: Some(index.num_entries()),
            num_sources: Some(index.sources().len()),
        });
    }

    print_json(&outputs);
    Ok(())
}
