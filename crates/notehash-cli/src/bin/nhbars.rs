//! nhbars - Classify the test set by downbeat intervals
//!
//! Usage: nhbars [--config <path>] [--tolerance <bars>]
//!
//! Indexes the highest downbeat pitch of every bar in the labeled corpus,
//! then votes per bar-to-bar interval of each test file.

use anyhow::Result;
use clap::Parser;
use notehash_cli::output::print_bar_results;
use notehash_cli::{init_logger, load_settings};
use notehash_core::{classify_bars, Corpus, IndexBuilder, MidiSource};
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "nhbars")]
#[command(about = "Classify MIDI files by matching bar-to-bar downbeat intervals", long_about = None)]
struct Args {
    /// Path to configuration file (TOML). If not provided, uses config.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Extra bars allowed between matched downbeats (overrides config)
    #[arg(short, long)]
    tolerance: Option<i64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let settings = load_settings(args.config.as_deref())?;
    let tolerance = args.tolerance.unwrap_or(settings.classifier.bar_tolerance);
    if tolerance < 0 {
        anyhow::bail!("tolerance must be >= 0");
    }

    let corpus = Corpus::from_config(&settings.corpus)?;
    let test_set = Corpus::test_set(&settings.corpus)?;

    let source = MidiSource::new();
    let builder = IndexBuilder::new(&source, &settings.classifier);
    let (index, _) = builder.build_bars(&corpus)?;

    let results: Vec<_> = test_set
        .files()
        .par_iter()
        .filter_map(|file| match builder.downbeats_file(&file.path) {
            Ok(query) => Some(classify_bars(&file.id(), &index, &query, tolerance)),
            Err(e) => {
                log::warn!("Skipping {}: {}", file.path.display(), e);
                None
            }
        })
        .collect();

    print_bar_results(&results);
    Ok(())
}
