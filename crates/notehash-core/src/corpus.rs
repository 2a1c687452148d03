//! Corpus driver
//!
//! Ties the stages together for one classification run: enumerate the
//! labeled corpus, build the fingerprint (or bar) index, then classify
//! queries against it. All state lives in the values returned here; nothing
//! is process-global.

use crate::config::ClassifierConfig;
use crate::error::FingerprintError;
use crate::fingerprint::{Fingerprint, FingerprintGenerator};
use crate::index::FingerprintIndex;
use crate::intervals::{downbeats, BarIndex, Downbeat};
use crate::matching::{Bucket, CountMode, LabelCounts, Matcher};
use crate::melody::{analyze_channels, choose_melody_channel};
use crate::midi::{NoteEvent, NoteSource};
use crate::peaks::{extract_channel_peaks, extract_peaks, PeakSequence};
use crate::storage_config::CorpusConfig;
use crate::voting::{
    binary_ratio_score, classify_intervals, percentages, tally_intervals, Classification,
    IntervalTally,
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Label given to unlabeled query files from the test directory
pub const SAMPLE_LABEL: &str = "sample";

/// One file of the corpus with its genre label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub path: PathBuf,
    pub label: String,
}

impl CorpusFile {
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }

    /// Source identifier: the bare file name
    pub fn id(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Ordered list of labeled files
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    files: Vec<CorpusFile>,
}

impl Corpus {
    pub fn new(files: Vec<CorpusFile>) -> Self {
        Self { files }
    }

    /// Reference corpus: every genre directory in configuration order
    pub fn from_config(config: &CorpusConfig) -> Result<Self> {
        let mut files = Vec::new();
        for genre in &config.genres {
            files.extend(list_directory(&config.genre_dir(genre), genre)?);
        }
        log::info!("Corpus: {} files across {} genres", files.len(), config.genres.len());
        Ok(Self { files })
    }

    /// Unlabeled query files from the test directory
    pub fn test_set(config: &CorpusConfig) -> Result<Self> {
        let files = list_directory(&config.test_dir(), SAMPLE_LABEL)?;
        log::info!("Test set: {} files", files.len());
        Ok(Self { files })
    }

    pub fn files(&self) -> &[CorpusFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Regular, non-hidden files of `dir` sorted by name
pub fn list_directory(dir: &Path, label: &str) -> Result<Vec<CorpusFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read corpus directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| !name.starts_with('.'))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| CorpusFile::new(path, label))
        .collect())
}

/// Outcome of a corpus scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusReport {
    pub indexed: usize,
    pub skipped: usize,
}

/// Peak sequence of a note list, restricted to the melody channel when
/// `config.melody_only` is set.
pub fn query_peaks(
    notes: &[NoteEvent],
    config: &ClassifierConfig,
) -> Result<PeakSequence, FingerprintError> {
    if !config.melody_only {
        return extract_peaks(notes);
    }

    let stats = analyze_channels(notes, config.max_onset_gap, config.consecutive_strides);
    let channel =
        choose_melody_channel(&stats, config.melody_signal).ok_or(FingerprintError::EmptyInput)?;
    log::debug!("melody channel {} ({:?})", channel, config.melody_signal);
    extract_channel_peaks(notes, channel)
}

/// Builds indexes from a corpus through a [`NoteSource`]
pub struct IndexBuilder<'a, S: NoteSource> {
    source: &'a S,
    config: &'a ClassifierConfig,
}

impl<'a, S: NoteSource> IndexBuilder<'a, S> {
    pub fn new(source: &'a S, config: &'a ClassifierConfig) -> Self {
        Self { source, config }
    }

    /// Fingerprint one file
    pub fn fingerprint_file(&self, path: &Path) -> Result<Vec<Fingerprint>> {
        let notes = self.source.decode(path)?;
        let peaks = query_peaks(&notes, self.config)?;
        let fingerprints = FingerprintGenerator::from_config(self.config).generate(&peaks);
        log::debug!(
            "{}: peak pitch {}, {} peaks, {} keys",
            path.display(),
            peaks.pitch(),
            peaks.len(),
            fingerprints.len()
        );
        Ok(fingerprints)
    }

    /// Build the fingerprint index.
    ///
    /// Files are hashed in parallel and appended in corpus order. Files that
    /// fail to decode or have no notes are logged and skipped.
    pub fn build(&self, corpus: &Corpus) -> Result<(FingerprintIndex, CorpusReport)> {
        self.config.validate()?;
        log::info!(
            "Indexing {} files ({}, fan-out {})",
            corpus.len(),
            self.config.hash_variant,
            self.config.fan_out
        );

        let hashed: Vec<(&CorpusFile, Result<Vec<Fingerprint>>)> = corpus
            .files()
            .par_iter()
            .map(|file| (file, self.fingerprint_file(&file.path)))
            .collect();

        let mut index = FingerprintIndex::new();
        let mut report = CorpusReport::default();
        for (file, result) in hashed {
            match result {
                Ok(fingerprints) => {
                    index.add_fingerprints(&file.id(), &file.label, &fingerprints);
                    report.indexed += 1;
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", file.path.display(), e);
                    report.skipped += 1;
                }
            }
        }

        log::info!(
            "Indexed {} files ({} skipped): {} keys, {} entries",
            report.indexed,
            report.skipped,
            index.num_keys(),
            index.num_entries()
        );
        Ok((index, report))
    }

    /// Downbeats of one file; needs a time signature.
    pub fn downbeats_file(&self, path: &Path) -> Result<Vec<Downbeat>> {
        let (notes, ticks_per_bar) = self.source.load(path)?;
        Ok(downbeats(&notes, ticks_per_bar))
    }

    /// Build the bar index; files without a time signature are skipped.
    pub fn build_bars(&self, corpus: &Corpus) -> Result<(BarIndex, CorpusReport)> {
        let scanned: Vec<(&CorpusFile, Result<Vec<Downbeat>>)> = corpus
            .files()
            .par_iter()
            .map(|file| (file, self.downbeats_file(&file.path)))
            .collect();

        let mut index = BarIndex::new();
        let mut report = CorpusReport::default();
        for (file, result) in scanned {
            match result {
                Ok(bars) => {
                    index.add_song(&file.id(), &file.label, &bars);
                    report.indexed += 1;
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", file.path.display(), e);
                    report.skipped += 1;
                }
            }
        }

        log::info!("Bar index: {} files ({} skipped)", report.indexed, report.skipped);
        Ok((index, report))
    }
}

/// Classification of one query against the fingerprint index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub buckets: BTreeMap<String, Bucket>,
    pub tally: LabelCounts,
    /// Binary-ratio score of the primary label
    pub score: f64,
    /// Tally shares per label; empty when nothing matched
    pub percentages: BTreeMap<String, f64>,
}

/// Classifies queries against a borrowed index
pub struct Classifier<'a> {
    index: &'a FingerprintIndex,
    config: &'a ClassifierConfig,
    count_mode: CountMode,
}

impl<'a> Classifier<'a> {
    pub fn new(index: &'a FingerprintIndex, config: &'a ClassifierConfig) -> Self {
        Self {
            index,
            config,
            count_mode: CountMode::PerEntry,
        }
    }

    pub fn with_count_mode(mut self, count_mode: CountMode) -> Self {
        self.count_mode = count_mode;
        self
    }

    /// Classify an already decoded note list
    pub fn classify_notes(
        &self,
        query_id: &str,
        notes: &[NoteEvent],
    ) -> Result<QueryReport, FingerprintError> {
        let peaks = query_peaks(notes, self.config)?;
        let fingerprints = FingerprintGenerator::from_config(self.config).generate(&peaks);
        Ok(self.classify_fingerprints(query_id, &fingerprints))
    }

    pub fn classify_fingerprints(&self, query_id: &str, fingerprints: &[Fingerprint]) -> QueryReport {
        let result = Matcher::new(self.index)
            .with_self_match(self.config.self_match)
            .with_count_mode(self.count_mode)
            .match_query(query_id, fingerprints);

        let score = binary_ratio_score(
            &result.tally,
            &self.config.primary_label,
            &self.config.secondary_label,
        );
        let votes: Classification = result
            .tally
            .iter()
            .map(|(label, &count)| (label.clone(), count as f64))
            .collect();

        log::debug!(
            "{}: {} matches, {} = {:.3}",
            query_id,
            result.num_matches(),
            self.config.primary_label,
            score
        );

        QueryReport {
            query: query_id.to_string(),
            buckets: result.buckets,
            tally: result.tally,
            score,
            percentages: percentages(&votes),
        }
    }

    /// Decode and classify one file
    pub fn classify_file<S: NoteSource>(&self, source: &S, file: &CorpusFile) -> Result<QueryReport> {
        let notes = source.decode(&file.path)?;
        Ok(self.classify_notes(&file.id(), &notes)?)
    }
}

/// Classification of one query through the bar-interval path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarReport {
    pub query: String,
    pub intervals: IntervalTally,
    pub classification: Classification,
    pub percentages: BTreeMap<String, f64>,
}

/// Walk a query's downbeats against the bar index and vote per interval
pub fn classify_bars(query_id: &str, index: &BarIndex, query: &[Downbeat], tolerance: i64) -> BarReport {
    let matches = index.match_song(query, tolerance);
    let intervals = tally_intervals(&matches);
    let classification = classify_intervals(&intervals);

    log::debug!("{}: {} intervals", query_id, intervals.len());

    BarReport {
        query: query_id.to_string(),
        percentages: percentages(&classification),
        intervals,
        classification,
    }
}
