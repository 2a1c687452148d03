//! Notehash Core - Symbolic Music Fingerprinting Library
//!
//! This crate classifies the genre of MIDI files by fingerprinting the
//! onsets of each file's most frequent pitch, matching a query's keys
//! against an inverted index built from a labeled corpus, and voting on
//! the labels of the matched entries.

pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod fingerprint;
pub mod index;
pub mod intervals;
pub mod matching;
pub mod melody;
pub mod midi;
pub mod peaks;
pub mod storage_backend;
pub mod storage_config;
pub mod voting;

pub use config::ClassifierConfig;
pub use corpus::{
    classify_bars, BarReport, Classifier, Corpus, CorpusFile, CorpusReport, IndexBuilder,
    QueryReport, SAMPLE_LABEL,
};
pub use error::FingerprintError;
pub use features::{one_hot_label, FeatureTable};
pub use fingerprint::{Fingerprint, FingerprintGenerator, FingerprintKey, HashVariant};
pub use index::{FingerprintIndex, IndexEntry};
pub use intervals::{downbeats, BarIndex, Downbeat};
pub use matching::{Bucket, CountMode, MatchResult, Matcher, SelfMatch};
pub use melody::{analyze_channels, choose_melody_channel, ChannelStats, MelodySignal};
pub use midi::{MidiSource, NoteEvent, NoteSource};
pub use peaks::{extract_peaks, PeakSequence};
pub use storage_backend::{FilesystemStore, Store};
pub use storage_config::NotehashSettings;
