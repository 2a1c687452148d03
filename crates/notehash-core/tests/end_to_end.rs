//! Corpus -> index -> store -> classify, through the public API

use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use notehash_core::storage_config::FileFormat;
use notehash_core::voting::binary_ratio_score;
use notehash_core::{
    Classifier, ClassifierConfig, Corpus, FilesystemStore, FingerprintGenerator,
    FingerprintIndex, HashVariant, IndexBuilder, Matcher, MidiSource, NotehashSettings,
    PeakSequence, Store,
};
use notehash_fp::IndexMetadata;
use std::path::Path;

fn config() -> ClassifierConfig {
    ClassifierConfig {
        hash_variant: HashVariant::TimeDiff,
        fan_out: 2,
        ..Default::default()
    }
}

#[test]
fn classical_query_scores_classical() {
    let generator = FingerprintGenerator::new(HashVariant::TimeDiff, 2);
    let mut index = FingerprintIndex::new();
    index.add_fingerprints(
        "classical.mid",
        "classical",
        &generator.generate(&PeakSequence::from_onsets(60, &[0, 4, 9, 13])),
    );
    index.add_fingerprints(
        "rock.mid",
        "rock",
        &generator.generate(&PeakSequence::from_onsets(45, &[0, 5, 11, 16])),
    );

    let query = generator.generate(&PeakSequence::from_onsets(60, &[0, 4, 9, 13]));
    let result = Matcher::new(&index).match_query("query.mid", &query);

    let classical = result.tally.get("classical").copied().unwrap_or(0);
    let rock = result.tally.get("rock").copied().unwrap_or(0);
    assert!(classical > rock);
    assert!(binary_ratio_score(&result.tally, "classical", "rock") > 0.5);
}

#[test]
fn unknown_keys_score_degenerately() {
    let generator = FingerprintGenerator::new(HashVariant::TimeDiff, 2);
    let mut index = FingerprintIndex::new();
    index.add_fingerprints(
        "classical.mid",
        "classical",
        &generator.generate(&PeakSequence::from_onsets(60, &[0, 4, 9, 13])),
    );

    let config = config();
    let query = generator.generate(&PeakSequence::from_onsets(60, &[0, 100, 250, 600]));
    let report = Classifier::new(&index, &config).classify_fingerprints("query.mid", &query);

    assert!(report.buckets.is_empty());
    assert!(report.tally.is_empty());
    assert!(report.percentages.is_empty());
    assert_eq!(report.score, 0.0);
}

fn event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind,
    }
}

fn note(key: u8, on: bool) -> TrackEventKind<'static> {
    let (key, vel) = (u7::new(key), u7::new(if on { 100 } else { 0 }));
    let message = if on {
        MidiMessage::NoteOn { key, vel }
    } else {
        MidiMessage::NoteOff { key, vel }
    };
    TrackEventKind::Midi {
        channel: u4::new(0),
        message,
    }
}

/// 4/4 song at 120 ticks per beat playing `pitch` at each onset
fn write_song(path: &Path, pitch: u8, onsets: &[u32]) {
    let conductor = vec![
        event(0, TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8))),
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ];

    let mut track = Vec::new();
    let mut now = 0;
    for &onset in onsets {
        track.push(event(onset - now, note(pitch, true)));
        track.push(event(30, note(pitch, false)));
        now = onset + 30;
    }
    track.push(event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)));

    let smf = Smf {
        header: Header::new(Format::Parallel, Timing::Metrical(u15::new(120))),
        tracks: vec![conductor, track],
    };
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    smf.save(path).unwrap();
}

#[test]
fn midi_corpus_round_trip() {
    let root = tempfile::tempdir().unwrap();
    let classical = [0, 480, 1080, 1560];
    let rock = [0, 600, 1320, 1920];
    write_song(&root.path().join("midi-classical/bach.mid"), 60, &classical);
    write_song(&root.path().join("midi-rock/acdc.mid"), 45, &rock);
    write_song(&root.path().join("test-set/query.mid"), 62, &classical);
    std::fs::write(root.path().join("midi-rock/broken.mid"), b"not a midi file").unwrap();

    let mut settings = NotehashSettings::default();
    settings.corpus.root = root.path().to_string_lossy().into_owned();
    settings.classifier = config();

    let corpus = Corpus::from_config(&settings.corpus).unwrap();
    assert_eq!(corpus.len(), 3);

    let source = MidiSource::new();
    let (index, report) = IndexBuilder::new(&source, &settings.classifier)
        .build(&corpus)
        .unwrap();
    assert_eq!(report.indexed, 2);
    assert_eq!(report.skipped, 1);

    let store = FilesystemStore::from_path(root.path().join("pickles"), FileFormat::Auto);
    let metadata = IndexMetadata::new(settings.classifier.hash_variant.name(), 2, 2);
    store.save_index("pitches_hash0-2", &index, &metadata).unwrap();
    let (loaded, loaded_metadata) = store.load_index("pitches_hash0-2").unwrap();
    assert_eq!(loaded, index);
    assert_eq!(loaded_metadata.hash_variant, "time-diff");

    let test_set = Corpus::test_set(&settings.corpus).unwrap();
    let classifier = Classifier::new(&loaded, &settings.classifier);
    let result = classifier
        .classify_file(&source, &test_set.files()[0])
        .unwrap();

    assert_eq!(result.query, "query.mid");
    assert!(result.score > 0.5);
    assert_eq!(result.percentages.get("classical"), Some(&1.0));
    assert!(result.buckets.contains_key("bach.mid"));
}
