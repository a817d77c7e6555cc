//! End-to-end rendering of fixture songs.

use sx_formats::read_wav;
use sx_master::{EngineConfig, Frame, SynthEngine};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/songs").join(name)
}

fn load(name: &str) -> SynthEngine {
    let path = fixture(name);
    SynthEngine::load(&path, EngineConfig::default())
        .unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

#[test]
fn minimal_song_buffer_length() {
    let engine = load("minimal.json");
    assert_eq!(engine.song().title.as_str(), "minimal");
    let package = engine.generate();

    // round(songLen * 44100) frames of 2 channels * 2 bytes
    assert_eq!(package.frames.len(), 11025);
    assert_eq!(package.byte_len(), 11025 * 2 * 2);
}

#[test]
fn minimal_song_note_spans_its_envelope() {
    let package = load("minimal.json").generate();
    let len = 100 + 2000 + 4000;

    let audible = |range: std::ops::Range<usize>| package.frames[range].iter().any(|f| *f != Frame::silence());
    assert!(audible(0..100));
    assert!(audible(len / 2..len / 2 + 100));
    assert!(audible(len - 500..len));
    assert!(!audible(len..package.frames.len()));
}

#[test]
fn rendering_is_reproducible() {
    let a = load("minimal.json").generate();
    let b = load("minimal.json").generate();
    assert_eq!(a, b);
}

#[test]
fn wav_export_reads_back() {
    let package = load("minimal.json").generate();
    let wav = package.to_wav();
    assert_eq!(wav.len(), 44 + package.byte_len());

    let decoded = read_wav(&wav).unwrap();
    assert_eq!(decoded.sample_rate, 44100);
    assert_eq!(decoded.frames, package.frames);
}

#[test]
fn silent_mix_packages_to_silence() {
    let package = sx_master::AudioPackage::from_mix(vec![Frame::silence(); 1000], 44100);
    assert!(package.frames.iter().all(|f| *f == Frame::silence()));
    let (left, right) = package.to_float_channels();
    assert!(left.iter().chain(&right).all(|&s| s == 0.0));
}

#[test]
fn planet_song_loads_with_expected_shape() {
    let engine = load("planet.json");
    let song = engine.song();
    assert_eq!(song.row_len, 2242);
    assert_eq!(song.end_pattern, 49);
    assert_eq!(song.song_len, 80.0);
    assert_eq!(song.instruments.len(), 7);
    assert_eq!(song.frames(44100), 80 * 44100);
    // 48 measures of 32 rows
    assert!((song.music_duration(44100) - 48.0 * 32.0 * 2242.0 / 44100.0).abs() < 1e-9);
}

#[test]
fn planet_song_reports_unstable_filter() {
    let engine = load("planet.json");
    let issues = engine.issues();
    assert!(issues
        .iter()
        .any(|i| matches!(i, sx_master::SongIssue::UnstableFilter { instrument: 1, .. })));
}
