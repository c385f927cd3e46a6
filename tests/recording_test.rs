// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! End-to-end checks of recording synthesis and output

use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_heartbeat::config::{Config, PauseStrategy, SampleFormat};
use rust_heartbeat::spectral::{relative_loudness, LoudnessTask};
use rust_heartbeat::synthesis::{synthesize_recording, RecordingSynthesizer};
use rust_heartbeat::utility::{read_wav, AudioSink, WavFileSink};
use rust_heartbeat::SynthesisError;
use tempfile::tempdir;

#[test]
fn test_recording_length_is_exact_floor_arithmetic() {
    let mut synth = RecordingSynthesizer::new(Some(1));
    let recording = synth.synthesize_recording(10, 80.0, 44100, 0).unwrap();
    // 10 * floor(60 / 80 * 44100)
    assert_eq!(recording.len(), 330_750);
    assert_eq!(recording.raw.len(), 330_750);
    assert!((recording.duration() - 7.5).abs() < 1e-12);
}

#[test]
fn test_seeded_recordings_are_bit_identical() {
    let a = RecordingSynthesizer::new(Some(2024))
        .synthesize_recording(4, 100.0, 22050, 5)
        .unwrap();
    let b = RecordingSynthesizer::new(Some(2024))
        .synthesize_recording(4, 100.0, 22050, 5)
        .unwrap();
    assert_eq!(a.filtered, b.filtered);
    assert_eq!(a.raw, b.raw);

    let mut rng = StdRng::seed_from_u64(2024);
    let c =
        synthesize_recording(&mut rng, 4, 100.0, 22050, 5, PauseStrategy::Sequential).unwrap();
    assert_eq!(a.filtered, c.filtered);
}

#[test]
fn test_unseeded_recordings_differ_but_share_length() {
    let a = RecordingSynthesizer::new(None)
        .synthesize_recording(3, 80.0, 44100, 0)
        .unwrap();
    let b = RecordingSynthesizer::new(None)
        .synthesize_recording(3, 80.0, 44100, 0)
        .unwrap();
    assert_eq!(a.len(), b.len());
    assert_ne!(a.filtered, b.filtered);
}

#[test]
fn test_consecutive_recordings_from_one_synthesizer_differ() {
    let mut synth = RecordingSynthesizer::new(Some(3));
    let first = synth.synthesize_recording(2, 80.0, 44100, 2).unwrap();
    let second = synth.synthesize_recording(2, 80.0, 44100, 2).unwrap();
    assert_eq!(first.len(), second.len());
    assert_ne!(first.raw, second.raw);
}

#[test]
fn test_invalid_parameters_produce_no_recording() {
    let mut synth = RecordingSynthesizer::new(Some(4));
    for (tempo, rate, s3) in [
        (80.0, 44100, 11),
        (0.0, 44100, 0),
        (-5.0, 44100, 0),
        (80.0, 0, 0),
    ] {
        let result = synth.synthesize_recording(10, tempo, rate, s3);
        assert!(
            matches!(result, Err(SynthesisError::InvalidParameter { .. })),
            "({tempo}, {rate}, {s3}) should be rejected"
        );
    }
}

#[test]
fn test_every_intensity_level_synthesizes() {
    let mut synth =
        RecordingSynthesizer::new(Some(5)).with_pause_strategy(PauseStrategy::Independent);
    let mut max_raw_peak = 0.0_f64;
    for level in 1..=10 {
        let recording = synth.synthesize_recording(1, 80.0, 8000, level).unwrap();
        assert_eq!(recording.raw.len(), recording.filtered.len());
        assert!(recording.peak() > 0.0);
        // S1 at full volume dominates the raw cycle at every level
        let raw_peak = recording.raw.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        assert!(raw_peak > 0.5);
        max_raw_peak = raw_peak.max(max_raw_peak);
    }
    assert!(max_raw_peak < 1.25);
}

#[test]
fn test_high_sample_rates_keep_exact_length() {
    for (rate, tempo, beat_ns) in [(96000, 80.0, 72_000), (192000, 100.0, 115_200)] {
        let recording = RecordingSynthesizer::new(Some(6))
            .synthesize_recording(3, tempo, rate, 0)
            .unwrap_or_else(|e| panic!("{tempo} BPM at {rate} Hz: {e}"));
        assert_eq!(recording.len(), 3 * beat_ns);
        assert!(recording.filtered.iter().all(|x| x.is_finite()));
        assert!(recording.peak() < 10.0);
    }
}

#[test]
fn test_configured_recording_round_trips_through_wav() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("heartbeat.yaml");
    std::fs::write(
        &config_path,
        "synthesis:
  num_beats: 3
  tempo_bpm: 80
  s3_intensity: 8
  seed: 11
output:
  filename: s3_level_8
",
    )
    .unwrap();

    let mut config = Config::from_file(&config_path).unwrap();
    config.output.directory = dir.path().join("media");

    let recording = RecordingSynthesizer::from_config(&config.synthesis)
        .synthesize_configured(&config.synthesis)
        .unwrap();

    let path = config.output.wav_path();
    let mut sink = WavFileSink::new(&path, SampleFormat::Float32);
    sink.write(recording.sample_rate, &recording.filtered).unwrap();

    let (rate, samples) = read_wav(&path).unwrap();
    assert_eq!(rate, 44100);
    assert_eq!(samples.len(), recording.len());
    for (read, written) in samples.iter().zip(&recording.filtered) {
        assert!((read - written).abs() <= written.abs() * 1e-6 + 1e-9);
    }

    let mean = relative_loudness(&samples, LoudnessTask::Mean).unwrap();
    assert!(mean < 0.0 && mean > -80.0);
}
