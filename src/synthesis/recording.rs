// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Recording Synthesis
//!
//! Drives the whole pipeline: timing derivation, per-cycle assembly and
//! filtering, and concatenation of `num_beats` cycles into one recording.
//!
//! ```text
//! (tempo, fs) ──> BeatTiming ──> AcousticFilter (once)
//!                     │
//!                     └──> assemble_cycle ×num_beats ──> Recording
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use rust_heartbeat::synthesis::RecordingSynthesizer;
//!
//! let mut synth = RecordingSynthesizer::new(Some(42));
//! let recording = synth.synthesize_recording(10, 80.0, 44100, 0).unwrap();
//! assert_eq!(recording.len(), 10 * 33075);
//! ```

use super::heartbeat::{assemble_cycle, validate_s3_intensity, MAX_S3_INTENSITY};
use super::pulse::synthesize_pulse;
use super::SampleBuffer;
use crate::config::{PauseStrategy, SampleFormat, SynthesisConfig};
use crate::error::{Result, SynthesisError};
use crate::preprocessing::AcousticFilter;
use crate::utility::{AudioSink, WavFileSink};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::thread;

/// Longest heart sound, in seconds
pub const MAX_PULSE_DURATION: f64 = 0.15;
/// Heart sound duration as a fraction of the beat, for fast tempos
pub const PULSE_BEAT_FRACTION: f64 = 0.15;

/// Number of beats in each file of the intensity set
pub const INTENSITY_SET_BEATS: usize = 10;
/// Tempo of the intensity set, in BPM
pub const INTENSITY_SET_TEMPO: f64 = 80.0;
/// Sample rate of the intensity set, in Hz
pub const INTENSITY_SET_SAMPLE_RATE: u32 = 44100;

/// Most samples a 32-bit float WAV data chunk can hold
pub const MAX_RECORDING_SAMPLES: usize = (u32::MAX / 4) as usize;

/// Sample counts derived from a tempo and a sample rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatTiming {
    /// Beat period in seconds
    pub beat_duration: f64,
    /// Samples per beat, floored
    pub beat_ns: usize,
    /// Samples per heart sound, floored
    pub pulse_ns: usize,
}

impl BeatTiming {
    /// Derive the beat and pulse lengths
    ///
    /// The beat lasts `60 / tempo_bpm` seconds and a heart sound lasts
    /// `min(0.15, 0.15 * beat_duration)` seconds. Both are floored to whole
    /// samples independently, so every cycle of a recording has the same
    /// budget.
    ///
    /// # Errors
    /// [`SynthesisError::InvalidParameter`] when the tempo is not a positive
    /// finite number, or when the sample rate is zero.
    pub fn new(tempo_bpm: f64, sample_rate: u32) -> Result<Self> {
        if !(tempo_bpm > 0.0) || !tempo_bpm.is_finite() {
            return Err(SynthesisError::invalid(
                "tempo_bpm",
                format!("must be a positive number, got {tempo_bpm}"),
            ));
        }
        if sample_rate == 0 {
            return Err(SynthesisError::invalid("sample_rate", "must be positive"));
        }

        let fs = f64::from(sample_rate);
        let beat_duration = 60.0 / tempo_bpm;
        let pulse_duration = MAX_PULSE_DURATION.min(PULSE_BEAT_FRACTION * beat_duration);
        let timing = Self {
            beat_duration,
            beat_ns: (beat_duration * fs).floor() as usize,
            pulse_ns: (pulse_duration * fs).floor() as usize,
        };

        if timing.pulse_ns == 0 {
            return Err(SynthesisError::invalid(
                "sample_rate",
                format!(
                    "{sample_rate} Hz leaves no sample for a heart sound at {tempo_bpm} BPM"
                ),
            ));
        }
        Ok(timing)
    }
}

/// A complete synthesized recording
#[derive(Debug, Clone)]
pub struct Recording {
    /// Concatenated filtered cycles, the actual stimulus
    pub filtered: SampleBuffer,
    /// Concatenated cycles before filtering
    pub raw: SampleBuffer,
    pub sample_rate: u32,
}

impl Recording {
    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.filtered.len() as f64 / f64::from(self.sample_rate)
    }

    /// Largest absolute sample of the filtered signal
    pub fn peak(&self) -> f64 {
        self.filtered.iter().fold(0.0, |acc, x| acc.max(x.abs()))
    }
}

/// Synthesize `num_beats` cycles with the given random source
///
/// Parameters are checked before any sample is produced; on error nothing is
/// returned. The filter coefficients are derived once and shared by all
/// cycles, each of which is filtered from a fresh state. Cycles are appended
/// back to back without normalization or clipping.
///
/// Zero beats is an error, not an empty recording.
///
/// # Errors
/// * [`SynthesisError::InvalidParameter`] for an S3 level above 10, zero beats,
///   a non-positive tempo or a zero sample rate
/// * [`SynthesisError::InvalidParameter`] when `num_beats` cycles would not
///   fit in [`MAX_RECORDING_SAMPLES`]
/// * [`SynthesisError::FilterInstability`] when the filter derived from
///   `(tempo_bpm, sample_rate)` cannot be applied
pub fn synthesize_recording<R: Rng + ?Sized>(
    rng: &mut R,
    num_beats: usize,
    tempo_bpm: f64,
    sample_rate: u32,
    s3_intensity: u8,
    strategy: PauseStrategy,
) -> Result<Recording> {
    validate_s3_intensity(s3_intensity)?;
    if num_beats == 0 {
        return Err(SynthesisError::invalid("num_beats", "must be at least 1"));
    }
    let timing = BeatTiming::new(tempo_bpm, sample_rate)?;
    let total_samples = num_beats
        .checked_mul(timing.beat_ns)
        .filter(|&total| total <= MAX_RECORDING_SAMPLES)
        .ok_or_else(|| {
            SynthesisError::invalid(
                "num_beats",
                format!(
                    "{num_beats} beats of {} samples exceed {MAX_RECORDING_SAMPLES} samples",
                    timing.beat_ns
                ),
            )
        })?;
    let filter = AcousticFilter::new(tempo_bpm, sample_rate)?;

    info!(
        "Synthesizing {} beats at {} BPM, {} Hz, s3 level {} ({:?} pauses)",
        num_beats, tempo_bpm, sample_rate, s3_intensity, strategy
    );
    debug!(
        "Beat: {:.4} s, {} samples; pulse: {} samples",
        timing.beat_duration, timing.beat_ns, timing.pulse_ns
    );

    let mut filtered = Vec::with_capacity(total_samples);
    let mut raw = Vec::with_capacity(total_samples);
    for _ in 0..num_beats {
        let cycle = assemble_cycle(
            rng,
            timing.pulse_ns,
            timing.beat_ns,
            s3_intensity,
            strategy,
            &filter,
        )?;
        filtered.extend_from_slice(&cycle.filtered);
        raw.extend_from_slice(&cycle.raw);
    }

    Ok(Recording {
        filtered,
        raw,
        sample_rate,
    })
}

/// One unfiltered heart sound scaled by `volume`
///
/// This is only the "lub" of "lub-dub", used as a loudness calibration
/// reference.
pub fn synthesize_single_beat<R: Rng + ?Sized>(
    rng: &mut R,
    volume: f64,
    tempo_bpm: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    if !volume.is_finite() {
        return Err(SynthesisError::invalid(
            "volume",
            format!("must be finite, got {volume}"),
        ));
    }
    let timing = BeatTiming::new(tempo_bpm, sample_rate)?;
    let pulse = synthesize_pulse(rng, timing.pulse_ns)?;
    Ok(pulse.into_iter().map(|x| volume * x).collect())
}

/// Recording generator owning its random stream
///
/// Each synthesizer owns an independent [`StdRng`]; give every worker thread
/// its own instance.
pub struct RecordingSynthesizer {
    rng: StdRng,
    pause_strategy: PauseStrategy,
}

impl RecordingSynthesizer {
    /// Create a synthesizer, seeded for bit-identical replay or from the OS
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            pause_strategy: PauseStrategy::default(),
        }
    }

    /// Build a synthesizer from the seed and pause strategy of a configuration
    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self::new(config.seed).with_pause_strategy(config.pause_strategy)
    }

    pub fn with_pause_strategy(mut self, strategy: PauseStrategy) -> Self {
        self.pause_strategy = strategy;
        self
    }

    pub fn pause_strategy(&self) -> PauseStrategy {
        self.pause_strategy
    }

    /// See [`synthesize_recording`]
    pub fn synthesize_recording(
        &mut self,
        num_beats: usize,
        tempo_bpm: f64,
        sample_rate: u32,
        s3_intensity: u8,
    ) -> Result<Recording> {
        synthesize_recording(
            &mut self.rng,
            num_beats,
            tempo_bpm,
            sample_rate,
            s3_intensity,
            self.pause_strategy,
        )
    }

    /// Synthesize the recording described by a configuration
    pub fn synthesize_configured(&mut self, config: &SynthesisConfig) -> Result<Recording> {
        self.synthesize_recording(
            config.num_beats,
            config.tempo_bpm,
            config.sample_rate,
            config.s3_intensity,
        )
    }

    /// See [`synthesize_single_beat`]
    pub fn synthesize_single_beat(
        &mut self,
        volume: f64,
        tempo_bpm: f64,
        sample_rate: u32,
    ) -> Result<SampleBuffer> {
        synthesize_single_beat(&mut self.rng, volume, tempo_bpm, sample_rate)
    }
}

/// Write the base files of the intensity experiment into `directory`
///
/// For each level `i` in `1..=10` this writes `HB_S3_{i}.wav` (10 beats at
/// 80 BPM with S3 level `i`) and `TR_{i}.wav` (a single beat at volume `i`).
/// Levels run on separate scoped threads, each with its own generator seeded
/// with `seed + i` when a seed is given. Returns the written paths in level
/// order.
pub fn generate_intensity_set(
    directory: &Path,
    seed: Option<u64>,
    strategy: PauseStrategy,
    format: SampleFormat,
) -> Result<Vec<PathBuf>> {
    info!(
        "Generating intensity set in {:?} (seed {:?})",
        directory, seed
    );

    let results: Vec<Result<[PathBuf; 2]>> = thread::scope(|scope| {
        let handles: Vec<_> = (1..=MAX_S3_INTENSITY)
            .map(|level| {
                scope.spawn(move || {
                    let mut synth = RecordingSynthesizer::new(
                        seed.map(|s| s.wrapping_add(u64::from(level))),
                    )
                    .with_pause_strategy(strategy);
                    write_intensity_level(&mut synth, directory, level, format)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut paths = Vec::with_capacity(results.len() * 2);
    for result in results {
        paths.extend(result?);
    }
    Ok(paths)
}

fn write_intensity_level(
    synth: &mut RecordingSynthesizer,
    directory: &Path,
    level: u8,
    format: SampleFormat,
) -> Result<[PathBuf; 2]> {
    let recording = synth.synthesize_recording(
        INTENSITY_SET_BEATS,
        INTENSITY_SET_TEMPO,
        INTENSITY_SET_SAMPLE_RATE,
        level,
    )?;
    let heartbeat_path = directory.join(format!("HB_S3_{level}.wav"));
    WavFileSink::new(&heartbeat_path, format)
        .write(recording.sample_rate, &recording.filtered)?;

    let beat = synth.synthesize_single_beat(
        f64::from(level),
        INTENSITY_SET_TEMPO,
        INTENSITY_SET_SAMPLE_RATE,
    )?;
    let beat_path = directory.join(format!("TR_{level}.wav"));
    WavFileSink::new(&beat_path, format).write(INTENSITY_SET_SAMPLE_RATE, &beat)?;

    Ok([heartbeat_path, beat_path])
}
