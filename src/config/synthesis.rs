// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration of the heartbeat synthesis request

use serde::{Deserialize, Serialize};

/// How the three S3-cycle pauses split the silence budget
///
/// The budget is `beat_ns - 2 * pulse_ns` and the fractions are `0.6` (after
/// S1), `1.0` (end of cycle) and `0.3` (between S2 and S3), consumed in that
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PauseStrategy {
    /// Each fraction applies to what the previous pauses left over
    #[default]
    Sequential,
    /// Each fraction applies to the full budget; the cycle overruns `beat_ns`
    Independent,
}

/// Parameters of one synthesized recording
///
/// ### Examples
///
/// ```no_run
/// use rust_heartbeat::config::{PauseStrategy, SynthesisConfig};
///
/// let config = SynthesisConfig {
///     tempo_bpm: 80.0,
///     s3_intensity: 5,
///     pause_strategy: PauseStrategy::Independent,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Number of cardiac cycles in the recording
    #[serde(default = "default_num_beats")]
    pub num_beats: usize,

    /// Heart rate in beats per minute
    #[serde(default = "default_tempo_bpm")]
    pub tempo_bpm: f64,

    /// Sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// S3 intensity level: 0 for no S3, otherwise 1 (faintest) to 10 (loudest)
    #[serde(default)]
    pub s3_intensity: u8,

    /// Pause budget handling for cycles with an S3
    #[serde(default)]
    pub pause_strategy: PauseStrategy,

    /// Fixed RNG seed for reproducible recordings; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            num_beats: default_num_beats(),
            tempo_bpm: default_tempo_bpm(),
            sample_rate: default_sample_rate(),
            s3_intensity: 0,
            pause_strategy: PauseStrategy::default(),
            seed: None,
        }
    }
}

fn default_num_beats() -> usize {
    10
}

fn default_tempo_bpm() -> f64 {
    100.0
}

fn default_sample_rate() -> u32 {
    44100
}
