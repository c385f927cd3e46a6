// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Cardiac Cycle Assembly
//!
//! One heartbeat is one full cycle of a Wiggers diagram: the S1 and S2 sounds
//! ("lub", "dub") and, when the experiment asks for it, a third S3 sound shortly
//! after S2. Each sound is a pulse from [`synthesize_pulse`] scaled by a volume
//! multiplier; the rest of the cycle is silence.
//!
//! ```text
//! without S3   lub..........dub.................
//! with S3      lub.........dub..dub.............
//! ```
//!
//! The silence budget is `beat_ns - 2 * pulse_ns`. Without S3 it is split
//! 25 % / 75 % (ceil first, remainder second) so the cycle is exactly
//! `beat_ns` samples. With S3 the fractions `[0.6, 1.0, 0.3]` are applied
//! according to the configured [`PauseStrategy`].

use super::pulse::synthesize_pulse;
use super::SampleBuffer;
use crate::config::PauseStrategy;
use crate::error::{Result, SynthesisError};
use crate::preprocessing::AcousticFilter;
use log::debug;
use rand::Rng;

/// S3 amplitude multiplier for intensity levels 1 to 10
///
/// Roughly geometric so that perceived loudness steps are comparable.
pub const S3_AMPLITUDES: [f64; 10] = [0.003, 0.005, 0.008, 0.01, 0.02, 0.04, 0.06, 0.08, 0.1, 0.12];

/// Highest accepted S3 intensity level
pub const MAX_S3_INTENSITY: u8 = 10;

const NORMAL_VOLUMES: [f64; 2] = [0.8, 1.0];
const NORMAL_FIRST_PAUSE: f64 = 0.25;

const S3_S1_VOLUME: f64 = 1.0;
const S3_S2_VOLUME: f64 = 0.4;
const S3_SHORT_PAUSE: f64 = 0.6;
const S3_LONG_PAUSE: f64 = 1.0;
const S3_MINI_PAUSE: f64 = 0.3;

/// Amplitude multiplier of the S3 pulse for `intensity` in `1..=10`
///
/// # Errors
/// [`SynthesisError::InvalidParameter`] for any other level, 0 included:
/// level 0 means "no S3" and has no amplitude.
pub fn amplitude_for(intensity: u8) -> Result<f64> {
    match intensity {
        1..=MAX_S3_INTENSITY => Ok(S3_AMPLITUDES[usize::from(intensity) - 1]),
        _ => Err(SynthesisError::invalid(
            "s3_intensity",
            format!("no S3 amplitude for level {intensity}, expected 1 to {MAX_S3_INTENSITY}"),
        )),
    }
}

/// Check an S3 level: `0` (absent) or `1..=10`
pub fn validate_s3_intensity(intensity: u8) -> Result<()> {
    if intensity > MAX_S3_INTENSITY {
        return Err(SynthesisError::invalid(
            "s3_intensity",
            format!("must be 0 (absent) or 1 to {MAX_S3_INTENSITY}, got {intensity}"),
        ));
    }
    Ok(())
}

/// Heart sounds within one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeartSound {
    S1,
    S2,
    S3,
}

/// What occupies a span of the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Sound(HeartSound),
    Pause,
}

/// A contiguous span of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleComponent {
    pub kind: ComponentKind,
    pub start: usize,
    pub len: usize,
}

/// One assembled cardiac cycle
#[derive(Debug, Clone)]
pub struct HeartbeatCycle {
    /// Cycle after the tissue-coupling filter
    pub filtered: SampleBuffer,
    /// Cycle before filtering
    pub raw: SampleBuffer,
    /// Layout of `raw`, in order
    pub components: Vec<CycleComponent>,
}

impl HeartbeatCycle {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Span of a given heart sound, if the cycle contains it
    pub fn sound(&self, sound: HeartSound) -> Option<&CycleComponent> {
        self.components
            .iter()
            .find(|c| c.kind == ComponentKind::Sound(sound))
    }

    /// Lengths of the silent gaps, in cycle order
    pub fn pause_lengths(&self) -> Vec<usize> {
        self.components
            .iter()
            .filter(|c| c.kind == ComponentKind::Pause)
            .map(|c| c.len)
            .collect()
    }
}

struct CycleBuilder {
    raw: SampleBuffer,
    components: Vec<CycleComponent>,
}

impl CycleBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            raw: Vec::with_capacity(capacity),
            components: Vec::with_capacity(6),
        }
    }

    fn sound(&mut self, sound: HeartSound, pulse: &[f64], volume: f64) {
        let start = self.raw.len();
        self.raw.extend(pulse.iter().map(|&x| volume * x));
        self.components.push(CycleComponent {
            kind: ComponentKind::Sound(sound),
            start,
            len: pulse.len(),
        });
    }

    fn pause(&mut self, len: usize) {
        let start = self.raw.len();
        self.raw.resize(start + len, 0.0);
        self.components.push(CycleComponent {
            kind: ComponentKind::Pause,
            start,
            len,
        });
    }
}

/// Pause lengths `(short, long, mini)` of an S3 cycle for a silence budget
///
/// `short` follows S1, `mini` separates S2 from S3 and `long` closes the
/// cycle. The fractions are consumed in the order short, long, mini.
pub fn s3_pause_lengths(budget: usize, strategy: PauseStrategy) -> (usize, usize, usize) {
    let budget_f = budget as f64;
    match strategy {
        PauseStrategy::Sequential => {
            let short = ((S3_SHORT_PAUSE * budget_f).ceil() as usize).min(budget);
            let remaining = budget - short;
            let long = ((S3_LONG_PAUSE * remaining as f64).floor() as usize).min(remaining);
            let remaining = remaining - long;
            let mini = ((S3_MINI_PAUSE * remaining as f64).ceil() as usize).min(remaining);
            (short, long, mini)
        }
        PauseStrategy::Independent => (
            (S3_SHORT_PAUSE * budget_f).ceil() as usize,
            (S3_LONG_PAUSE * budget_f).floor() as usize,
            (S3_MINI_PAUSE * budget_f).ceil() as usize,
        ),
    }
}

/// Pause lengths `(short, long)` of a cycle without S3; they always sum to `budget`
pub fn normal_pause_lengths(budget: usize) -> (usize, usize) {
    let short = ((NORMAL_FIRST_PAUSE * budget as f64).ceil() as usize).min(budget);
    (short, budget - short)
}

/// Assemble and filter one cardiac cycle
///
/// # Arguments
/// * `rng` - Jitter source for the pulses
/// * `pulse_ns` - Samples per heart sound
/// * `beat_ns` - Samples per beat; the silence budget is `beat_ns - 2 * pulse_ns`
/// * `s3_intensity` - `0` for no S3, otherwise `1..=10`
/// * `strategy` - How the S3 pause fractions consume the budget
/// * `filter` - Coefficients shared by the whole recording
///
/// # Errors
/// [`SynthesisError::InvalidParameter`] for an S3 level above 10 or a zero
/// `pulse_ns`. Nothing is drawn from `rng` when the S3 level is rejected.
pub fn assemble_cycle<R: Rng + ?Sized>(
    rng: &mut R,
    pulse_ns: usize,
    beat_ns: usize,
    s3_intensity: u8,
    strategy: PauseStrategy,
    filter: &AcousticFilter,
) -> Result<HeartbeatCycle> {
    validate_s3_intensity(s3_intensity)?;
    let budget = beat_ns.saturating_sub(2 * pulse_ns);

    let mut builder;
    if s3_intensity == 0 {
        let s1 = synthesize_pulse(rng, pulse_ns)?;
        let s2 = synthesize_pulse(rng, pulse_ns)?;
        let (short, long) = normal_pause_lengths(budget);

        builder = CycleBuilder::with_capacity(2 * pulse_ns + budget);
        builder.sound(HeartSound::S1, &s1, NORMAL_VOLUMES[0]);
        builder.pause(short);
        builder.sound(HeartSound::S2, &s2, NORMAL_VOLUMES[1]);
        builder.pause(long);
    } else {
        let s3_volume = amplitude_for(s3_intensity)?;
        let s1 = synthesize_pulse(rng, pulse_ns)?;
        let s2 = synthesize_pulse(rng, pulse_ns)?;
        let s3 = synthesize_pulse(rng, pulse_ns)?;
        let (short, long, mini) = s3_pause_lengths(budget, strategy);

        builder = CycleBuilder::with_capacity(3 * pulse_ns + short + long + mini);
        builder.sound(HeartSound::S1, &s1, S3_S1_VOLUME);
        builder.pause(short);
        builder.sound(HeartSound::S2, &s2, S3_S2_VOLUME);
        builder.pause(mini);
        builder.sound(HeartSound::S3, &s3, s3_volume);
        builder.pause(long);
    }

    let CycleBuilder { raw, components } = builder;
    let filtered = filter.apply(&raw);
    debug!(
        "Assembled cycle: {} samples, s3 level {}, pauses {:?}",
        raw.len(),
        s3_intensity,
        components
            .iter()
            .filter(|c| c.kind == ComponentKind::Pause)
            .map(|c| c.len)
            .collect::<Vec<_>>()
    );

    Ok(HeartbeatCycle {
        filtered,
        raw,
        components,
    })
}
