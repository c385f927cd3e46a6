// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Heart sound synthesis
//!
//! Data flows strictly downward:
//! [`recording`] → [`heartbeat`] → [`pulse`], with the acoustic filter applied
//! once per assembled cycle before concatenation.

pub mod heartbeat;
pub mod pulse;
pub mod recording;

/// Mono amplitude samples, the currency between every synthesis stage
pub type SampleBuffer = Vec<f64>;

pub use heartbeat::{
    amplitude_for, assemble_cycle, HeartSound, HeartbeatCycle, S3_AMPLITUDES,
};
pub use pulse::{synthesize_pulse, PulseSegment, SegmentKind, PULSE_SEGMENTS};
pub use recording::{
    generate_intensity_set, synthesize_recording, synthesize_single_beat, BeatTiming, Recording,
    RecordingSynthesizer,
};
