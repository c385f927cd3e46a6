// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Heartbeat library
//!
//! Synthetic heart-sound stimuli for auditory perception experiments. A
//! recording is built from stylized S1/S2 pulses, an optional S3 pulse of
//! configurable intensity, and a two-stage filter that emulates a microphone
//! coupled through tissue.
//!
//! ```no_run
//! use rust_heartbeat::synthesis::RecordingSynthesizer;
//! use rust_heartbeat::utility::{AudioSink, WavFileSink};
//! use rust_heartbeat::config::SampleFormat;
//!
//! let recording = RecordingSynthesizer::new(None)
//!     .synthesize_recording(10, 80.0, 44100, 6)
//!     .unwrap();
//! WavFileSink::new("media/HB_S3_6.wav", SampleFormat::Float32)
//!     .write(recording.sample_rate, &recording.filtered)
//!     .unwrap();
//! ```

pub mod config;
pub mod error;
pub mod preprocessing;
pub mod spectral;
pub mod synthesis;
pub mod utility;

pub use error::{Result, SynthesisError};
pub use synthesis::{Recording, RecordingSynthesizer, SampleBuffer};
