// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Utility module for audio input and output

pub mod wav_sink;

// Re-exports for use in other modules
pub use wav_sink::{read_wav, AudioSink, WavFileSink};
