// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Spectral analysis module
//!
//! Short-time Fourier analysis used to compare the loudness of generated
//! stimuli.

pub mod loudness;

pub use loudness::{relative_loudness, relative_spectrogram, LoudnessTask};
