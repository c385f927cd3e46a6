// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error type shared by the synthesis, filtering and output layers

use thiserror::Error;

/// Errors raised while synthesizing or writing a heart-sound recording
///
/// Synthesis is all-or-nothing: whenever one of these is returned, no partial
/// buffer is handed back to the caller.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// A request parameter is outside its accepted domain
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A filter stage produced coefficients that cannot be applied safely
    #[error("Filter stage '{stage}' is unstable: {reason}")]
    FilterInstability { stage: &'static str, reason: String },

    /// The filter design backend returned an unexpected representation
    #[error("Filter design failed: {reason}")]
    FilterDesign { reason: String },

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthesisError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SynthesisError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn unstable(stage: &'static str, reason: impl Into<String>) -> Self {
        SynthesisError::FilterInstability {
            stage,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, SynthesisError>;
