// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Tissue-coupling filter
//!
//! Heart sounds picked up by a microphone near the abdomen lose most of their
//! energy outside a narrow low-frequency band. [`AcousticFilter`] emulates that
//! with two cascaded stages applied to a whole cardiac cycle:
//!
//! 1. 3rd-order Butterworth bandpass, cutoffs `[20, 140 + tempo]` Hz divided
//!    by `0.4 * sample_rate`, not by the Nyquist frequency.
//! 2. Peaking filter with `w0 = 110 / (sample_rate / 2)` and
//!    `Q = 120 / (0.5 * sample_rate)`.
//!
//! Coefficients are derived once per recording and never mutated; every call
//! to [`AcousticFilter::apply`] starts from a fresh filter state.

use super::filter::{ButterBandpassFilter, Filter, PeakFilter};
use crate::error::{Result, SynthesisError};
use log::debug;

/// Order of the Butterworth prototype
pub const BANDPASS_ORDER: usize = 3;
/// Lower bandpass cutoff in Hz
pub const BANDPASS_LOW_HZ: f64 = 20.0;
/// Upper cutoff is this offset plus the tempo in BPM
pub const BANDPASS_HIGH_OFFSET_HZ: f64 = 140.0;
/// Cutoffs are normalized against this fraction of the sample rate
pub const BANDPASS_REFERENCE_FRACTION: f64 = 0.4;
/// Peaking filter center frequency in Hz
pub const PEAK_CENTER_HZ: f64 = 110.0;
/// Numerator of the peaking filter's quality factor
pub const PEAK_QUALITY_HZ: f64 = 120.0;

/// Two-stage filter coefficients for one recording
#[derive(Debug, Clone)]
pub struct AcousticFilter {
    tempo_bpm: f64,
    sample_rate: u32,
    bandpass: ButterBandpassFilter,
    peak: PeakFilter,
}

/// Read-only coefficient set shared by every cycle of a recording
pub type FilterCoefficients = AcousticFilter;

impl AcousticFilter {
    /// Derive both filter stages from the tempo and sample rate
    ///
    /// # Errors
    /// - [`SynthesisError::InvalidParameter`] for a non-positive tempo or sample rate
    /// - [`SynthesisError::FilterInstability`] when the combination leads to an
    ///   invalid band or unstable coefficients
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
        let bandpass = ButterBandpassFilter::new(
            BANDPASS_LOW_HZ,
            BANDPASS_HIGH_OFFSET_HZ + tempo_bpm,
            BANDPASS_REFERENCE_FRACTION * fs,
            BANDPASS_ORDER,
        )?;
        let peak = PeakFilter::new(PEAK_CENTER_HZ / (fs / 2.0), PEAK_QUALITY_HZ / (0.5 * fs))?;

        debug!(
            "Acoustic filter derived for {} BPM at {} Hz (band {}-{} Hz)",
            tempo_bpm,
            sample_rate,
            BANDPASS_LOW_HZ,
            BANDPASS_HIGH_OFFSET_HZ + tempo_bpm
        );

        Ok(Self {
            tempo_bpm,
            sample_rate,
            bandpass,
            peak,
        })
    }

    /// Bandpass then peak over the entire buffer; output length equals input length
    pub fn apply(&self, raw: &[f64]) -> Vec<f64> {
        self.peak.apply(&self.bandpass.apply(raw))
    }

    pub fn tempo_bpm(&self) -> f64 {
        self.tempo_bpm
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bandpass(&self) -> &ButterBandpassFilter {
        &self.bandpass
    }

    pub fn peak(&self) -> &PeakFilter {
        &self.peak
    }
}

/// One-shot form: derive the coefficients and filter `raw`
pub fn filter(tempo_bpm: f64, sample_rate: u32, raw: &[f64]) -> Result<Vec<f64>> {
    Ok(AcousticFilter::new(tempo_bpm, sample_rate)?.apply(raw))
}
