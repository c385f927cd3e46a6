// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Butterworth bandpass filter designed the SciPy way
//!
//! The design goes through `sci-rs`' `butter_dyn`, so the transfer function
//! matches `scipy.signal.butter(order, wn, 'bandpass')`. Filtering is a plain
//! forward pass, not `filtfilt`.
//!
//! The signal runs through the second-order sections of the design, one
//! `lfilter` pass per section. With a narrow band at a high sample rate the
//! poles crowd around `z = 1`, and the expanded (b, a) polynomial rounds badly
//! enough to turn unstable (tempo 60 at 192 kHz). The (b, a) form is still
//! designed and reported by [`Filter::transfer_function`].
//!
//! # Examples
//!
//! ```no_run
//! use rust_heartbeat::preprocessing::filter::{Filter, scipy_butter_filter::ButterBandpassFilter};
//!
//! // 3rd-order bandpass 20-220 Hz, cutoffs normalized against 17640 Hz
//! let filter = ButterBandpassFilter::new(20.0, 220.0, 17640.0, 3).unwrap();
//! let output = filter.apply(&[1.0, 0.0, 0.0, 0.0]);
//! ```

use super::{lfilter, Filter, TransferFunction};
use crate::error::{Result, SynthesisError};
use log::debug;
use sci_rs::signal::filter::design::{
    butter_dyn, DigitalFilter, FilterBandType, FilterOutputType,
};

const STAGE: &str = "bandpass";

/// Butterworth bandpass filter
///
/// # Parameters
/// - `low_freq`: Lower cutoff frequency in Hz
/// - `high_freq`: Upper cutoff frequency in Hz
/// - `reference_freq`: Frequency the cutoffs are divided by to get the
///   normalized critical frequencies handed to the designer (SciPy treats
///   those as fractions of Nyquist)
/// - `order`: Prototype order; the bandpass denominator has degree `2 * order`
#[derive(Debug, Clone)]
pub struct ButterBandpassFilter {
    low_freq: f64,
    high_freq: f64,
    reference_freq: f64,
    order: usize,
    coefficients: TransferFunction,
    sections: Vec<TransferFunction>,
}

impl ButterBandpassFilter {
    /// Design a new Butterworth bandpass filter
    ///
    /// # Errors
    /// [`SynthesisError::FilterInstability`] when the normalized band is not
    /// inside `(0, 1)` or a second-order section is unstable,
    /// [`SynthesisError::FilterDesign`] when the designer returns another
    /// representation than the one requested.
    pub fn new(low_freq: f64, high_freq: f64, reference_freq: f64, order: usize) -> Result<Self> {
        if order == 0 {
            return Err(SynthesisError::unstable(STAGE, "filter order must be greater than 0"));
        }
        if !(reference_freq > 0.0) {
            return Err(SynthesisError::unstable(
                STAGE,
                format!("reference frequency {reference_freq} Hz must be positive"),
            ));
        }

        let low_norm = low_freq / reference_freq;
        let high_norm = high_freq / reference_freq;
        if !(low_norm > 0.0 && low_norm < high_norm && high_norm < 1.0) {
            return Err(SynthesisError::unstable(
                STAGE,
                format!("normalized band [{low_norm:.6}, {high_norm:.6}] is not inside (0, 1)"),
            ));
        }

        let result = butter_dyn(
            order,                          // filter order
            vec![low_norm, high_norm],      // critical frequencies (normalized)
            Some(FilterBandType::Bandpass), // filter type
            Some(false),                    // digital filter
            Some(FilterOutputType::Sos),    // second-order sections
            None,                           // fs (already normalized)
        );
        let sections: Vec<TransferFunction> = match result {
            DigitalFilter::Sos(sos_filter) => sos_filter
                .sos
                .iter()
                .map(|section| TransferFunction::new(section.b.to_vec(), section.a.to_vec()))
                .collect(),
            _ => {
                return Err(SynthesisError::FilterDesign {
                    reason: "expected second-order sections from butter_dyn".to_string(),
                })
            }
        };
        if sections.is_empty() {
            return Err(SynthesisError::FilterDesign {
                reason: "butter_dyn returned no second-order sections".to_string(),
            });
        }
        for section in &sections {
            section.ensure_stable(STAGE)?;
        }

        let result = butter_dyn(
            order,
            vec![low_norm, high_norm],
            Some(FilterBandType::Bandpass),
            Some(false),
            Some(FilterOutputType::Ba), // reported transfer function
            None,
        );

        let coefficients = match result {
            DigitalFilter::Ba(ba) => TransferFunction::new(ba.b, ba.a),
            _ => {
                return Err(SynthesisError::FilterDesign {
                    reason: "expected (b, a) output from butter_dyn".to_string(),
                })
            }
        };
        coefficients.ensure_finite(STAGE)?;

        debug!(
            "Butterworth bandpass order {} designed for [{:.6}, {:.6}] (normalized), {} sections",
            order,
            low_norm,
            high_norm,
            sections.len()
        );

        Ok(Self {
            low_freq,
            high_freq,
            reference_freq,
            order,
            coefficients,
            sections,
        })
    }

    pub fn low_freq(&self) -> f64 {
        self.low_freq
    }

    pub fn high_freq(&self) -> f64 {
        self.high_freq
    }

    pub fn reference_freq(&self) -> f64 {
        self.reference_freq
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Second-order sections the signal is run through, gain in the first
    pub fn sections(&self) -> &[TransferFunction] {
        &self.sections
    }
}

impl Filter for ButterBandpassFilter {
    fn apply(&self, signal: &[f64]) -> Vec<f64> {
        self.sections
            .iter()
            .fold(signal.to_vec(), |acc, section| lfilter(&section.b, &section.a, &acc))
    }

    fn transfer_function(&self) -> &TransferFunction {
        &self.coefficients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: f64, freq: f64, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    fn rms(signal: &[f64]) -> f64 {
        (signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64).sqrt()
    }

    #[test]
    fn test_butter_bandpass_coefficient_shape() {
        let filter = ButterBandpassFilter::new(20.0, 220.0, 17640.0, 3).unwrap();
        let tf = filter.transfer_function();
        assert_eq!(tf.b.len(), 7);
        assert_eq!(tf.a.len(), 7);
        assert!((tf.a[0] - 1.0).abs() < 1e-12);
        assert_eq!(filter.sections().len(), 3);
        for section in filter.sections() {
            assert_eq!(section.a.len(), 3);
        }
    }

    #[test]
    fn test_sections_match_transfer_function_at_cd_rate() {
        let filter = ButterBandpassFilter::new(20.0, 220.0, 17640.0, 3).unwrap();
        let tf = filter.transfer_function();
        let input = sine(44100.0, 100.0, 20_000);
        let cascade = filter.apply(&input);
        let direct = lfilter(&tf.b, &tf.a, &input);
        for (x, y) in cascade.iter().zip(&direct) {
            assert!((x - y).abs() < 1e-2, "cascade {x} vs direct {y}");
        }
    }

    #[test]
    fn test_butter_bandpass_passes_band_and_rejects_outside() {
        let sample_rate = 8000.0;
        let filter = ButterBandpassFilter::new(200.0, 800.0, sample_rate / 2.0, 3).unwrap();

        let in_band = filter.apply(&sine(sample_rate, 400.0, 8000));
        let out_of_band = filter.apply(&sine(sample_rate, 3500.0, 8000));

        // skip the transient
        let in_rms = rms(&in_band[2000..]);
        let out_rms = rms(&out_of_band[2000..]);
        assert!(in_rms > 0.5, "in-band rms {in_rms}");
        assert!(out_rms < 0.05, "out-of-band rms {out_rms}");
    }

    #[test]
    fn test_butter_bandpass_preserves_length() {
        let filter = ButterBandpassFilter::new(20.0, 220.0, 17640.0, 3).unwrap();
        for len in [0, 1, 5, 1024] {
            assert_eq!(filter.apply(&vec![0.5; len]).len(), len);
        }
    }

    #[test]
    fn test_narrow_band_at_high_rate_stays_bounded() {
        // 20-200 Hz at 96 kHz and 192 kHz: poles hug z = 1
        for sample_rate in [96000.0, 192000.0] {
            let filter = ButterBandpassFilter::new(20.0, 200.0, 0.4 * sample_rate, 3).unwrap();
            let output = filter.apply(&sine(sample_rate, 100.0, 200_000));
            assert_eq!(output.len(), 200_000);
            assert!(output.iter().all(|x| x.is_finite() && x.abs() < 2.0));
            assert!(rms(&output[100_000..]) > 0.5);
        }
    }

    #[test]
    fn test_butter_bandpass_rejects_band_outside_unit_interval() {
        let err = ButterBandpassFilter::new(20.0, 300.0, 200.0, 3).unwrap_err();
        assert!(matches!(err, SynthesisError::FilterInstability { stage: "bandpass", .. }));

        assert!(ButterBandpassFilter::new(0.0, 100.0, 1000.0, 3).is_err());
        assert!(ButterBandpassFilter::new(200.0, 100.0, 1000.0, 3).is_err());
        assert!(ButterBandpassFilter::new(20.0, 100.0, 1000.0, 0).is_err());
    }
}
