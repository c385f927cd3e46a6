// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Digital filters for heart-sound shaping
//!
//! This module provides the IIR building blocks used to make a synthetic
//! heartbeat sound like a recording taken through tissue. All filters
//! implement the [`Filter`] trait and are applied in direct form, starting
//! from a fresh (zero) state on every call.
//!
//! # Filter Types
//!
//! - **[`scipy_butter_filter::ButterBandpassFilter`]**: Butterworth bandpass designed
//!   with `sci-rs`, run as a cascade of second-order sections
//! - **[`scipy_peak_filter::PeakFilter`]**: second-order resonant peaking filter with
//!   the same coefficient formula as SciPy's `iirpeak`
//!
//! # Examples
//!
//! ```no_run
//! use rust_heartbeat::preprocessing::filter::{Filter, ButterBandpassFilter};
//!
//! let filter = ButterBandpassFilter::new(20.0, 220.0, 17640.0, 3).unwrap();
//! let input = vec![1.0, 0.5, -0.3, 0.8, -0.2];
//! let output = filter.apply(&input);
//! assert_eq!(output.len(), input.len());
//! ```

pub mod scipy_butter_filter;
pub mod scipy_peak_filter;

use crate::error::{Result, SynthesisError};

/// Trait for implementing digital filters
///
/// Filters are immutable once designed, so a single instance can be shared
/// read-only between threads and applied to any number of buffers.
pub trait Filter: Send + Sync {
    /// Apply the filter to a signal and return the filtered signal
    ///
    /// ### Arguments
    ///
    /// * `signal` - Input samples
    ///
    /// ### Returns
    ///
    /// A new vector with exactly `signal.len()` samples
    fn apply(&self, signal: &[f64]) -> Vec<f64>;

    /// The (b, a) coefficients the filter applies
    fn transfer_function(&self) -> &TransferFunction;
}

/// Numerator/denominator polynomial coefficients of an IIR filter
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl TransferFunction {
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Self {
        Self { b, a }
    }

    /// Check that the coefficients are usable: non-empty, finite, `a[0] != 0`
    ///
    /// ### Errors
    ///
    /// Returns [`SynthesisError::FilterInstability`] tagged with `stage`.
    pub fn ensure_finite(&self, stage: &'static str) -> Result<()> {
        if self.a.is_empty() || self.b.is_empty() {
            return Err(SynthesisError::unstable(stage, "empty coefficient vector"));
        }
        if self.a.iter().chain(self.b.iter()).any(|c| !c.is_finite()) {
            return Err(SynthesisError::unstable(stage, "non-finite coefficient"));
        }
        if self.a[0] == 0.0 {
            return Err(SynthesisError::unstable(stage, "leading denominator coefficient is zero"));
        }
        Ok(())
    }

    /// Check that the coefficients are finite and every pole lies strictly
    /// inside the unit circle
    ///
    /// Uses the Schur-Cohn step-down recursion on the normalized denominator:
    /// the filter is stable iff every reflection coefficient has magnitude < 1.
    /// The recursion loses precision when several poles crowd near `z = 1`,
    /// so high-order designs are checked and run one second-order section at
    /// a time.
    ///
    /// ### Errors
    ///
    /// Returns [`SynthesisError::FilterInstability`] tagged with `stage`.
    pub fn ensure_stable(&self, stage: &'static str) -> Result<()> {
        self.ensure_finite(stage)?;

        let a0 = self.a[0];
        let mut poly: Vec<f64> = self.a.iter().map(|&c| c / a0).collect();
        while poly.len() > 1 {
            let k = poly.len() - 1;
            let reflection = poly[k];
            if reflection.abs() >= 1.0 {
                return Err(SynthesisError::unstable(
                    stage,
                    format!("unstable denominator (reflection {reflection:.6} at degree {k})"),
                ));
            }
            let scale = 1.0 - reflection * reflection;
            poly = (0..k)
                .map(|j| (poly[j] - reflection * poly[k - j]) / scale)
                .collect();
        }
        Ok(())
    }
}

/// Filter `input` with the rational transfer function `b / a`
///
/// Direct form II transposed, zero initial conditions, no phase correction.
/// Coefficients are normalized by `a[0]`. The output has the same length as
/// the input.
pub fn lfilter(b: &[f64], a: &[f64], input: &[f64]) -> Vec<f64> {
    let order = b.len().max(a.len());
    if order == 0 || a.first().map_or(true, |&a0| a0 == 0.0) {
        return vec![0.0; input.len()];
    }

    let a0 = a[0];
    let mut bn = vec![0.0; order];
    let mut an = vec![0.0; order];
    for (dst, &src) in bn.iter_mut().zip(b) {
        *dst = src / a0;
    }
    for (dst, &src) in an.iter_mut().zip(a) {
        *dst = src / a0;
    }

    let mut state = vec![0.0; order - 1];
    let mut output = Vec::with_capacity(input.len());

    for &x in input {
        let y = bn[0] * x + state.first().copied().unwrap_or(0.0);
        for i in 0..state.len() {
            let next = state.get(i + 1).copied().unwrap_or(0.0);
            state[i] = bn[i + 1] * x + next - an[i + 1] * y;
        }
        output.push(y);
    }

    output
}

pub use scipy_butter_filter::ButterBandpassFilter;
pub use scipy_peak_filter::PeakFilter;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lfilter_fir_is_convolution() {
        let out = lfilter(&[1.0, 0.5], &[1.0], &[1.0, 2.0, 3.0]);
        assert_eq!(out, vec![1.0, 2.5, 4.0]);
    }

    #[test]
    fn test_lfilter_one_pole_impulse_response() {
        // y[n] = x[n] + 0.5 y[n-1]
        let out = lfilter(&[1.0], &[1.0, -0.5], &[1.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[1], 0.5);
        assert_relative_eq!(out[2], 0.25);
        assert_relative_eq!(out[3], 0.125);
    }

    #[test]
    fn test_lfilter_normalizes_by_a0() {
        let out = lfilter(&[2.0], &[2.0], &[3.0, -1.0]);
        assert_eq!(out, vec![3.0, -1.0]);
    }

    #[test]
    fn test_lfilter_preserves_length_and_empty_input() {
        assert!(lfilter(&[1.0, 2.0, 1.0], &[1.0, 0.1, 0.2], &[]).is_empty());
        assert_eq!(lfilter(&[1.0], &[1.0, 0.3, 0.1], &vec![1.0; 37]).len(), 37);
    }

    #[test]
    fn test_stability_accepts_stable_denominator() {
        // poles at 0.5 and 0.4
        let tf = TransferFunction::new(vec![1.0], vec![1.0, -0.9, 0.2]);
        assert!(tf.ensure_stable("test").is_ok());
    }

    #[test]
    fn test_stability_rejects_pole_outside_unit_circle() {
        // pole at 1.5
        let tf = TransferFunction::new(vec![1.0], vec![1.0, -1.5]);
        let err = tf.ensure_stable("test").unwrap_err();
        assert!(matches!(err, SynthesisError::FilterInstability { stage: "test", .. }));

        // poles at 2.0 and 0.25: product below one but still unstable
        let tf = TransferFunction::new(vec![1.0], vec![1.0, -2.25, 0.5]);
        assert!(tf.ensure_stable("test").is_err());
    }

    #[test]
    fn test_finite_check_does_not_judge_poles() {
        // pole at 1.5 is finite but unstable
        let tf = TransferFunction::new(vec![1.0], vec![1.0, -1.5]);
        assert!(tf.ensure_finite("test").is_ok());
        let zero_lead = TransferFunction::new(vec![1.0], vec![0.0, 1.0]);
        assert!(zero_lead.ensure_finite("test").is_err());
    }

    #[test]
    fn test_stability_rejects_non_finite() {
        let tf = TransferFunction::new(vec![f64::NAN], vec![1.0]);
        assert!(tf.ensure_stable("test").is_err());
    }
}
