// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Second-order peaking (resonator) filter
//!
//! Coefficients follow SciPy's `iirpeak(w0, Q)` with the default `fs = 2`:
//! `w0` is the center frequency as a fraction of Nyquist and `Q` the quality
//! factor, the -3 dB bandwidth being `w0 / Q` (also a fraction of Nyquist).
//!
//! ```text
//! beta = tan(bw * pi / 2)
//! gain = 1 / (1 + beta)
//! b    = (1 - gain) * [1, 0, -1]
//! a    = [1, -2 * gain * cos(w0 * pi), 2 * gain - 1]
//! ```

use super::{lfilter, Filter, TransferFunction};
use crate::error::{Result, SynthesisError};
use std::f64::consts::PI;

const STAGE: &str = "peak";

/// Peaking filter in (b, a) form
#[derive(Debug, Clone)]
pub struct PeakFilter {
    w0: f64,
    quality: f64,
    coefficients: TransferFunction,
}

impl PeakFilter {
    /// Design a peaking filter
    ///
    /// # Arguments
    /// * `w0` - Center frequency normalized to Nyquist, in `(0, 1)`
    /// * `quality` - Quality factor, strictly positive
    ///
    /// # Errors
    /// [`SynthesisError::FilterInstability`] when the parameters put the
    /// bandwidth outside the range where the formula yields a stable filter.
    pub fn new(w0: f64, quality: f64) -> Result<Self> {
        if !(w0 > 0.0 && w0 < 1.0) {
            return Err(SynthesisError::unstable(
                STAGE,
                format!("normalized center frequency {w0:.6} must be in (0, 1)"),
            ));
        }
        if !(quality > 0.0) || !quality.is_finite() {
            return Err(SynthesisError::unstable(
                STAGE,
                format!("quality factor {quality} must be positive"),
            ));
        }

        let bandwidth = w0 / quality;
        let half_angle = bandwidth * PI / 2.0;
        if half_angle >= PI / 2.0 {
            return Err(SynthesisError::unstable(
                STAGE,
                format!("normalized bandwidth {bandwidth:.6} reaches Nyquist"),
            ));
        }

        // -3 dB attenuation: gb / sqrt(1 - gb^2) == 1 for gb = 1/sqrt(2)
        let beta = half_angle.tan();
        let gain = 1.0 / (1.0 + beta);

        let b = vec![1.0 - gain, 0.0, -(1.0 - gain)];
        let a = vec![1.0, -2.0 * gain * (w0 * PI).cos(), 2.0 * gain - 1.0];
        let coefficients = TransferFunction::new(b, a);
        coefficients.ensure_stable(STAGE)?;

        Ok(Self {
            w0,
            quality,
            coefficients,
        })
    }

    pub fn w0(&self) -> f64 {
        self.w0
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }
}

impl Filter for PeakFilter {
    fn apply(&self, signal: &[f64]) -> Vec<f64> {
        lfilter(&self.coefficients.b, &self.coefficients.a, signal)
    }

    fn transfer_function(&self) -> &TransferFunction {
        &self.coefficients
    }
}
