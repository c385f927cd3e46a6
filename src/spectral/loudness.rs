// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Relative loudness estimate
//!
//! dB values here are relative to the loudest time-frequency cell of the
//! signal itself (0 dB), floored 80 dB below it. They compare stimuli with
//! each other; they are not an absolute sound level.

use crate::error::{Result, SynthesisError};
use rustfft::{num_complex::Complex64, FftPlanner};
use std::f64::consts::PI;

/// STFT frame length in samples
pub const FRAME_SIZE: usize = 2048;
/// Distance between consecutive frames
pub const HOP_SIZE: usize = 512;
/// Dynamic range kept below the loudest cell
pub const TOP_DB: f64 = 80.0;

const AMIN: f64 = 1e-10;

/// Which summary of the spectrogram to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoudnessTask {
    /// Average over frequency bins of each bin's loudest frame
    Mean,
    /// Loudest cell overall
    Max,
}

/// Power spectrogram in dB relative to its maximum
///
/// Indexed `[bin][frame]`, with `FRAME_SIZE / 2 + 1` bins. Frames start at
/// multiples of [`HOP_SIZE`]; the signal is zero-padded up to the end of the
/// last frame.
pub fn relative_spectrogram(samples: &[f64]) -> Result<Vec<Vec<f64>>> {
    if samples.is_empty() {
        return Err(SynthesisError::invalid("samples", "signal is empty"));
    }

    let frames = if samples.len() <= FRAME_SIZE {
        1
    } else {
        1 + (samples.len() - FRAME_SIZE).div_ceil(HOP_SIZE)
    };
    let bins = FRAME_SIZE / 2 + 1;

    let window: Vec<f64> = (0..FRAME_SIZE)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / FRAME_SIZE as f64).cos())
        .collect();
    let fft = FftPlanner::<f64>::new().plan_fft_forward(FRAME_SIZE);

    let mut power = vec![vec![0.0; frames]; bins];
    let mut buffer = vec![Complex64::new(0.0, 0.0); FRAME_SIZE];
    for frame in 0..frames {
        let start = frame * HOP_SIZE;
        for (n, slot) in buffer.iter_mut().enumerate() {
            let x = samples.get(start + n).copied().unwrap_or(0.0);
            *slot = Complex64::new(x * window[n], 0.0);
        }
        fft.process(&mut buffer);
        for (bin, row) in power.iter_mut().enumerate() {
            row[frame] = buffer[bin].norm_sqr();
        }
    }

    let reference = power
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, &p| acc.max(p))
        .max(AMIN);
    let reference_db = 10.0 * reference.log10();
    let floor = -TOP_DB;

    for row in &mut power {
        for cell in row.iter_mut() {
            let db = 10.0 * cell.max(AMIN).log10() - reference_db;
            *cell = db.max(floor);
        }
    }
    Ok(power)
}

/// Relative loudness of a signal in dB
///
/// With [`LoudnessTask::Mean`], bins whose loudest frame sits at the floor are
/// left out of the average.
///
/// # Errors
/// [`SynthesisError::InvalidParameter`] for an empty signal.
pub fn relative_loudness(samples: &[f64], task: LoudnessTask) -> Result<f64> {
    let spectrogram = relative_spectrogram(samples)?;
    let bin_peaks = spectrogram
        .iter()
        .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max));

    match task {
        LoudnessTask::Max => Ok(bin_peaks.fold(f64::NEG_INFINITY, f64::max)),
        LoudnessTask::Mean => {
            let (sum, count) = bin_peaks
                .filter(|&peak| peak > -TOP_DB)
                .fold((0.0, 0usize), |(sum, count), peak| (sum + peak, count + 1));
            if count == 0 {
                Ok(-TOP_DB)
            } else {
                Ok(sum / count as f64)
            }
        }
    }
}
