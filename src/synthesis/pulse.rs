// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Single Pulse Synthesis
//!
//! A heart sound pulse is approximated by the phases of an EKG trace
//! (P, PR, Q, R, S, ST, T, U), laid end to end. Each phase with an amplitude is
//! a Hann-windowed bump; PR and ST are silence. Lengths and amplitudes are
//! jittered independently on every call so repeated pulses never sound
//! identical.
//!
//! ```text
//!        R
//!        /\
//!  P    /  \        T
//!  /\  /    \  ST  /\   U
//! /  \/ PR Q \  /\/  \ /\___ (zero padding)
//!             \/ S
//! ```
//!
//! This is a stylized approximation, not a physiological model.
//!
//! ## Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use rust_heartbeat::synthesis::pulse::synthesize_pulse;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let pulse = synthesize_pulse(&mut rng, 6615).unwrap();
//! assert_eq!(pulse.len(), 6615);
//! ```

use super::SampleBuffer;
use crate::error::{Result, SynthesisError};
use log::debug;
use rand::Rng;
use std::f64::consts::PI;

/// Lower bound of the jitter factor
pub const JITTER_MIN: f64 = 0.75;
/// Width of the jitter band; factors fall in `[0.75, 1.25)`
pub const JITTER_SPAN: f64 = 0.5;

/// Physiological phase of a pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    P,
    Pr,
    Q,
    R,
    S,
    St,
    T,
    U,
}

impl SegmentKind {
    pub fn name(self) -> &'static str {
        match self {
            SegmentKind::P => "P",
            SegmentKind::Pr => "PR",
            SegmentKind::Q => "Q",
            SegmentKind::R => "R",
            SegmentKind::S => "S",
            SegmentKind::St => "ST",
            SegmentKind::T => "T",
            SegmentKind::U => "U",
        }
    }
}

/// Base shape of one pulse phase
///
/// The segment spans `pulse_ns / length_divisor` samples before jitter. A
/// `None` amplitude marks a silent segment; negative amplitudes produce
/// downward deflections (Q and S).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseSegment {
    pub kind: SegmentKind,
    pub length_divisor: f64,
    pub amplitude: Option<f64>,
}

/// Segment table in anatomical order
pub const PULSE_SEGMENTS: [PulseSegment; 8] = [
    PulseSegment {
        kind: SegmentKind::P,
        length_divisor: 9.0,
        amplitude: Some(0.1),
    },
    PulseSegment {
        kind: SegmentKind::Pr,
        length_divisor: 8.0,
        amplitude: None,
    },
    PulseSegment {
        kind: SegmentKind::Q,
        length_divisor: 24.0,
        amplitude: Some(-0.1),
    },
    PulseSegment {
        kind: SegmentKind::R,
        length_divisor: 6.0,
        amplitude: Some(1.0),
    },
    PulseSegment {
        kind: SegmentKind::S,
        length_divisor: 24.0,
        amplitude: Some(-0.3),
    },
    PulseSegment {
        kind: SegmentKind::St,
        length_divisor: 9.0,
        amplitude: None,
    },
    PulseSegment {
        kind: SegmentKind::T,
        length_divisor: 9.0,
        amplitude: Some(0.2),
    },
    PulseSegment {
        kind: SegmentKind::U,
        length_divisor: 11.0,
        amplitude: Some(0.1),
    },
];

impl PulseSegment {
    /// Fraction of the pulse the segment covers before jitter
    pub fn length_fraction(&self) -> f64 {
        1.0 / self.length_divisor
    }

    pub fn is_silent(&self) -> bool {
        self.amplitude.is_none()
    }

    /// Render this segment for a pulse of `pulse_ns` samples
    ///
    /// Draws the length jitter first, then (for windowed segments) the
    /// amplitude jitter.
    pub fn render<R: Rng + ?Sized>(&self, rng: &mut R, pulse_ns: usize) -> SampleBuffer {
        let length = (jitter(rng) * pulse_ns as f64 / self.length_divisor).floor() as usize;
        match self.amplitude {
            None => vec![0.0; length],
            Some(base) => {
                let peak = jitter(rng) * base;
                hann(length).into_iter().map(|w| peak * w).collect()
            }
        }
    }
}

/// Uniform jitter factor in `[0.75, 1.25)`
pub fn jitter<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    JITTER_MIN + rng.random::<f64>() * JITTER_SPAN
}

/// Symmetric Hann window, zero at both ends
///
/// A single-sample window is a boundary on both sides and is therefore zero.
pub fn hann(length: usize) -> Vec<f64> {
    match length {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let denom = (length - 1) as f64;
            (0..length)
                .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / denom).cos())
                .collect()
        }
    }
}

/// Build one pulse of exactly `pulse_ns` samples
///
/// Segments are concatenated in the order of [`PULSE_SEGMENTS`] and the tail
/// is zero-padded up to `pulse_ns`. Should the jittered lengths ever sum past
/// `pulse_ns`, the pulse is truncated instead of failing. Requests shorter
/// than the number of segments cannot hold a shape and come back silent.
///
/// # Errors
/// [`SynthesisError::InvalidParameter`] when `pulse_ns` is zero.
pub fn synthesize_pulse<R: Rng + ?Sized>(rng: &mut R, pulse_ns: usize) -> Result<SampleBuffer> {
    if pulse_ns == 0 {
        return Err(SynthesisError::invalid("pulse_ns", "must be positive"));
    }
    if pulse_ns < PULSE_SEGMENTS.len() {
        return Ok(vec![0.0; pulse_ns]);
    }

    let mut pulse = Vec::with_capacity(pulse_ns);
    for segment in &PULSE_SEGMENTS {
        pulse.extend(segment.render(rng, pulse_ns));
    }

    if pulse.len() > pulse_ns {
        debug!(
            "Pulse segments overshoot by {} samples, truncating to {}",
            pulse.len() - pulse_ns,
            pulse_ns
        );
        pulse.truncate(pulse_ns);
    }
    pulse.resize(pulse_ns, 0.0);

    Ok(pulse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pulse_has_exact_length() {
        let mut rng = StdRng::seed_from_u64(1);
        for pulse_ns in [8, 9, 23, 24, 100, 997, 4410, 6615, 6616] {
            for _ in 0..20 {
                assert_eq!(synthesize_pulse(&mut rng, pulse_ns).unwrap().len(), pulse_ns);
            }
        }
    }

    #[test]
    fn test_short_pulse_is_silent() {
        let mut rng = StdRng::seed_from_u64(2);
        for pulse_ns in 1..PULSE_SEGMENTS.len() {
            let pulse = synthesize_pulse(&mut rng, pulse_ns).unwrap();
            assert_eq!(pulse.len(), pulse_ns);
            assert!(pulse.iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_zero_length_pulse_is_invalid() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            synthesize_pulse(&mut rng, 0),
            Err(SynthesisError::InvalidParameter { name: "pulse_ns", .. })
        ));
    }

    #[test]
    fn test_pulse_is_deterministic_under_seed() {
        let a = synthesize_pulse(&mut StdRng::seed_from_u64(42), 6615).unwrap();
        let b = synthesize_pulse(&mut StdRng::seed_from_u64(42), 6615).unwrap();
        let c = synthesize_pulse(&mut StdRng::seed_from_u64(43), 6615).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_pulse_starts_silent_and_peaks_near_r_amplitude() {
        let mut rng = StdRng::seed_from_u64(4);
        let pulse = synthesize_pulse(&mut rng, 6615).unwrap();
        assert_eq!(pulse[0], 0.0);
        let peak = pulse.iter().cloned().fold(f64::MIN, f64::max);
        // R dominates: base 1.0 jittered into [0.75, 1.25)
        assert!(peak >= 0.74 && peak < 1.25, "peak {peak}");
        let trough = pulse.iter().cloned().fold(f64::MAX, f64::min);
        // S is the deepest downward deflection: -0.3 jittered
        assert!(trough <= -0.2 && trough > -0.375, "trough {trough}");
    }

    #[test]
    fn test_segment_table_is_in_anatomical_order() {
        let names: Vec<_> = PULSE_SEGMENTS.iter().map(|s| s.kind.name()).collect();
        assert_eq!(names, ["P", "PR", "Q", "R", "S", "ST", "T", "U"]);
        let silent: Vec<_> = PULSE_SEGMENTS
            .iter()
            .filter(|s| s.is_silent())
            .map(|s| s.kind)
            .collect();
        assert_eq!(silent, [SegmentKind::Pr, SegmentKind::St]);
        assert_relative_eq!(PULSE_SEGMENTS[3].length_fraction(), 1.0 / 6.0);
    }

    #[test]
    fn test_segment_table_cannot_overshoot() {
        let max_total: f64 = PULSE_SEGMENTS
            .iter()
            .map(|s| (JITTER_MIN + JITTER_SPAN) * s.length_fraction())
            .sum();
        assert!(max_total < 1.0);
    }

    #[test]
    fn test_segment_render_respects_jitter_band() {
        let mut rng = StdRng::seed_from_u64(5);
        let pulse_ns = 2400;
        for segment in &PULSE_SEGMENTS {
            let base = pulse_ns as f64 / segment.length_divisor;
            for _ in 0..50 {
                let rendered = segment.render(&mut rng, pulse_ns);
                let len = rendered.len() as f64;
                assert!(len >= (0.75 * base).floor() && len <= (1.25 * base).floor());

                match segment.amplitude {
                    None => assert!(rendered.iter().all(|&x| x == 0.0)),
                    Some(amp) => {
                        assert_eq!(rendered[0], 0.0);
                        assert!(rendered[rendered.len() - 1].abs() < 1e-12);
                        let extreme = rendered.iter().map(|x| x.abs()).fold(0.0, f64::max);
                        assert!(extreme <= 1.25 * amp.abs() + 1e-12);
                        assert!(extreme >= 0.70 * amp.abs());
                    }
                }
            }
        }
    }

    #[test]
    fn test_hann_window_shape() {
        assert!(hann(0).is_empty());
        assert_eq!(hann(1), vec![0.0]);
        let w = hann(5);
        assert_relative_eq!(w[0], 0.0);
        assert_relative_eq!(w[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(w[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[3], 0.5, epsilon = 1e-12);
        assert_relative_eq!(w[4], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_jitter_range() {
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..1000 {
            let j = jitter(&mut rng);
            assert!((0.75..1.25).contains(&j));
        }
    }
}
