// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Audio sinks for finished recordings

use crate::config::SampleFormat;
use crate::error::Result;
use hound::{WavReader, WavSpec, WavWriter};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Destination of a finished mono recording
pub trait AudioSink: Send {
    /// Persist `samples` recorded at `sample_rate`
    fn write(&mut self, sample_rate: u32, samples: &[f64]) -> Result<()>;
}

/// Mono WAV file writer
#[derive(Debug, Clone)]
pub struct WavFileSink {
    path: PathBuf,
    format: SampleFormat,
}

impl WavFileSink {
    pub fn new<P: AsRef<Path>>(path: P, format: SampleFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn spec(&self, sample_rate: u32) -> WavSpec {
        match self.format {
            SampleFormat::Float32 => WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
            SampleFormat::Int16 => WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
        }
    }
}

impl AudioSink for WavFileSink {
    /// Write the samples, creating missing parent directories
    ///
    /// `Float32` stores amplitudes unchanged. `Int16` clamps to `[-1, 1]`
    /// before scaling to the full 16-bit range.
    fn write(&mut self, sample_rate: u32, samples: &[f64]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = WavWriter::create(&self.path, self.spec(sample_rate))?;
        match self.format {
            SampleFormat::Float32 => {
                for &sample in samples {
                    writer.write_sample(sample as f32)?;
                }
            }
            SampleFormat::Int16 => {
                for &sample in samples {
                    let scaled = (sample.clamp(-1.0, 1.0) * f64::from(i16::MAX)).round();
                    writer.write_sample(scaled as i16)?;
                }
            }
        }
        writer.finalize()?;

        info!(
            "Wrote {} samples at {} Hz to {:?}",
            samples.len(),
            sample_rate,
            self.path
        );
        Ok(())
    }
}

/// Read a WAV file as mono `f64` samples in `[-1, 1]`
///
/// Multi-channel files are averaged down to one channel. Returns the sample
/// rate alongside the samples.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(u32, Vec<f64>)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = f64::from(1u32 << (spec.bits_per_sample - 1));
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
        .collect();
    Ok((spec.sample_rate, samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    #[test]
    fn test_float_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("float.wav");
        let samples = vec![0.0, 0.25, -0.5, 1.5, -0.001];

        let mut sink = WavFileSink::new(&path, SampleFormat::Float32);
        sink.write(8000, &samples).unwrap();

        let (rate, read) = read_wav(&path).unwrap();
        assert_eq!(rate, 8000);
        assert_eq!(read.len(), samples.len());
        for (a, b) in read.iter().zip(&samples) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_int16_clamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("int.wav");
        let mut sink = WavFileSink::new(&path, SampleFormat::Int16);
        sink.write(44100, &[2.0, -2.0, 0.5, 0.0]).unwrap();

        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        let raw: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(raw, vec![i16::MAX, -i16::MAX, 16384, 0]);
    }

    #[test]
    fn test_stereo_is_downmixed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 1000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.5f32, 0.1, -0.2, 0.2] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let (_, mono) = read_wav(&path).unwrap();
        assert_eq!(mono.len(), 2);
        assert_relative_eq!(mono[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(mono[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(read_wav(dir.path().join("nope.wav")).is_err());
    }
}
