// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management
//!
//! The configuration is a YAML file with two sections:
//!
//! ```yaml
//! synthesis:
//!   num_beats: 10
//!   tempo_bpm: 100.0
//!   sample_rate: 44100
//!   s3_intensity: 0
//!   pause_strategy: sequential
//!   seed: null
//! output:
//!   directory: media
//!   filename: heartbeat
//!   sample_format: float32
//! ```
//!
//! Every field has a default, so a partial file (or an empty one) is valid.

mod output;
mod synthesis;

pub use output::{OutputConfig, SampleFormat};
pub use synthesis::{PauseStrategy, SynthesisConfig};

use crate::synthesis::heartbeat::MAX_S3_INTENSITY;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a file
    ///
    /// A missing file is created with the default configuration, which is
    /// then returned.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let config: Config = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?
        };

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {:?}", path))?;
        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }

        fs::write(path, yaml)
            .with_context(|| format!("Failed to write configuration to {:?}", path))?;
        Ok(())
    }

    /// Override configuration values with command line arguments
    ///
    /// Only the arguments that were provided replace file values.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_args(
        &mut self,
        num_beats: Option<usize>,
        tempo_bpm: Option<f64>,
        sample_rate: Option<u32>,
        s3_intensity: Option<u8>,
        pause_strategy: Option<PauseStrategy>,
        seed: Option<u64>,
        sample_format: Option<SampleFormat>,
    ) {
        if let Some(num_beats) = num_beats {
            debug!("Overriding num_beats from command line: {}", num_beats);
            self.synthesis.num_beats = num_beats;
        }
        if let Some(tempo) = tempo_bpm {
            debug!("Overriding tempo from command line: {}", tempo);
            self.synthesis.tempo_bpm = tempo;
        }
        if let Some(rate) = sample_rate {
            debug!("Overriding sample rate from command line: {}", rate);
            self.synthesis.sample_rate = rate;
        }
        if let Some(level) = s3_intensity {
            debug!("Overriding S3 intensity from command line: {}", level);
            self.synthesis.s3_intensity = level;
        }
        if let Some(strategy) = pause_strategy {
            debug!("Overriding pause strategy from command line: {:?}", strategy);
            self.synthesis.pause_strategy = strategy;
        }
        if let Some(seed) = seed {
            debug!("Overriding seed from command line: {}", seed);
            self.synthesis.seed = Some(seed);
        }
        if let Some(format) = sample_format {
            debug!("Overriding sample format from command line: {:?}", format);
            self.output.sample_format = format;
        }
    }

    /// Check the rules serde cannot express
    pub fn validate(&self) -> Result<()> {
        let synthesis = &self.synthesis;
        if synthesis.num_beats == 0 {
            anyhow::bail!("num_beats must be at least 1");
        }
        if !(synthesis.tempo_bpm > 0.0) || !synthesis.tempo_bpm.is_finite() {
            anyhow::bail!(
                "tempo_bpm must be a positive number, got {}",
                synthesis.tempo_bpm
            );
        }
        if synthesis.sample_rate == 0 {
            anyhow::bail!("sample_rate must be positive");
        }
        if synthesis.s3_intensity > MAX_S3_INTENSITY {
            anyhow::bail!(
                "s3_intensity must be 0 (absent) or 1 to {}, got {}",
                MAX_S3_INTENSITY,
                synthesis.s3_intensity
            );
        }
        if self.output.filename.trim().is_empty() {
            anyhow::bail!("output filename must not be empty");
        }
        Ok(())
    }
}
