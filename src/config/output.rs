// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration of the WAV output

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sample encoding used when writing WAV files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// 32-bit IEEE float, amplitudes written as-is
    #[default]
    Float32,
    /// 16-bit PCM, amplitudes clamped to [-1, 1]
    Int16,
}

/// Where and how recordings are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the WAV files
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// File stem of a single recording (".wav" is appended)
    #[serde(default = "default_filename")]
    pub filename: String,

    #[serde(default)]
    pub sample_format: SampleFormat,
}

impl OutputConfig {
    /// Full path of the recording: `directory/filename.wav`
    pub fn wav_path(&self) -> PathBuf {
        self.directory.join(format!("{}.wav", self.filename))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            filename: default_filename(),
            sample_format: SampleFormat::default(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("media")
}

fn default_filename() -> String {
    "heartbeat".to_string()
}
