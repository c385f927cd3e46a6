// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-heartbeat project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the heart sound stimulus generator

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::info;
use rust_heartbeat::config::{Config, PauseStrategy, SampleFormat};
use rust_heartbeat::spectral::{relative_loudness, LoudnessTask};
use rust_heartbeat::synthesis::{generate_intensity_set, RecordingSynthesizer};
use rust_heartbeat::utility::{read_wav, AudioSink, WavFileSink};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Synthetic heart sound generator for perception experiments
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Synthesize a full recording
    Generate(GenerateArgs),
    /// Write a single unfiltered heart sound for loudness calibration
    SingleBeat(SingleBeatArgs),
    /// Write the HB_S3_{1..10} and TR_{1..10} base files
    Batch(BatchArgs),
    /// Print the relative loudness of a WAV file
    Loudness(LoudnessArgs),
}

#[derive(Debug, ClapArgs)]
struct GenerateArgs {
    /// Path to configuration file (YAML format)
    #[arg(long, default_value = "heartbeat.yaml")]
    config: PathBuf,

    /// Output WAV file, overrides the configured directory and filename
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of cardiac cycles
    #[arg(long)]
    num_beats: Option<usize>,

    /// Heart rate in beats per minute
    #[arg(long)]
    tempo: Option<f64>,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// S3 intensity, 0 (absent) or 1 to 10
    #[arg(long)]
    s3_intensity: Option<u8>,

    /// Pause budget handling for cycles with an S3
    #[arg(long, value_enum)]
    pause_strategy: Option<PauseStrategy>,

    /// RNG seed for a reproducible recording
    #[arg(long)]
    seed: Option<u64>,

    /// WAV sample encoding
    #[arg(long, value_enum)]
    sample_format: Option<SampleFormat>,

    /// Also write the unfiltered recording to this file
    #[arg(long)]
    raw_output: Option<PathBuf>,

    /// Write a JSON summary of the recording to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, ClapArgs)]
struct SingleBeatArgs {
    /// Volume multiplier of the pulse
    #[arg(long, default_value_t = 1.0)]
    volume: f64,

    #[arg(long, default_value_t = 100.0)]
    tempo: f64,

    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, ClapArgs)]
struct BatchArgs {
    /// Directory receiving the 20 base files
    #[arg(short, long, default_value = "media/base")]
    directory: PathBuf,

    /// Base seed; level i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = PauseStrategy::Sequential)]
    pause_strategy: PauseStrategy,

    #[arg(long, value_enum, default_value_t = SampleFormat::Float32)]
    sample_format: SampleFormat,
}

#[derive(Debug, ClapArgs)]
struct LoudnessArgs {
    /// WAV file to analyze
    input: PathBuf,
}

#[derive(Debug, Serialize)]
struct RecordingReport {
    output: PathBuf,
    samples: usize,
    sample_rate: u32,
    duration_secs: f64,
    peak_amplitude: f64,
    mean_relative_db: f64,
    num_beats: usize,
    tempo_bpm: f64,
    s3_intensity: u8,
    pause_strategy: PauseStrategy,
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    match args.command {
        Command::Generate(generate) => run_generate(generate),
        Command::SingleBeat(single) => run_single_beat(single),
        Command::Batch(batch) => run_batch(batch),
        Command::Loudness(loudness) => run_loudness(loudness),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut config = Config::from_file(&args.config)?;
    config.apply_args(
        args.num_beats,
        args.tempo,
        args.sample_rate,
        args.s3_intensity,
        args.pause_strategy,
        args.seed,
        args.sample_format,
    );
    config
        .validate()
        .context("Invalid parameters after command line overrides")?;

    let mut synth = RecordingSynthesizer::from_config(&config.synthesis);
    let recording = synth
        .synthesize_configured(&config.synthesis)
        .context("Failed to synthesize recording")?;

    let output = args.output.unwrap_or_else(|| config.output.wav_path());
    WavFileSink::new(&output, config.output.sample_format)
        .write(recording.sample_rate, &recording.filtered)
        .with_context(|| format!("Failed to write {:?}", output))?;

    if let Some(raw_output) = &args.raw_output {
        WavFileSink::new(raw_output, config.output.sample_format)
            .write(recording.sample_rate, &recording.raw)
            .with_context(|| format!("Failed to write {:?}", raw_output))?;
    }

    if let Some(report_path) = &args.report {
        let report = RecordingReport {
            output: output.clone(),
            samples: recording.len(),
            sample_rate: recording.sample_rate,
            duration_secs: recording.duration(),
            peak_amplitude: recording.peak(),
            mean_relative_db: relative_loudness(&recording.filtered, LoudnessTask::Mean)?,
            num_beats: config.synthesis.num_beats,
            tempo_bpm: config.synthesis.tempo_bpm,
            s3_intensity: config.synthesis.s3_intensity,
            pause_strategy: config.synthesis.pause_strategy,
            seed: config.synthesis.seed,
        };
        fs::write(report_path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report to {:?}", report_path))?;
        info!("Report saved to {:?}", report_path);
    }

    println!(
        "Recording written to {} ({} samples, {:.2} s)",
        output.display(),
        recording.len(),
        recording.duration()
    );
    Ok(())
}

fn run_single_beat(args: SingleBeatArgs) -> Result<()> {
    let beat = RecordingSynthesizer::new(args.seed)
        .synthesize_single_beat(args.volume, args.tempo, args.sample_rate)
        .context("Failed to synthesize single beat")?;
    WavFileSink::new(&args.output, SampleFormat::Float32)
        .write(args.sample_rate, &beat)
        .with_context(|| format!("Failed to write {:?}", args.output))?;
    println!("Single beat written to {}", args.output.display());
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<()> {
    let paths = generate_intensity_set(
        &args.directory,
        args.seed,
        args.pause_strategy,
        args.sample_format,
    )
    .context("Failed to generate intensity set")?;
    println!(
        "{} files written to {}",
        paths.len(),
        args.directory.display()
    );
    Ok(())
}

fn run_loudness(args: LoudnessArgs) -> Result<()> {
    let (sample_rate, samples) =
        read_wav(&args.input).with_context(|| format!("Failed to read {:?}", args.input))?;
    let mean = relative_loudness(&samples, LoudnessTask::Mean)?;
    let max = relative_loudness(&samples, LoudnessTask::Max)?;

    println!("File: {}", args.input.display());
    println!("- Sample rate: {} Hz", sample_rate);
    println!("- Samples: {}", samples.len());
    println!("- Mean relative loudness: {:.2} dB", mean);
    println!("- Max relative loudness: {:.2} dB", max);
    Ok(())
}
