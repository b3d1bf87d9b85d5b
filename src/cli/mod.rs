//! CLI Module
//!
//! Command-line surface for the cropping session.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::EngineKind;

/// Waveclip - crop audio files to a selected time range
#[derive(Parser, Debug)]
#[command(name = "waveclip")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a JSON config file (defaults to ./waveclip.json if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Engine selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    Auto,
    Ffmpeg,
    Wav,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Auto => EngineKind::Auto,
            EngineArg::Ffmpeg => EngineKind::Ffmpeg,
            EngineArg::Wav => EngineKind::Wav,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crop an audio file to [start, end] seconds
    #[command(name = "crop")]
    Crop {
        /// Input audio file
        input: PathBuf,

        /// Selection start in seconds (default: 0)
        #[arg(short, long)]
        start: Option<f64>,

        /// Selection end in seconds (default: full duration)
        #[arg(short, long)]
        end: Option<f64>,

        /// Output directory or file (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Engine performing the crop
        #[arg(long, value_enum)]
        engine: Option<EngineArg>,

        /// Decimal places kept for the bounds
        #[arg(long)]
        precision: Option<u32>,

        /// Round bounds instead of truncating them
        #[arg(long)]
        round: bool,
    },

    /// Show duration, size and checksum of an audio file
    #[command(name = "info")]
    Info {
        /// Input audio file
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Draw the waveform with the selected range marked
    #[command(name = "waveform")]
    Waveform {
        /// Input audio file
        input: PathBuf,

        /// Columns
        #[arg(long, default_value_t = 80)]
        width: usize,

        /// Rows
        #[arg(long, default_value_t = 12)]
        height: usize,

        /// Selection start in seconds
        #[arg(short, long)]
        start: Option<f64>,

        /// Selection end in seconds
        #[arg(short, long)]
        end: Option<f64>,
    },
}
