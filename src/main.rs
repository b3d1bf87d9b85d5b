//! Waveclip CLI - Audio Cropping Tool
//!
//! Command-line interface for the Waveclip cropping session.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use waveclip::cli::commands;
use waveclip::cli::{Cli, Commands};
use waveclip::config::CropConfig;
use waveclip::selection::RoundingMode;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Waveclip v{}", env!("CARGO_PKG_VERSION"));

    let config = CropConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Some(cmd) => handle_command(cmd, config),
        None => {
            println!("Waveclip v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, mut config: CropConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Crop {
            input,
            start,
            end,
            output,
            engine,
            precision,
            round,
        } => {
            if let Some(digits) = precision {
                config.precision = digits;
            }
            if round {
                config.rounding = RoundingMode::Round;
            }
            let engine = engine.map(Into::into).unwrap_or(config.engine);
            commands::crop(config, &input, start, end, output.as_deref(), engine)
                .with_context(|| format!("failed to crop {}", input.display()))?;
            Ok(())
        }
        Commands::Info { input, json } => commands::info(&config, &input, json)
            .with_context(|| format!("failed to inspect {}", input.display())),
        Commands::Waveform {
            input,
            width,
            height,
            start,
            end,
        } => commands::waveform(config, &input, width, height, start, end)
            .with_context(|| format!("failed to draw {}", input.display())),
    }
}
