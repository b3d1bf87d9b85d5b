//! CLI Command Implementations
//!
//! Each command drives a [`CropSession`] the same way the cropping screen
//! does, then prints the session's notifications.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::asset::{self, extension_of, AudioAsset};
use crate::config::{CropConfig, EngineKind};
use crate::engine::{AudioProcessor, FfmpegProcessor, WavProcessor};
use crate::error::{CropError, Result};
use crate::selection::Interval;
use crate::session::{CropSession, NotificationLevel};
use crate::waveform::{decode_mono, PeakWaveform, WaveformView};

/// Pick the engine for `input` according to `kind`
pub fn engine_for(config: &CropConfig, kind: EngineKind, input: &Path) -> Box<dyn AudioProcessor> {
    let is_wav = input
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(extension_of)
        .is_some_and(|ext| ext == "wav" || ext == "wave");
    match kind {
        EngineKind::Wav => Box::new(WavProcessor::new()),
        EngineKind::Auto if is_wav => Box::new(WavProcessor::new()),
        EngineKind::Auto | EngineKind::Ffmpeg => {
            Box::new(FfmpegProcessor::new(config.ffmpeg_path.clone()))
        }
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Where the cropped file is written.
///
/// The input is never overwritten: an explicit output naming the input is
/// rejected, and a default name that collides with it gets a `-1` suffix.
pub fn resolve_output(input: &Path, output: Option<&Path>, file_name: &str) -> Result<PathBuf> {
    let path = match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => {
            if is_same_file(input, path) {
                return Err(CropError::InvalidArguments {
                    reason: format!("output {} would overwrite the input", path.display()),
                });
            }
            return Ok(path.to_path_buf());
        }
        None => input
            .parent()
            .map(|dir| dir.join(file_name))
            .unwrap_or_else(|| PathBuf::from(file_name)),
    };
    if !is_same_file(input, &path) {
        return Ok(path);
    }

    let file_name = Path::new(file_name);
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let renamed = match file_name.extension() {
        Some(ext) => format!("{}-1.{}", stem, ext.to_string_lossy()),
        None => format!("{}-1", stem),
    };
    warn!(
        "{} is the input; writing {} instead",
        path.display(),
        renamed
    );
    Ok(path.with_file_name(renamed))
}

/// Apply optional `--start/--end` as a slider edit
fn apply_range<P: AudioProcessor, V: WaveformView>(
    session: &mut CropSession<P, V>,
    start: Option<f64>,
    end: Option<f64>,
) -> Result<()> {
    if start.is_none() && end.is_none() {
        return Ok(());
    }
    let Some(current) = session.current_interval() else {
        return Ok(());
    };
    session.on_slider_change(Interval {
        start: start.unwrap_or(current.start),
        end: end.unwrap_or(current.end),
    })?;
    Ok(())
}

fn print_notifications<P: AudioProcessor, V: WaveformView>(session: &mut CropSession<P, V>) {
    for notification in session.take_notifications() {
        match notification.level {
            NotificationLevel::Info => println!("{}", notification),
            NotificationLevel::Error => eprintln!("{}", notification),
        }
    }
}

/// Crop `input` and write the result under the fixed output name.
pub fn crop(
    config: CropConfig,
    input: &Path,
    start: Option<f64>,
    end: Option<f64>,
    output: Option<&Path>,
    engine: EngineKind,
) -> Result<PathBuf> {
    info!("Cropping: {}", input.display());

    let processor = engine_for(&config, engine, input);
    let mut session = CropSession::new(config, processor, PeakWaveform::default());

    let outcome = run_crop(&mut session, input, start, end, output);
    print_notifications(&mut session);
    outcome
}

fn run_crop<V: WaveformView>(
    session: &mut CropSession<Box<dyn AudioProcessor>, V>,
    input: &Path,
    start: Option<f64>,
    end: Option<f64>,
    output: Option<&Path>,
) -> Result<PathBuf> {
    session.load_engine()?;
    session.select_path(input)?;
    apply_range(session, start, end)?;

    if let Some(interval) = session.current_interval() {
        println!("Selection: {}", interval);
    }

    let result = session.crop()?;
    let path = resolve_output(input, output, result.name())?;
    result.save(&path)?;
    println!(
        "Saved {} ({:.3}s, {} bytes)",
        path.display(),
        result.duration_secs(),
        result.size()
    );
    Ok(path)
}

/// Summary printed by `info`
#[derive(Debug, Serialize)]
pub struct InfoReport {
    pub file: String,
    pub size_bytes: u64,
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_secs: f64,
    pub default_interval: Interval,
    pub asset: AudioAsset,
}

/// Describe an audio file
pub fn info(config: &CropConfig, input: &Path, json: bool) -> Result<()> {
    let bytes = asset::read_limited(input, config.max_file_bytes)?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let decoded = decode_mono(&bytes, extension_of(&name).as_deref())?;
    let duration = config.precision().apply(decoded.duration_secs());
    let asset = AudioAsset::new(name.clone(), bytes, decoded.duration_secs());

    let report = InfoReport {
        file: name,
        size_bytes: asset.size(),
        sample_rate: decoded.sample_rate,
        channels: decoded.channels,
        duration_secs: duration,
        default_interval: Interval::full(duration),
        asset,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File: {}", report.file);
    println!("Size: {} bytes", report.size_bytes);
    println!("Format: {} Hz, {} channel(s)", report.sample_rate, report.channels);
    println!("Duration: {:.3}s", report.duration_secs);
    println!("Default selection: {}", report.default_interval);
    println!("SHA-256: {}", report.asset.sha256());
    Ok(())
}

/// Draw the waveform with the current selection marked
pub fn waveform(
    config: CropConfig,
    input: &Path,
    width: usize,
    height: usize,
    start: Option<f64>,
    end: Option<f64>,
) -> Result<()> {
    // Drawing never crops, so the engine is left unloaded.
    let mut session = CropSession::new(config, WavProcessor::new(), PeakWaveform::default());

    let outcome = session
        .select_path(input)
        .and_then(|_| apply_range(&mut session, start, end));
    print_notifications(&mut session);
    outcome?;

    for line in session.view().render_ascii(width, height) {
        println!("{}", line);
    }
    match session.current_interval() {
        Some(interval) => println!("Selection: {}", interval),
        None => warn!("No selection available for {}", input.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.wav");

        assert_eq!(
            resolve_output(&input, None, "cropped.wav").unwrap(),
            dir.path().join("cropped.wav")
        );
        assert_eq!(
            resolve_output(&input, Some(dir.path()), "cropped.wav").unwrap(),
            dir.path().join("cropped.wav")
        );
        let explicit = dir.path().join("mine.wav");
        assert_eq!(
            resolve_output(&input, Some(&explicit), "cropped.wav").unwrap(),
            explicit
        );
    }

    #[test]
    fn test_resolve_output_never_overwrites_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cropped.wav");
        std::fs::write(&input, b"RIFF").unwrap();

        assert_eq!(
            resolve_output(&input, None, "cropped.wav").unwrap(),
            dir.path().join("cropped-1.wav")
        );
        assert_eq!(
            resolve_output(&input, Some(dir.path()), "cropped.wav").unwrap(),
            dir.path().join("cropped-1.wav")
        );

        let err = resolve_output(&input, Some(&input), "cropped.wav").unwrap_err();
        assert!(matches!(err, CropError::InvalidArguments { .. }));

        // Same file through a different spelling
        let dotted = dir.path().join(".").join("cropped.wav");
        assert!(resolve_output(&input, Some(&dotted), "cropped.wav").is_err());
    }

    #[test]
    fn test_engine_for_auto() {
        let config = CropConfig::default();
        assert_eq!(
            engine_for(&config, EngineKind::Auto, Path::new("a.WAV")).name(),
            "wav"
        );
        assert_eq!(
            engine_for(&config, EngineKind::Auto, Path::new("a.mp3")).name(),
            "ffmpeg"
        );
        assert_eq!(
            engine_for(&config, EngineKind::Wav, Path::new("a.mp3")).name(),
            "wav"
        );
    }
}
