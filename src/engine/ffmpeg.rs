//! ffmpeg-backed engine
//!
//! Runs the configured `ffmpeg` executable inside a private scratch
//! directory. Input and output names are resolved relative to it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use log::{debug, info};
use tempfile::TempDir;

use crate::engine::{validate_file_name, AudioProcessor};
use crate::error::{CropError, Result};

// Lines of stderr kept in invocation errors
const STDERR_TAIL_LINES: usize = 8;

/// Engine driving an external `ffmpeg` binary
#[derive(Debug)]
pub struct FfmpegProcessor {
    binary: PathBuf,
    workdir: Option<TempDir>,
}

impl FfmpegProcessor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            workdir: None,
        }
    }

    fn workdir(&self) -> Result<&Path> {
        self.workdir
            .as_ref()
            .map(TempDir::path)
            .ok_or(CropError::EngineNotReady)
    }
}

impl Default for FfmpegProcessor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl AudioProcessor for FfmpegProcessor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn load(&mut self) -> Result<()> {
        if self.workdir.is_some() {
            return Ok(());
        }

        let output = Command::new(&self.binary)
            .arg("-version")
            .output()
            .map_err(|e| CropError::EngineInit {
                reason: format!("cannot run {}: {}", self.binary.display(), e),
            })?;
        if !output.status.success() {
            return Err(CropError::EngineInit {
                reason: format!(
                    "{} -version exited with {}",
                    self.binary.display(),
                    output.status
                ),
            });
        }
        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        let workdir = tempfile::Builder::new()
            .prefix("waveclip-")
            .tempdir()
            .map_err(|e| CropError::EngineInit {
                reason: format!("cannot create scratch directory: {}", e),
            })?;

        info!("[ENGINE] Loaded {} in {}", version, workdir.path().display());
        self.workdir = Some(workdir);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.workdir.is_some()
    }

    fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        validate_file_name(name)?;
        let path = self.workdir()?.join(name);
        fs::write(&path, bytes)?;
        debug!("[ENGINE] Wrote {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    fn exec(&mut self, args: &[String]) -> Result<()> {
        let workdir = self.workdir()?.to_path_buf();
        let start = Instant::now();
        debug!("[ENGINE] ffmpeg {}", args.join(" "));

        let output = Command::new(&self.binary)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(args)
            .current_dir(&workdir)
            .output()
            .map_err(|e| CropError::EngineInvocation {
                reason: format!("cannot run {}: {}", self.binary.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(CropError::EngineInvocation {
                reason: format!("ffmpeg exited with {}: {}", output.status, tail),
            });
        }

        debug!(
            "[ENGINE] ffmpeg finished in {} ms",
            start.elapsed().as_millis()
        );
        Ok(())
    }

    fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        validate_file_name(name)?;
        let path = self.workdir()?.join(name);
        match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Err(CropError::MissingOutput {
                name: name.to_string(),
            }),
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CropError::MissingOutput {
                name: name.to_string(),
            }),
            Err(e) => Err(CropError::Io(e)),
        }
    }

    fn remove_file(&mut self, name: &str) -> Result<()> {
        validate_file_name(name)?;
        let path = self.workdir()?.join(name);
        match fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(CropError::Io(e)),
            _ => Ok(()),
        }
    }
}
