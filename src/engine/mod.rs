//! Audio Engine Module
//!
//! The engine is an external collaborator reached through an ffmpeg-style
//! command interface:
//! - load once before first use
//! - write one named input file
//! - run one crop command
//! - read one named output file
//!
//! Implementations:
//! - [`FfmpegProcessor`] drives an `ffmpeg` executable
//! - [`WavProcessor`] crops PCM WAV in-process
//! - [`MockProcessor`] is a scripted engine for tests

pub mod args;
mod ffmpeg;
mod mock;
mod wav;

use std::fmt;

use crate::error::Result;

pub use args::{format_timestamp, parse_timestamp, CropCommand};
pub use ffmpeg::FfmpegProcessor;
pub use mock::MockProcessor;
pub use wav::{wav_spec, WavProcessor};

/// Lifecycle of the engine within a session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineStatus {
    /// Not loaded yet (default state)
    #[default]
    Loading,
    /// Loaded and accepting commands
    Ready,
    /// Load failed; unusable for the rest of the session
    Failed(String),
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineStatus::Loading => write!(f, "Loading"),
            EngineStatus::Ready => write!(f, "Ready"),
            EngineStatus::Failed(reason) => write!(f, "Failed ({})", reason),
        }
    }
}

/// Capability interface of the audio engine
pub trait AudioProcessor {
    /// Short engine name for logs
    fn name(&self) -> &str;

    /// Initialize the engine. Calling it again after success is a no-op.
    fn load(&mut self) -> Result<()>;

    /// Whether [`load`](Self::load) has succeeded
    fn is_loaded(&self) -> bool;

    /// Store `bytes` under `name` in the engine's working space
    fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Run one command
    fn exec(&mut self, args: &[String]) -> Result<()>;

    /// Fetch a file produced by [`exec`](Self::exec)
    fn read_file(&mut self, name: &str) -> Result<Vec<u8>>;

    /// Drop a file from the working space
    fn remove_file(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }
}

impl<P: AudioProcessor + ?Sized> AudioProcessor for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&mut self) -> Result<()> {
        (**self).load()
    }

    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }

    fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        (**self).write_file(name, bytes)
    }

    fn exec(&mut self, args: &[String]) -> Result<()> {
        (**self).exec(args)
    }

    fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        (**self).read_file(name)
    }

    fn remove_file(&mut self, name: &str) -> Result<()> {
        (**self).remove_file(name)
    }
}

/// File names inside the engine's working space must be bare names
pub(crate) fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(crate::error::CropError::InvalidArguments {
            reason: format!("invalid engine file name '{}'", name),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(EngineStatus::default().to_string(), "Loading");
        assert!(EngineStatus::Ready.is_ready());
        assert!(!EngineStatus::Failed("x".into()).is_ready());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("input.mp3").is_ok());
        assert!(validate_file_name("../etc/passwd").is_err());
        assert!(validate_file_name("").is_err());
    }
}
