//! Configuration
//!
//! Loaded from an optional JSON file, then overridden by environment
//! variables:
//! - `WAVECLIP_FFMPEG` path to the ffmpeg executable
//! - `WAVECLIP_MAX_FILE_MB` upload size limit in MiB
//! - `WAVECLIP_PRECISION` decimal places kept for interval bounds
//! - `WAVECLIP_OUTPUT_STEM` file stem of the cropped output

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CropError, Result};
use crate::selection::{Precision, RoundingMode, DEFAULT_PRECISION_DIGITS};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "waveclip.json";

const MIB: u64 = 1024 * 1024;

/// Which engine performs the crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// WAV input goes to the in-process engine, everything else to ffmpeg
    #[default]
    Auto,
    Ffmpeg,
    Wav,
}

impl std::str::FromStr for EngineKind {
    type Err = CropError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "ffmpeg" => Ok(Self::Ffmpeg),
            "wav" | "native" => Ok(Self::Wav),
            other => Err(CropError::Config {
                reason: format!("unknown engine '{}'", other),
            }),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Decimal places kept for interval bounds
    pub precision: u32,
    pub rounding: RoundingMode,
    /// Largest accepted input file
    pub max_file_bytes: u64,
    /// Cropped output is named `<output_stem>.<input extension>`
    pub output_stem: String,
    pub ffmpeg_path: PathBuf,
    pub engine: EngineKind,
    /// How long a notification stays visible
    pub notification_ttl_secs: u64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION_DIGITS,
            rounding: RoundingMode::Truncate,
            max_file_bytes: 50 * MIB,
            output_stem: "cropped".to_string(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            engine: EngineKind::Auto,
            notification_ttl_secs: 5,
        }
    }
}

impl CropConfig {
    /// Load `path`, or `waveclip.json` if present, then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CropError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: Self = serde_json::from_str(&text)?;
        debug!("[CONFIG] Loaded {}", path.display());
        Ok(config)
    }

    /// Apply `WAVECLIP_*` environment overrides; unparsable values are ignored
    pub fn apply_env(&mut self) {
        if let Ok(path) = env::var("WAVECLIP_FFMPEG") {
            self.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(bytes) = env::var("WAVECLIP_MAX_FILE_MB")
            .ok()
            .and_then(|s| megabytes_to_bytes(&s))
        {
            self.max_file_bytes = bytes;
        }
        if let Some(digits) = env::var("WAVECLIP_PRECISION")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.precision = digits;
        }
        if let Ok(stem) = env::var("WAVECLIP_OUTPUT_STEM") {
            self.output_stem = stem;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_file_bytes == 0 {
            return Err(CropError::Config {
                reason: "max_file_bytes must be positive".to_string(),
            });
        }
        if self.output_stem.is_empty()
            || self.output_stem.contains('/')
            || self.output_stem.contains('\\')
        {
            return Err(CropError::Config {
                reason: format!("invalid output_stem '{}'", self.output_stem),
            });
        }
        Ok(())
    }

    pub fn precision(&self) -> Precision {
        match self.rounding {
            RoundingMode::Truncate => Precision::truncate(self.precision),
            RoundingMode::Round => Precision::round(self.precision),
        }
    }

    /// Fixed output file name for an input with `extension`
    pub fn output_name(&self, extension: Option<&str>) -> String {
        match extension {
            Some(ext) => format!("{}.{}", self.output_stem, ext),
            None => self.output_stem.clone(),
        }
    }
}

/// Parse a whole number of MiB; `None` if unparsable or out of range
fn megabytes_to_bytes(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()?.checked_mul(MIB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_megabytes_to_bytes() {
        assert_eq!(megabytes_to_bytes("8"), Some(8 * MIB));
        assert_eq!(megabytes_to_bytes(" 1 "), Some(MIB));
        assert_eq!(megabytes_to_bytes("20000000000000"), None);
        assert_eq!(megabytes_to_bytes("lots"), None);
    }

    #[test]
    fn test_defaults() {
        let config = CropConfig::default();
        assert_eq!(config.precision(), Precision::truncate(2));
        assert_eq!(config.max_file_bytes, 50 * MIB);
        assert_eq!(config.output_name(Some("mp3")), "cropped.mp3");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waveclip.json");
        fs::write(&path, r#"{ "precision": 3, "rounding": "round", "engine": "wav" }"#).unwrap();

        let config = CropConfig::from_file(&path).unwrap();
        assert_eq!(config.precision(), Precision::round(3));
        assert_eq!(config.engine, EngineKind::Wav);
        assert_eq!(config.output_stem, "cropped");
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ precision: ").unwrap();
        assert_eq!(
            CropConfig::from_file(&path).unwrap_err().error_code(),
            "SERIALIZATION_ERROR"
        );
    }

    #[test]
    fn test_validate_rejects_bad_stem() {
        let config = CropConfig {
            output_stem: "../out".to_string(),
            ..CropConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_kind_from_str() {
        assert_eq!("FFmpeg".parse::<EngineKind>().unwrap(), EngineKind::Ffmpeg);
        assert!("sox".parse::<EngineKind>().is_err());
    }
}
