//! Audio assets
//!
//! An [`AudioAsset`] is immutable once created. Cropping produces a new
//! asset; the source is never touched.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{CropError, Result};

/// Transient reference used for playback, like a browser blob URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AssetHandle(Uuid);

impl AssetHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssetHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:waveclip/{}", self.0)
    }
}

/// Reject a file before it is read if it exceeds `limit` bytes
pub fn check_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(CropError::FileTooLarge { size, limit });
    }
    Ok(())
}

/// Read a file from disk, checking its size against `limit` first
pub fn read_limited(path: &Path, limit: u64) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CropError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => CropError::Io(e),
    })?;
    check_size(metadata.len(), limit)?;
    Ok(fs::read(path)?)
}

/// Loaded audio plus its derived properties
#[derive(Debug, Clone, Serialize)]
pub struct AudioAsset {
    name: String,
    #[serde(skip)]
    bytes: Vec<u8>,
    duration_secs: f64,
    handle: AssetHandle,
    sha256: String,
    created_at: DateTime<Utc>,
}

impl AudioAsset {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, duration_secs: f64) -> Self {
        let sha256 = hex_digest(&bytes);
        Self {
            name: name.into(),
            bytes,
            duration_secs,
            handle: AssetHandle::new(),
            sha256,
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn handle(&self) -> AssetHandle {
        self.handle
    }

    /// Hex SHA-256 of the contents
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Lowercase file extension, if the name has one
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    /// Write the contents to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Lowercase extension of a file name
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase)
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_and_handle() {
        let a = AudioAsset::new("a.mp3", b"abc".to_vec(), 1.0);
        let b = AudioAsset::new("b.mp3", b"abc".to_vec(), 1.0);
        assert_eq!(
            a.sha256(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(a.sha256(), b.sha256());
        assert_ne!(a.handle(), b.handle());
        assert!(a.handle().to_string().starts_with("blob:waveclip/"));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension_of("Song.MP3"), Some("mp3".to_string()));
        assert_eq!(extension_of("noext"), None);
    }

    #[test]
    fn test_size_limit() {
        assert!(check_size(10, 10).is_ok());
        assert!(matches!(
            check_size(11, 10),
            Err(CropError::FileTooLarge { size: 11, limit: 10 })
        ));
    }

    #[test]
    fn test_read_limited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        fs::write(&path, vec![0u8; 64]).unwrap();

        assert_eq!(read_limited(&path, 64).unwrap().len(), 64);
        assert!(matches!(
            read_limited(&path, 63),
            Err(CropError::FileTooLarge { .. })
        ));
        assert!(matches!(
            read_limited(&dir.path().join("missing.wav"), 64),
            Err(CropError::FileNotFound { .. })
        ));
    }
}
