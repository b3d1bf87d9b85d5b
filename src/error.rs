//! Error handling for Waveclip
//!
//! Every error is reported to the user as a transient notification; none of
//! them is fatal to the session.

use thiserror::Error;

/// Result type alias for Waveclip operations
pub type Result<T> = std::result::Result<T, CropError>;

/// Main error type for Waveclip operations
#[derive(Error, Debug)]
pub enum CropError {
    // Engine Errors
    #[error("Audio engine failed to initialize: {reason}")]
    EngineInit { reason: String },

    #[error("Audio engine is not ready")]
    EngineNotReady,

    #[error("Audio engine invocation failed: {reason}")]
    EngineInvocation { reason: String },

    #[error("Audio engine produced no output: {name}")]
    MissingOutput { name: String },

    #[error("A crop is already in progress")]
    CropInFlight,

    // Input Errors
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("No audio file selected")]
    NoFileSelected,

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Failed to decode audio: {reason}")]
    Decode { reason: String },

    // Selection Errors
    #[error("Invalid duration: {duration} (must be a positive number of seconds)")]
    InvalidDuration { duration: f64 },

    #[error("Invalid interval: {reason}")]
    InvalidInterval { reason: String },

    #[error("Invalid engine arguments: {reason}")]
    InvalidArguments { reason: String },

    // Configuration Errors
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CropError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            CropError::EngineInit { .. } => "ENGINE_INIT",
            CropError::EngineNotReady => "ENGINE_NOT_READY",
            CropError::EngineInvocation { .. } => "ENGINE_INVOCATION",
            CropError::MissingOutput { .. } => "MISSING_OUTPUT",
            CropError::CropInFlight => "CROP_IN_FLIGHT",
            CropError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            CropError::NoFileSelected => "NO_FILE_SELECTED",
            CropError::FileNotFound { .. } => "FILE_NOT_FOUND",
            CropError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            CropError::Decode { .. } => "DECODE_ERROR",
            CropError::InvalidDuration { .. } => "INVALID_DURATION",
            CropError::InvalidInterval { .. } => "INVALID_INTERVAL",
            CropError::InvalidArguments { .. } => "INVALID_ARGUMENTS",
            CropError::Config { .. } => "CONFIG_ERROR",
            CropError::Io(_) => "IO_ERROR",
            CropError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the user can recover by retrying or picking another file.
    ///
    /// Engine initialization failure is the only kind that leaves the
    /// session unusable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CropError::EngineInit { .. })
    }

    /// Missing output counts as a failed invocation.
    pub fn is_invocation_failure(&self) -> bool {
        matches!(
            self,
            CropError::EngineInvocation { .. } | CropError::MissingOutput { .. }
        )
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            CropError::EngineInit { .. } => {
                "The audio engine could not be loaded, so cropping is unavailable.".to_string()
            }
            CropError::EngineNotReady => "The audio engine is still loading.".to_string(),
            CropError::FileTooLarge { limit, .. } => format!(
                "That file is too large. Please choose a file under {:.1} MB.",
                *limit as f64 / (1024.0 * 1024.0)
            ),
            CropError::NoFileSelected => "Please select an audio file first.".to_string(),
            CropError::EngineInvocation { .. } | CropError::MissingOutput { .. } => {
                "Cropping failed. Your selection is unchanged, try again.".to_string()
            }
            CropError::CropInFlight => "A crop is already running.".to_string(),
            _ => self.to_string(),
        }
    }
}
