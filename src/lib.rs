//! Waveclip - Audio Cropping Tool
//!
//! Select a time range on an audio file's waveform and trim the file to it
//! without re-encoding.
//!
//! # Architecture
//!
//! - `selection`: the authoritative crop interval, reconciled between a
//!   range slider and a draggable waveform region
//! - `waveform`: the waveform widget seam (`WaveformView`) and a peak-based view
//! - `engine`: the audio engine seam (`AudioProcessor`) with ffmpeg, WAV and
//!   mock engines
//! - `session`: file intake, crop orchestration and notifications

pub mod asset;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod selection;
pub mod session;
pub mod waveform;

pub use asset::AudioAsset;
pub use config::CropConfig;
pub use error::{CropError, Result};
pub use selection::{Interval, Precision, RangeSelectionController};
pub use session::CropSession;
