//! Waveform Module
//!
//! The waveform widget is an external collaborator. [`WaveformView`] is the
//! narrow surface the session needs from it:
//! - render raw audio bytes
//! - own draggable regions
//! - report `Ready`, `Decode` and `RegionUpdated` events
//!
//! [`PeakWaveform`] is the in-process implementation backed by symphonia.

pub mod peaks;
pub mod terminal;

use std::fmt;

use crate::error::Result;
use crate::selection::Interval;

pub use peaks::{decode_mono, DecodedAudio, PeakWaveform, Peaks};

/// Identifier of a region owned by a [`WaveformView`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region-{}", self.0)
    }
}

/// Events emitted by a waveform view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveformEvent {
    /// Audio rendered; total duration in seconds is known
    Ready { duration: f64 },
    /// Decoding finished; the initial region may be created
    Decode,
    /// The user dragged or resized a region
    RegionUpdated {
        region: RegionId,
        start: f64,
        end: f64,
    },
}

/// Capability interface of the waveform widget
pub trait WaveformView {
    /// Render raw audio bytes. Queues `Ready` then `Decode` on success.
    fn render(&mut self, audio: &[u8]) -> Result<()>;

    /// Create a region covering `interval`
    fn add_region(&mut self, interval: Interval) -> Result<RegionId>;

    /// Move a region programmatically. Does not emit `RegionUpdated`.
    fn set_region_bounds(&mut self, region: RegionId, interval: Interval) -> Result<()>;

    /// Current bounds of a region, if it exists
    fn region_bounds(&self, region: RegionId) -> Option<Interval>;

    /// Remove every region
    fn clear_regions(&mut self);

    /// Next pending event, oldest first
    fn poll_event(&mut self) -> Option<WaveformEvent>;

    /// Hint about the container format of the next render (file extension)
    fn set_format_hint(&mut self, _extension: Option<&str>) {}
}

impl<V: WaveformView + ?Sized> WaveformView for Box<V> {
    fn render(&mut self, audio: &[u8]) -> Result<()> {
        (**self).render(audio)
    }

    fn add_region(&mut self, interval: Interval) -> Result<RegionId> {
        (**self).add_region(interval)
    }

    fn set_region_bounds(&mut self, region: RegionId, interval: Interval) -> Result<()> {
        (**self).set_region_bounds(region, interval)
    }

    fn region_bounds(&self, region: RegionId) -> Option<Interval> {
        (**self).region_bounds(region)
    }

    fn clear_regions(&mut self) {
        (**self).clear_regions()
    }

    fn poll_event(&mut self) -> Option<WaveformEvent> {
        (**self).poll_event()
    }

    fn set_format_hint(&mut self, extension: Option<&str>) {
        (**self).set_format_hint(extension)
    }
}
