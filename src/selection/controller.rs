//! Range Selection Controller
//!
//! Keeps one authoritative crop interval while two inputs edit it: the
//! slider-style range control and the draggable region on the waveform.
//!
//! Propagation rules:
//! - Slider edits are pushed to the region ([`RegionSync::Push`]).
//! - Region edits update the interval only. They are never pushed back to
//!   the region and never touch the slider's own drag state.

use std::fmt;

use log::debug;

use crate::error::{CropError, Result};
use crate::selection::interval::{Interval, Precision};
use crate::waveform::RegionId;

/// One handle of the two-thumb range control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thumb {
    Start,
    End,
}

impl fmt::Display for Thumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thumb::Start => write!(f, "start"),
            Thumb::End => write!(f, "end"),
        }
    }
}

/// State owned by the slider itself
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SliderDrag {
    /// Thumb currently held by the user
    pub active: Option<Thumb>,
    /// Last interval the slider committed
    pub committed: Option<Interval>,
}

/// What the caller must forward to the waveform after an edit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionSync {
    /// Move the region to these bounds
    Push { region: RegionId, interval: Interval },
    /// Nothing to forward
    None,
}

/// Selection state for the currently loaded asset
#[derive(Debug, Clone)]
pub struct RangeSelectionController {
    duration: f64,
    precision: Precision,
    interval: Interval,
    region: Option<RegionId>,
    slider: SliderDrag,
}

impl RangeSelectionController {
    /// Start a selection covering the whole asset: `[0, duration]`.
    ///
    /// The caller creates the full-width region and hands its id to
    /// [`attach_region`](Self::attach_region).
    pub fn initialize(duration: f64, precision: Precision) -> Result<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(CropError::InvalidDuration { duration });
        }
        debug!("[SELECTION] Initialized to full duration {:.3}s", duration);
        Ok(Self {
            duration,
            precision,
            interval: Interval::full(duration),
            region: None,
            slider: SliderDrag::default(),
        })
    }

    /// Bind the visual region that mirrors this selection
    pub fn attach_region(&mut self, region: RegionId) {
        self.region = Some(region);
    }

    /// Slider edit: clamp, quantize, store, and push to the region.
    pub fn on_slider_change(&mut self, requested: Interval) -> Result<RegionSync> {
        let clamped = Interval::clamped(requested.start, requested.end, self.duration)?;
        if clamped != requested {
            debug!(
                "[SELECTION] Slider value {} clamped to {}",
                requested, clamped
            );
        }
        let interval = clamped.quantized_within(self.precision, self.duration);
        self.interval = interval;
        self.slider.committed = Some(interval);

        Ok(match self.region {
            Some(region) => RegionSync::Push { region, interval },
            None => RegionSync::None,
        })
    }

    /// Region drag/resize: quantize and store. Nothing is propagated.
    pub fn on_region_change(&mut self, region: RegionId, start: f64, end: f64) -> Result<()> {
        if self.region != Some(region) {
            debug!("[SELECTION] Ignoring update from inactive region {}", region);
            return Ok(());
        }
        self.interval = Interval::clamped(start, end, self.duration)?
            .quantized_within(self.precision, self.duration);
        Ok(())
    }

    /// The user grabbed a slider thumb
    pub fn begin_slider_drag(&mut self, thumb: Thumb) {
        self.slider.active = Some(thumb);
    }

    /// The user released the slider
    pub fn end_slider_drag(&mut self) {
        self.slider.active = None;
    }

    /// Latest reconciled interval
    pub fn current_interval(&self) -> Interval {
        self.interval
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn region(&self) -> Option<RegionId> {
        self.region
    }

    pub fn slider(&self) -> SliderDrag {
        self.slider
    }
}
