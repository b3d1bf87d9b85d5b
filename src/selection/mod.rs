//! Range Selection Module
//!
//! Crop interval state shared by the range control and the waveform region.

pub mod controller;
pub mod interval;

pub use controller::{RangeSelectionController, RegionSync, SliderDrag, Thumb};
pub use interval::{Interval, Precision, RoundingMode, DEFAULT_PRECISION_DIGITS};
