//! Peak overview waveform
//!
//! Decodes audio with symphonia, mixes it down to mono and keeps one
//! min/max pair per bin. Regions live next to the peaks so the view can
//! draw them and report drags.

use std::collections::VecDeque;
use std::io::Cursor;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::error::{CropError, Result};
use crate::selection::Interval;
use crate::waveform::terminal;
use crate::waveform::{RegionId, WaveformEvent, WaveformView};

/// Default number of peak bins kept per render
pub const DEFAULT_BINS: usize = 2048;

/// Mono samples decoded from an audio container
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl DecodedAudio {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode any supported container to mono `f32` samples.
///
/// `extension` is only a probe hint; probing falls back to content sniffing.
pub fn decode_mono(bytes: &[u8], extension: Option<&str>) -> Result<DecodedAudio> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| CropError::UnsupportedFormat {
            format: format!("{} ({})", extension.unwrap_or("unknown"), e),
        })?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| CropError::Decode {
            reason: "no audio track".to_string(),
        })?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| CropError::Decode {
            reason: e.to_string(),
        })?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(CropError::Decode {
                    reason: e.to_string(),
                })
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("[WAVEFORM] Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(CropError::Decode {
                    reason: e.to_string(),
                })
            }
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count().max(1);

        let needs_alloc = sample_buf
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity());
        if needs_alloc {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            for frame in buf.samples().chunks(channels) {
                samples.push(frame.iter().sum::<f32>() / frame.len() as f32);
            }
        }
    }

    if samples.is_empty() || sample_rate == 0 {
        return Err(CropError::Decode {
            reason: "audio contains no samples".to_string(),
        });
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

/// Min/max peak bins over the whole asset
#[derive(Debug, Clone, PartialEq)]
pub struct Peaks {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
    pub duration_secs: f64,
}

impl Peaks {
    /// Build at most `bins` min/max pairs, normalized to the global peak
    pub fn from_samples(samples: &[f32], sample_rate: u32, bins: usize) -> Self {
        let duration_secs = if sample_rate == 0 {
            0.0
        } else {
            samples.len() as f64 / sample_rate as f64
        };
        if samples.is_empty() || bins == 0 {
            return Self {
                min: Vec::new(),
                max: Vec::new(),
                duration_secs,
            };
        }

        let per_bin = samples.len().div_ceil(bins).max(1);
        let mut min = Vec::with_capacity(bins);
        let mut max = Vec::with_capacity(bins);
        let mut global_peak = 0.0f32;

        for chunk in samples.chunks(per_bin) {
            let mut lo = f32::INFINITY;
            let mut hi = f32::NEG_INFINITY;
            for &s in chunk {
                lo = lo.min(s);
                hi = hi.max(s);
                global_peak = global_peak.max(s.abs());
            }
            min.push(lo);
            max.push(hi);
        }

        if global_peak > 0.0 {
            let scale = 1.0 / global_peak;
            min.iter_mut().for_each(|v| *v *= scale);
            max.iter_mut().for_each(|v| *v *= scale);
        }

        Self {
            min,
            max,
            duration_secs,
        }
    }

    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    /// Merge bins down to `width` columns
    pub fn resample(&self, width: usize) -> Self {
        if width == 0 || self.is_empty() {
            return Self {
                min: Vec::new(),
                max: Vec::new(),
                duration_secs: self.duration_secs,
            };
        }
        let mut min = Vec::with_capacity(width);
        let mut max = Vec::with_capacity(width);
        for col in 0..width {
            let a = col * self.len() / width;
            let b = ((col + 1) * self.len() / width).max(a + 1).min(self.len());
            let lo = self.min[a..b].iter().copied().fold(f32::INFINITY, f32::min);
            let hi = self.max[a..b]
                .iter()
                .copied()
                .fold(f32::NEG_INFINITY, f32::max);
            min.push(lo);
            max.push(hi);
        }
        Self {
            min,
            max,
            duration_secs: self.duration_secs,
        }
    }
}

/// In-process waveform view
#[derive(Debug)]
pub struct PeakWaveform {
    bins: usize,
    hint: Option<String>,
    peaks: Option<Peaks>,
    regions: Vec<(RegionId, Interval)>,
    next_region: u64,
    events: VecDeque<WaveformEvent>,
}

impl Default for PeakWaveform {
    fn default() -> Self {
        Self::new(DEFAULT_BINS)
    }
}

impl PeakWaveform {
    pub fn new(bins: usize) -> Self {
        Self {
            bins: bins.max(1),
            hint: None,
            peaks: None,
            regions: Vec::new(),
            next_region: 1,
            events: VecDeque::new(),
        }
    }

    pub fn peaks(&self) -> Option<&Peaks> {
        self.peaks.as_ref()
    }

    pub fn duration(&self) -> Option<f64> {
        self.peaks.as_ref().map(|p| p.duration_secs)
    }

    /// Simulates the user dragging or resizing a region.
    ///
    /// Bounds are clamped to the rendered duration and a `RegionUpdated`
    /// event is queued.
    pub fn drag_region(&mut self, region: RegionId, start: f64, end: f64) -> Result<()> {
        let duration = self.duration().unwrap_or(f64::MAX);
        let interval = Interval::clamped(start, end, duration)?;
        let slot = self.region_slot(region)?;
        *slot = interval;
        self.events.push_back(WaveformEvent::RegionUpdated {
            region,
            start: interval.start,
            end: interval.end,
        });
        Ok(())
    }

    /// ASCII rendering with region columns marked on the bottom row
    pub fn render_ascii(&self, width: usize, height: usize) -> Vec<String> {
        let Some(peaks) = self.peaks.as_ref() else {
            return Vec::new();
        };
        let columns = peaks.resample(width);
        let mut lines = terminal::render_ascii(&columns.min, &columns.max, height);
        let marked: Vec<Interval> = self.regions.iter().map(|(_, iv)| *iv).collect();
        lines.push(terminal::region_ruler(
            columns.len(),
            peaks.duration_secs,
            &marked,
        ));
        lines
    }

    fn region_slot(&mut self, region: RegionId) -> Result<&mut Interval> {
        self.regions
            .iter_mut()
            .find(|(id, _)| *id == region)
            .map(|(_, iv)| iv)
            .ok_or_else(|| CropError::InvalidInterval {
                reason: format!("unknown {}", region),
            })
    }
}

impl WaveformView for PeakWaveform {
    fn render(&mut self, audio: &[u8]) -> Result<()> {
        let decoded = decode_mono(audio, self.hint.as_deref())?;
        let peaks = Peaks::from_samples(&decoded.samples, decoded.sample_rate, self.bins);
        debug!(
            "[WAVEFORM] Rendered {} bins, {:.3}s at {} Hz ({} ch)",
            peaks.len(),
            peaks.duration_secs,
            decoded.sample_rate,
            decoded.channels
        );

        self.events.push_back(WaveformEvent::Ready {
            duration: peaks.duration_secs,
        });
        self.events.push_back(WaveformEvent::Decode);
        self.peaks = Some(peaks);
        Ok(())
    }

    fn add_region(&mut self, interval: Interval) -> Result<RegionId> {
        let region = RegionId(self.next_region);
        self.next_region += 1;
        self.regions.push((region, interval));
        Ok(region)
    }

    fn set_region_bounds(&mut self, region: RegionId, interval: Interval) -> Result<()> {
        *self.region_slot(region)? = interval;
        Ok(())
    }

    fn region_bounds(&self, region: RegionId) -> Option<Interval> {
        self.regions
            .iter()
            .find(|(id, _)| *id == region)
            .map(|(_, iv)| *iv)
    }

    fn clear_regions(&mut self) {
        self.regions.clear();
    }

    fn poll_event(&mut self) -> Option<WaveformEvent> {
        self.events.pop_front()
    }

    fn set_format_hint(&mut self, extension: Option<&str>) {
        self.hint = extension.map(str::to_lowercase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wav_bytes(duration_secs: f64, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut out = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut out), spec).unwrap();
            let frames = (duration_secs * sample_rate as f64) as usize;
            for i in 0..frames {
                let t = i as f64 / sample_rate as f64;
                let s = (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5;
                writer.write_sample((s * i16::MAX as f64) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        out
    }

    #[test]
    fn test_decode_wav_duration() {
        let decoded = decode_mono(&wav_bytes(1.5, 8000), Some("wav")).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_relative_eq!(decoded.duration_secs(), 1.5, epsilon = 1e-3);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_mono(b"definitely not audio", None).is_err());
    }

    #[test]
    fn test_peaks_normalized() {
        let samples: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.1).sin() * 0.25).collect();
        let peaks = Peaks::from_samples(&samples, 1000, 100);
        assert_eq!(peaks.len(), 100);
        let top = peaks.max.iter().copied().fold(f32::MIN, f32::max);
        assert_relative_eq!(top, 1.0, epsilon = 1e-6);
        assert_relative_eq!(peaks.duration_secs, 1.0);
    }

    #[test]
    fn test_peaks_resample() {
        let samples: Vec<f32> = (0..400).map(|i| if i < 200 { 0.1 } else { -0.1 }).collect();
        let peaks = Peaks::from_samples(&samples, 100, 40).resample(4);
        assert_eq!(peaks.len(), 4);
        assert!(peaks.max[0] > 0.0);
        assert!(peaks.min[3] < 0.0);
    }

    #[test]
    fn test_render_emits_ready_then_decode() {
        let mut view = PeakWaveform::new(256);
        view.set_format_hint(Some("WAV"));
        view.render(&wav_bytes(2.0, 8000)).unwrap();

        match view.poll_event() {
            Some(WaveformEvent::Ready { duration }) => {
                assert_relative_eq!(duration, 2.0, epsilon = 1e-3)
            }
            other => panic!("expected Ready, got {:?}", other),
        }
        assert_eq!(view.poll_event(), Some(WaveformEvent::Decode));
        assert_eq!(view.poll_event(), None);
    }

    #[test]
    fn test_programmatic_bounds_do_not_emit() {
        let mut view = PeakWaveform::default();
        let region = view.add_region(Interval::full(4.0)).unwrap();
        view.set_region_bounds(region, Interval { start: 1.0, end: 2.0 })
            .unwrap();
        assert_eq!(view.poll_event(), None);
        assert_eq!(
            view.region_bounds(region),
            Some(Interval { start: 1.0, end: 2.0 })
        );
    }

    #[test]
    fn test_drag_region_emits_update() {
        let mut view = PeakWaveform::default();
        view.render(&wav_bytes(1.0, 8000)).unwrap();
        while view.poll_event().is_some() {}

        let region = view.add_region(Interval::full(1.0)).unwrap();
        view.drag_region(region, 0.25, 5.0).unwrap();

        match view.poll_event() {
            Some(WaveformEvent::RegionUpdated { region: r, start, end }) => {
                assert_eq!(r, region);
                assert_relative_eq!(start, 0.25);
                assert_relative_eq!(end, 1.0, epsilon = 1e-3);
            }
            other => panic!("expected RegionUpdated, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_region_is_error() {
        let mut view = PeakWaveform::default();
        assert!(view
            .set_region_bounds(RegionId(99), Interval::full(1.0))
            .is_err());
        assert!(view.drag_region(RegionId(99), 0.0, 1.0).is_err());
    }
}
