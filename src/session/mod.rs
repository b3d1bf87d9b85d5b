//! Crop Session
//!
//! Wires file intake, the waveform view, the selection controller and the
//! audio engine together, the way the cropping screen does:
//!
//! 1. `load_engine` once
//! 2. `select_file` renders the waveform; `Ready` and `Decode` events create
//!    the asset, the selection and its full-width region
//! 3. slider edits go through `on_slider_change`; region drags arrive as
//!    waveform events via `pump_waveform_events`
//! 4. `crop` (or `begin_crop` / `run_job` / `finish_crop`) produces the result
//!
//! Only one crop can be outstanding. Every failure is also queued as a
//! [`Notification`].

mod notification;

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::asset::{self, AudioAsset};
use crate::config::CropConfig;
use crate::engine::{AudioProcessor, CropCommand, EngineStatus};
use crate::error::{CropError, Result};
use crate::selection::{Interval, RangeSelectionController, RegionSync, Thumb};
use crate::waveform::{WaveformEvent, WaveformView};

pub use notification::{Notification, NotificationLevel};

/// Stem of the name the input is written under inside the engine
pub const ENGINE_INPUT_STEM: &str = "input";

/// A file whose waveform has been requested but not reported ready
#[derive(Debug)]
struct PendingFile {
    name: String,
    bytes: Vec<u8>,
}

/// One outstanding crop invocation
#[derive(Debug, Clone)]
pub struct CropJob {
    command: CropCommand,
    input: Vec<u8>,
}

impl CropJob {
    pub fn command(&self) -> &CropCommand {
        &self.command
    }

    pub fn interval(&self) -> Interval {
        self.command.interval()
    }

    /// One input write, one exec, one output read
    pub fn execute<P: AudioProcessor + ?Sized>(&self, processor: &mut P) -> Result<Vec<u8>> {
        processor.write_file(&self.command.input, &self.input)?;
        let outcome = processor
            .exec(&self.command.to_args())
            .and_then(|_| processor.read_file(&self.command.output));

        for name in [&self.command.input, &self.command.output] {
            if let Err(e) = processor.remove_file(name) {
                warn!("[CROP] Could not clean up {}: {}", name, e);
            }
        }
        outcome
    }
}

/// State of the cropping screen
pub struct CropSession<P: AudioProcessor, V: WaveformView> {
    config: CropConfig,
    processor: P,
    view: V,
    engine: EngineStatus,
    pending: Option<PendingFile>,
    source: Option<AudioAsset>,
    selection: Option<RangeSelectionController>,
    result: Option<AudioAsset>,
    crop_in_flight: bool,
    notifications: Vec<Notification>,
}

impl<P: AudioProcessor, V: WaveformView> CropSession<P, V> {
    pub fn new(config: CropConfig, processor: P, view: V) -> Self {
        Self {
            config,
            processor,
            view,
            engine: EngineStatus::Loading,
            pending: None,
            source: None,
            selection: None,
            result: None,
            crop_in_flight: false,
            notifications: Vec::new(),
        }
    }

    // ========================================================================
    // Engine
    // ========================================================================

    /// Load the engine. A failed load is final for this session.
    pub fn load_engine(&mut self) -> Result<()> {
        match &self.engine {
            EngineStatus::Ready => return Ok(()),
            EngineStatus::Failed(reason) => {
                return Err(CropError::EngineInit {
                    reason: reason.clone(),
                })
            }
            EngineStatus::Loading => {}
        }

        match self.processor.load() {
            Ok(()) => {
                info!("[SESSION] Engine '{}' ready", self.processor.name());
                self.engine = EngineStatus::Ready;
                Ok(())
            }
            Err(e) => {
                warn!("[SESSION] Engine '{}' failed: {}", self.processor.name(), e);
                self.engine = EngineStatus::Failed(e.to_string());
                Err(self.fail(e))
            }
        }
    }

    // ========================================================================
    // File intake
    // ========================================================================

    /// Read a file from disk and select it. Oversized files are rejected
    /// before they are read.
    pub fn select_path(&mut self, path: &Path) -> Result<()> {
        if self.crop_in_flight {
            return Err(self.fail(CropError::CropInFlight));
        }
        let bytes = match asset::read_limited(path, self.config.max_file_bytes) {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(e)),
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.select_file(name, bytes)
    }

    /// Select an in-memory file and render its waveform.
    ///
    /// An oversized file is rejected without touching the current state.
    /// Any other outcome discards the previous asset, selection and result.
    pub fn select_file(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        let name = name.into();
        if self.crop_in_flight {
            return Err(self.fail(CropError::CropInFlight));
        }
        if let Err(e) = asset::check_size(bytes.len() as u64, self.config.max_file_bytes) {
            return Err(self.fail(e));
        }

        info!("[SESSION] Selected {} ({} bytes)", name, bytes.len());
        self.discard_asset();

        let extension = asset::extension_of(&name);
        self.view.set_format_hint(extension.as_deref());
        if let Err(e) = self.view.render(&bytes) {
            return Err(self.fail(e));
        }
        self.pending = Some(PendingFile { name, bytes });
        self.pump_waveform_events()
    }

    fn discard_asset(&mut self) {
        self.view.clear_regions();
        self.pending = None;
        self.source = None;
        self.selection = None;
        self.result = None;
    }

    // ========================================================================
    // Waveform events
    // ========================================================================

    /// Drain the view's event queue into the session
    pub fn pump_waveform_events(&mut self) -> Result<()> {
        while let Some(event) = self.view.poll_event() {
            if let Err(e) = self.handle_event(event) {
                return Err(self.fail(e));
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: WaveformEvent) -> Result<()> {
        match event {
            WaveformEvent::Ready { duration } => {
                let Some(file) = self.pending.take() else {
                    debug!("[SESSION] Ready event without a pending file");
                    return Ok(());
                };
                if !duration.is_finite() || duration <= 0.0 {
                    return Err(CropError::InvalidDuration { duration });
                }
                let asset = AudioAsset::new(file.name, file.bytes, duration);
                info!(
                    "[SESSION] Loaded {} ({:.3}s, {})",
                    asset.name(),
                    duration,
                    asset.handle()
                );
                self.source = Some(asset);
            }
            WaveformEvent::Decode => {
                let Some(source) = self.source.as_ref() else {
                    return Ok(());
                };
                if self.selection.is_some() {
                    return Ok(());
                }
                let mut selection = RangeSelectionController::initialize(
                    source.duration_secs(),
                    self.config.precision(),
                )?;
                let region = self.view.add_region(selection.current_interval())?;
                selection.attach_region(region);
                self.selection = Some(selection);
            }
            WaveformEvent::RegionUpdated { region, start, end } => {
                if let Some(selection) = self.selection.as_mut() {
                    selection.on_region_change(region, start, end)?;
                    debug!(
                        "[SESSION] Region drag -> {}",
                        selection.current_interval()
                    );
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Range control
    // ========================================================================

    /// Apply a slider edit and mirror it on the waveform region
    pub fn on_slider_change(&mut self, interval: Interval) -> Result<Interval> {
        let Some(selection) = self.selection.as_mut() else {
            return Err(self.fail(CropError::NoFileSelected));
        };
        let sync = match selection.on_slider_change(interval) {
            Ok(sync) => sync,
            Err(e) => return Err(self.fail(e)),
        };
        let current = selection.current_interval();

        if let RegionSync::Push { region, interval } = sync {
            if let Err(e) = self.view.set_region_bounds(region, interval) {
                return Err(self.fail(e));
            }
        }
        Ok(current)
    }

    pub fn begin_slider_drag(&mut self, thumb: Thumb) {
        if let Some(selection) = self.selection.as_mut() {
            selection.begin_slider_drag(thumb);
        }
    }

    pub fn end_slider_drag(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.end_slider_drag();
        }
    }

    // ========================================================================
    // Crop
    // ========================================================================

    /// Whether the crop trigger is enabled
    pub fn can_crop(&self) -> bool {
        self.engine.is_ready()
            && self.source.is_some()
            && self.selection.is_some()
            && !self.crop_in_flight
    }

    /// Validate preconditions, disable the trigger and describe the job
    pub fn begin_crop(&mut self) -> Result<CropJob> {
        if self.crop_in_flight {
            return Err(self.fail(CropError::CropInFlight));
        }
        if !self.engine.is_ready() {
            return Err(self.fail(CropError::EngineNotReady));
        }
        let (Some(source), Some(selection)) = (self.source.as_ref(), self.selection.as_ref())
        else {
            return Err(self.fail(CropError::NoFileSelected));
        };

        let interval = selection
            .current_interval()
            .quantized_within(selection.precision(), selection.duration());
        let extension = source.extension();
        let input_name = match extension.as_deref() {
            Some(ext) => format!("{}.{}", ENGINE_INPUT_STEM, ext),
            None => ENGINE_INPUT_STEM.to_string(),
        };
        let output_name = self.config.output_name(extension.as_deref());

        let job = CropJob {
            command: CropCommand::new(input_name, output_name, interval),
            input: source.bytes().to_vec(),
        };
        info!("[CROP] Cropping {} to {}", source.name(), interval);
        self.crop_in_flight = true;
        Ok(job)
    }

    /// Run a job against this session's engine
    pub fn run_job(&mut self, job: &CropJob) -> Result<Vec<u8>> {
        job.execute(&mut self.processor)
    }

    /// Settle a job: re-enable the trigger and publish or report the outcome.
    ///
    /// On failure the source asset and the selection are left as they were.
    pub fn finish_crop(&mut self, job: CropJob, outcome: Result<Vec<u8>>) -> Result<&AudioAsset> {
        self.crop_in_flight = false;
        let bytes = match outcome {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("[CROP] Failed: {}", e);
                return Err(self.fail(e));
            }
        };

        let interval = job.interval();
        let asset = AudioAsset::new(job.command.output, bytes, interval.length());
        info!(
            "[CROP] Produced {} ({} bytes, {:.3}s)",
            asset.name(),
            asset.size(),
            asset.duration_secs()
        );
        self.notify(Notification::info(
            format!("Cropped to {}", interval),
            self.config.notification_ttl_secs,
        ));
        Ok(self.result.insert(asset))
    }

    /// Begin, run and finish a crop
    pub fn crop(&mut self) -> Result<&AudioAsset> {
        let job = self.begin_crop()?;
        let outcome = self.run_job(&job);
        self.finish_crop(job, outcome)
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    fn fail(&mut self, error: CropError) -> CropError {
        if !error.is_recoverable() {
            error!("[SESSION] Session unusable: {}", error);
        }
        let notification = Notification::from_error(&error, self.config.notification_ttl_secs);
        self.notify(notification);
        error
    }

    /// Queue a notification, dropping those already expired
    fn notify(&mut self, notification: Notification) {
        debug!("[SESSION] Notify: {}", notification);
        self.prune_notifications(Utc::now());
        self.notifications.push(notification);
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Drop notifications whose time-to-live has passed
    pub fn prune_notifications(&mut self, now: DateTime<Utc>) {
        self.notifications.retain(|n| !n.is_expired(now));
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    pub fn engine_status(&self) -> &EngineStatus {
        &self.engine
    }

    pub fn source(&self) -> Option<&AudioAsset> {
        self.source.as_ref()
    }

    pub fn selection(&self) -> Option<&RangeSelectionController> {
        self.selection.as_ref()
    }

    pub fn current_interval(&self) -> Option<Interval> {
        self.selection.as_ref().map(|s| s.current_interval())
    }

    pub fn result(&self) -> Option<&AudioAsset> {
        self.result.as_ref()
    }

    pub fn is_crop_in_flight(&self) -> bool {
        self.crop_in_flight
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}
