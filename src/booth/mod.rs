// SPDX-License-Identifier: GPL-3.0-only

//! Capture orchestrator
//!
//! ```text
//!            StartCapture            tick (n > 1)
//!   Idle ───────────────▶ CountingDown(n) ──────▶ CountingDown(n-1)
//!    ▲                         │ tick (n = 1)
//!    │ no still                ▼
//!    ├──────────────────── Capturing
//!    │                         │ photo committed
//!    │ expiry / Dismiss        ▼
//!    └──────────────────── PreviewActive(n) ──Retake──▶ CountingDown(5)
//! ```
//!
//! A single one-second [`BoothTimer`] drives both the countdown and preview
//! expiry. The capture sequence itself runs inline on the event loop, so two
//! captures can never overlap.
//!
//! Errors never escape the orchestrator: lighting, compositing and thumbnail
//! failures degrade the capture, a missing still aborts it back to `Idle`.

pub mod state;
pub mod timer;

pub use state::{BoothState, CaptureOutcome, CaptureStats, Message};
pub use timer::BoothTimer;

use crate::backends::camera::{self, CameraBackend, SharedCamera};
use crate::backends::lighting::{self, LightingController};
use crate::config::Config;
use crate::constants::{capture, timing};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::{
    EncodedImage, FilterParameters, PhotoCapture, PhotoPipeline, find_preset,
    has_enabled_overlays,
};
use crate::props::{PhotoProp, PropItem, PropLayer, Size};
use crate::storage::{Photo, PhotoArchive, PhotoId, PhotoStore};
use futures::StreamExt;
use futures::channel::mpsc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Follow one capture attempt on `states`, passing each observed state to `report`
///
/// `states` must be subscribed while the booth is idle. The channel only keeps
/// the latest value, so the countdown and `Capturing` may be skipped; any
/// `Idle` seen afterwards ends the attempt. Returns the final state, or `None`
/// if the booth went away first.
pub async fn follow_attempt(
    states: &mut watch::Receiver<BoothState>,
    mut report: impl FnMut(BoothState),
) -> Option<BoothState> {
    while states.changed().await.is_ok() {
        let state = *states.borrow_and_update();
        report(state);
        if matches!(state, BoothState::Idle | BoothState::PreviewActive { .. }) {
            return Some(state);
        }
    }
    None
}

/// Coordinates countdown, capture, compositing and preview
pub struct CaptureOrchestrator {
    config: Config,
    camera: SharedCamera,
    lighting: Box<dyn LightingController>,
    pipeline: PhotoPipeline,
    store: PhotoStore,
    archive: Option<PhotoArchive>,
    state: watch::Sender<BoothState>,
    preview: Option<PhotoId>,
    stats: CaptureStats,
    /// A new timed phase began; the event loop restarts its timer
    rearm: bool,
}

impl CaptureOrchestrator {
    pub fn new(
        config: Config,
        camera: Box<dyn CameraBackend>,
        lighting: Box<dyn LightingController>,
    ) -> Self {
        let pipeline = PhotoPipeline::with_thumbnail(config.thumbnail.into());
        let (state, _) = watch::channel(BoothState::Idle);
        Self {
            config,
            camera: camera::shared(camera),
            lighting,
            pipeline,
            store: PhotoStore::new(),
            archive: None,
            state,
            preview: None,
            stats: CaptureStats::default(),
            rearm: false,
        }
    }

    /// Build camera, lighting and archive from `config`
    pub fn from_config(config: Config) -> Self {
        let camera = camera::create_backend(&config.camera);
        let lights = lighting::create_controller(&config.lighting);
        let archive = config.photos_dir.clone().map(PhotoArchive::new);
        let mut booth = Self::new(config, camera, lights);
        booth.archive = archive;
        booth
    }

    /// Mirror committed photos into `archive`
    pub fn with_archive(mut self, archive: PhotoArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Open the camera and the lights
    ///
    /// Lighting is optional; a lighting failure is only logged.
    pub fn connect(&mut self) -> AppResult<()> {
        if let Err(e) = self.lighting.connect() {
            warn!(error = %e, "Booth lights unavailable; capturing without them");
        }

        let mut camera = self
            .camera
            .lock()
            .map_err(|_| AppError::Other("camera lock poisoned".to_string()))?;
        camera.connect()?;
        info!(backend = camera.name(), "Booth connected");
        Ok(())
    }

    /// Release the camera and the lights
    pub fn disconnect(&mut self) {
        self.lighting.disconnect();
        if let Ok(mut camera) = self.camera.lock() {
            camera.disconnect();
        }
        debug!("Booth disconnected");
    }

    pub fn state(&self) -> BoothState {
        *self.state.borrow()
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<BoothState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Photo currently shown in the preview
    pub fn preview(&self) -> Option<&Photo> {
        self.preview.as_ref().and_then(|id| self.store.get(id))
    }

    fn set_state(&mut self, state: BoothState) {
        self.state.send_replace(state);
    }

    /// Idle → CountingDown; ignored in every other state
    pub fn start_capture(&mut self) -> bool {
        let current = self.state();
        if current.is_busy() {
            debug!(state = %current, "Capture already in progress");
            return false;
        }
        if let BoothState::PreviewActive { .. } = current {
            debug!("Capture request ignored during preview; retake instead");
            return false;
        }
        let remaining = self.config.timing.countdown_secs.max(1);
        info!(remaining, "Countdown started");
        self.set_state(BoothState::CountingDown { remaining });
        self.rearm = true;
        true
    }

    /// Advance the countdown or the preview by one second
    ///
    /// Returns the outcome when this tick fired the shutter.
    pub async fn tick(&mut self) -> Option<CaptureOutcome> {
        match self.state() {
            BoothState::CountingDown { remaining } if remaining <= 1 => {
                Some(self.capture_sequence().await)
            }
            BoothState::CountingDown { remaining } => {
                debug!(remaining = remaining - 1, "Countdown tick");
                self.set_state(BoothState::CountingDown {
                    remaining: remaining - 1,
                });
                None
            }
            BoothState::PreviewActive { seconds_left } if seconds_left <= 1 => {
                info!("Preview expired");
                self.preview = None;
                self.set_state(BoothState::Idle);
                None
            }
            BoothState::PreviewActive { seconds_left } => {
                self.set_state(BoothState::PreviewActive {
                    seconds_left: seconds_left - 1,
                });
                None
            }
            BoothState::Idle | BoothState::Capturing => None,
        }
    }

    /// Leave the preview and count down for another photo
    ///
    /// The previewed photo stays in the store.
    pub fn retake(&mut self) -> bool {
        if !matches!(self.state(), BoothState::PreviewActive { .. }) {
            return false;
        }
        self.preview = None;
        self.set_state(BoothState::Idle);
        info!("Retake requested");
        self.start_capture()
    }

    /// Close the preview, keeping the photo
    pub fn dismiss(&mut self) -> bool {
        if !matches!(self.state(), BoothState::PreviewActive { .. }) {
            return false;
        }
        self.preview = None;
        self.set_state(BoothState::Idle);
        debug!("Preview dismissed");
        true
    }

    /// Cancel the countdown or preview
    pub fn abort(&mut self) -> bool {
        match self.state() {
            BoothState::CountingDown { .. } | BoothState::PreviewActive { .. } => {
                info!(state = %self.state(), "Aborted");
                self.preview = None;
                self.set_state(BoothState::Idle);
                true
            }
            BoothState::Idle | BoothState::Capturing => false,
        }
    }

    pub fn delete_photo(&mut self, id: &PhotoId) -> bool {
        if self.preview.as_ref() == Some(id) {
            self.dismiss();
        }
        self.store.delete(id).is_some()
    }

    pub fn update_filters(&mut self, id: &PhotoId, filters: FilterParameters) -> bool {
        self.store.update_filters(id, filters.sanitized())
    }

    /// Apply a named preset to a photo's filters
    pub fn apply_preset(&mut self, id: &PhotoId, preset_name: &str) -> bool {
        let Some(preset) = find_preset(preset_name) else {
            warn!(preset = preset_name, "Unknown filter preset");
            return false;
        };
        let Some(photo) = self.store.get(id) else {
            return false;
        };
        let mut filters = photo.filters.clone();
        filters.apply_preset(preset);
        self.store.update_filters(id, filters)
    }

    pub fn update_props(&mut self, id: &PhotoId, props: Vec<PhotoProp>) -> bool {
        self.store.update_props(id, props)
    }

    pub fn prop_library(&self) -> &[PropItem] {
        self.config.props.library()
    }

    /// Place a library prop on a photo edited in a `container`-sized view
    ///
    /// Returns the id of the placed prop.
    pub fn add_prop(&mut self, id: &PhotoId, item_id: &str, container: Size) -> Option<String> {
        let Some(item) = self.prop_library().iter().find(|item| item.id == item_id).cloned() else {
            warn!(prop = item_id, "Prop not in library");
            return None;
        };
        let photo = self.store.get(id)?;

        let mut layer = PropLayer::with_props(container, photo.props.clone());
        let placed = match layer.add_item(&item) {
            Ok(prop) => prop.id.clone(),
            Err(e) => {
                warn!(prop = item_id, error = %e, "Prop asset unavailable");
                return None;
            }
        };
        self.store.update_props(id, layer.into_props());
        debug!(photo_id = %id, prop = %placed, "Prop placed");
        Some(placed)
    }

    /// Handle one message
    pub async fn update(&mut self, message: Message) -> Option<CaptureOutcome> {
        match message {
            Message::StartCapture => {
                self.start_capture();
            }
            Message::Tick => return self.tick().await,
            Message::Retake => {
                self.retake();
            }
            Message::Dismiss => {
                self.dismiss();
            }
            Message::Abort => {
                self.abort();
            }
            Message::DeletePhoto(id) => {
                self.delete_photo(&id);
            }
            Message::UpdateFilters(id, filters) => {
                self.update_filters(&id, filters);
            }
            Message::ApplyPreset(id, name) => {
                self.apply_preset(&id, &name);
            }
            Message::UpdateProps(id, props) => {
                self.update_props(&id, props);
            }
            Message::Shutdown => {
                self.abort();
            }
        }
        None
    }

    /// Event loop: handles messages and timer ticks until `Shutdown` or the
    /// sender is dropped, then hands the orchestrator back
    pub async fn run(mut self, mut messages: mpsc::Receiver<Message>) -> Self {
        let mut timer = BoothTimer::new(timing::TICK_INTERVAL);

        loop {
            let message = tokio::select! {
                message = messages.next() => message.unwrap_or(Message::Shutdown),
                _ = timer.tick() => Message::Tick,
            };

            if matches!(message, Message::Shutdown) {
                self.abort();
                break;
            }

            if let Some(outcome) = self.update(message).await {
                debug!(?outcome, "Capture attempt finished");
            }

            if std::mem::take(&mut self.rearm) {
                timer.arm();
            } else if !self.state().is_timed() {
                timer.disarm();
            }
        }

        info!(photos = self.store.len(), "Booth loop stopped");
        self
    }

    /// Lights on → settle → acquire → compose → thumbnail → commit → lights off
    async fn capture_sequence(&mut self) -> CaptureOutcome {
        self.set_state(BoothState::Capturing);
        self.stats.attempts += 1;
        info!(attempt = self.stats.attempts, "Capturing");

        if let Err(e) = self.lighting.activate() {
            warn!(error = %e, "Failed to activate booth lights");
        }
        tokio::time::sleep(self.config.timing.settle_delay()).await;

        let outcome = self.acquire_and_commit().await;

        if let Err(e) = self.lighting.deactivate() {
            warn!(error = %e, "Failed to deactivate booth lights");
        }

        match &outcome {
            CaptureOutcome::Saved { photo_id, .. } => {
                self.preview = Some(photo_id.clone());
                self.set_state(BoothState::PreviewActive {
                    seconds_left: self.config.timing.preview_secs.max(1),
                });
                self.rearm = true;
            }
            CaptureOutcome::Aborted => {
                self.preview = None;
                self.set_state(BoothState::Idle);
            }
        }
        outcome
    }

    async fn acquire_and_commit(&mut self) -> CaptureOutcome {
        let raw = match PhotoCapture::capture_from_backend(&self.camera).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "No still acquired; capture aborted");
                self.stats.aborted += 1;
                return CaptureOutcome::Aborted;
            }
        };

        let overlays = &self.config.processing.overlays;
        let processed = has_enabled_overlays(overlays);
        let mut degraded = false;

        let image = if processed {
            match self.pipeline.compose(&raw, overlays.clone()).await {
                Ok(composed) => {
                    degraded |= !composed.skipped.is_empty();
                    composed.image
                }
                Err(e) => {
                    error!(error = %e, "Compositing failed; keeping the original still");
                    degraded = true;
                    EncodedImage::from_raw(&raw)
                }
            }
        } else {
            EncodedImage::from_raw(&raw)
        };

        let thumbnail = match self.pipeline.thumbnail(&image).await {
            Ok(thumbnail) => thumbnail,
            Err(e) => {
                warn!(error = %e, "Thumbnail failed; using the full image");
                degraded = true;
                image.clone()
            }
        };

        let photo = Photo::new(image, Some(thumbnail), processed);
        let photo_id = photo.id.clone();
        self.store.append(photo.clone());
        info!(photo_id = %photo_id, processed, degraded, "Photo saved");

        if let Some(archive) = &self.archive {
            if let Err(e) = archive.save_photo(&photo).await {
                warn!(photo_id = %photo_id, error = %e, "Failed to archive photo");
            }
            if processed
                && self.config.processing.preserve_original
                && let Err(e) = archive.save_original(&photo, &raw).await
            {
                warn!(photo_id = %photo_id, error = %e, "Failed to keep original still");
            }
        }

        self.record_saved(degraded);
        CaptureOutcome::Saved {
            photo_id,
            processed,
            degraded,
        }
    }

    fn record_saved(&mut self, degraded: bool) {
        self.stats.saved += 1;
        if !degraded {
            self.stats.consecutive_degraded = 0;
            return;
        }
        self.stats.degraded += 1;
        self.stats.consecutive_degraded += 1;
        if self.stats.consecutive_degraded == capture::DEGRADED_ALERT_THRESHOLD {
            error!(
                consecutive = self.stats.consecutive_degraded,
                "Repeated degraded captures; check overlay assets and storage"
            );
        }
    }
}
