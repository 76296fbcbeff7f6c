// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ Capture Orchestrator │
//! └──────────┬───────────┘
//!            │ acquire_still()
//!            ▼
//! ┌──────────────────────┐
//! │  CameraBackend Trait │  ← connect / disconnect / acquire_still
//! └──────────┬───────────┘
//!            │
//!    ┌───────┼─────────┬──────────┐
//!    ▼       ▼         ▼          ▼
//! ┌─────┐ ┌──────┐ ┌────────┐ ┌──────┐
//! │ V4L2│ │ rpicam│ │gphoto2 │ │ File │
//! └─────┘ └──────┘ └────────┘ └──────┘
//! ```
//!
//! Backends are blocking. The orchestrator drives them from a blocking task
//! through [`SharedCamera`].

pub mod command;
pub mod file_source;
#[cfg(target_os = "linux")]
pub mod v4l2;

pub mod types;

pub use command::{DslrCamera, PiCamera};
pub use file_source::FileCamera;
pub use types::*;

use std::sync::{Arc, Mutex};

/// Camera capability consumed by the orchestrator
///
/// `acquire_still` returns `Ok(None)` when the source is reachable but had no
/// frame to give. Both `Ok(None)` and `Err(_)` abort the current capture
/// attempt without creating a photo.
pub trait CameraBackend: Send {
    /// Human-readable backend name for logs
    fn name(&self) -> &'static str;

    /// Open the source. Calling it twice is harmless.
    fn connect(&mut self) -> BackendResult<()>;

    /// Release the source
    fn disconnect(&mut self);

    /// Whether [`CameraBackend::connect`] succeeded and the source is held
    fn is_connected(&self) -> bool;

    /// Acquire one encoded still
    fn acquire_still(&mut self) -> BackendResult<Option<RawImage>>;
}

/// Camera shared between the orchestrator and its blocking capture task
pub type SharedCamera = Arc<Mutex<Box<dyn CameraBackend>>>;

/// Wrap a backend for use by the orchestrator
pub fn shared(backend: Box<dyn CameraBackend>) -> SharedCamera {
    Arc::new(Mutex::new(backend))
}

/// Build the backend selected by `settings.source`
pub fn create_backend(settings: &CameraSettings) -> Box<dyn CameraBackend> {
    match settings.source {
        CameraSource::File => Box::new(FileCamera::new(settings.file.clone())),
        CameraSource::PiCamera => Box::new(PiCamera::new(settings.picamera.clone())),
        CameraSource::Dslr => Box::new(DslrCamera::new(settings.dslr.clone())),
        CameraSource::Webcam => webcam_backend(settings),
    }
}

#[cfg(target_os = "linux")]
fn webcam_backend(settings: &CameraSettings) -> Box<dyn CameraBackend> {
    Box::new(v4l2::V4l2Camera::new(settings.webcam.clone()))
}

#[cfg(not(target_os = "linux"))]
fn webcam_backend(_settings: &CameraSettings) -> Box<dyn CameraBackend> {
    tracing::warn!("V4L2 webcams are only supported on Linux; falling back to file source");
    Box::new(FileCamera::new(FileSourceSettings::default()))
}
