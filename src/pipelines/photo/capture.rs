// SPDX-License-Identifier: GPL-3.0-only

//! Still acquisition from the camera backend
//!
//! Camera backends block (V4L2 dequeue, capture tools), so acquisition runs on
//! the blocking pool while the orchestrator awaits it.

use crate::backends::camera::{RawImage, SharedCamera};
use crate::errors::PhotoError;
use tracing::{debug, info, warn};

/// Photo capture handler
pub struct PhotoCapture;

impl PhotoCapture {
    /// Acquire one still from the camera
    ///
    /// # Returns
    /// * `Ok(RawImage)` - Encoded still from the backend
    /// * `Err(PhotoError::NoFrameAvailable)` - Backend had nothing to give
    /// * `Err(_)` - Backend failed or the task was cancelled
    pub async fn capture_from_backend(camera: &SharedCamera) -> Result<RawImage, PhotoError> {
        let camera = SharedCamera::clone(camera);

        let still = tokio::task::spawn_blocking(move || {
            let mut backend = camera
                .lock()
                .map_err(|_| PhotoError::TaskFailed("camera lock poisoned".to_string()))?;
            info!(backend = backend.name(), "Acquiring still");
            backend.acquire_still().map_err(|e| {
                warn!(error = %e, "Camera backend failed");
                PhotoError::NoFrameAvailable
            })
        })
        .await??;

        let still = still.ok_or(PhotoError::NoFrameAvailable)?;
        debug!(format = ?still.format, size = still.len(), "Still acquired");
        Ok(still)
    }
}
