// SPDX-License-Identifier: GPL-3.0-only

//! USB webcam stills via V4L2
//!
//! Requests MJPG at the configured resolution so every buffer is already a
//! complete JPEG. A stream is opened per capture and the first few frames are
//! dropped while auto-exposure settles.

use super::types::{BackendResult, RawImage, WebcamSettings};
use super::CameraBackend;
use crate::errors::CameraError;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

const BUFFER_COUNT: u32 = 4;

/// Webcam backend for `/dev/videoN`
pub struct V4l2Camera {
    settings: WebcamSettings,
    device: Option<Device>,
}

impl V4l2Camera {
    pub fn new(settings: WebcamSettings) -> Self {
        Self {
            settings,
            device: None,
        }
    }
}

impl CameraBackend for V4l2Camera {
    fn name(&self) -> &'static str {
        "webcam"
    }

    fn connect(&mut self) -> BackendResult<()> {
        if self.device.is_some() {
            return Ok(());
        }

        let index = self.settings.device_index;
        let dev = Device::new(index).map_err(|e| {
            CameraError::DeviceNotFound(format!("/dev/video{}: {}", index, e))
        })?;

        let mut format = dev
            .format()
            .map_err(|e| CameraError::InitializationFailed(format!("Failed to query format: {}", e)))?;
        let mjpg = v4l::FourCC::new(b"MJPG");
        format.width = self.settings.resolution.width;
        format.height = self.settings.resolution.height;
        format.fourcc = mjpg;

        let actual = dev
            .set_format(&format)
            .map_err(|e| CameraError::InitializationFailed(format!("Failed to set format: {}", e)))?;
        if actual.fourcc != mjpg {
            return Err(CameraError::InvalidFormat(format!(
                "Device does not support MJPG (got {:?})",
                actual.fourcc
            )));
        }
        if actual.width != format.width || actual.height != format.height {
            warn!(
                requested_width = format.width,
                requested_height = format.height,
                width = actual.width,
                height = actual.height,
                "Webcam adjusted capture resolution"
            );
        }

        info!(
            device = index,
            width = actual.width,
            height = actual.height,
            facing = ?self.settings.facing_mode,
            "Webcam connected"
        );
        self.device = Some(dev);
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.device.take().is_some() {
            debug!(device = self.settings.device_index, "Webcam released");
        }
    }

    fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    fn acquire_still(&mut self) -> BackendResult<Option<RawImage>> {
        let dev = self.device.as_mut().ok_or(CameraError::NotConnected)?;

        let mut stream = Stream::with_buffers(dev, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| CameraError::BackendError(format!("Failed to create buffer stream: {}", e)))?;

        for _ in 0..self.settings.warmup_frames {
            stream.next()?;
        }

        let (buf, meta) = stream.next()?;
        let used = (meta.bytesused as usize).min(buf.len());
        if used == 0 {
            debug!("Webcam returned an empty buffer");
            return Ok(None);
        }

        debug!(size = used, sequence = meta.sequence, "Webcam still captured");
        RawImage::from_bytes(buf[..used].to_vec()).map(Some)
    }
}
