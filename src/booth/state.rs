// SPDX-License-Identifier: GPL-3.0-only

//! Booth state machine types

use crate::pipelines::photo::FilterParameters;
use crate::props::PhotoProp;
use crate::storage::PhotoId;
use std::fmt;

/// Where the booth is in the capture cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoothState {
    /// Waiting for a capture request
    #[default]
    Idle,
    /// Visible countdown; the shutter fires when it runs out
    CountingDown { remaining: u32 },
    /// Capture sequence in flight
    Capturing,
    /// Showing the latest photo until it expires or is dismissed
    PreviewActive { seconds_left: u32 },
}

impl BoothState {
    /// States driven by the one-second timer
    pub fn is_timed(&self) -> bool {
        matches!(
            self,
            BoothState::CountingDown { .. } | BoothState::PreviewActive { .. }
        )
    }

    /// States that reject a new capture request
    pub fn is_busy(&self) -> bool {
        matches!(self, BoothState::CountingDown { .. } | BoothState::Capturing)
    }
}

impl fmt::Display for BoothState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoothState::Idle => write!(f, "idle"),
            BoothState::CountingDown { remaining } => write!(f, "countdown {}", remaining),
            BoothState::Capturing => write!(f, "capturing"),
            BoothState::PreviewActive { seconds_left } => write!(f, "preview {}s", seconds_left),
        }
    }
}

/// Commands accepted by the orchestrator
#[derive(Debug, Clone)]
pub enum Message {
    /// Begin the countdown
    StartCapture,
    /// One second elapsed
    Tick,
    /// Leave the preview and count down again
    Retake,
    /// Close the preview, keeping the photo
    Dismiss,
    /// Cancel whatever is running and return to idle
    Abort,
    DeletePhoto(PhotoId),
    UpdateFilters(PhotoId, FilterParameters),
    ApplyPreset(PhotoId, String),
    UpdateProps(PhotoId, Vec<PhotoProp>),
    /// Stop the event loop
    Shutdown,
}

/// Result of one capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A photo was committed to the store
    Saved {
        photo_id: PhotoId,
        processed: bool,
        /// Compositing, an overlay or the thumbnail fell back
        degraded: bool,
    },
    /// No still was acquired; nothing was stored
    Aborted,
}

/// Capture counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureStats {
    pub attempts: u32,
    pub saved: u32,
    pub aborted: u32,
    pub degraded: u32,
    /// Degraded captures in a row, reset by a clean capture
    pub consecutive_degraded: u32,
}
