// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Capture sequence timing
pub mod timing {
    use super::Duration;

    /// Countdown length before the shutter fires
    pub const COUNTDOWN_SECS: u32 = 5;

    /// Lighting settle delay between activation and acquisition
    pub const LIGHT_SETTLE_DELAY_MS: u64 = 100;

    /// How long a fresh capture stays on screen before auto-dismiss
    pub const PREVIEW_SECS: u32 = 20;

    /// Period of the orchestrator's single timer
    pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
}

/// Thumbnail generation defaults
pub mod thumbnail {
    /// Maximum thumbnail width for the capture preview
    pub const MAX_WIDTH: u32 = 800;

    /// Maximum thumbnail height for the capture preview
    pub const MAX_HEIGHT: u32 = 1200;

    /// Default bound used when no explicit size is requested
    pub const GALLERY_MAX_WIDTH: u32 = 400;

    /// Default bound used when no explicit size is requested
    pub const GALLERY_MAX_HEIGHT: u32 = 600;
}

/// JPEG quality values (0-100)
pub mod encoding {
    /// Quality of the flattened composite
    pub const COMPOSITE_QUALITY: u8 = 95;

    /// Quality of generated thumbnails
    pub const THUMBNAIL_QUALITY: u8 = 80;
}

/// Overlay canvas defaults
pub mod processing {
    /// Default print canvas width (2x3 portrait at 600 dpi)
    pub const DEFAULT_CANVAS_WIDTH: u32 = 1200;

    /// Default print canvas height
    pub const DEFAULT_CANVAS_HEIGHT: u32 = 1800;
}

/// Prop placement and transform limits
pub mod props {
    /// Minimum prop scale
    pub const MIN_SCALE: f32 = 0.5;

    /// Maximum prop scale
    pub const MAX_SCALE: f32 = 2.0;

    /// Rendered prop images are fitted into a square of this edge length
    pub const MAX_RENDER_EDGE: u32 = 200;

    /// Initial placement of a newly added prop
    pub const INITIAL_X: f32 = 50.0;

    /// Initial placement of a newly added prop
    pub const INITIAL_Y: f32 = 50.0;

    /// Rotation step of the rotate control
    pub const ROTATE_STEP_DEGREES: f32 = 90.0;

    /// Scale step of the zoom controls
    pub const SCALE_STEP: f32 = 0.1;
}

/// Capture health tracking
pub mod capture {
    /// Consecutive degraded captures before the operator is alerted in the log
    pub const DEGRADED_ALERT_THRESHOLD: u32 = 3;
}

/// Sysfs LED discovery
pub mod lighting {
    /// Directory scanned for LED class devices
    pub const LEDS_DIR: &str = "/sys/class/leds";

    /// Suffixes of LED entries we treat as booth lights
    pub const LED_SUFFIXES: &[&str] = &[":flash", ":torch", ":booth"];
}

/// Supported file formats for the file camera source
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}
