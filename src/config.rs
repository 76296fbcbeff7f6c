// SPDX-License-Identifier: GPL-3.0-only

//! Booth configuration
//!
//! A read-only snapshot loaded before the booth starts. Every section carries
//! `#[serde(default)]`, so a partial JSON file fills the missing fields from
//! the typed defaults.

use crate::backends::camera::CameraSettings;
use crate::backends::lighting::LightingSettings;
use crate::constants::{encoding, processing, thumbnail, timing};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::{EncodingQuality, Overlay, ThumbnailSpec};
use crate::props::PropItem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Capture-time image processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Overlay stack, drawn in order
    pub overlays: Vec<Overlay>,
    /// Print canvas that overlays are expected to match
    pub default_dimensions: Dimensions,
    /// Keep the uncomposited still when overlays were applied
    pub preserve_original: bool,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            overlays: Vec::new(),
            default_dimensions: Dimensions {
                width: processing::DEFAULT_CANVAS_WIDTH,
                height: processing::DEFAULT_CANVAS_HEIGHT,
            },
            preserve_original: false,
        }
    }
}

/// Prop library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PropsSettings {
    pub enabled: bool,
    pub items: Vec<PropItem>,
}

impl PropsSettings {
    /// Items offered for placement; none while props are disabled
    pub fn library(&self) -> &[PropItem] {
        if self.enabled { &self.items } else { &[] }
    }
}

/// Countdown, settle and preview timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureTiming {
    pub countdown_secs: u32,
    pub settle_delay_ms: u64,
    pub preview_secs: u32,
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self {
            countdown_secs: timing::COUNTDOWN_SECS,
            settle_delay_ms: timing::LIGHT_SETTLE_DELAY_MS,
            preview_secs: timing::PREVIEW_SECS,
        }
    }
}

impl CaptureTiming {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Thumbnail bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSettings {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            max_width: thumbnail::MAX_WIDTH,
            max_height: thumbnail::MAX_HEIGHT,
            quality: encoding::THUMBNAIL_QUALITY,
        }
    }
}

impl From<ThumbnailSettings> for ThumbnailSpec {
    fn from(settings: ThumbnailSettings) -> Self {
        ThumbnailSpec {
            max_width: settings.max_width,
            max_height: settings.max_height,
            quality: EncodingQuality::Custom(settings.quality),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub camera: CameraSettings,
    pub lighting: LightingSettings,
    pub processing: ProcessingSettings,
    pub props: PropsSettings,
    pub timing: CaptureTiming,
    pub thumbnail: ThumbnailSettings,
    /// Archive directory; no archive is written when unset
    pub photos_dir: Option<PathBuf>,
}

impl Config {
    /// `~/.config/photobooth/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("photobooth").join("config.json"))
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)?;
        info!(path = %path.display(), overlays = config.processing.overlays.len(), "Config loaded");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> AppResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "No config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }
}
