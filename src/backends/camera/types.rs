// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Result type for camera backend operations
pub type BackendResult<T> = Result<T, CameraError>;

/// An encoded still straight from a camera source
///
/// The bytes are whatever the source produced (usually JPEG). The orchestrator
/// consumes a `RawImage` once and does not keep it after compositing.
#[derive(Clone)]
pub struct RawImage {
    /// Encoded image bytes
    pub data: Arc<[u8]>,
    /// Container format detected from the bytes
    pub format: image::ImageFormat,
    /// When the still was acquired
    pub captured_at: Instant,
}

impl RawImage {
    /// Wrap encoded bytes, sniffing the container format
    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> BackendResult<Self> {
        let data = data.into();
        let format = image::guess_format(&data)
            .map_err(|e| CameraError::InvalidFormat(e.to_string()))?;
        Ok(Self {
            data,
            format,
            captured_at: Instant::now(),
        })
    }

    /// Length of the encoded data in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the still carries no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for RawImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawImage({:?}, {} bytes)", self.format, self.data.len())
    }
}

/// Which camera source the booth captures from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraSource {
    /// USB webcam via V4L2
    #[default]
    Webcam,
    /// Tethered DSLR via gphoto2
    Dslr,
    /// Raspberry Pi camera module via rpicam-still / libcamera-still
    PiCamera,
    /// Image file or directory of images
    File,
}

impl CameraSource {
    /// All sources for listing in the CLI
    pub const ALL: [CameraSource; 4] = [
        CameraSource::Webcam,
        CameraSource::Dslr,
        CameraSource::PiCamera,
        CameraSource::File,
    ];
}

impl std::fmt::Display for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSource::Webcam => write!(f, "webcam"),
            CameraSource::Dslr => write!(f, "dslr"),
            CameraSource::PiCamera => write!(f, "picamera"),
            CameraSource::File => write!(f, "file"),
        }
    }
}

/// Capture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Which way a webcam faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front-facing (selfie)
    #[default]
    User,
    /// Rear-facing
    Environment,
}

/// Webcam source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebcamSettings {
    /// V4L2 device index (`/dev/videoN`)
    pub device_index: usize,
    pub resolution: Resolution,
    pub facing_mode: FacingMode,
    /// Frames discarded before the still so auto-exposure can settle
    pub warmup_frames: u32,
}

impl Default for WebcamSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: Resolution::new(1280, 720),
            facing_mode: FacingMode::User,
            warmup_frames: 3,
        }
    }
}

/// Tethered DSLR settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DslrSettings {
    pub enabled: bool,
    /// Camera model as reported by `gphoto2 --auto-detect`
    pub model: String,
    /// gphoto2 port, e.g. `usb:001,004`
    pub port: String,
    pub auto_focus: bool,
    pub iso: u32,
    /// Shutter speed, e.g. `1/125`
    pub shutter_speed: String,
    /// Aperture, e.g. `f/5.6`
    pub aperture: String,
    pub capture_preview: bool,
}

impl Default for DslrSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            model: String::new(),
            port: String::new(),
            auto_focus: true,
            iso: 400,
            shutter_speed: "1/125".to_string(),
            aperture: "f/5.6".to_string(),
            capture_preview: true,
        }
    }
}

/// Pi camera exposure program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExposureMode {
    #[default]
    Auto,
    Night,
    Backlight,
    Spotlight,
    Sports,
}

impl ExposureMode {
    /// Name understood by `rpicam-still --exposure`
    pub fn rpicam_name(&self) -> &'static str {
        match self {
            ExposureMode::Auto | ExposureMode::Backlight | ExposureMode::Spotlight => "normal",
            ExposureMode::Night => "long",
            ExposureMode::Sports => "sport",
        }
    }
}

/// Pi camera white balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AwbMode {
    #[default]
    Auto,
    Sunlight,
    Cloudy,
    Shade,
    Tungsten,
    Fluorescent,
}

impl AwbMode {
    /// Name understood by `rpicam-still --awb`
    pub fn rpicam_name(&self) -> &'static str {
        match self {
            AwbMode::Auto => "auto",
            AwbMode::Sunlight => "daylight",
            AwbMode::Cloudy | AwbMode::Shade => "cloudy",
            AwbMode::Tungsten => "tungsten",
            AwbMode::Fluorescent => "fluorescent",
        }
    }
}

/// Raspberry Pi camera module settings
///
/// Brightness is on a 0..=100 scale with 50 neutral; contrast, saturation
/// and sharpness are on -100..=100 with 0 neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiCameraSettings {
    pub enabled: bool,
    pub resolution: Resolution,
    pub framerate: u32,
    pub exposure: ExposureMode,
    pub awb: AwbMode,
    /// Sensor rotation in degrees (0, 90, 180, 270)
    pub rotation: u16,
    pub hflip: bool,
    pub vflip: bool,
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
    pub sharpness: i32,
}

impl Default for PiCameraSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            resolution: Resolution::new(2592, 1944),
            framerate: 30,
            exposure: ExposureMode::Auto,
            awb: AwbMode::Auto,
            rotation: 0,
            hflip: false,
            vflip: false,
            brightness: 50,
            contrast: 0,
            saturation: 0,
            sharpness: 0,
        }
    }
}

/// File source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileSourceSettings {
    /// Image file, or a directory whose images are served in name order
    pub path: Option<PathBuf>,
}

/// Camera configuration: the selected source plus per-source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CameraSettings {
    pub source: CameraSource,
    pub webcam: WebcamSettings,
    pub dslr: DslrSettings,
    pub picamera: PiCameraSettings,
    pub file: FileSourceSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_image_rejects_unknown_bytes() {
        assert!(RawImage::from_bytes(vec![0u8, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_raw_image_detects_png() {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let raw = RawImage::from_bytes(bytes).unwrap();
        assert_eq!(raw.format, image::ImageFormat::Png);
        assert!(!raw.is_empty());
    }

    #[test]
    fn test_camera_source_serde_names() {
        let json = serde_json::to_string(&CameraSource::PiCamera).unwrap();
        assert_eq!(json, "\"picamera\"");
        let parsed: CameraSource = serde_json::from_str("\"dslr\"").unwrap();
        assert_eq!(parsed, CameraSource::Dslr);
    }
}
