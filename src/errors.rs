// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo booth

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Photo processing errors
    Photo(PhotoError),
    /// Auxiliary lighting errors
    Lighting(LightingError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Source is disabled or not connected
    NotConnected,
    /// Connecting to the source failed
    InitializationFailed(String),
    /// Source device could not be found
    DeviceNotFound(String),
    /// Source returned data in a format we cannot handle
    InvalidFormat(String),
    /// Underlying driver or helper process failed
    BackendError(String),
}

/// Photo processing errors
#[derive(Debug, Clone)]
pub enum PhotoError {
    /// No still available for capture
    NoFrameAvailable,
    /// Source image could not be decoded
    DecodeFailed(String),
    /// Overlay or prop asset could not be loaded
    AssetUnavailable(String),
    /// Encoding failed
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
    /// Background task was cancelled or panicked
    TaskFailed(String),
}

/// Auxiliary lighting errors
#[derive(Debug, Clone)]
pub enum LightingError {
    /// No controllable light was found
    NoDevice,
    /// Light exists but cannot be driven by this user
    PermissionDenied(String),
    /// Writing the light state failed
    WriteFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Lighting(e) => write!(f, "Lighting error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NotConnected => write!(f, "Camera not connected"),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            CameraError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoFrameAvailable => write!(f, "No frame available for capture"),
            PhotoError::DecodeFailed(msg) => write!(f, "Decode failed: {}", msg),
            PhotoError::AssetUnavailable(msg) => write!(f, "Asset unavailable: {}", msg),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
            PhotoError::TaskFailed(msg) => write!(f, "Processing task failed: {}", msg),
        }
    }
}

impl fmt::Display for LightingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightingError::NoDevice => write!(f, "No lighting device available"),
            LightingError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            LightingError::WriteFailed(msg) => write!(f, "Failed to set light state: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}
impl std::error::Error for LightingError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<LightingError> for AppError {
    fn from(err: LightingError) -> Self {
        AppError::Lighting(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => PhotoError::EncodingFailed(e.to_string()),
            other => PhotoError::DecodeFailed(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for PhotoError {
    fn from(err: tokio::task::JoinError) -> Self {
        PhotoError::TaskFailed(err.to_string())
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => CameraError::DeviceNotFound(err.to_string()),
            _ => CameraError::BackendError(err.to_string()),
        }
    }
}

impl From<std::io::Error> for LightingError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => LightingError::PermissionDenied(err.to_string()),
            _ => LightingError::WriteFailed(err.to_string()),
        }
    }
}
