// SPDX-License-Identifier: GPL-3.0-only

//! Still source backed by image files
//!
//! Points at either a single image or a directory. Directories are scanned on
//! connect and their images served one per capture, in file name order,
//! wrapping around at the end.

use super::types::{BackendResult, FileSourceSettings, RawImage};
use super::CameraBackend;
use crate::constants::file_formats;
use crate::errors::CameraError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Camera backend that reads stills from disk
pub struct FileCamera {
    settings: FileSourceSettings,
    files: Vec<PathBuf>,
    next: usize,
    connected: bool,
}

impl FileCamera {
    pub fn new(settings: FileSourceSettings) -> Self {
        Self {
            settings,
            files: Vec::new(),
            next: 0,
            connected: false,
        }
    }

    /// Convenience constructor for a single path
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(FileSourceSettings {
            path: Some(path.into()),
        })
    }

    /// Number of images the source will cycle through
    pub fn image_count(&self) -> usize {
        self.files.len()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(file_formats::is_image_extension)
}

fn scan_directory(dir: &Path) -> BackendResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

impl CameraBackend for FileCamera {
    fn name(&self) -> &'static str {
        "file"
    }

    fn connect(&mut self) -> BackendResult<()> {
        let path = self.settings.path.clone().ok_or_else(|| {
            CameraError::InitializationFailed("No file source path configured".to_string())
        })?;

        self.files = if path.is_dir() {
            scan_directory(&path)?
        } else if path.is_file() {
            if !has_image_extension(&path) {
                return Err(CameraError::InvalidFormat(format!(
                    "Unsupported file type: {}",
                    path.display()
                )));
            }
            vec![path.clone()]
        } else {
            return Err(CameraError::DeviceNotFound(path.display().to_string()));
        };

        if self.files.is_empty() {
            warn!(path = %path.display(), "File source contains no images");
        }

        self.next = 0;
        self.connected = true;
        info!(path = %path.display(), images = self.files.len(), "File source connected");
        Ok(())
    }

    fn disconnect(&mut self) {
        self.files.clear();
        self.next = 0;
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn acquire_still(&mut self) -> BackendResult<Option<RawImage>> {
        if !self.connected {
            return Err(CameraError::NotConnected);
        }
        if self.files.is_empty() {
            return Ok(None);
        }

        let path = &self.files[self.next % self.files.len()];
        self.next = (self.next + 1) % self.files.len();

        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            debug!(path = %path.display(), "Empty image file");
            return Ok(None);
        }

        debug!(path = %path.display(), size = bytes.len(), "Read still from file");
        RawImage::from_bytes(bytes).map(Some)
    }
}
