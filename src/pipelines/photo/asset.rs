// SPDX-License-Identifier: GPL-3.0-only

//! Image asset references for overlays and props

use crate::errors::PhotoError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Where an overlay or prop image comes from
///
/// Configuration files only ever carry `File` references. `Memory` exists for
/// assets generated at runtime and is never serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAsset {
    File(PathBuf),
    #[serde(skip)]
    Memory(Arc<[u8]>),
}

impl ImageAsset {
    /// Decode the asset into RGBA pixels
    pub fn load(&self) -> Result<RgbaImage, PhotoError> {
        let decoded = match self {
            ImageAsset::File(path) => image::open(path).map_err(|e| {
                PhotoError::AssetUnavailable(format!("{}: {}", path.display(), e))
            })?,
            ImageAsset::Memory(bytes) => image::load_from_memory(bytes)
                .map_err(|e| PhotoError::AssetUnavailable(e.to_string()))?,
        };
        Ok(decoded.to_rgba8())
    }

    /// Natural pixel size without decoding the whole image
    pub fn dimensions(&self) -> Result<(u32, u32), PhotoError> {
        let unavailable = |e: &dyn std::fmt::Display| PhotoError::AssetUnavailable(e.to_string());
        match self {
            ImageAsset::File(path) => image::image_dimensions(path).map_err(|e| unavailable(&e)),
            ImageAsset::Memory(bytes) => image::ImageReader::new(std::io::Cursor::new(&bytes[..]))
                .with_guessed_format()
                .map_err(|e| unavailable(&e))?
                .into_dimensions()
                .map_err(|e| unavailable(&e)),
        }
    }
}

impl std::fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageAsset::File(path) => write!(f, "File({})", path.display()),
            ImageAsset::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

impl PartialEq for ImageAsset {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ImageAsset::File(a), ImageAsset::File(b)) => a == b,
            (ImageAsset::Memory(a), ImageAsset::Memory(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl From<PathBuf> for ImageAsset {
    fn from(path: PathBuf) -> Self {
        ImageAsset::File(path)
    }
}
