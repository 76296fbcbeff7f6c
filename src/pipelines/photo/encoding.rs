// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding and decoding
//!
//! Composites and thumbnails are stored as JPEG. PNG is available for
//! lossless exports from the CLI.

use crate::backends::camera::RawImage;
use crate::errors::PhotoError;
use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }

    /// Pick a format from an output path, defaulting to JPEG
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => EncodingFormat::Png,
            _ => EncodingFormat::Jpeg,
        }
    }
}

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingQuality {
    /// Thumbnail quality
    Preview,
    /// Composite quality
    High,
    /// Explicit JPEG quality (1-100)
    Custom(u8),
}

impl EncodingQuality {
    /// Get JPEG quality value (1-100)
    pub fn jpeg_quality(&self) -> u8 {
        use crate::constants::encoding;
        match self {
            EncodingQuality::Preview => encoding::THUMBNAIL_QUALITY,
            EncodingQuality::High => encoding::COMPOSITE_QUALITY,
            EncodingQuality::Custom(q) => (*q).clamp(1, 100),
        }
    }
}

/// An encoded image held in memory
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, PartialEq)]
pub struct EncodedImage {
    pub data: Arc<[u8]>,
    pub format: ImageFormat,
    /// Pixel size when known without decoding
    pub dimensions: Option<(u32, u32)>,
}

impl EncodedImage {
    /// Reuse a camera still as-is
    pub fn from_raw(raw: &RawImage) -> Self {
        Self {
            data: Arc::clone(&raw.data),
            format: raw.format,
            dimensions: None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File extension matching the container format
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    /// Decode to RGBA pixels
    pub fn decode(&self) -> Result<RgbaImage, PhotoError> {
        PhotoEncoder::decode(&self.data)
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("format", &self.format)
            .field("dimensions", &self.dimensions)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Photo encoder
pub struct PhotoEncoder;

impl PhotoEncoder {
    /// Encode RGBA pixels in the requested format
    pub fn encode(
        image: &RgbaImage,
        format: EncodingFormat,
        quality: EncodingQuality,
    ) -> Result<EncodedImage, PhotoError> {
        match format {
            EncodingFormat::Jpeg => Self::encode_jpeg(image, quality),
            EncodingFormat::Png => Self::encode_png(image),
        }
    }

    /// Encode image as JPEG
    ///
    /// JPEG has no alpha channel; pixels are flattened to RGB as-is.
    pub fn encode_jpeg(image: &RgbaImage, quality: EncodingQuality) -> Result<EncodedImage, PhotoError> {
        let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
        let mut buffer = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buffer,
            quality.jpeg_quality(),
        );

        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

        debug!(
            width = rgb.width(),
            height = rgb.height(),
            size = buffer.len(),
            "JPEG encoded"
        );
        Ok(EncodedImage {
            data: buffer.into(),
            format: ImageFormat::Jpeg,
            dimensions: Some(rgb.dimensions()),
        })
    }

    /// Encode image as PNG
    pub fn encode_png(image: &RgbaImage) -> Result<EncodedImage, PhotoError> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| PhotoError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;

        Ok(EncodedImage {
            data: buffer.into(),
            format: ImageFormat::Png,
            dimensions: Some(image.dimensions()),
        })
    }

    /// Decode encoded bytes to RGBA pixels
    pub fn decode(data: &[u8]) -> Result<RgbaImage, PhotoError> {
        let image = image::load_from_memory(data)
            .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?;
        Ok(image.to_rgba8())
    }

    /// Write an encoded image to `path`, creating parent directories
    pub fn save(encoded: &EncodedImage, path: &Path) -> Result<PathBuf, PhotoError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &encoded.data)?;
        info!(path = %path.display(), size = encoded.len(), "Image saved");
        Ok(path.to_path_buf())
    }
}
