// SPDX-License-Identifier: GPL-3.0-only

//! Thumbnail generation
//!
//! Only the longer side is bounded: a landscape image is limited by
//! `max_width`, anything else by `max_height`. Images already within the
//! bound keep their size.

use super::encoding::{EncodedImage, EncodingQuality, PhotoEncoder};
use crate::errors::PhotoError;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::debug;

/// Bounds and quality for generated thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: EncodingQuality,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        use crate::constants::thumbnail;
        Self {
            max_width: thumbnail::MAX_WIDTH,
            max_height: thumbnail::MAX_HEIGHT,
            quality: EncodingQuality::Preview,
        }
    }
}

/// Output size for a `width`×`height` image
pub fn thumbnail_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scaled = |side: u32, num: u32, den: u32| -> u32 {
        ((side as f64 * num as f64 / den as f64).round() as u32).max(1)
    };

    if width > height {
        if width > max_width {
            return (max_width.max(1), scaled(height, max_width, width));
        }
    } else if height > max_height {
        return (scaled(width, max_height, height), max_height.max(1));
    }
    (width, height)
}

/// Resize decoded pixels to thumbnail size
pub fn resize_to_thumbnail(image: &RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let (tw, th) = thumbnail_dimensions(w, h, max_width, max_height);
    if (tw, th) == (w, h) {
        return image.clone();
    }
    imageops::resize(image, tw, th, FilterType::Triangle)
}

/// Decode `source`, shrink it and encode as JPEG
pub fn generate_thumbnail(source: &EncodedImage, spec: &ThumbnailSpec) -> Result<EncodedImage, PhotoError> {
    let image = source.decode()?;
    let thumb = resize_to_thumbnail(&image, spec.max_width, spec.max_height);
    debug!(
        from_width = image.width(),
        from_height = image.height(),
        width = thumb.width(),
        height = thumb.height(),
        "Thumbnail generated"
    );
    PhotoEncoder::encode_jpeg(&thumb, spec.quality)
}
