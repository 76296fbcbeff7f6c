// SPDX-License-Identifier: GPL-3.0-only

//! Async photo pipeline
//!
//! ```text
//! Camera Backend → Capture → Compositing → Encoding → Thumbnail
//!                               ↓
//!                  Filters + Props (editing, on demand)
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Capture**: Grab an encoded still from the camera backend
//! 2. **Compositing**: Flatten the enabled overlay stack onto the still
//! 3. **Encoding**: JPEG at composite quality
//! 4. **Thumbnail**: Bounded JPEG preview
//!
//! Every CPU-bound stage runs on the blocking pool so the orchestrator's
//! timer keeps ticking.

pub mod asset;
pub mod capture;
pub mod compositor;
pub mod encoding;
pub mod filters;
pub mod thumbnail;

pub use asset::ImageAsset;
pub use capture::PhotoCapture;
pub use compositor::{Composite, Compositor, Overlay, has_enabled_overlays};
pub use encoding::{EncodedImage, EncodingFormat, EncodingQuality, PhotoEncoder};
pub use filters::{FilterChain, FilterField, FilterOp, FilterParameters, FilterPreset, PRESETS, find_preset};
pub use thumbnail::{ThumbnailSpec, generate_thumbnail, thumbnail_dimensions};

use crate::backends::camera::RawImage;
use crate::errors::PhotoError;
use crate::props::{self, PropLayer};
use tracing::{debug, info};

/// Output of the compositing stage
#[derive(Debug, Clone)]
pub struct ComposedPhoto {
    pub image: EncodedImage,
    /// Overlays drawn into the image
    pub applied: usize,
    /// Enabled overlays that could not be loaded
    pub skipped: Vec<String>,
}

/// Complete photo pipeline
pub struct PhotoPipeline {
    thumbnail: ThumbnailSpec,
    quality: EncodingQuality,
}

impl Default for PhotoPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoPipeline {
    /// Create a pipeline with default thumbnail bounds and composite quality
    pub fn new() -> Self {
        Self {
            thumbnail: ThumbnailSpec::default(),
            quality: EncodingQuality::High,
        }
    }

    /// Create a pipeline with custom thumbnail settings
    pub fn with_thumbnail(thumbnail: ThumbnailSpec) -> Self {
        Self {
            thumbnail,
            quality: EncodingQuality::High,
        }
    }

    pub fn thumbnail_spec(&self) -> &ThumbnailSpec {
        &self.thumbnail
    }

    /// Decode the still, flatten `overlays` onto it and re-encode
    ///
    /// When no overlay could be drawn the still is kept as captured.
    pub async fn compose(&self, raw: &RawImage, overlays: Vec<Overlay>) -> Result<ComposedPhoto, PhotoError> {
        let untouched = EncodedImage::from_raw(raw);
        let quality = self.quality;

        let composed = tokio::task::spawn_blocking(move || {
            let base = untouched.decode()?;
            let composite = Compositor::compose(&base, &overlays);
            let image = if composite.applied == 0 {
                untouched
            } else {
                PhotoEncoder::encode_jpeg(&composite.image, quality)?
            };
            Ok::<_, PhotoError>(ComposedPhoto {
                image,
                applied: composite.applied,
                skipped: composite.skipped,
            })
        })
        .await??;

        info!(
            applied = composed.applied,
            skipped = composed.skipped.len(),
            size = composed.image.len(),
            "Composite ready"
        );
        Ok(composed)
    }

    /// Produce a thumbnail of `image`
    pub async fn thumbnail(&self, image: &EncodedImage) -> Result<EncodedImage, PhotoError> {
        let source = image.clone();
        let spec = self.thumbnail;
        let thumb =
            tokio::task::spawn_blocking(move || generate_thumbnail(&source, &spec)).await??;
        debug!(size = thumb.len(), dimensions = ?thumb.dimensions, "Thumbnail ready");
        Ok(thumb)
    }

    /// Bake `filters` and the props in `layer` into a new image
    ///
    /// The input is left untouched; callers decide whether to replace the
    /// stored photo with the result.
    pub async fn render(
        &self,
        image: &EncodedImage,
        filters: FilterParameters,
        layer: PropLayer,
        format: EncodingFormat,
    ) -> Result<EncodedImage, PhotoError> {
        let source = image.clone();
        let quality = self.quality;

        tokio::task::spawn_blocking(move || {
            let base = source.decode()?;
            let rendered = props::render_edit(&base, &filters, &layer);
            PhotoEncoder::encode(&rendered, format, quality)
        })
        .await?
    }
}
