// SPDX-License-Identifier: GPL-3.0-only

//! Overlay compositing
//!
//! Flattens a base photo and an ordered overlay stack into one image. Each
//! enabled overlay defines its own canvas: the working image is cover-fitted
//! (scaled by the larger axis ratio and centered) onto that canvas and the
//! overlay is drawn unscaled on top. The result feeds the next overlay.

use super::asset::ImageAsset;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

fn default_enabled() -> bool {
    true
}

/// A full-bleed decorative frame applied at capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub id: String,
    pub name: String,
    pub asset: ImageAsset,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Overlay {
    pub fn new(id: impl Into<String>, name: impl Into<String>, asset: ImageAsset) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            asset,
            enabled: true,
        }
    }
}

/// Whether any overlay in the stack would participate in compositing
pub fn has_enabled_overlays(overlays: &[Overlay]) -> bool {
    overlays.iter().any(|o| o.enabled)
}

/// Result of flattening an overlay stack
#[derive(Debug)]
pub struct Composite {
    pub image: RgbaImage,
    /// Number of overlays actually drawn
    pub applied: usize,
    /// Ids of enabled overlays whose asset could not be loaded
    pub skipped: Vec<String>,
}

/// Overlay compositor
pub struct Compositor;

impl Compositor {
    /// Flatten `base` with the enabled members of `overlays`, in order
    ///
    /// An overlay whose asset fails to load is skipped and the previous
    /// working image carries on. With no enabled overlays the base is
    /// returned unchanged.
    pub fn compose(base: &RgbaImage, overlays: &[Overlay]) -> Composite {
        let mut working = base.clone();
        let mut applied = 0;
        let mut skipped = Vec::new();

        for overlay in overlays.iter().filter(|o| o.enabled) {
            match overlay.asset.load() {
                Ok(layer) => {
                    working = Self::draw_layer(&working, &layer);
                    applied += 1;
                    debug!(overlay = %overlay.id, "Overlay applied");
                }
                Err(e) => {
                    warn!(overlay = %overlay.id, error = %e, "Skipping overlay");
                    skipped.push(overlay.id.clone());
                }
            }
        }

        Composite {
            image: working,
            applied,
            skipped,
        }
    }

    /// Cover-fit `image` onto a canvas the size of `layer`, then draw `layer`
    pub fn draw_layer(image: &RgbaImage, layer: &RgbaImage) -> RgbaImage {
        let (cw, ch) = layer.dimensions();
        let mut canvas = RgbaImage::new(cw, ch);

        let (w, h) = image.dimensions();
        if w > 0 && h > 0 {
            let (nw, nh) = cover_size((w, h), (cw, ch));
            let scaled = if (nw, nh) == (w, h) {
                image.clone()
            } else {
                imageops::resize(image, nw, nh, FilterType::Triangle)
            };
            let x = (i64::from(cw) - i64::from(nw)) / 2;
            let y = (i64::from(ch) - i64::from(nh)) / 2;
            imageops::overlay(&mut canvas, &scaled, x, y);
        }

        imageops::overlay(&mut canvas, layer, 0, 0);
        canvas
    }
}

/// Size of `image` scaled by the larger of the two canvas/image ratios
pub fn cover_size(image: (u32, u32), canvas: (u32, u32)) -> (u32, u32) {
    let (w, h) = (image.0.max(1) as f64, image.1.max(1) as f64);
    let scale = (canvas.0 as f64 / w).max(canvas.1 as f64 / h);
    (
        ((w * scale).round() as u32).max(1),
        ((h * scale).round() as u32).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::Arc;

    fn png_asset(img: &RgbaImage) -> ImageAsset {
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        ImageAsset::Memory(Arc::from(bytes))
    }

    #[test]
    fn test_cover_size() {
        assert_eq!(cover_size((100, 50), (200, 200)), (400, 200));
        assert_eq!(cover_size((300, 600), (100, 100)), (100, 200));
        assert_eq!(cover_size((10, 10), (10, 10)), (10, 10));
    }

    #[test]
    fn test_empty_stack_is_identity() {
        let base = RgbaImage::from_pixel(5, 3, Rgba([9, 8, 7, 255]));
        let composite = Compositor::compose(&base, &[]);
        assert_eq!(composite.image, base);
        assert_eq!(composite.applied, 0);
    }

    #[test]
    fn test_disabled_overlays_are_ignored() {
        let base = RgbaImage::from_pixel(5, 3, Rgba([9, 8, 7, 255]));
        let mut overlay = Overlay::new("frame", "Frame", png_asset(&RgbaImage::new(20, 20)));
        overlay.enabled = false;
        assert!(!has_enabled_overlays(std::slice::from_ref(&overlay)));

        let composite = Compositor::compose(&base, &[overlay]);
        assert_eq!(composite.image, base);
    }

    #[test]
    fn test_overlay_sets_canvas_and_draws_on_top() {
        let base = RgbaImage::from_pixel(10, 5, Rgba([255, 0, 0, 255]));
        let mut frame = RgbaImage::new(8, 8);
        frame.put_pixel(0, 0, Rgba([0, 0, 255, 255]));

        let composite = Compositor::compose(&base, &[Overlay::new("f", "F", png_asset(&frame))]);
        assert_eq!(composite.image.dimensions(), (8, 8));
        assert_eq!(composite.applied, 1);
        assert_eq!(composite.image.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(composite.image.get_pixel(4, 4).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_unloadable_overlay_is_skipped() {
        let base = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let broken = Overlay::new(
            "missing",
            "Missing",
            ImageAsset::File("/nonexistent/overlay.png".into()),
        );
        let good = Overlay::new("good", "Good", png_asset(&RgbaImage::new(6, 6)));

        let composite = Compositor::compose(&base, &[broken, good]);
        assert_eq!(composite.applied, 1);
        assert_eq!(composite.skipped, vec!["missing".to_string()]);
        assert_eq!(composite.image.dimensions(), (6, 6));
    }

    #[test]
    fn test_stack_order_matters() {
        let base = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let blue = Rgba([0, 0, 255, 255]);
        let green = Rgba([0, 255, 0, 255]);

        // Square frame with a blue top edge, wide frame with a green right edge
        let square = RgbaImage::from_fn(8, 8, |_, y| if y == 0 { blue } else { Rgba([0, 0, 0, 0]) });
        let wide = RgbaImage::from_fn(12, 6, |x, _| if x == 11 { green } else { Rgba([0, 0, 0, 0]) });
        let a = Overlay::new("square", "Square", png_asset(&square));
        let b = Overlay::new("wide", "Wide", png_asset(&wide));

        // Square first: its edge is cropped away when covering the wide canvas
        let ab = Compositor::compose(&base, &[a.clone(), b.clone()]);
        assert_eq!(ab.applied, 2);
        assert_eq!(ab.image.dimensions(), (12, 6));
        assert_eq!(*ab.image.get_pixel(11, 3), green);
        assert!(ab.image.pixels().all(|p| p.0[2] < 128));

        let ba = Compositor::compose(&base, &[b, a]);
        assert_eq!(ba.applied, 2);
        assert_eq!(ba.image.dimensions(), (8, 8));
        assert_eq!(*ba.image.get_pixel(4, 0), blue);
        assert!(ba.image.pixels().all(|p| p.0[1] < 128));
    }
}
