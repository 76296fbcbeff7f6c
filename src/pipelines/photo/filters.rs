// SPDX-License-Identifier: GPL-3.0-only

//! Filter engine
//!
//! [`FilterParameters`] describe a photo's look. They turn into a
//! [`FilterChain`]: an ordered list of operations applied as
//! brightness → contrast → saturate → sepia → grayscale → blur.
//! The order is fixed; the colour operations always run before blur.
//!
//! Colour operations use the Filter Effects matrices on gamma-encoded sRGB
//! values in `0.0..=1.0`, clamping after every step. Alpha is left alone.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// One adjustable filter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Brightness,
    Contrast,
    Saturation,
    Sepia,
    Grayscale,
    Blur,
}

impl FilterField {
    /// All fields in application order
    pub const ALL: [FilterField; 6] = [
        FilterField::Brightness,
        FilterField::Contrast,
        FilterField::Saturation,
        FilterField::Sepia,
        FilterField::Grayscale,
        FilterField::Blur,
    ];

    /// Valid range for this field
    pub fn range(&self) -> RangeInclusive<f32> {
        match self {
            FilterField::Brightness | FilterField::Contrast | FilterField::Saturation => 0.0..=2.0,
            FilterField::Sepia | FilterField::Grayscale => 0.0..=1.0,
            FilterField::Blur => 0.0..=10.0,
        }
    }

    /// Value that leaves the image unchanged
    pub fn identity(&self) -> f32 {
        match self {
            FilterField::Brightness | FilterField::Contrast | FilterField::Saturation => 1.0,
            FilterField::Sepia | FilterField::Grayscale | FilterField::Blur => 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterField::Brightness => "brightness",
            FilterField::Contrast => "contrast",
            FilterField::Saturation => "saturation",
            FilterField::Sepia => "sepia",
            FilterField::Grayscale => "grayscale",
            FilterField::Blur => "blur",
        }
    }

    /// Clamp `value` into range; non-finite input falls back to identity
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.identity();
        }
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }
}

/// Filter values attached to a photo
///
/// The default is the identity look. Setting a single field clears
/// [`FilterParameters::preset`]; applying a preset overwrites every numeric
/// field and records its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParameters {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub sepia: f32,
    pub grayscale: f32,
    /// Blur radius in pixels
    pub blur: f32,
    /// Name of the preset these values came from, if untouched since
    pub preset: Option<String>,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sepia: 0.0,
            grayscale: 0.0,
            blur: 0.0,
            preset: None,
        }
    }
}

impl FilterParameters {
    /// Identity filters (no visible change)
    pub fn identity() -> Self {
        Self::default()
    }

    /// Whether every numeric field is at its identity value
    pub fn is_identity(&self) -> bool {
        FilterField::ALL
            .iter()
            .all(|field| self.get(*field) == field.identity())
    }

    /// Values taken from a preset, with the preset tag set
    pub fn from_preset(preset: &FilterPreset) -> Self {
        let mut params = Self::default();
        params.apply_preset(preset);
        params
    }

    pub fn get(&self, field: FilterField) -> f32 {
        match field {
            FilterField::Brightness => self.brightness,
            FilterField::Contrast => self.contrast,
            FilterField::Saturation => self.saturation,
            FilterField::Sepia => self.sepia,
            FilterField::Grayscale => self.grayscale,
            FilterField::Blur => self.blur,
        }
    }

    /// Manually adjust one field
    ///
    /// The value is clamped to the field's range and the preset tag is
    /// cleared. Other fields keep their current values.
    pub fn set(&mut self, field: FilterField, value: f32) {
        let value = field.clamp(value);
        match field {
            FilterField::Brightness => self.brightness = value,
            FilterField::Contrast => self.contrast = value,
            FilterField::Saturation => self.saturation = value,
            FilterField::Sepia => self.sepia = value,
            FilterField::Grayscale => self.grayscale = value,
            FilterField::Blur => self.blur = value,
        }
        self.preset = None;
    }

    /// Copy with one field adjusted
    pub fn with(&self, field: FilterField, value: f32) -> Self {
        let mut next = self.clone();
        next.set(field, value);
        next
    }

    /// Overwrite all numeric fields from `preset` and tag it
    pub fn apply_preset(&mut self, preset: &FilterPreset) {
        self.brightness = preset.brightness;
        self.contrast = preset.contrast;
        self.saturation = preset.saturation;
        self.sepia = preset.sepia;
        self.grayscale = preset.grayscale;
        self.blur = preset.blur;
        self.preset = Some(preset.name.to_string());
    }

    /// Clamp every field into range, keeping the preset tag
    pub fn sanitized(&self) -> Self {
        let mut next = self.clone();
        next.brightness = FilterField::Brightness.clamp(self.brightness);
        next.contrast = FilterField::Contrast.clamp(self.contrast);
        next.saturation = FilterField::Saturation.clamp(self.saturation);
        next.sepia = FilterField::Sepia.clamp(self.sepia);
        next.grayscale = FilterField::Grayscale.clamp(self.grayscale);
        next.blur = FilterField::Blur.clamp(self.blur);
        next
    }

    /// Ordered operation chain for rendering
    pub fn chain(&self) -> FilterChain {
        let p = self.sanitized();
        FilterChain {
            ops: vec![
                FilterOp::Brightness(p.brightness),
                FilterOp::Contrast(p.contrast),
                FilterOp::Saturate(p.saturation),
                FilterOp::Sepia(p.sepia),
                FilterOp::Grayscale(p.grayscale),
                FilterOp::Blur(p.blur),
            ],
        }
    }
}

/// A named bundle of filter values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterPreset {
    pub name: &'static str,
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub sepia: f32,
    pub grayscale: f32,
    pub blur: f32,
}

const fn preset(
    name: &'static str,
    brightness: f32,
    contrast: f32,
    saturation: f32,
    sepia: f32,
    grayscale: f32,
    blur: f32,
) -> FilterPreset {
    FilterPreset {
        name,
        brightness,
        contrast,
        saturation,
        sepia,
        grayscale,
        blur,
    }
}

/// Built-in presets, in menu order
pub const PRESETS: [FilterPreset; 8] = [
    preset("Normal", 1.0, 1.0, 1.0, 0.0, 0.0, 0.0),
    preset("Vintage", 1.1, 0.9, 0.8, 0.3, 0.1, 0.0),
    preset("B&W", 1.0, 1.2, 0.0, 0.0, 1.0, 0.0),
    preset("Warm", 1.1, 1.1, 1.2, 0.2, 0.0, 0.0),
    preset("Cool", 1.0, 1.1, 0.9, 0.0, 0.1, 0.0),
    preset("Sharp", 1.1, 1.3, 1.1, 0.0, 0.0, 0.0),
    preset("Soft", 1.1, 0.9, 0.9, 0.1, 0.0, 1.5),
    preset("Drama", 1.1, 1.4, 1.2, 0.0, 0.1, 0.0),
];

/// Look up a preset by name, ignoring case and non-alphanumerics
/// (so `"bw"` finds `"B&W"`)
pub fn find_preset(name: &str) -> Option<&'static FilterPreset> {
    let key = |s: &str| -> String {
        s.chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect()
    };
    let wanted = key(name);
    PRESETS.iter().find(|p| key(p.name) == wanted)
}

/// One rendering step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Sepia(f32),
    Grayscale(f32),
    /// Gaussian blur, radius in pixels
    Blur(f32),
}

type Matrix = [[f32; 3]; 3];

impl FilterOp {
    /// Whether this step leaves pixels unchanged
    pub fn is_identity(&self) -> bool {
        match *self {
            FilterOp::Brightness(v) | FilterOp::Contrast(v) | FilterOp::Saturate(v) => v == 1.0,
            FilterOp::Sepia(v) | FilterOp::Grayscale(v) | FilterOp::Blur(v) => v == 0.0,
        }
    }

    fn saturate_matrix(s: f32) -> Matrix {
        [
            [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
        ]
    }

    fn sepia_matrix(amount: f32) -> Matrix {
        let k = 1.0 - amount.clamp(0.0, 1.0);
        [
            [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
            [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
            [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
        ]
    }

    fn grayscale_matrix(amount: f32) -> Matrix {
        let k = 1.0 - amount.clamp(0.0, 1.0);
        [
            [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
            [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
            [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
        ]
    }

    /// Apply a colour step to one normalized RGB triple
    fn apply_color(&self, rgb: [f32; 3]) -> [f32; 3] {
        let out = match *self {
            FilterOp::Brightness(b) => rgb.map(|c| c * b),
            FilterOp::Contrast(k) => rgb.map(|c| (c - 0.5) * k + 0.5),
            FilterOp::Saturate(s) => mul(&Self::saturate_matrix(s), rgb),
            FilterOp::Sepia(a) => mul(&Self::sepia_matrix(a), rgb),
            FilterOp::Grayscale(a) => mul(&Self::grayscale_matrix(a), rgb),
            FilterOp::Blur(_) => rgb,
        };
        out.map(|c| c.clamp(0.0, 1.0))
    }
}

fn mul(m: &Matrix, rgb: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * rgb[0] + m[0][1] * rgb[1] + m[0][2] * rgb[2],
        m[1][0] * rgb[0] + m[1][1] * rgb[1] + m[1][2] * rgb[2],
        m[2][0] * rgb[0] + m[2][1] * rgb[1] + m[2][2] * rgb[2],
    ]
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Brightness(v) => write!(f, "brightness({})", v),
            FilterOp::Contrast(v) => write!(f, "contrast({})", v),
            FilterOp::Saturate(v) => write!(f, "saturate({})", v),
            FilterOp::Sepia(v) => write!(f, "sepia({})", v),
            FilterOp::Grayscale(v) => write!(f, "grayscale({})", v),
            FilterOp::Blur(v) => write!(f, "blur({}px)", v),
        }
    }
}

/// Ordered filter operations
///
/// `Display` renders the CSS `filter` property value.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    ops: Vec<FilterOp>,
}

impl FilterChain {
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(FilterOp::is_identity)
    }

    /// Render the chain onto a copy of `image`
    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        let color_ops: Vec<FilterOp> = self
            .ops
            .iter()
            .copied()
            .filter(|op| !matches!(op, FilterOp::Blur(_)) && !op.is_identity())
            .collect();

        let mut out = image.clone();
        if !color_ops.is_empty() {
            for pixel in out.pixels_mut() {
                let Rgba([r, g, b, a]) = *pixel;
                let mut rgb = [r, g, b].map(|c| c as f32 / 255.0);
                for op in &color_ops {
                    rgb = op.apply_color(rgb);
                }
                let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
                *pixel = Rgba([r, g, b, a]);
            }
        }

        let blur = self.ops.iter().find_map(|op| match op {
            FilterOp::Blur(radius) if *radius > 0.0 => Some(*radius),
            _ => None,
        });
        match blur {
            Some(radius) => image::imageops::blur(&out, radius),
            None => out,
        }
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}
