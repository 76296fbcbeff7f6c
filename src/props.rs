// SPDX-License-Identifier: GPL-3.0-only

//! Prop layer model
//!
//! Props are decorative images placed on a photo while editing. They live in
//! container coordinates (the on-screen editing surface, top-left anchored)
//! and stay separate from the photo's pixels until [`render_edit`] or
//! [`PropLayer::merge_onto`] bakes them in.
//!
//! Every transform returns an updated [`PhotoProp`] rather than mutating in
//! place; [`PropLayer`] swaps the result into its list.

use crate::constants::props as limits;
use crate::errors::PhotoError;
use crate::pipelines::photo::{FilterParameters, ImageAsset};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A point in container coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A size in container coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Placement of a prop
///
/// `x`/`y` are the top-left corner of the unscaled box. Scale and rotation
/// are applied around the box center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropPosition {
    pub x: f32,
    pub y: f32,
    /// In `MIN_SCALE..=MAX_SCALE`
    pub scale: f32,
    /// Degrees clockwise, in `[0, 360)`
    pub rotation: f32,
}

impl Default for PropPosition {
    fn default() -> Self {
        Self {
            x: limits::INITIAL_X,
            y: limits::INITIAL_Y,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

/// A prop available in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropItem {
    pub id: String,
    pub name: String,
    pub asset: ImageAsset,
    #[serde(default)]
    pub category: String,
}

/// A prop placed on a photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoProp {
    pub id: String,
    /// Library item this prop was created from
    pub prop_id: String,
    pub asset: ImageAsset,
    pub position: PropPosition,
    /// Unscaled rendered size, used for bounds clamping
    #[serde(default)]
    pub size: Size,
}

/// Wrap degrees into `[0, 360)`
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Size of an image of `natural` pixels shown inside the render box
///
/// Images are shrunk to fit `MAX_RENDER_EDGE` on both axes, never enlarged.
pub fn fit_render_size(natural: (u32, u32)) -> Size {
    let (w, h) = (natural.0 as f32, natural.1 as f32);
    if w <= 0.0 || h <= 0.0 {
        return Size::default();
    }
    let edge = limits::MAX_RENDER_EDGE as f32;
    let scale = (edge / w).min(edge / h).min(1.0);
    Size::new(w * scale, h * scale)
}

impl PhotoProp {
    /// Place `item` at the initial position with the given rendered size
    pub fn from_item(item: &PropItem, size: Size) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            prop_id: item.id.clone(),
            asset: item.asset.clone(),
            position: PropPosition::default(),
            size,
        }
    }

    /// Copy moved by `delta`, kept fully inside `container`
    pub fn moved(&self, delta: Point, container: Size) -> Self {
        let target = Point::new(self.position.x + delta.x, self.position.y + delta.y);
        self.moved_to(target, container)
    }

    /// Copy with the top-left corner at `target`, kept fully inside `container`
    pub fn moved_to(&self, target: Point, container: Size) -> Self {
        let max_x = (container.width - self.size.width).max(0.0);
        let max_y = (container.height - self.size.height).max(0.0);
        let clamp = |v: f32, max: f32| if v.is_finite() { v.clamp(0.0, max) } else { 0.0 };

        let mut next = self.clone();
        next.position.x = clamp(target.x, max_x);
        next.position.y = clamp(target.y, max_y);
        next
    }

    /// Copy rotated by `delta` degrees
    pub fn rotated(&self, delta: f32) -> Self {
        let mut next = self.clone();
        if delta.is_finite() {
            next.position.rotation = wrap_degrees(self.position.rotation + delta);
        }
        next
    }

    /// Copy scaled by `delta`, clamped to the scale limits
    pub fn scaled(&self, delta: f32) -> Self {
        let mut next = self.clone();
        if delta.is_finite() {
            next.position.scale =
                (self.position.scale + delta).clamp(limits::MIN_SCALE, limits::MAX_SCALE);
        }
        next
    }
}

/// Props placed on one photo, plus the container they are positioned in
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropLayer {
    container: Size,
    props: Vec<PhotoProp>,
}

impl PropLayer {
    pub fn new(container: Size) -> Self {
        Self {
            container,
            props: Vec::new(),
        }
    }

    /// Layer over props already stored on a photo
    pub fn with_props(container: Size, props: Vec<PhotoProp>) -> Self {
        Self { container, props }
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn props(&self) -> &[PhotoProp] {
        &self.props
    }

    pub fn into_props(self) -> Vec<PhotoProp> {
        self.props
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PhotoProp> {
        self.props.iter().find(|p| p.id == id)
    }

    /// Append a placed prop
    pub fn add(&mut self, prop: PhotoProp) -> &PhotoProp {
        let index = self.props.len();
        self.props.push(prop);
        &self.props[index]
    }

    /// Place a library item at the initial position
    ///
    /// Fails when the item's image cannot be read.
    pub fn add_item(&mut self, item: &PropItem) -> Result<&PhotoProp, PhotoError> {
        let size = fit_render_size(item.asset.dimensions()?);
        debug!(prop = %item.id, width = size.width, height = size.height, "Prop added");
        Ok(self.add(PhotoProp::from_item(item, size)))
    }

    /// Swap in an updated prop with the same id
    pub fn replace(&mut self, prop: PhotoProp) -> bool {
        match self.props.iter_mut().find(|p| p.id == prop.id) {
            Some(slot) => {
                *slot = prop;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<PhotoProp> {
        let index = self.props.iter().position(|p| p.id == id)?;
        Some(self.props.remove(index))
    }

    fn update(&mut self, id: &str, f: impl FnOnce(&PhotoProp, Size) -> PhotoProp) -> Option<&PhotoProp> {
        let container = self.container;
        let slot = self.props.iter_mut().find(|p| p.id == id)?;
        let next = f(slot, container);
        *slot = next;
        Some(&*slot)
    }

    pub fn move_by(&mut self, id: &str, delta: Point) -> Option<&PhotoProp> {
        self.update(id, |p, container| p.moved(delta, container))
    }

    pub fn rotate(&mut self, id: &str, delta: f32) -> Option<&PhotoProp> {
        self.update(id, |p, _| p.rotated(delta))
    }

    pub fn scale(&mut self, id: &str, delta: f32) -> Option<&PhotoProp> {
        self.update(id, |p, _| p.scaled(delta))
    }

    /// Rotate control: one quarter turn clockwise
    pub fn rotate_step(&mut self, id: &str) -> Option<&PhotoProp> {
        self.rotate(id, limits::ROTATE_STEP_DEGREES)
    }

    pub fn zoom_in(&mut self, id: &str) -> Option<&PhotoProp> {
        self.scale(id, limits::SCALE_STEP)
    }

    pub fn zoom_out(&mut self, id: &str) -> Option<&PhotoProp> {
        self.scale(id, -limits::SCALE_STEP)
    }

    /// Start dragging prop `id` from pointer position `pointer`
    pub fn begin_drag(&self, id: &str, pointer: Point) -> Option<DragSession> {
        self.get(id).map(|_| DragSession {
            prop_id: id.to_string(),
            last: pointer,
        })
    }

    /// Flatten the props onto `base`
    ///
    /// Container coordinates are mapped onto the image size. Props whose
    /// image cannot be loaded are skipped.
    pub fn merge_onto(&self, base: &RgbaImage) -> RgbaImage {
        let mut out = base.clone();
        let (iw, ih) = base.dimensions();
        if self.props.is_empty() || iw == 0 || ih == 0 {
            return out;
        }

        let sx = if self.container.width > 0.0 { iw as f32 / self.container.width } else { 1.0 };
        let sy = if self.container.height > 0.0 { ih as f32 / self.container.height } else { 1.0 };

        for prop in &self.props {
            let source = match prop.asset.load() {
                Ok(img) => img,
                Err(e) => {
                    warn!(prop = %prop.id, error = %e, "Skipping prop in merge");
                    continue;
                }
            };

            let size = if prop.size.width > 0.0 && prop.size.height > 0.0 {
                prop.size
            } else {
                fit_render_size(source.dimensions())
            };
            let pos = &prop.position;
            let w = ((size.width * pos.scale * sx).round() as u32).max(1);
            let h = ((size.height * pos.scale * sy).round() as u32).max(1);
            let scaled = imageops::resize(&source, w, h, FilterType::Triangle);
            let rotated = rotate_clockwise(&scaled, pos.rotation);

            let cx = (pos.x + size.width / 2.0) * sx;
            let cy = (pos.y + size.height / 2.0) * sy;
            let x = (cx - rotated.width() as f32 / 2.0).round() as i64;
            let y = (cy - rotated.height() as f32 / 2.0).round() as i64;
            imageops::overlay(&mut out, &rotated, x, y);
        }
        out
    }
}

/// Rotate clockwise by `degrees`, growing the canvas to fit
fn rotate_clockwise(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let degrees = wrap_degrees(degrees);
    match degrees {
        d if d == 0.0 => return image.clone(),
        d if d == 90.0 => return imageops::rotate90(image),
        d if d == 180.0 => return imageops::rotate180(image),
        d if d == 270.0 => return imageops::rotate270(image),
        _ => {}
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    let (w, h) = (image.width() as f32, image.height() as f32);
    let out_w = (w * cos.abs() + h * sin.abs()).ceil().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs()).ceil().max(1.0) as u32;
    let (src_cx, src_cy) = (w / 2.0, h / 2.0);
    let (dst_cx, dst_cy) = (out_w as f32 / 2.0, out_h as f32 / 2.0);

    RgbaImage::from_fn(out_w, out_h, |ox, oy| {
        let dx = ox as f32 + 0.5 - dst_cx;
        let dy = oy as f32 + 0.5 - dst_cy;
        let sx = dx * cos + dy * sin + src_cx;
        let sy = -dx * sin + dy * cos + src_cy;
        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *image.get_pixel(sx as u32, sy as u32)
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// An in-progress pointer drag of one prop
///
/// Created by [`PropLayer::begin_drag`] on press. Each pointer position is
/// turned into a delta from the previous one and applied with clamping.
/// Dropping the session (or calling [`DragSession::end`]) ends the drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    prop_id: String,
    last: Point,
}

impl DragSession {
    pub fn prop_id(&self) -> &str {
        &self.prop_id
    }

    /// Route a pointer move to the dragged prop
    ///
    /// Returns `None` if the prop has been removed from the layer meanwhile.
    pub fn pointer_moved<'a>(&mut self, layer: &'a mut PropLayer, pointer: Point) -> Option<&'a PhotoProp> {
        let delta = Point::new(pointer.x - self.last.x, pointer.y - self.last.y);
        self.last = pointer;
        layer.move_by(&self.prop_id, delta)
    }

    /// Release the pointer
    pub fn end(self) -> String {
        self.prop_id
    }
}

/// Apply `filters` to `base`, then flatten the props of `layer` on top
pub fn render_edit(base: &RgbaImage, filters: &FilterParameters, layer: &PropLayer) -> RgbaImage {
    let filtered = filters.chain().apply(base);
    layer.merge_onto(&filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(size: Size) -> PhotoProp {
        PhotoProp {
            id: "p1".to_string(),
            prop_id: "hat".to_string(),
            asset: ImageAsset::File("/props/hat.png".into()),
            position: PropPosition::default(),
            size,
        }
    }

    #[test]
    fn test_fit_render_size() {
        assert_eq!(fit_render_size((400, 100)), Size::new(200.0, 50.0));
        assert_eq!(fit_render_size((50, 80)), Size::new(50.0, 80.0));
        assert_eq!(fit_render_size((0, 10)), Size::default());
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(450.0), 90.0);
    }

    #[test]
    fn test_move_larger_than_container_pins_to_origin() {
        let p = prop(Size::new(300.0, 300.0));
        let moved = p.moved(Point::new(40.0, 40.0), Size::new(200.0, 200.0));
        assert_eq!((moved.position.x, moved.position.y), (0.0, 0.0));
    }

    #[test]
    fn test_rotate_clockwise_quarter_turn() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let rotated = rotate_clockwise(&img, 90.0);
        assert_eq!(rotated.dimensions(), (1, 2));
        assert_eq!(rotated.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_rotate_arbitrary_grows_canvas() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([1, 1, 1, 255]));
        let rotated = rotate_clockwise(&img, 45.0);
        assert!(rotated.width() >= 14 && rotated.height() >= 14);
        assert_eq!(rotated.get_pixel(0, 0).0[3], 0);
        let c = rotated.width() / 2;
        assert_eq!(rotated.get_pixel(c, c).0, [1, 1, 1, 255]);
    }

    #[test]
    fn test_drag_session_unknown_prop() {
        let layer = PropLayer::new(Size::new(100.0, 100.0));
        assert!(layer.begin_drag("missing", Point::default()).is_none());
    }
}
