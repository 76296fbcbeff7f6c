// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the prop layer

use image::{ImageFormat, Rgba, RgbaImage};
use photobooth::pipelines::photo::{FilterParameters, ImageAsset, find_preset};
use photobooth::props::{Point, PropItem, PropLayer, Size, render_edit};
use std::io::Cursor;
use std::sync::Arc;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn png_asset(width: u32, height: u32, colour: Rgba<u8>) -> ImageAsset {
    let img = RgbaImage::from_pixel(width, height, colour);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    ImageAsset::Memory(Arc::from(buf))
}

fn item(width: u32, height: u32) -> PropItem {
    PropItem {
        id: "hat".to_string(),
        name: "Hat".to_string(),
        asset: png_asset(width, height, RED),
        category: "hats".to_string(),
    }
}

#[test]
fn test_add_item_initial_placement() {
    let mut layer = PropLayer::new(Size::new(600.0, 900.0));
    let prop = layer.add_item(&item(400, 100)).unwrap();

    assert_eq!(prop.prop_id, "hat");
    assert_eq!((prop.position.x, prop.position.y), (50.0, 50.0));
    assert_eq!(prop.position.scale, 1.0);
    assert_eq!(prop.position.rotation, 0.0);
    // Fitted into the 200px render box
    assert_eq!(prop.size, Size::new(200.0, 50.0));
}

#[test]
fn test_each_added_prop_gets_unique_id() {
    let mut layer = PropLayer::new(Size::new(600.0, 900.0));
    let first = layer.add_item(&item(20, 20)).unwrap().id.clone();
    let second = layer.add_item(&item(20, 20)).unwrap().id.clone();

    assert_ne!(first, second);
    assert_eq!(layer.len(), 2);
}

#[test]
fn test_add_item_with_broken_asset_fails() {
    let mut layer = PropLayer::new(Size::new(600.0, 900.0));
    let broken = PropItem {
        asset: ImageAsset::File("/nonexistent/prop.png".into()),
        ..item(10, 10)
    };
    assert!(layer.add_item(&broken).is_err());
    assert!(layer.is_empty());
}

#[test]
fn test_move_is_clamped_to_container() {
    let mut layer = PropLayer::new(Size::new(300.0, 300.0));
    let id = layer.add_item(&item(400, 100)).unwrap().id.clone();

    // 200x50 prop: x may range over [0, 100], y over [0, 250]
    let moved = layer.move_by(&id, Point::new(100.0, 500.0)).unwrap();
    assert_eq!((moved.position.x, moved.position.y), (100.0, 250.0));

    let moved = layer.move_by(&id, Point::new(-1000.0, -1000.0)).unwrap();
    assert_eq!((moved.position.x, moved.position.y), (0.0, 0.0));
}

#[test]
fn test_rotation_wraps() {
    let mut layer = PropLayer::new(Size::new(300.0, 300.0));
    let id = layer.add_item(&item(20, 20)).unwrap().id.clone();

    for _ in 0..4 {
        layer.rotate_step(&id);
    }
    assert_eq!(layer.get(&id).unwrap().position.rotation, 0.0);

    let rotated = layer.rotate(&id, -90.0).unwrap();
    assert_eq!(rotated.position.rotation, 270.0);
}

#[test]
fn test_scale_is_clamped() {
    let mut layer = PropLayer::new(Size::new(300.0, 300.0));
    let id = layer.add_item(&item(20, 20)).unwrap().id.clone();

    for _ in 0..30 {
        layer.zoom_in(&id);
    }
    assert_eq!(layer.get(&id).unwrap().position.scale, 2.0);

    for _ in 0..30 {
        layer.zoom_out(&id);
    }
    assert_eq!(layer.get(&id).unwrap().position.scale, 0.5);
}

#[test]
fn test_operations_on_unknown_prop() {
    let mut layer = PropLayer::new(Size::new(300.0, 300.0));
    assert!(layer.move_by("nope", Point::new(1.0, 1.0)).is_none());
    assert!(layer.rotate("nope", 90.0).is_none());
    assert!(layer.scale("nope", 0.1).is_none());
    assert!(layer.remove("nope").is_none());
}

#[test]
fn test_drag_session_applies_incremental_deltas() {
    let mut layer = PropLayer::new(Size::new(400.0, 400.0));
    let id = layer.add_item(&item(400, 100)).unwrap().id.clone();

    let mut drag = layer.begin_drag(&id, Point::new(10.0, 10.0)).unwrap();
    let prop = drag.pointer_moved(&mut layer, Point::new(30.0, 20.0)).unwrap();
    assert_eq!((prop.position.x, prop.position.y), (70.0, 60.0));

    let prop = drag.pointer_moved(&mut layer, Point::new(35.0, 20.0)).unwrap();
    assert_eq!((prop.position.x, prop.position.y), (75.0, 60.0));

    assert_eq!(drag.end(), id);
}

#[test]
fn test_drag_after_removal_is_ignored() {
    let mut layer = PropLayer::new(Size::new(400.0, 400.0));
    let id = layer.add_item(&item(20, 20)).unwrap().id.clone();

    let mut drag = layer.begin_drag(&id, Point::default()).unwrap();
    assert!(layer.remove(&id).is_some());
    assert!(drag.pointer_moved(&mut layer, Point::new(5.0, 5.0)).is_none());
}

#[test]
fn test_merge_draws_prop_at_position() {
    let base = RgbaImage::from_pixel(100, 100, WHITE);
    let mut layer = PropLayer::new(Size::new(100.0, 100.0));
    let prop = layer.add_item(&item(20, 20)).unwrap().clone();
    layer.replace(prop.moved_to(Point::new(10.0, 10.0), layer.container()));

    let merged = layer.merge_onto(&base);
    assert_eq!(*merged.get_pixel(20, 20), RED);
    assert_eq!(*merged.get_pixel(5, 5), WHITE);
    assert_eq!(*merged.get_pixel(90, 90), WHITE);
}

#[test]
fn test_merge_maps_container_to_image_scale() {
    // Container is half the image size, so the prop is drawn twice as large
    let base = RgbaImage::from_pixel(100, 100, WHITE);
    let mut layer = PropLayer::new(Size::new(50.0, 50.0));
    let prop = layer.add_item(&item(20, 20)).unwrap().clone();
    layer.replace(prop.moved_to(Point::new(10.0, 10.0), layer.container()));

    let merged = layer.merge_onto(&base);
    assert_eq!(*merged.get_pixel(25, 25), RED);
    assert_eq!(*merged.get_pixel(55, 55), RED);
    assert_eq!(*merged.get_pixel(15, 15), WHITE);
    assert_eq!(*merged.get_pixel(65, 65), WHITE);
}

#[test]
fn test_merge_skips_unloadable_props() {
    let base = RgbaImage::from_pixel(40, 40, WHITE);
    let mut layer = PropLayer::new(Size::new(40.0, 40.0));
    let mut prop = layer.add_item(&item(10, 10)).unwrap().clone();
    prop.asset = ImageAsset::File("/nonexistent/prop.png".into());
    layer.replace(prop);

    assert_eq!(layer.merge_onto(&base), base);
}

#[test]
fn test_render_edit_filters_before_props() {
    let base = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 200, 255]));
    let mut layer = PropLayer::new(Size::new(100.0, 100.0));
    let prop = layer.add_item(&item(20, 20)).unwrap().clone();
    layer.replace(prop.moved_to(Point::new(0.0, 0.0), layer.container()));

    let bw = FilterParameters::from_preset(find_preset("B&W").unwrap());
    let out = render_edit(&base, &bw, &layer);

    // Props keep their colour; only the photo is filtered
    assert_eq!(*out.get_pixel(10, 10), RED);
    let Rgba([r, g, b, _]) = *out.get_pixel(80, 80);
    assert!(r.abs_diff(b) <= 1 && g.abs_diff(b) <= 1);
}
