// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture orchestrator

use futures::SinkExt;
use futures::channel::mpsc;
use image::{ImageFormat, Rgba, RgbaImage};
use photobooth::backends::camera::{BackendResult, CameraBackend, RawImage};
use photobooth::backends::lighting::LightingController;
use photobooth::booth::{BoothState, CaptureOrchestrator, CaptureOutcome, Message, follow_attempt};
use photobooth::config::Config;
use photobooth::errors::{AppError, CameraError, LightingError};
use photobooth::pipelines::photo::{FilterField, FilterParameters, ImageAsset, Overlay};
use photobooth::props::{PropItem, Size};
use photobooth::storage::{PhotoArchive, PhotoId};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

fn png_bytes(width: u32, height: u32) -> Arc<[u8]> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 150, 100, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    Arc::from(buf)
}

/// Camera that serves a fixed still, or nothing
struct StubCamera {
    still: Option<Arc<[u8]>>,
    fail_connect: bool,
    acquired: Arc<AtomicUsize>,
}

impl CameraBackend for StubCamera {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn connect(&mut self) -> BackendResult<()> {
        if self.fail_connect {
            return Err(CameraError::DeviceNotFound("stub".to_string()));
        }
        Ok(())
    }

    fn disconnect(&mut self) {}

    fn is_connected(&self) -> bool {
        !self.fail_connect
    }

    fn acquire_still(&mut self) -> BackendResult<Option<RawImage>> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        match &self.still {
            Some(data) => RawImage::from_bytes(Arc::clone(data)).map(Some),
            None => Ok(None),
        }
    }
}

type Events = Arc<Mutex<Vec<&'static str>>>;

/// Lights that record every call
struct RecordingLights {
    events: Events,
    available: bool,
    /// Switching the lights on or off fails
    broken: bool,
}

impl RecordingLights {
    fn switch(&mut self, event: &'static str) -> Result<(), LightingError> {
        self.events.lock().unwrap().push(event);
        if self.broken {
            Err(LightingError::WriteFailed("stuck".to_string()))
        } else {
            Ok(())
        }
    }
}

impl LightingController for RecordingLights {
    fn connect(&mut self) -> Result<(), LightingError> {
        self.events.lock().unwrap().push("connect");
        if self.available {
            Ok(())
        } else {
            Err(LightingError::NoDevice)
        }
    }

    fn disconnect(&mut self) {
        self.events.lock().unwrap().push("disconnect");
    }

    fn is_connected(&self) -> bool {
        self.available
    }

    fn activate(&mut self) -> Result<(), LightingError> {
        self.switch("on")
    }

    fn deactivate(&mut self) -> Result<(), LightingError> {
        self.switch("off")
    }
}

struct Harness {
    booth: CaptureOrchestrator,
    events: Events,
    acquired: Arc<AtomicUsize>,
}

fn harness(still: Option<Arc<[u8]>>, config: Config) -> Harness {
    harness_with_lights(still, config, false)
}

fn harness_with_lights(still: Option<Arc<[u8]>>, config: Config, broken_lights: bool) -> Harness {
    let events: Events = Arc::default();
    let acquired = Arc::new(AtomicUsize::new(0));
    let camera = StubCamera {
        still,
        fail_connect: false,
        acquired: Arc::clone(&acquired),
    };
    let lights = RecordingLights {
        events: Arc::clone(&events),
        available: true,
        broken: broken_lights,
    };
    let mut booth = CaptureOrchestrator::new(config, Box::new(camera), Box::new(lights));
    booth.connect().unwrap();
    Harness {
        booth,
        events,
        acquired,
    }
}

fn working_booth() -> Harness {
    harness(Some(png_bytes(40, 60)), Config::default())
}

/// Start a countdown and tick until the shutter fires
async fn capture_once(booth: &mut CaptureOrchestrator) -> CaptureOutcome {
    assert!(booth.start_capture());
    loop {
        if let Some(outcome) = booth.tick().await {
            return outcome;
        }
    }
}

fn saved_id(outcome: &CaptureOutcome) -> PhotoId {
    match outcome {
        CaptureOutcome::Saved { photo_id, .. } => photo_id.clone(),
        CaptureOutcome::Aborted => panic!("capture was aborted"),
    }
}

fn frame_overlay(enabled: bool) -> Overlay {
    let mut overlay = Overlay::new("frame", "Frame", ImageAsset::Memory(png_bytes(60, 90)));
    overlay.enabled = enabled;
    overlay
}

#[tokio::test(start_paused = true)]
async fn test_countdown_then_capture_then_preview() {
    let Harness {
        mut booth, events, ..
    } = working_booth();

    assert!(booth.start_capture());
    assert_eq!(booth.state(), BoothState::CountingDown { remaining: 5 });

    for remaining in [4, 3, 2, 1] {
        assert!(booth.tick().await.is_none());
        assert_eq!(booth.state(), BoothState::CountingDown { remaining });
    }

    let outcome = booth.tick().await.expect("fifth tick fires the shutter");
    let CaptureOutcome::Saved {
        ref photo_id,
        processed,
        degraded,
    } = outcome
    else {
        panic!("expected a saved photo, got {:?}", outcome);
    };
    assert!(!processed, "No overlays configured");
    assert!(!degraded);

    assert_eq!(booth.state(), BoothState::PreviewActive { seconds_left: 20 });
    assert_eq!(booth.store().len(), 1);

    let photo = booth.preview().expect("new photo is previewed");
    assert_eq!(&photo.id, photo_id);
    assert!(photo.filters.is_identity());
    assert!(photo.props.is_empty());
    assert!(photo.thumbnail.is_some());

    assert_eq!(*events.lock().unwrap(), ["connect", "on", "off"]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_still_aborts_to_idle() {
    let Harness {
        mut booth,
        events,
        acquired,
    } = harness(None, Config::default());

    let outcome = capture_once(&mut booth).await;

    assert_eq!(outcome, CaptureOutcome::Aborted);
    assert_eq!(booth.state(), BoothState::Idle);
    assert!(booth.store().is_empty());
    assert!(booth.preview().is_none());
    assert_eq!(acquired.load(Ordering::SeqCst), 1);
    assert_eq!(booth.stats().aborted, 1);
    // Lights are switched off on the abort path too
    assert_eq!(*events.lock().unwrap(), ["connect", "on", "off"]);
}

#[tokio::test(start_paused = true)]
async fn test_start_capture_ignored_while_busy() {
    let Harness { mut booth, .. } = working_booth();

    assert!(booth.start_capture());
    booth.tick().await;
    assert!(!booth.start_capture(), "Countdown is not restarted");
    assert_eq!(booth.state(), BoothState::CountingDown { remaining: 4 });

    while booth.tick().await.is_none() {}
    assert!(matches!(booth.state(), BoothState::PreviewActive { .. }));
    assert!(!booth.start_capture(), "Preview must be left first");
}

#[tokio::test(start_paused = true)]
async fn test_preview_expires_to_idle() {
    let Harness { mut booth, .. } = working_booth();
    let id = saved_id(&capture_once(&mut booth).await);

    for _ in 0..19 {
        booth.tick().await;
    }
    assert_eq!(booth.state(), BoothState::PreviewActive { seconds_left: 1 });

    booth.tick().await;
    assert_eq!(booth.state(), BoothState::Idle);
    assert!(booth.preview().is_none());
    assert!(booth.store().get(&id).is_some(), "Photo is kept after expiry");
}

#[tokio::test(start_paused = true)]
async fn test_retake_keeps_first_photo() {
    let Harness { mut booth, .. } = working_booth();
    let first = saved_id(&capture_once(&mut booth).await);

    for _ in 0..8 {
        booth.tick().await;
    }
    assert_eq!(booth.state(), BoothState::PreviewActive { seconds_left: 12 });

    assert!(booth.retake());
    assert_eq!(booth.state(), BoothState::CountingDown { remaining: 5 });
    assert!(booth.preview().is_none());
    assert_eq!(booth.store().len(), 1);

    let mut second = None;
    while second.is_none() {
        second = booth.tick().await;
    }
    let second = saved_id(&second.unwrap());

    assert_ne!(first, second);
    assert_eq!(booth.store().len(), 2);
    assert_eq!(booth.store().latest().map(|p| &p.id), Some(&second));
    assert_eq!(booth.preview().map(|p| &p.id), Some(&second));
}

#[tokio::test(start_paused = true)]
async fn test_retake_and_dismiss_need_preview() {
    let Harness { mut booth, .. } = working_booth();
    assert!(!booth.retake());
    assert!(!booth.dismiss());

    capture_once(&mut booth).await;
    assert!(booth.dismiss());
    assert_eq!(booth.state(), BoothState::Idle);
    assert_eq!(booth.store().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_abort_during_countdown_skips_capture() {
    let Harness {
        mut booth,
        acquired,
        events,
    } = working_booth();

    booth.start_capture();
    booth.tick().await;
    booth.tick().await;
    assert!(booth.abort());
    assert_eq!(booth.state(), BoothState::Idle);

    // Stray ticks after the abort do nothing
    assert!(booth.tick().await.is_none());
    assert_eq!(acquired.load(Ordering::SeqCst), 0);
    assert_eq!(*events.lock().unwrap(), ["connect"]);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_overlay_leaves_photo_unprocessed() {
    let mut config = Config::default();
    config.processing.overlays = vec![frame_overlay(false)];
    let Harness { mut booth, .. } = harness(Some(png_bytes(40, 60)), config);

    let outcome = capture_once(&mut booth).await;
    assert!(matches!(
        outcome,
        CaptureOutcome::Saved {
            processed: false,
            ..
        }
    ));
    assert_eq!(booth.store().unprocessed().count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_enabled_overlay_composites() {
    let mut config = Config::default();
    config.processing.overlays = vec![frame_overlay(true)];
    let Harness { mut booth, .. } = harness(Some(png_bytes(40, 60)), config);

    let outcome = capture_once(&mut booth).await;
    assert!(matches!(
        outcome,
        CaptureOutcome::Saved {
            processed: true,
            degraded: false,
            ..
        }
    ));

    let photo = booth.store().latest().unwrap();
    assert!(photo.processed);
    let composed = photo.image.decode().unwrap();
    assert_eq!(composed.dimensions(), (60, 90), "Output takes the overlay canvas size");
}

#[tokio::test(start_paused = true)]
async fn test_missing_overlay_degrades_but_saves() {
    let mut config = Config::default();
    config.processing.overlays = vec![Overlay::new(
        "gone",
        "Gone",
        ImageAsset::File("/nonexistent/overlay.png".into()),
    )];
    let Harness { mut booth, .. } = harness(Some(png_bytes(40, 60)), config);

    for round in 1..=3 {
        let outcome = capture_once(&mut booth).await;
        assert!(matches!(
            outcome,
            CaptureOutcome::Saved {
                processed: true,
                degraded: true,
                ..
            }
        ));
        booth.dismiss();
        assert_eq!(booth.stats().consecutive_degraded, round);
    }

    assert_eq!(booth.store().len(), 3);
    assert_eq!(booth.stats().degraded, 3);
}

#[tokio::test(start_paused = true)]
async fn test_light_failures_do_not_stop_capture() {
    let Harness {
        mut booth, events, ..
    } = harness_with_lights(Some(png_bytes(40, 60)), Config::default(), true);

    let outcome = capture_once(&mut booth).await;
    assert!(matches!(outcome, CaptureOutcome::Saved { .. }));
    assert_eq!(booth.state(), BoothState::PreviewActive { seconds_left: 20 });
    assert_eq!(booth.store().len(), 1);
    // Switching off is still attempted after a failed switch on
    assert_eq!(*events.lock().unwrap(), ["connect", "on", "off"]);
}

/// JPEG signature followed by a body no decoder accepts
fn corrupt_jpeg() -> Arc<[u8]> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(&[0x5A; 64]);
    Arc::from(bytes)
}

#[tokio::test(start_paused = true)]
async fn test_compositing_failure_keeps_raw_still() {
    let mut config = Config::default();
    config.processing.overlays = vec![frame_overlay(true)];
    let raw = corrupt_jpeg();
    let Harness { mut booth, .. } = harness(Some(Arc::clone(&raw)), config);

    let outcome = capture_once(&mut booth).await;
    assert!(matches!(
        outcome,
        CaptureOutcome::Saved {
            processed: true,
            degraded: true,
            ..
        }
    ));
    assert_eq!(booth.state(), BoothState::PreviewActive { seconds_left: 20 });

    let photo = booth.store().latest().unwrap();
    assert_eq!(photo.image.data[..], raw[..]);
    assert_eq!(photo.image.format, ImageFormat::Jpeg);
    // The thumbnail cannot be decoded either, so the full image stands in
    assert_eq!(photo.thumbnail.as_ref(), Some(&photo.image));
    assert_eq!(booth.stats().consecutive_degraded, 1);
}

#[tokio::test(start_paused = true)]
async fn test_thumbnail_failure_uses_full_image() {
    let raw = corrupt_jpeg();
    let Harness { mut booth, .. } = harness(Some(Arc::clone(&raw)), Config::default());

    let outcome = capture_once(&mut booth).await;
    assert!(matches!(
        outcome,
        CaptureOutcome::Saved {
            processed: false,
            degraded: true,
            ..
        }
    ));
    assert_eq!(booth.state(), BoothState::PreviewActive { seconds_left: 20 });

    let photo = booth.store().latest().unwrap();
    assert_eq!(photo.image.data[..], raw[..]);
    assert_eq!(photo.thumbnail.as_ref(), Some(&photo.image));
}

#[tokio::test(start_paused = true)]
async fn test_delete_previewed_photo_closes_preview() {
    let Harness { mut booth, .. } = working_booth();
    let id = saved_id(&capture_once(&mut booth).await);

    assert!(booth.delete_photo(&id));
    assert_eq!(booth.state(), BoothState::Idle);
    assert!(booth.store().is_empty());
    assert!(!booth.delete_photo(&id));
}

#[tokio::test(start_paused = true)]
async fn test_editing_messages_update_store() {
    let Harness { mut booth, .. } = working_booth();
    let id = saved_id(&capture_once(&mut booth).await);

    booth
        .update(Message::ApplyPreset(id.clone(), "vintage".to_string()))
        .await;
    let filters = &booth.store().get(&id).unwrap().filters;
    assert_eq!(filters.preset.as_deref(), Some("Vintage"));
    assert_eq!(filters.sepia, 0.3);

    // Unknown preset leaves the filters alone
    assert!(!booth.apply_preset(&id, "sparkle"));
    assert_eq!(
        booth.store().get(&id).unwrap().filters.preset.as_deref(),
        Some("Vintage")
    );

    // Out-of-range values are clamped on the way in
    let wild = FilterParameters {
        brightness: 5.0,
        ..FilterParameters::identity()
    };
    booth.update(Message::UpdateFilters(id.clone(), wild)).await;
    assert_eq!(booth.store().get(&id).unwrap().filters.brightness, 2.0);

    let manual = FilterParameters::identity().with(FilterField::Grayscale, 0.5);
    assert!(booth.update_filters(&id, manual.clone()));
    assert_eq!(booth.store().get(&id).unwrap().filters, manual);

    booth.update(Message::UpdateProps(id.clone(), Vec::new())).await;
    assert!(booth.store().get(&id).unwrap().props.is_empty());
}

fn prop_config(enabled: bool) -> Config {
    let mut config = Config::default();
    config.props.enabled = enabled;
    config.props.items = vec![PropItem {
        id: "hat".to_string(),
        name: "Hat".to_string(),
        asset: ImageAsset::Memory(png_bytes(40, 20)),
        category: "hats".to_string(),
    }];
    config
}

#[tokio::test(start_paused = true)]
async fn test_library_prop_is_placed_on_photo() {
    let Harness { mut booth, .. } = harness(Some(png_bytes(40, 60)), prop_config(true));
    let id = saved_id(&capture_once(&mut booth).await);
    assert_eq!(booth.prop_library().len(), 1);

    let container = Size::new(400.0, 600.0);
    let first = booth.add_prop(&id, "hat", container).unwrap();
    let second = booth.add_prop(&id, "hat", container).unwrap();
    assert_ne!(first, second);

    let props = &booth.store().get(&id).unwrap().props;
    assert_eq!(props.len(), 2);
    assert!(props.iter().all(|p| p.prop_id == "hat"));
    assert_eq!(props[0].size, Size::new(40.0, 20.0));

    assert!(booth.add_prop(&id, "moustache", container).is_none());
    assert!(booth.add_prop(&PhotoId::from("missing"), "hat", container).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_disabled_prop_library_places_nothing() {
    let Harness { mut booth, .. } = harness(Some(png_bytes(40, 60)), prop_config(false));
    let id = saved_id(&capture_once(&mut booth).await);

    assert!(booth.prop_library().is_empty());
    assert!(booth.add_prop(&id, "hat", Size::new(400.0, 600.0)).is_none());
    assert!(booth.store().get(&id).unwrap().props.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_archive_receives_photo_and_original() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.processing.overlays = vec![frame_overlay(true)];
    config.processing.preserve_original = true;
    let Harness { booth, .. } = harness(Some(png_bytes(40, 60)), config);
    let mut booth = booth.with_archive(PhotoArchive::new(dir.path()));

    capture_once(&mut booth).await;

    let archived = PhotoArchive::new(dir.path()).list().await;
    assert_eq!(archived.len(), 1);
    let name = archived[0].file_name().unwrap();
    assert!(dir.path().join("thumbnails").join(name).exists());

    let originals: Vec<_> = std::fs::read_dir(dir.path().join("unprocessed"))
        .unwrap()
        .collect();
    assert_eq!(originals.len(), 1);
}

#[tokio::test]
async fn test_lighting_failure_does_not_block_connect() {
    let camera = StubCamera {
        still: Some(png_bytes(10, 10)),
        fail_connect: false,
        acquired: Arc::default(),
    };
    let lights = RecordingLights {
        events: Arc::default(),
        available: false,
        broken: false,
    };
    let mut booth = CaptureOrchestrator::new(Config::default(), Box::new(camera), Box::new(lights));
    assert!(booth.connect().is_ok());
}

#[tokio::test]
async fn test_camera_failure_fails_connect() {
    let camera = StubCamera {
        still: None,
        fail_connect: true,
        acquired: Arc::default(),
    };
    let lights = RecordingLights {
        events: Arc::default(),
        available: true,
        broken: false,
    };
    let mut booth = CaptureOrchestrator::new(Config::default(), Box::new(camera), Box::new(lights));
    assert!(matches!(
        booth.connect(),
        Err(AppError::Camera(CameraError::DeviceNotFound(_)))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_event_loop_runs_full_cycle() {
    let Harness { booth, events, .. } = working_booth();
    let mut states = booth.subscribe();
    let (mut tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(booth.run(rx));

    let start = tokio::time::Instant::now();
    tx.send(Message::StartCapture).await.unwrap();

    states
        .wait_for(|s| matches!(s, BoothState::PreviewActive { .. }))
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_secs(5));

    // The preview runs out on its own
    states
        .wait_for(|s| *s == BoothState::Idle)
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_secs(25));

    tx.send(Message::Shutdown).await.unwrap();
    let booth = handle.await.unwrap();
    assert_eq!(booth.store().len(), 1);
    assert_eq!(booth.stats().saved, 1);
    assert_eq!(
        events.lock().unwrap().iter().filter(|e| **e == "on").count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_event_loop_stops_when_senders_drop() {
    let Harness { booth, .. } = working_booth();
    let (tx, rx) = mpsc::channel::<Message>(8);
    let handle = tokio::spawn(booth.run(rx));

    drop(tx);
    let booth = tokio::time::timeout(Duration::from_secs(60), handle)
        .await
        .expect("loop ends")
        .unwrap();
    assert_eq!(booth.state(), BoothState::Idle);
}

#[tokio::test]
async fn test_follow_attempt_survives_skipped_states() {
    let (tx, mut rx) = watch::channel(BoothState::Idle);
    // Countdown and capture are overwritten before the follower looks
    tx.send_replace(BoothState::CountingDown { remaining: 1 });
    tx.send_replace(BoothState::Capturing);
    tx.send_replace(BoothState::Idle);

    let mut seen = Vec::new();
    let end = tokio::time::timeout(Duration::from_secs(1), follow_attempt(&mut rx, |s| seen.push(s)))
        .await
        .expect("attempt ends");
    assert_eq!(end, Some(BoothState::Idle));
    assert_eq!(seen, [BoothState::Idle]);
}

#[tokio::test]
async fn test_follow_attempt_ends_at_preview_or_drop() {
    let (tx, mut rx) = watch::channel(BoothState::Idle);
    tx.send_replace(BoothState::PreviewActive { seconds_left: 20 });
    let end = follow_attempt(&mut rx, |_| {}).await;
    assert_eq!(end, Some(BoothState::PreviewActive { seconds_left: 20 }));

    drop(tx);
    assert_eq!(follow_attempt(&mut rx, |_| {}).await, None);
}
