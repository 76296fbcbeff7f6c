// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for booth operations
//!
//! This module provides command-line functionality for:
//! - Running a single countdown and capture
//! - Running an interactive booth session
//! - Applying filter presets and generating thumbnails offline

use futures::SinkExt;
use futures::channel::mpsc;
use photobooth::backends::camera::{CameraSource, RawImage};
use photobooth::booth::{BoothState, CaptureOrchestrator, Message, follow_attempt};
use photobooth::config::Config;
use photobooth::pipelines::photo::{
    EncodedImage, EncodingFormat, EncodingQuality, FilterParameters, PRESETS, PhotoEncoder,
    PhotoPipeline, ThumbnailSpec, find_preset, generate_thumbnail,
};
use photobooth::props::PropLayer;
use photobooth::storage::PhotoArchive;
use std::io::BufRead;
use std::path::PathBuf;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// An explicit path must exist; the default path falls back to defaults
fn load_config(path: Option<PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load(&path)?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };
    Ok(config)
}

fn read_image(path: &PathBuf) -> Result<EncodedImage, Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    let raw = RawImage::from_bytes(data)?;
    Ok(EncodedImage::from_raw(&raw))
}

/// Run one countdown, fire the shutter and report the saved photo
pub fn capture(
    image: Option<PathBuf>,
    source: Option<CameraSource>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> CliResult {
    let mut config = load_config(config)?;
    if let Some(source) = source {
        config.camera.source = source;
    }
    if let Some(image) = image {
        config.camera.source = CameraSource::File;
        config.camera.file.path = Some(image);
    }

    let archive_dir = output
        .or_else(|| config.photos_dir.clone())
        .or_else(PhotoArchive::default_dir);

    let mut booth = CaptureOrchestrator::from_config(config);
    if let Some(dir) = archive_dir.clone() {
        booth = booth.with_archive(PhotoArchive::new(dir));
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_capture(booth, archive_dir))
}

async fn run_capture(mut booth: CaptureOrchestrator, archive_dir: Option<PathBuf>) -> CliResult {
    booth.connect()?;
    let countdown = booth.config().timing.countdown_secs;
    let mut states = booth.subscribe();
    let (mut tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(booth.run(rx));

    println!("Get ready! Capturing in {} seconds...", countdown);
    tx.send(Message::StartCapture).await?;

    follow_attempt(&mut states, |state| match state {
        BoothState::CountingDown { remaining } => println!("  {}...", remaining),
        BoothState::Capturing => println!("Smile!"),
        BoothState::Idle | BoothState::PreviewActive { .. } => {}
    })
    .await;

    tx.send(Message::Shutdown).await?;
    let mut booth = handle.await?;
    booth.disconnect();

    let Some(photo) = booth.store().latest() else {
        return Err("No photo captured".into());
    };

    println!();
    println!("Photo captured: {}", photo.id);
    if let Some(thumb) = &photo.thumbnail
        && let Some((width, height)) = thumb.dimensions
    {
        println!("  Thumbnail: {}x{}", width, height);
    }
    if photo.processed {
        println!("  Overlays applied");
    }
    let stats = booth.stats();
    if stats.degraded > 0 {
        println!("  Warning: capture completed with fallbacks (see log)");
    }
    if let Some(dir) = archive_dir {
        let archive = PhotoArchive::new(dir);
        if let Some(path) = archive.list().await.first() {
            println!("  Saved to: {}", path.display());
        }
    }

    Ok(())
}

/// Interactive booth driven from stdin
pub fn session(config: Option<PathBuf>) -> CliResult {
    let config = load_config(config)?;
    let mut booth = CaptureOrchestrator::from_config(config);
    booth.connect()?;

    let (tx, rx) = mpsc::channel(16);

    let mut shutdown_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(Message::Shutdown);
    })?;

    println!("Booth ready. Commands: c = capture, r = retake, x = dismiss, a = abort, q = quit");

    let mut input_tx = tx;
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let message = match line.trim() {
                "c" => Message::StartCapture,
                "r" => Message::Retake,
                "x" => Message::Dismiss,
                "a" => Message::Abort,
                "q" => Message::Shutdown,
                "" => continue,
                other => {
                    println!("Unknown command: {}", other);
                    continue;
                }
            };
            let quit = matches!(message, Message::Shutdown);
            if input_tx.try_send(message).is_err() || quit {
                break;
            }
        }
        let _ = input_tx.try_send(Message::Shutdown);
    });

    let rt = tokio::runtime::Runtime::new()?;
    let mut booth = rt.block_on(async {
        let mut states = booth.subscribe();
        tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let state = *states.borrow_and_update();
                println!("[{}]", state);
            }
        });
        booth.run(rx).await
    });
    booth.disconnect();

    println!("Session ended with {} photo(s)", booth.store().len());
    Ok(())
}

/// List the built-in filter presets
pub fn list_presets() -> CliResult {
    println!("Filter presets:");
    println!();
    for preset in PRESETS.iter() {
        let chain = FilterParameters::from_preset(preset).chain();
        println!("  {:<8} {}", preset.name, chain);
    }
    Ok(())
}

/// List the configured prop library
pub fn list_props(config_path: Option<PathBuf>) -> CliResult {
    let config = load_config(config_path)?;
    let library = config.props.library();
    if library.is_empty() {
        println!("No props available (enable `props` in the config file)");
        return Ok(());
    }

    println!("Props:");
    println!();
    for item in library {
        println!("  {:<12} {:<20} {:<10} {:?}", item.id, item.name, item.category, item.asset);
    }
    Ok(())
}

/// Bake a preset into an image file
pub fn render(input: PathBuf, preset: &str, output: PathBuf) -> CliResult {
    let Some(preset) = find_preset(preset) else {
        return Err(format!("Unknown preset '{}'; see `photobooth presets`", preset).into());
    };

    let image = read_image(&input)?;
    let format = EncodingFormat::from_path(&output);

    let rt = tokio::runtime::Runtime::new()?;
    let rendered = rt.block_on(PhotoPipeline::new().render(
        &image,
        FilterParameters::from_preset(preset),
        PropLayer::default(),
        format,
    ))?;

    let saved = PhotoEncoder::save(&rendered, &output)?;
    println!("Rendered '{}' to {}", preset.name, saved.display());
    Ok(())
}

/// Write a JPEG thumbnail of an image file
pub fn thumbnail(input: PathBuf, output: PathBuf, max_width: u32, max_height: u32) -> CliResult {
    if max_width == 0 || max_height == 0 {
        return Err("Thumbnail bounds must be positive".into());
    }

    let image = read_image(&input)?;
    let spec = ThumbnailSpec {
        max_width,
        max_height,
        quality: EncodingQuality::Preview,
    };
    let thumb = generate_thumbnail(&image, &spec)?;
    let saved = PhotoEncoder::save(&thumb, &output)?;

    match thumb.dimensions {
        Some((width, height)) => println!("Thumbnail {}x{} saved to {}", width, height, saved.display()),
        None => println!("Thumbnail saved to {}", saved.display()),
    }
    Ok(())
}
