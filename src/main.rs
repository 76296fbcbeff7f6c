// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use photobooth::backends::camera::CameraSource;
use photobooth::constants::thumbnail;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Kiosk photo booth")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Camera source override
#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Webcam,
    Dslr,
    Picamera,
    File,
}

impl From<SourceArg> for CameraSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Webcam => CameraSource::Webcam,
            SourceArg::Dslr => CameraSource::Dslr,
            SourceArg::Picamera => CameraSource::PiCamera,
            SourceArg::File => CameraSource::File,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one countdown and capture
    Capture {
        /// Use this image (or directory of images) as the camera
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Camera source (overrides the config file)
        #[arg(short, long, value_enum)]
        source: Option<SourceArg>,

        /// Config file (default: ~/.config/photobooth/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (default: photos_dir or ~/Pictures/photobooth)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the booth interactively (c = capture, r = retake, x = dismiss, a = abort, q = quit)
    Session {
        /// Config file (default: ~/.config/photobooth/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List filter presets
    Presets,

    /// List the prop library from the config file
    Props {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Apply a filter preset to an image
    Render {
        #[arg(short, long)]
        input: PathBuf,

        /// Preset name (see `photobooth presets`)
        #[arg(short, long)]
        preset: String,

        /// Output file; `.png` writes PNG, anything else JPEG
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate a thumbnail
    Thumbnail {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value_t = thumbnail::GALLERY_MAX_WIDTH)]
        max_width: u32,

        #[arg(long, default_value_t = thumbnail::GALLERY_MAX_HEIGHT)]
        max_height: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=photobooth=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Capture {
            image,
            source,
            config,
            output,
        } => cli::capture(image, source.map(Into::into), config, output),
        Commands::Session { config } => cli::session(config),
        Commands::Presets => cli::list_presets(),
        Commands::Props { config } => cli::list_props(config),
        Commands::Render {
            input,
            preset,
            output,
        } => cli::render(input, &preset, output),
        Commands::Thumbnail {
            input,
            output,
            max_width,
            max_height,
        } => cli::thumbnail(input, output, max_width, max_height),
    }
}
