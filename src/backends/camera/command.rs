// SPDX-License-Identifier: GPL-3.0-only

//! Stills from external capture tools
//!
//! The Pi camera module is driven through `rpicam-still` (or the older
//! `libcamera-still`) and tethered DSLRs through `gphoto2`. Both tools are
//! asked to write the JPEG to stdout so nothing touches the disk.

use super::types::{BackendResult, DslrSettings, PiCameraSettings, RawImage};
use super::CameraBackend;
use crate::errors::CameraError;
use std::process::{Command, Output};
use tracing::{debug, info, warn};

/// Still tools tried in order for the Pi camera
const PI_STILL_TOOLS: &[&str] = &["rpicam-still", "libcamera-still"];

const GPHOTO2: &str = "gphoto2";

fn run(program: &str, args: &[String]) -> BackendResult<Output> {
    debug!(program, ?args, "Running capture tool");
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CameraError::BackendError(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }
    Ok(output)
}

fn still_from_stdout(program: &str, output: Output) -> BackendResult<Option<RawImage>> {
    if output.stdout.is_empty() {
        warn!(program, "Capture tool produced no image data");
        return Ok(None);
    }
    RawImage::from_bytes(output.stdout).map(Some)
}

/// Raspberry Pi camera module
pub struct PiCamera {
    settings: PiCameraSettings,
    tool: Option<&'static str>,
}

impl PiCamera {
    pub fn new(settings: PiCameraSettings) -> Self {
        Self {
            settings,
            tool: None,
        }
    }

    /// Command line for one still written to stdout
    pub fn still_args(settings: &PiCameraSettings) -> Vec<String> {
        let mut args: Vec<String> = ["-n", "-t", "1", "-e", "jpg", "-o", "-"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut push = |flag: &str, value: String| {
            args.push(flag.to_string());
            args.push(value);
        };
        push("--width", settings.resolution.width.to_string());
        push("--height", settings.resolution.height.to_string());
        push("--framerate", settings.framerate.to_string());
        push("--exposure", settings.exposure.rpicam_name().to_string());
        push("--awb", settings.awb.rpicam_name().to_string());
        // rpicam uses -1..1 for brightness and a multiplier for the rest
        push(
            "--brightness",
            format!("{:.2}", (settings.brightness - 50) as f32 / 50.0),
        );
        push("--contrast", format!("{:.2}", 1.0 + settings.contrast as f32 / 100.0));
        push(
            "--saturation",
            format!("{:.2}", 1.0 + settings.saturation as f32 / 100.0),
        );
        push(
            "--sharpness",
            format!("{:.2}", 1.0 + settings.sharpness as f32 / 100.0),
        );
        if settings.rotation != 0 {
            push("--rotation", settings.rotation.to_string());
        }
        if settings.hflip {
            args.push("--hflip".to_string());
        }
        if settings.vflip {
            args.push("--vflip".to_string());
        }
        args
    }
}

impl CameraBackend for PiCamera {
    fn name(&self) -> &'static str {
        "picamera"
    }

    fn connect(&mut self) -> BackendResult<()> {
        if !self.settings.enabled {
            return Err(CameraError::InitializationFailed(
                "Pi camera is disabled in settings".to_string(),
            ));
        }
        if self.tool.is_some() {
            return Ok(());
        }

        let tool = PI_STILL_TOOLS
            .iter()
            .copied()
            .find(|tool| {
                Command::new(tool)
                    .arg("--version")
                    .output()
                    .is_ok_and(|o| o.status.success())
            })
            .ok_or_else(|| {
                CameraError::DeviceNotFound(format!(
                    "none of {} is installed",
                    PI_STILL_TOOLS.join(", ")
                ))
            })?;

        info!(tool, "Pi camera connected");
        self.tool = Some(tool);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.tool = None;
    }

    fn is_connected(&self) -> bool {
        self.tool.is_some()
    }

    fn acquire_still(&mut self) -> BackendResult<Option<RawImage>> {
        let tool = self.tool.ok_or(CameraError::NotConnected)?;
        let output = run(tool, &Self::still_args(&self.settings))?;
        still_from_stdout(tool, output)
    }
}

/// Tethered DSLR controlled through gphoto2
pub struct DslrCamera {
    settings: DslrSettings,
    port: Option<String>,
}

impl DslrCamera {
    pub fn new(settings: DslrSettings) -> Self {
        Self {
            settings,
            port: None,
        }
    }

    /// Parse `gphoto2 --auto-detect` output into `(model, port)` pairs
    pub fn parse_auto_detect(stdout: &str) -> Vec<(String, String)> {
        stdout
            .lines()
            .skip_while(|line| !line.starts_with("---"))
            .skip(1)
            .filter_map(|line| {
                let line = line.trim_end();
                let split = line.rfind(char::is_whitespace)?;
                let (model, port) = line.split_at(split);
                let model = model.trim();
                let port = port.trim();
                (!model.is_empty() && !port.is_empty())
                    .then(|| (model.to_string(), port.to_string()))
            })
            .collect()
    }

    /// Command line for one still written to stdout
    pub fn capture_args(settings: &DslrSettings, port: &str) -> Vec<String> {
        let mut args = Vec::new();
        if !port.is_empty() {
            args.push("--port".to_string());
            args.push(port.to_string());
        }

        let mut set = |key: &str, value: String| {
            args.push("--set-config".to_string());
            args.push(format!("{}={}", key, value));
        };
        set("iso", settings.iso.to_string());
        set("shutterspeed", settings.shutter_speed.clone());
        set("f-number", settings.aperture.clone());
        set("autofocusdrive", u8::from(settings.auto_focus).to_string());

        args.push("--capture-image-and-download".to_string());
        args.push("--stdout".to_string());
        args
    }
}

impl CameraBackend for DslrCamera {
    fn name(&self) -> &'static str {
        "dslr"
    }

    fn connect(&mut self) -> BackendResult<()> {
        if !self.settings.enabled {
            return Err(CameraError::InitializationFailed(
                "DSLR is disabled in settings".to_string(),
            ));
        }
        if self.port.is_some() {
            return Ok(());
        }

        let output = run(GPHOTO2, &["--auto-detect".to_string()])?;
        let cameras = Self::parse_auto_detect(&String::from_utf8_lossy(&output.stdout));

        let found = cameras.into_iter().find(|(model, port)| {
            (self.settings.port.is_empty() || *port == self.settings.port)
                && (self.settings.model.is_empty() || *model == self.settings.model)
        });
        let (model, port) = found.ok_or_else(|| {
            CameraError::DeviceNotFound(if self.settings.model.is_empty() {
                "no camera detected by gphoto2".to_string()
            } else {
                format!("{} not detected by gphoto2", self.settings.model)
            })
        })?;

        info!(%model, %port, "DSLR connected");
        self.port = Some(port);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.port = None;
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn acquire_still(&mut self) -> BackendResult<Option<RawImage>> {
        let port = self.port.as_deref().ok_or(CameraError::NotConnected)?;
        let output = run(GPHOTO2, &Self::capture_args(&self.settings, port))?;
        still_from_stdout(GPHOTO2, output)
    }
}
