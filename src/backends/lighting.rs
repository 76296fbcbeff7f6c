// SPDX-License-Identifier: GPL-3.0-only

//! Auxiliary booth lighting
//!
//! Lights are driven through the Linux LED class in sysfs
//! (`/sys/class/leds/<name>/brightness`). Entries named `*:flash`, `*:torch`
//! or `*:booth` are treated as booth lights and switched together.
//!
//! Lighting is best-effort. `activate`/`deactivate` on a controller that is
//! not connected do nothing and succeed.

use crate::constants::lighting as led_consts;
use crate::errors::LightingError;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lighting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    pub enabled: bool,
    /// Fraction of max brightness used while capturing (0.0 - 1.0)
    pub intensity: f32,
    /// Directory scanned for LED class devices
    pub leds_dir: PathBuf,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 1.0,
            leds_dir: PathBuf::from(led_consts::LEDS_DIR),
        }
    }
}

/// Lighting capability consumed by the orchestrator
pub trait LightingController: Send {
    /// Acquire the lights
    fn connect(&mut self) -> Result<(), LightingError>;

    /// Release the lights, switching them off first
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Switch the lights on. No-op when not connected.
    fn activate(&mut self) -> Result<(), LightingError>;

    /// Switch the lights off. No-op when not connected.
    fn deactivate(&mut self) -> Result<(), LightingError>;
}

/// Build the controller described by `settings`
pub fn create_controller(settings: &LightingSettings) -> Box<dyn LightingController> {
    if settings.enabled {
        Box::new(SysfsLighting::new(settings.clone()))
    } else {
        Box::new(NoLighting)
    }
}

/// A booth LED discovered via sysfs
#[derive(Debug, Clone)]
pub struct LedDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Directory basename
    name: String,
}

impl LedDevice {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness value (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())
    }

    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }

    /// Turn on at a fraction of max brightness (0.0 = off, 1.0 = full)
    pub fn on(&self, intensity: f32) -> io::Result<()> {
        let clamped = intensity.clamp(0.0, 1.0);
        let value = (clamped * self.max_brightness as f32).round() as u32;
        self.set_brightness(value)
    }
}

/// Result of LED detection
///
/// Separates "hardware exists" from "we can control it" so the operator gets
/// a permission hint instead of silently running without lights.
pub struct LedHardware {
    /// Devices we can actually control (writable)
    pub devices: Vec<LedDevice>,
    /// Error if hardware was found but none of it is writable
    pub permission_error: Option<String>,
}

impl LedHardware {
    /// Scan `leds_dir` for booth light entries
    pub fn detect(leds_dir: &Path) -> LedHardware {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            debug!(dir = %leds_dir.display(), "Cannot read LED directory; no lights");
            return LedHardware {
                devices: Vec::new(),
                permission_error: None,
            };
        };

        let mut devices = Vec::new();
        let mut permission_failures: Vec<PathBuf> = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };

            if !led_consts::LED_SUFFIXES
                .iter()
                .any(|suffix| name_str.ends_with(suffix))
            {
                continue;
            }

            let led_path = entry.path();
            let brightness_path = led_path.join("brightness");
            let max_brightness_path = led_path.join("max_brightness");

            let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
                Ok(s) => match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!(
                            path = %max_brightness_path.display(),
                            "Invalid max_brightness value"
                        );
                        continue;
                    }
                },
                Err(e) => {
                    warn!(
                        path = %max_brightness_path.display(),
                        error = %e,
                        "Cannot read max_brightness"
                    );
                    continue;
                }
            };

            match std::fs::OpenOptions::new()
                .write(true)
                .open(&brightness_path)
            {
                Ok(_) => {
                    info!(name = name_str, max_brightness, "Discovered booth light");
                    devices.push(LedDevice {
                        path: led_path,
                        max_brightness,
                        name: name_str.to_string(),
                    });
                }
                Err(_) => {
                    warn!(
                        path = %brightness_path.display(),
                        "Booth light found but not writable"
                    );
                    permission_failures.push(brightness_path);
                }
            }
        }

        devices.sort_by(|a, b| a.name.cmp(&b.name));

        let permission_error = if !permission_failures.is_empty() && devices.is_empty() {
            Some(Self::build_permission_error(&permission_failures))
        } else {
            None
        };

        LedHardware {
            devices,
            permission_error,
        }
    }

    /// Operator hint naming the group that owns the brightness files
    fn build_permission_error(failures: &[PathBuf]) -> String {
        let username = std::env::var("USER").unwrap_or_else(|_| "user".to_string());
        let group = failures
            .first()
            .and_then(|path| owning_group(path))
            .unwrap_or_else(|| "feedbackd".to_string());

        format!("booth lights are not writable; run: sudo adduser {username} {group}")
    }
}

#[cfg(unix)]
fn owning_group(path: &Path) -> Option<String> {
    use std::os::unix::fs::MetadataExt;

    let gid = std::fs::metadata(path).ok()?.gid();
    let groups = std::fs::read_to_string("/etc/group").ok()?;
    groups.lines().find_map(|line| {
        let parts: Vec<&str> = line.split(':').collect();
        (parts.len() >= 3 && parts[2].parse::<u32>().ok() == Some(gid))
            .then(|| parts[0].to_string())
    })
}

#[cfg(not(unix))]
fn owning_group(_path: &Path) -> Option<String> {
    None
}

/// Sysfs LED controller
pub struct SysfsLighting {
    settings: LightingSettings,
    devices: Vec<LedDevice>,
    connected: bool,
}

impl SysfsLighting {
    pub fn new(settings: LightingSettings) -> Self {
        Self {
            settings,
            devices: Vec::new(),
            connected: false,
        }
    }

    pub fn devices(&self) -> &[LedDevice] {
        &self.devices
    }

    /// Apply `op` to every device, reporting the first failure after trying all
    fn for_each_device(
        &self,
        action: &str,
        op: impl Fn(&LedDevice) -> io::Result<()>,
    ) -> Result<(), LightingError> {
        let mut first_error = None;
        for dev in &self.devices {
            if let Err(e) = op(dev) {
                warn!(device = %dev.name, error = %e, "Failed to {} booth light", action);
                first_error.get_or_insert(LightingError::from(e));
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl LightingController for SysfsLighting {
    fn connect(&mut self) -> Result<(), LightingError> {
        let hardware = LedHardware::detect(&self.settings.leds_dir);
        if !hardware.devices.is_empty() {
            self.devices = hardware.devices;
            self.connected = true;
            return Ok(());
        }
        Err(match hardware.permission_error {
            Some(msg) => LightingError::PermissionDenied(msg),
            None => LightingError::NoDevice,
        })
    }

    fn disconnect(&mut self) {
        if self.connected {
            let _ = self.for_each_device("switch off", LedDevice::off);
        }
        self.devices.clear();
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn activate(&mut self) -> Result<(), LightingError> {
        if !self.connected {
            return Ok(());
        }
        let intensity = self.settings.intensity;
        self.for_each_device("switch on", |dev| dev.on(intensity))
    }

    fn deactivate(&mut self) -> Result<(), LightingError> {
        if !self.connected {
            return Ok(());
        }
        self.for_each_device("switch off", LedDevice::off)
    }
}

/// Controller for booths without lights
#[derive(Debug, Default)]
pub struct NoLighting;

impl LightingController for NoLighting {
    fn connect(&mut self) -> Result<(), LightingError> {
        Ok(())
    }

    fn disconnect(&mut self) {}

    fn is_connected(&self) -> bool {
        false
    }

    fn activate(&mut self) -> Result<(), LightingError> {
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), LightingError> {
        Ok(())
    }
}
