// SPDX-License-Identifier: GPL-3.0-only

//! Torch LED control via Linux sysfs
//!
//! Flash LEDs show up as `/sys/class/leds/*:flash`. Only the `brightness`
//! file is used (torch mode), which is group-writable on most phones; the
//! strobe interface needs root.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const LEDS_ROOT: &str = "/sys/class/leds";

/// A writable torch LED
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashDevice {
    path: PathBuf,
    max_brightness: u32,
    name: String,
}

impl FlashDevice {
    /// Writable flash LEDs on this system, sorted by name
    pub fn discover() -> Vec<FlashDevice> {
        Self::discover_in(Path::new(LEDS_ROOT))
    }

    /// Writable `*:flash` entries under `root`
    pub fn discover_in(root: &Path) -> Vec<FlashDevice> {
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %root.display(), error = %e, "No LED class directory, no torch");
                return Vec::new();
            }
        };

        let mut devices: Vec<FlashDevice> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if !name.ends_with(":flash") {
                    return None;
                }
                Self::open(entry.path(), name)
            })
            .collect();

        devices.sort_by(|a, b| a.name.cmp(&b.name));
        devices
    }

    fn open(path: PathBuf, name: String) -> Option<FlashDevice> {
        let max_path = path.join("max_brightness");
        let max_brightness = match std::fs::read_to_string(&max_path) {
            Ok(s) => match s.trim().parse::<u32>() {
                Ok(v) if v > 0 => v,
                _ => {
                    warn!(path = %max_path.display(), "Invalid max_brightness value");
                    return None;
                }
            },
            Err(e) => {
                warn!(path = %max_path.display(), error = %e, "Cannot read max_brightness");
                return None;
            }
        };

        let brightness_path = path.join("brightness");
        if let Err(e) = std::fs::OpenOptions::new().write(true).open(&brightness_path) {
            warn!(
                path = %brightness_path.display(),
                error = %e,
                "Flash LED found but not writable, user may need to be in the 'feedbackd' group"
            );
            return None;
        }

        info!(name = %name, max_brightness, "Discovered flash LED");
        Some(FlashDevice {
            path,
            max_brightness,
            name,
        })
    }

    /// Directory name, e.g. `white:flash`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write a raw brightness, capped at `max_brightness`
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let value = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), value.to_string())
    }

    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }

    /// Light the LED at a fraction of full brightness
    pub fn torch(&self, intensity: f32) -> io::Result<()> {
        let intensity = intensity.clamp(0.0, 1.0);
        self.set_brightness((intensity * self.max_brightness as f32).round() as u32)
    }
}
