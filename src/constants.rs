// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recording quality presets
///
/// The preset is persisted in the settings file and sets the encoder's
/// target size and bitrate. It does not influence the reference frame used
/// for recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoQuality {
    /// 854x480
    #[serde(rename = "480p")]
    Sd,
    /// 1280x720
    #[serde(rename = "720p")]
    Hd,
    /// 1920x1080 (default)
    #[default]
    #[serde(rename = "1080p")]
    FullHd,
}

impl VideoQuality {
    /// Get all preset variants for UI iteration
    pub const ALL: [VideoQuality; 3] = [VideoQuality::Sd, VideoQuality::Hd, VideoQuality::FullHd];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            VideoQuality::Sd => "480p",
            VideoQuality::Hd => "720p",
            VideoQuality::FullHd => "1080p",
        }
    }

    /// Target encode resolution for the preset
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            VideoQuality::Sd => (854, 480),
            VideoQuality::Hd => (1280, 720),
            VideoQuality::FullHd => (1920, 1080),
        }
    }

    /// Bitrate in kbps, tuned per resolution tier
    pub fn bitrate_kbps(&self) -> u32 {
        match self {
            VideoQuality::Sd => 2_000,
            VideoQuality::Hd => 5_000,
            VideoQuality::FullHd => 8_000,
        }
    }
}

/// Reference frame width used for recognition and photos
pub const REFERENCE_WIDTH: u32 = 1280;

/// Reference frame height used for recognition and photos
pub const REFERENCE_HEIGHT: u32 = 720;

/// Hard limit for obtaining a live feed before falling back to demo
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Shared recognition polling interval
pub const PROCESSOR_INTERVAL: Duration = Duration::from_millis(2000);

/// QR polling interval in scanner mode
pub const QR_SCAN_INTERVAL: Duration = Duration::from_millis(2000);

/// Recording timer refresh rate (display only)
pub const RECORDING_TIMER_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest period any session loop runs at
pub const MIN_LOOP_INTERVAL: Duration = Duration::from_millis(1);

/// How long a QR result stays on screen
pub const QR_RESULT_DISPLAY: Duration = Duration::from_secs(4);

/// Zoom bounds applied to every zoom request
pub const ZOOM_MIN: f32 = 1.0;
pub const ZOOM_MAX: f32 = 8.0;

/// Step used by the +/- zoom keys
pub const ZOOM_STEP: f32 = 0.5;

/// JPEG quality for photos and recognition frames
pub const JPEG_QUALITY: u8 = 90;

/// Default `maxResults` per recognition feature
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Recorder mime types in preference order
pub const MIME_PREFERENCES: [&str; 3] = ["video/webm;codecs=vp9", "video/webm", "video/mp4"];

/// Mime used when the runtime reports no support at all
pub const FALLBACK_MIME: &str = "video/webm";

/// Simulated QR decoder reports a hit on every Nth tick (20%)
pub const QR_SIMULATED_HIT_EVERY: u32 = 5;

/// Payloads cycled by the simulated QR decoder
pub const DEMO_QR_PAYLOADS: [&str; 6] = [
    "https://www.example.com",
    "https://github.com/vision-camera",
    "tel:+420123456789",
    "WIFI:T:WPA;S:VisionCamera_Demo;P:heslo123;;",
    "geo:50.0755,14.4378?q=Praha",
    "Vision Camera demo QR code",
];

/// Labels cycled by the simulated object detector
pub const DEMO_OBJECTS: [&str; 6] = ["Person", "Laptop", "Cup", "Phone", "Book", "Chair"];

/// Strings cycled by the simulated text recognizer
pub const DEMO_TEXTS: [&str; 4] = [
    "Vision Camera",
    "Hello, world!",
    "Demo text recognition",
    "EXIT",
];

/// Gradient stops of the synthetic demo frame (top to bottom)
pub const DEMO_GRADIENT: [[u8; 3]; 3] = [[0x2c, 0x3e, 0x50], [0x34, 0x49, 0x5e], [0x4a, 0x67, 0x41]];

/// Application directory name under the user's config/picture/video dirs
pub const APP_DIR_NAME: &str = "vision-camera";
