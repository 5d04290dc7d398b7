// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::{VideoQuality, ZOOM_MAX, ZOOM_MIN};
use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, CameraError>;

/// Which way the camera points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// User-facing camera
    #[default]
    Front,
    /// Environment-facing camera
    Back,
}

impl Facing {
    /// The opposite direction
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Facing::Front => "Front",
            Facing::Back => "Back",
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Whether the session holds a hardware feed or the synthetic placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Real,
    Demo,
}

impl SourceKind {
    pub fn is_demo(self) -> bool {
        self == SourceKind::Demo
    }
}

/// Inclusive zoom range advertised by a feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f32,
    pub max: f32,
}

impl ZoomRange {
    /// The full range every zoom request is clamped to
    pub const FULL: ZoomRange = ZoomRange {
        min: ZOOM_MIN,
        max: ZOOM_MAX,
    };
}

/// Capability set of a feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Zoom range, absent when the feed has no zoom control
    pub zoom: Option<ZoomRange>,
    /// Torch (continuous flash) availability
    pub torch: bool,
}

impl Capabilities {
    /// Permissive set used without hardware, keeps every control interactive
    pub const DEMO: Capabilities = Capabilities {
        zoom: Some(ZoomRange::FULL),
        torch: true,
    };

    /// Substituted when querying a real feed fails
    pub const SAFE_DEFAULT: Capabilities = Capabilities {
        zoom: Some(ZoomRange::FULL),
        torch: false,
    };

    pub fn supports_zoom(&self) -> bool {
        self.zoom.is_some()
    }
}

/// A single RGBA frame
///
/// `data` may carry per-row padding; `stride` is the byte length of one row.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Create a frame from tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// RGBA pixels with stride padding removed
    pub fn packed_rgba(&self) -> Vec<u8> {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.stride as usize;

        if stride == width * 4 && self.data.len() >= width * height * 4 {
            return self.data[..width * height * 4].to_vec();
        }

        let mut result = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            let row_start = y * stride;
            let row_end = row_start + width * 4;
            if row_end <= self.data.len() {
                result.extend_from_slice(&self.data[row_start..row_end]);
            }
        }
        result
    }

    /// Convert into an `image` buffer, `None` if the data is truncated
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.packed_rgba())
    }

    /// RGBA value at a pixel, black when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = y as usize * self.stride as usize + x as usize * 4;
        match self.data.get(offset..offset + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0, 0, 0, 255],
        }
    }
}

/// What a container encoder is asked to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    pub bitrate_kbps: u32,
}

impl EncoderSettings {
    pub fn new(mime: &'static str, quality: VideoQuality) -> Self {
        let (width, height) = quality.dimensions();
        Self {
            mime,
            width,
            height,
            bitrate_kbps: quality.bitrate_kbps(),
        }
    }

    /// `WxH`, as stamped into video metadata
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
