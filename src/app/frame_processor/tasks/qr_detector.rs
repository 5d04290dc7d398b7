// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! Frames are converted to grayscale (downscaled when large) and handed to
//! a [`QrDecoder`]. Real feeds use [`RqrrDecoder`]; the demo feed has no QR
//! codes in it, so it is paired with [`SimulatedQrDecoder`].

use crate::app::frame_processor::types::{FrameRegion, QrDetection};
use crate::backends::camera::CameraFrame;
use crate::constants::{DEMO_QR_PAYLOADS, QR_SIMULATED_HIT_EVERY};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Finds and decodes QR codes in a frame
pub trait QrDecoder: Send + Sync {
    /// Decode every QR code visible in the frame; CPU-bound
    fn decode(&self, frame: &CameraFrame) -> Vec<QrDetection>;
}

/// Real decoder backed by `rqrr`
#[derive(Debug, Clone)]
pub struct RqrrDecoder {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for RqrrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RqrrDecoder {
    pub fn new() -> Self {
        Self {
            // QR codes are typically large enough to be detected at 640px
            max_dimension: 640,
        }
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl QrDecoder for RqrrDecoder {
    fn decode(&self, frame: &CameraFrame) -> Vec<QrDetection> {
        let start = std::time::Instant::now();
        if frame.width == 0 || frame.height == 0 {
            return Vec::new();
        }

        let (luma, proc_width, proc_height, scale) = luma_for_detection(frame, self.max_dimension);
        trace!(
            proc_width,
            proc_height,
            scale,
            conversion_ms = start.elapsed().as_millis(),
            "Prepared grayscale image for QR detection"
        );

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            proc_width as usize,
            proc_height as usize,
            |x, y| luma[y * proc_width as usize + x],
        );
        let grids = prepared.detect_grids();

        let mut detections = Vec::with_capacity(grids.len());
        for grid in grids {
            let content = match grid.decode() {
                Ok((_meta, content)) => content,
                Err(e) => {
                    debug!(error = %e, "Failed to decode QR code");
                    continue;
                }
            };

            let xs = grid.bounds.iter().map(|p| p.x.max(0) as f32);
            let ys = grid.bounds.iter().map(|p| p.y.max(0) as f32);
            let min_x = xs.clone().fold(f32::MAX, f32::min);
            let max_x = xs.fold(0.0, f32::max).min(proc_width as f32);
            let min_y = ys.clone().fold(f32::MAX, f32::min);
            let max_y = ys.fold(0.0, f32::max).min(proc_height as f32);

            // Scale back to original frame coordinates
            let region = FrameRegion::from_pixels(
                (min_x * scale) as u32,
                (min_y * scale) as u32,
                ((max_x - min_x).max(0.0) * scale) as u32,
                ((max_y - min_y).max(0.0) * scale) as u32,
                frame.width,
                frame.height,
            );

            debug!(
                content = %content,
                x = region.x,
                y = region.y,
                width = region.width,
                height = region.height,
                "Detected QR code"
            );
            detections.push(QrDetection::new(region, content));
        }

        if !detections.is_empty() {
            debug!(
                count = detections.len(),
                total_ms = start.elapsed().as_millis(),
                "QR detection found codes"
            );
        }
        detections
    }
}

/// Stand-in decoder for the demo feed
///
/// Reports a hit on every fifth frame, cycling through a fixed set of
/// payloads, and nothing otherwise.
#[derive(Debug, Default)]
pub struct SimulatedQrDecoder {
    ticks: AtomicU32,
    hits: AtomicU32,
}

impl SimulatedQrDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QrDecoder for SimulatedQrDecoder {
    fn decode(&self, _frame: &CameraFrame) -> Vec<QrDetection> {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        if tick % QR_SIMULATED_HIT_EVERY != 0 {
            return Vec::new();
        }

        let hit = self.hits.fetch_add(1, Ordering::Relaxed) as usize;
        let payload = DEMO_QR_PAYLOADS[hit % DEMO_QR_PAYLOADS.len()];
        let bounds = FrameRegion {
            x: 0.35,
            y: 0.3,
            width: 0.3,
            height: 0.4,
        };
        vec![QrDetection::new(bounds, payload.to_string())]
    }
}

/// Async front end for a [`QrDecoder`]
#[derive(Clone)]
pub struct QrDetector {
    decoder: Arc<dyn QrDecoder>,
}

impl QrDetector {
    pub fn new(decoder: Arc<dyn QrDecoder>) -> Self {
        Self { decoder }
    }

    /// Detect QR codes in a frame on the blocking pool
    pub async fn detect(&self, frame: CameraFrame) -> Vec<QrDetection> {
        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || decoder.decode(&frame))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "QR detection task panicked");
                Vec::new()
            })
    }
}

impl std::fmt::Debug for QrDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrDetector").finish_non_exhaustive()
    }
}

/// Grayscale copy of the frame, downscaled so neither side exceeds `max_dimension`
///
/// Returns the luma plane, its dimensions and the scale back to the frame.
fn luma_for_detection(frame: &CameraFrame, max_dimension: u32) -> (Vec<u8>, u32, u32, f32) {
    let (width, height) = (frame.width, frame.height);
    let scale = if width > max_dimension || height > max_dimension {
        (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32)
    } else {
        1.0
    };
    let dst_width = ((width as f32 / scale) as u32).max(1);
    let dst_height = ((height as f32 / scale) as u32).max(1);

    let x_ratio = width as f32 / dst_width as f32;
    let y_ratio = height as f32 / dst_height as f32;

    let mut luma = Vec::with_capacity((dst_width * dst_height) as usize);
    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = ((x as f32 * x_ratio) as u32).min(width - 1);
            let src_y = ((y as f32 * y_ratio) as u32).min(height - 1);
            let [r, g, b, _] = frame.pixel(src_x, src_y);
            luma.push(rgb_to_luma(r, g, b));
        }
    }

    (luma, dst_width, dst_height, scale)
}

/// BT.601 luma
fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}
