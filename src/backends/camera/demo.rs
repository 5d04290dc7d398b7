// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic feed used in demo mode

use super::CameraFrame;
use crate::constants::{DEMO_GRADIENT, REFERENCE_HEIGHT, REFERENCE_WIDTH};
use std::sync::atomic::{AtomicU32, Ordering};

/// Rows the gradient moves per captured frame
const DRIFT_PER_FRAME: u32 = 24;

/// Placeholder frames rendered when no hardware feed is held
///
/// Produces a vertical three-stop gradient at the reference size. The
/// gradient drifts a little on every capture so previews visibly move.
#[derive(Debug, Default)]
pub struct DemoFeed {
    phase: AtomicU32,
}

impl DemoFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the next placeholder frame
    pub fn capture_frame(&self) -> CameraFrame {
        let phase = self.phase.fetch_add(1, Ordering::Relaxed);
        let width = REFERENCE_WIDTH;
        let height = REFERENCE_HEIGHT;
        let offset = (phase.wrapping_mul(DRIFT_PER_FRAME)) % (height * 2);

        let row_len = width as usize * 4;
        let mut data = Vec::with_capacity(row_len * height as usize);
        for y in 0..height {
            // Triangle wave so the gradient bounces instead of jumping
            let pos = (y + offset) % (height * 2);
            let pos = if pos >= height { height * 2 - 1 - pos } else { pos };
            let [r, g, b] = gradient_at(pos as f32 / (height - 1) as f32);
            for _ in 0..width {
                data.extend_from_slice(&[r, g, b, 255]);
            }
        }

        CameraFrame::from_rgba(width, height, data)
    }
}

/// Interpolate the gradient at `t` in [0, 1]
fn gradient_at(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let (from, to, local) = if t < 0.5 {
        (DEMO_GRADIENT[0], DEMO_GRADIENT[1], t * 2.0)
    } else {
        (DEMO_GRADIENT[1], DEMO_GRADIENT[2], (t - 0.5) * 2.0)
    };

    let mut out = [0u8; 3];
    for i in 0..3 {
        let a = from[i] as f32;
        let b = to[i] as f32;
        out[i] = (a + (b - a) * local).round() as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_have_reference_size() {
        let feed = DemoFeed::new();
        let frame = feed.capture_frame();
        assert_eq!((frame.width, frame.height), (REFERENCE_WIDTH, REFERENCE_HEIGHT));
        assert_eq!(frame.data.len(), (REFERENCE_WIDTH * REFERENCE_HEIGHT * 4) as usize);
    }

    #[test]
    fn gradient_hits_its_stops() {
        assert_eq!(gradient_at(0.0), DEMO_GRADIENT[0]);
        assert_eq!(gradient_at(0.5), DEMO_GRADIENT[1]);
        assert_eq!(gradient_at(1.0), DEMO_GRADIENT[2]);
    }

    #[test]
    fn consecutive_frames_drift() {
        let feed = DemoFeed::new();
        let first = feed.capture_frame();
        let second = feed.capture_frame();
        assert_ne!(first.pixel(0, 0), second.pixel(0, 0));
    }
}
