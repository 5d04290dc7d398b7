// SPDX-License-Identifier: GPL-3.0-only

//! Offline recognition
//!
//! Used when no recognition key is configured. Results are deterministic per
//! call order, so tests and the demo feed get stable, visibly changing
//! overlays without any network access.

use super::Annotator;
use crate::app::frame_processor::{
    DetectionKind, DetectionResult, FrameRegion, LabeledRegion, PixelBox,
};
use crate::constants::{DEMO_OBJECTS, DEMO_TEXTS, REFERENCE_HEIGHT, REFERENCE_WIDTH};
use crate::errors::RecognitionError;
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Horizontal step of the simulated face between calls, in pixels
const FACE_STEP: f32 = 40.0;
const FACE_SIZE: f32 = 240.0;

#[derive(Debug, Default)]
pub struct SimulatedAnnotator {
    faces: AtomicUsize,
    objects: AtomicUsize,
    texts: AtomicUsize,
}

impl SimulatedAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    fn face(&self) -> DetectionResult {
        let n = self.faces.fetch_add(1, Ordering::Relaxed);
        // Sway left and right around the center
        let offset = ((n % 5) as f32 - 2.0) * FACE_STEP;
        DetectionResult::Faces(vec![PixelBox {
            x: (REFERENCE_WIDTH as f32 - FACE_SIZE) / 2.0 + offset,
            y: (REFERENCE_HEIGHT as f32 - FACE_SIZE) / 2.0 - 40.0,
            width: FACE_SIZE,
            height: FACE_SIZE,
        }])
    }

    fn object(&self) -> DetectionResult {
        let n = self.objects.fetch_add(1, Ordering::Relaxed);
        let label = DEMO_OBJECTS[n % DEMO_OBJECTS.len()];
        let column = (n % 3) as f32;
        DetectionResult::Objects(vec![LabeledRegion {
            bounds: FrameRegion {
                x: 0.1 + column * 0.25,
                y: 0.25,
                width: 0.3,
                height: 0.45,
            },
            label: label.to_string(),
            score: Some(0.9 - (n % 4) as f32 * 0.05),
        }])
    }

    fn text(&self) -> DetectionResult {
        let n = self.texts.fetch_add(1, Ordering::Relaxed);
        DetectionResult::Text(DEMO_TEXTS[n % DEMO_TEXTS.len()].to_string())
    }
}

impl Annotator for SimulatedAnnotator {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn annotate(
        &self,
        kind: DetectionKind,
        _image_base64: Arc<str>,
    ) -> BoxFuture<'static, Result<DetectionResult, RecognitionError>> {
        let result = match kind {
            DetectionKind::Face => self.face(),
            DetectionKind::Object => self.object(),
            DetectionKind::Text => self.text(),
        };
        futures::future::ready(Ok(result)).boxed()
    }
}
