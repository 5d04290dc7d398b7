// SPDX-License-Identifier: GPL-3.0-only

//! Overlay model for recognition results
//!
//! The renderer keeps the latest result per kind and composes all enabled
//! kinds into one frame of drawing primitives in reference frame pixels.

use crate::app::frame_processor::{DetectionKind, DetectionResult, PixelBox};
use crate::constants::{REFERENCE_HEIGHT, REFERENCE_WIDTH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Inset of the recognized-text label from the bottom-left corner
const TEXT_LABEL_MARGIN: f32 = 24.0;
const TEXT_LABEL_BASELINE: f32 = 48.0;

/// One thing to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawPrimitive {
    Box {
        kind: DetectionKind,
        rect: PixelBox,
        label: Option<String>,
    },
    Label {
        kind: DetectionKind,
        x: f32,
        y: f32,
        text: String,
    },
}

impl DrawPrimitive {
    pub fn kind(&self) -> DetectionKind {
        match self {
            DrawPrimitive::Box { kind, .. } | DrawPrimitive::Label { kind, .. } => *kind,
        }
    }
}

/// A full overlay pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayFrame {
    pub width: u32,
    pub height: u32,
    pub primitives: Vec<DrawPrimitive>,
}

impl Default for OverlayFrame {
    fn default() -> Self {
        Self::empty()
    }
}

impl OverlayFrame {
    pub fn empty() -> Self {
        Self {
            width: REFERENCE_WIDTH,
            height: REFERENCE_HEIGHT,
            primitives: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn count(&self, kind: DetectionKind) -> usize {
        self.primitives.iter().filter(|p| p.kind() == kind).count()
    }
}

#[derive(Debug, Default)]
pub struct OverlayRenderer {
    latest: BTreeMap<DetectionKind, DetectionResult>,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the result of one kind; `None` clears only that kind
    pub fn update(&mut self, kind: DetectionKind, result: Option<DetectionResult>) {
        match result {
            Some(result) if result.kind() != kind => {
                warn!(expected = ?kind, got = ?result.kind(), "Ignoring mismatched recognition result");
            }
            Some(result) => {
                self.latest.insert(kind, result);
            }
            None => {
                self.latest.remove(&kind);
            }
        }
    }

    /// Update one kind and compose a pass over every enabled kind
    pub fn render(
        &mut self,
        kind: DetectionKind,
        result: Option<DetectionResult>,
        enabled: &[DetectionKind],
    ) -> OverlayFrame {
        self.update(kind, result);
        self.compose(enabled)
    }

    /// Combine the latest result of each enabled kind
    pub fn compose(&self, enabled: &[DetectionKind]) -> OverlayFrame {
        let mut frame = OverlayFrame::empty();
        for (kind, result) in &self.latest {
            if enabled.contains(kind) {
                frame.primitives.extend(primitives_for(result));
            }
        }
        frame
    }

    pub fn latest(&self, kind: DetectionKind) -> Option<&DetectionResult> {
        self.latest.get(&kind)
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }
}

fn primitives_for(result: &DetectionResult) -> Vec<DrawPrimitive> {
    match result {
        // Already absolute in the reference frame
        DetectionResult::Faces(faces) => faces
            .iter()
            .map(|rect| DrawPrimitive::Box {
                kind: DetectionKind::Face,
                rect: *rect,
                label: None,
            })
            .collect(),
        DetectionResult::Objects(objects) => objects
            .iter()
            .map(|object| DrawPrimitive::Box {
                kind: DetectionKind::Object,
                rect: object.bounds.to_pixels(REFERENCE_WIDTH, REFERENCE_HEIGHT),
                label: Some(match object.score {
                    Some(score) => format!("{} {:.0}%", object.label, score * 100.0),
                    None => object.label.clone(),
                }),
            })
            .collect(),
        DetectionResult::Text(text) if text.trim().is_empty() => Vec::new(),
        DetectionResult::Text(text) => vec![DrawPrimitive::Label {
            kind: DetectionKind::Text,
            x: TEXT_LABEL_MARGIN,
            y: REFERENCE_HEIGHT as f32 - TEXT_LABEL_BASELINE,
            text: text.trim().to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::{FrameRegion, LabeledRegion};

    fn face() -> DetectionResult {
        DetectionResult::Faces(vec![PixelBox {
            x: 100.0,
            y: 50.0,
            width: 200.0,
            height: 200.0,
        }])
    }

    fn cup() -> DetectionResult {
        DetectionResult::Objects(vec![LabeledRegion {
            bounds: FrameRegion {
                x: 0.5,
                y: 0.5,
                width: 0.25,
                height: 0.5,
            },
            label: "Cup".into(),
            score: Some(0.9),
        }])
    }

    #[test]
    fn faces_are_drawn_as_is_and_objects_are_scaled() {
        let mut renderer = OverlayRenderer::new();
        renderer.update(DetectionKind::Face, Some(face()));
        let frame = renderer.render(
            DetectionKind::Object,
            Some(cup()),
            &[DetectionKind::Face, DetectionKind::Object],
        );

        assert_eq!(frame.primitives.len(), 2);
        match &frame.primitives[0] {
            DrawPrimitive::Box { rect, .. } => assert_eq!(rect.x, 100.0),
            other => panic!("unexpected primitive {other:?}"),
        }
        match &frame.primitives[1] {
            DrawPrimitive::Box { rect, label, .. } => {
                assert_eq!(*rect, PixelBox { x: 640.0, y: 360.0, width: 320.0, height: 360.0 });
                assert_eq!(label.as_deref(), Some("Cup 90%"));
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn text_is_a_fixed_label() {
        let mut renderer = OverlayRenderer::new();
        let frame = renderer.render(
            DetectionKind::Text,
            Some(DetectionResult::Text(" EXIT \n".into())),
            &[DetectionKind::Text],
        );
        assert_eq!(
            frame.primitives,
            vec![DrawPrimitive::Label {
                kind: DetectionKind::Text,
                x: 24.0,
                y: 672.0,
                text: "EXIT".into(),
            }]
        );
    }

    #[test]
    fn absence_clears_only_that_kind() {
        let mut renderer = OverlayRenderer::new();
        let enabled = [DetectionKind::Face, DetectionKind::Object];
        renderer.update(DetectionKind::Face, Some(face()));
        renderer.update(DetectionKind::Object, Some(cup()));

        let frame = renderer.render(DetectionKind::Face, None, &enabled);
        assert_eq!(frame.count(DetectionKind::Face), 0);
        assert_eq!(frame.count(DetectionKind::Object), 1);
    }

    #[test]
    fn disabled_kinds_are_not_composed() {
        let mut renderer = OverlayRenderer::new();
        renderer.update(DetectionKind::Face, Some(face()));
        assert!(renderer.compose(&[DetectionKind::Object]).is_empty());
        assert_eq!(renderer.compose(&[DetectionKind::Face]).count(DetectionKind::Face), 1);
    }

    #[test]
    fn mismatched_result_is_ignored() {
        let mut renderer = OverlayRenderer::new();
        renderer.update(DetectionKind::Face, Some(cup()));
        assert!(renderer.latest(DetectionKind::Face).is_none());
    }
}
