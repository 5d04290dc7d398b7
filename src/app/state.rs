// SPDX-License-Identifier: GPL-3.0-only

//! Session state types

use crate::app::frame_processor::DetectionKind;
use crate::backends::camera::{Capabilities, Facing, SourceKind};
use serde::{Deserialize, Serialize};

/// Capture mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CaptureMode {
    #[default]
    Photo,
    Video,
    /// QR scanning; recognition processors are unavailable
    Scanner,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 3] = [CaptureMode::Photo, CaptureMode::Video, CaptureMode::Scanner];

    pub fn display_name(&self) -> &'static str {
        match self {
            CaptureMode::Photo => "Photo",
            CaptureMode::Video => "Video",
            CaptureMode::Scanner => "Scanner",
        }
    }
}

/// Toggleable frame processors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorKind {
    FaceDetection,
    ObjectDetection,
    TextRecognition,
    /// Owned by scanner mode, never toggled directly
    QrScanning,
}

impl ProcessorKind {
    pub const ALL: [ProcessorKind; 4] = [
        ProcessorKind::FaceDetection,
        ProcessorKind::ObjectDetection,
        ProcessorKind::TextRecognition,
        ProcessorKind::QrScanning,
    ];

    /// Recognition kind served by the shared polling loop, `None` for QR
    pub fn detection_kind(self) -> Option<DetectionKind> {
        match self {
            ProcessorKind::FaceDetection => Some(DetectionKind::Face),
            ProcessorKind::ObjectDetection => Some(DetectionKind::Object),
            ProcessorKind::TextRecognition => Some(DetectionKind::Text),
            ProcessorKind::QrScanning => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProcessorKind::FaceDetection => "Face detection",
            ProcessorKind::ObjectDetection => "Object detection",
            ProcessorKind::TextRecognition => "Text recognition",
            ProcessorKind::QrScanning => "QR scanning",
        }
    }
}

impl From<DetectionKind> for ProcessorKind {
    fn from(kind: DetectionKind) -> Self {
        match kind {
            DetectionKind::Face => ProcessorKind::FaceDetection,
            DetectionKind::Object => ProcessorKind::ObjectDetection,
            DetectionKind::Text => ProcessorKind::TextRecognition,
        }
    }
}

/// Enabled flag per processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessorSet {
    pub face_detection: bool,
    pub object_detection: bool,
    pub text_recognition: bool,
    pub qr_scanning: bool,
}

impl ProcessorSet {
    pub fn is_enabled(&self, kind: ProcessorKind) -> bool {
        match kind {
            ProcessorKind::FaceDetection => self.face_detection,
            ProcessorKind::ObjectDetection => self.object_detection,
            ProcessorKind::TextRecognition => self.text_recognition,
            ProcessorKind::QrScanning => self.qr_scanning,
        }
    }

    pub fn set(&mut self, kind: ProcessorKind, enabled: bool) {
        let flag = match kind {
            ProcessorKind::FaceDetection => &mut self.face_detection,
            ProcessorKind::ObjectDetection => &mut self.object_detection,
            ProcessorKind::TextRecognition => &mut self.text_recognition,
            ProcessorKind::QrScanning => &mut self.qr_scanning,
        };
        *flag = enabled;
    }

    /// Enabled recognition kinds, in a stable order
    pub fn enabled_polling(&self) -> Vec<DetectionKind> {
        DetectionKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(ProcessorKind::from(*kind)))
            .collect()
    }

    /// Number of enabled recognition processors (QR excluded)
    pub fn polling_count(&self) -> usize {
        [self.face_detection, self.object_detection, self.text_recognition]
            .into_iter()
            .filter(|enabled| *enabled)
            .count()
    }

    pub fn any(&self) -> bool {
        self.polling_count() > 0 || self.qr_scanning
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Recording status as seen from outside the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingStatus {
    pub started_at_ms: i64,
    pub elapsed_ms: u64,
    pub simulated: bool,
}

/// Copy of the session state for UI and persistence collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: CaptureMode,
    pub processors: ProcessorSet,
    pub source_kind: SourceKind,
    pub facing: Facing,
    pub camera_label: String,
    pub capabilities: Capabilities,
    pub zoom: f32,
    pub flash_on: bool,
    pub recording: Option<RecordingStatus>,
    pub polling_active: bool,
    pub qr_polling_active: bool,
}
