// SPDX-License-Identifier: GPL-3.0-only

//! Events the session publishes to the presentation layer
//!
//! Each event carries enough state to update a view without querying the
//! session back.

use super::overlay::OverlayFrame;
use super::state::{CaptureMode, ProcessorKind};
use crate::app::frame_processor::QrDetection;
use crate::backends::camera::{Capabilities, Facing, SourceKind};
use crate::gallery::{GalleryItemType, GalleryMetadata};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Feed acquired, released or switched
    SourceChanged {
        kind: SourceKind,
        facing: Facing,
        label: String,
        capabilities: Capabilities,
    },
    ModeChanged {
        mode: CaptureMode,
    },
    ProcessorToggled {
        kind: ProcessorKind,
        enabled: bool,
    },
    ZoomChanged {
        zoom: f32,
    },
    FlashChanged {
        on: bool,
    },
    RecordingStarted {
        simulated: bool,
        mime: Option<String>,
    },
    /// Once per second while recording, `MM:SS`
    RecordingElapsed {
        display: String,
    },
    RecordingStopped {
        duration_ms: u64,
        item: Option<Uuid>,
    },
    OverlayUpdated(OverlayFrame),
    QrDetected(QrDetection),
    CaptureCompleted {
        id: Uuid,
        item_type: GalleryItemType,
        metadata: GalleryMetadata,
    },
    Notice {
        level: NoticeLevel,
        message: String,
    },
    Haptic,
}

impl UiEvent {
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        UiEvent::Notice {
            level,
            message: message.into(),
        }
    }
}
