// SPDX-License-Identifier: GPL-3.0-only

//! Capture handlers
//!
//! Handles photo capture and the video recording lifecycle.

use crate::app::recording::{format_elapsed, RecordingOutcome};
use crate::app::{CameraSession, CaptureMode, NoticeLevel, UiEvent};
use crate::gallery::{GalleryItem, GalleryItemType, GalleryMetadata, MediaPayload};
use crate::media::encode_reference_frame;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const PHOTO_MIME: &str = "image/jpeg";

impl CameraSession {
    // =========================================================================
    // Capture Handlers
    // =========================================================================

    /// The shutter button: what it does depends on the mode
    pub async fn capture(&mut self) -> Option<Uuid> {
        match self.mode {
            CaptureMode::Photo => self.capture_photo().await,
            CaptureMode::Video => {
                self.toggle_recording();
                None
            }
            CaptureMode::Scanner => {
                self.notice(NoticeLevel::Info, "QR scanner runs automatically");
                None
            }
        }
    }

    /// Capture one reference frame as a JPEG photo
    pub async fn capture_photo(&mut self) -> Option<Uuid> {
        let demo = self.source.kind().is_demo();
        let encoded = match self.source.capture_frame() {
            Ok(frame) => encode_reference_frame(frame).await,
            Err(e) => Err(e),
        };
        let encoded = match encoded {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(error = %e, "Photo capture failed");
                self.notice(NoticeLevel::Error, format!("Photo capture failed: {e}"));
                return None;
            }
        };

        let metadata = GalleryMetadata {
            camera: self.source.facing().display_name().to_string(),
            zoom: self.controls.zoom(),
            resolution: Some(encoded.resolution()),
            duration_ms: None,
            demo,
            format: Some(PHOTO_MIME.to_string()),
        };
        info!(
            event = "capturePhoto",
            demo,
            zoom = metadata.zoom,
            size = encoded.jpeg.len(),
            "Photo captured"
        );

        let item = GalleryItem::new(
            GalleryItemType::Photo,
            metadata,
            MediaPayload::Jpeg(encoded.jpeg),
        );
        let id = self.deliver(item);
        self.haptic();
        Some(id)
    }

    /// Start recording in video mode
    ///
    /// Returns false when not in video mode or already recording.
    pub fn start_recording(&mut self) -> bool {
        if self.mode != CaptureMode::Video {
            self.notice(NoticeLevel::Info, "Switch to video mode to record");
            return false;
        }

        match self
            .recording
            .start(&self.source, self.config.format, self.config.quality, &self.tx)
        {
            Ok(started) => {
                info!(
                    event = "startVideoRecording",
                    simulated = started.simulated,
                    mime = ?started.mime,
                    quality = self.config.quality.display_name(),
                    "Recording started"
                );
                self.emit(UiEvent::RecordingStarted {
                    simulated: started.simulated,
                    mime: started.mime.map(str::to_string),
                });
                self.emit(UiEvent::RecordingElapsed {
                    display: format_elapsed(0),
                });
                self.haptic();
                true
            }
            Err(e) => {
                debug!(error = %e, "Recording not started");
                false
            }
        }
    }

    /// Stop recording and hand the result to the gallery
    ///
    /// Returns the new item's id. A real recording that produced no data
    /// yields no item and a warning notice.
    pub fn stop_recording(&mut self) -> Option<Uuid> {
        let outcome = match self.recording.stop() {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(error = %e, "Nothing to stop");
                return None;
            }
        };
        let duration_ms = outcome.duration_ms();
        info!(event = "stopVideoRecording", duration_ms, "Recording stopped");

        let camera = self.source.facing().display_name().to_string();
        let zoom = self.controls.zoom();
        let (media, demo, format, resolution) = match outcome {
            RecordingOutcome::Simulated { .. } => (MediaPayload::Placeholder, true, None, None),
            RecordingOutcome::Media {
                mime,
                resolution,
                data,
                ..
            } => (
                MediaPayload::Blob {
                    mime: mime.to_string(),
                    data,
                },
                false,
                Some(mime.to_string()),
                Some(resolution),
            ),
            RecordingOutcome::Empty { .. } => {
                warn!(duration_ms, "Recording produced no data, nothing saved");
                self.notice(NoticeLevel::Warning, "Recording produced no data");
                self.emit(UiEvent::RecordingStopped {
                    duration_ms,
                    item: None,
                });
                self.haptic();
                return None;
            }
        };

        let item = GalleryItem::new(
            GalleryItemType::Video,
            GalleryMetadata {
                camera,
                zoom,
                resolution,
                duration_ms: Some(duration_ms),
                demo,
                format,
            },
            media,
        );
        let id = self.deliver(item);
        self.emit(UiEvent::RecordingStopped {
            duration_ms,
            item: Some(id),
        });
        self.haptic();
        Some(id)
    }

    pub fn toggle_recording(&mut self) -> bool {
        if self.recording.is_active() {
            self.stop_recording();
        } else {
            self.start_recording();
        }
        self.recording.is_active()
    }

    pub(crate) fn handle_recording_tick(&mut self, recording_id: u64) {
        if !self.recording.is_current(recording_id) {
            return;
        }
        if let Some(elapsed) = self.recording.elapsed_ms() {
            self.emit(UiEvent::RecordingElapsed {
                display: format_elapsed(elapsed),
            });
        }
    }

    /// Announce a captured item and store it when auto-save is on
    fn deliver(&self, item: GalleryItem) -> Uuid {
        let id = item.id;
        let item_type = item.item_type;
        let metadata = item.metadata.clone();

        if self.config.auto_save {
            match self.gallery.add(item) {
                Ok(()) => debug!(%id, ?item_type, "Added to gallery"),
                Err(e) => {
                    error!(%id, error = %e, "Failed to save to gallery");
                    self.notice(NoticeLevel::Error, format!("Could not save: {e}"));
                }
            }
        } else {
            debug!(%id, "Auto-save off, item not stored");
        }

        self.emit(UiEvent::CaptureCompleted {
            id,
            item_type,
            metadata,
        });
        id
    }
}
