// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing handlers
//!
//! Processor toggles, the recognition loop ticks and the QR scanner ticks.
//! Ticks only capture a frame and spawn the work; results come back as
//! messages and are checked against the current state before they are
//! applied.

use crate::app::frame_processor::{DetectionKind, DetectionResult, QrDetection};
use crate::app::{CameraSession, CaptureMode, NoticeLevel, ProcessorKind, SessionMessage, UiEvent};
use crate::backends::camera::{CameraFrame, SourceKind};
use crate::errors::AppError;
use crate::media::encode_reference_frame;
use crate::recognition::Annotator;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

impl CameraSession {
    // =========================================================================
    // Processor Toggles
    // =========================================================================

    /// Flip one recognition processor; returns its new state
    pub fn toggle_processor(&mut self, kind: ProcessorKind) -> bool {
        let enabled = !self.processors.is_enabled(kind);
        self.set_processor(kind, enabled)
    }

    /// Enable or disable one recognition processor
    ///
    /// QR scanning follows scanner mode and cannot be set directly. The
    /// recognition processors cannot be enabled in scanner mode.
    pub fn set_processor(&mut self, kind: ProcessorKind, enabled: bool) -> bool {
        let Some(detection) = kind.detection_kind() else {
            self.notice(NoticeLevel::Info, "QR scanning follows scanner mode");
            return self.processors.qr_scanning;
        };
        if enabled && self.mode == CaptureMode::Scanner {
            self.notice(
                NoticeLevel::Info,
                format!("{} is not available in scanner mode", kind.display_name()),
            );
            return false;
        }
        if self.processors.is_enabled(kind) == enabled {
            return enabled;
        }

        self.processors.set(kind, enabled);
        if !enabled {
            // Anything still in flight for this kind is now stale
            self.scheduler.bump_epoch(detection);
            self.overlay.update(detection, None);
            self.emit_overlay();
        }
        let transition = self.scheduler.reconcile(self.mode, &self.processors, &self.tx);

        info!(processor = ?kind, enabled, ?transition, "Processor toggled");
        self.emit(UiEvent::ProcessorToggled { kind, enabled });
        let (level, state) = if enabled {
            (NoticeLevel::Success, "enabled")
        } else {
            (NoticeLevel::Info, "disabled")
        };
        self.notice(level, format!("{} {state}", kind.display_name()));
        self.haptic();
        enabled
    }

    /// Pause all processing without changing mode
    ///
    /// Recognition processors are turned off. In scanner mode the QR loop
    /// is paused but QR scanning stays selected, so
    /// [`CameraSession::resume_processing`] can pick it up again.
    pub fn suspend_processing(&mut self) {
        let disabled: Vec<ProcessorKind> = self
            .processors
            .enabled_polling()
            .into_iter()
            .map(ProcessorKind::from)
            .collect();
        for kind in &disabled {
            self.processors.set(*kind, false);
        }

        self.scheduler.cancel();
        self.qr_loop.stop();
        self.overlay.clear();
        self.emit_overlay();

        for kind in disabled {
            self.emit(UiEvent::ProcessorToggled {
                kind,
                enabled: false,
            });
        }
        debug!("Processing suspended");
    }

    /// Restart QR polling after a suspend
    pub fn resume_processing(&mut self) {
        if self.mode == CaptureMode::Scanner
            && self.processors.qr_scanning
            && !self.qr_loop.is_running()
        {
            self.start_qr_polling();
            debug!("Processing resumed");
        }
    }

    // =========================================================================
    // Recognition
    // =========================================================================

    pub(crate) fn handle_processor_tick(&mut self, generation: u64) {
        if !self.scheduler.is_current(generation) {
            debug!(generation, "Ignoring tick of a stopped recognition loop");
            return;
        }
        let jobs: Vec<(DetectionKind, u64)> = self
            .processors
            .enabled_polling()
            .into_iter()
            .map(|kind| (kind, self.scheduler.epoch(kind)))
            .collect();
        if jobs.is_empty() {
            return;
        }

        let frame = match self.source.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "No frame for recognition this tick");
                return;
            }
        };

        tokio::spawn(run_recognition(
            frame,
            jobs,
            Arc::clone(&self.annotator),
            self.tx.clone(),
        ));
    }

    pub(crate) fn apply_recognition(
        &mut self,
        kind: DetectionKind,
        epoch: u64,
        result: Result<DetectionResult, AppError>,
    ) {
        if !self
            .scheduler
            .accepts(kind, epoch, self.mode, &self.processors)
        {
            debug!(?kind, epoch, "Discarding stale recognition result");
            return;
        }

        match result {
            Ok(result) => {
                debug!(?kind, summary = %result.summary(), "Recognition result");
                self.overlay.update(kind, Some(result));
            }
            Err(e) => {
                // Background ticks fail quietly; the kind just shows nothing
                debug!(?kind, error = %e, "Recognition failed this tick");
                self.overlay.update(kind, None);
            }
        }
        self.emit_overlay();
    }

    /// Run one recognition pass on request
    ///
    /// Unlike the polling loop, a failure here is reported to the user.
    pub async fn recognize_once(&mut self, kind: DetectionKind) -> Option<DetectionResult> {
        let frame = self.source.capture_frame();
        let annotator = Arc::clone(&self.annotator);
        let result = async move {
            let encoded = encode_reference_frame(frame?).await?;
            let image: Arc<str> = Arc::from(encoded.to_base64());
            let result = annotator.annotate(kind, image).await?;
            Ok::<_, AppError>(result)
        }
        .await;

        match result {
            Ok(result) => {
                let message = if result.is_empty() {
                    format!("{}: nothing found", kind.display_name())
                } else {
                    format!("{}: {}", kind.display_name(), result.summary())
                };
                self.notice(NoticeLevel::Success, message);
                if self.mode != CaptureMode::Scanner
                    && self.processors.is_enabled(ProcessorKind::from(kind))
                {
                    self.overlay.update(kind, Some(result.clone()));
                    self.emit_overlay();
                }
                Some(result)
            }
            Err(e) => {
                warn!(?kind, error = %e, "Recognition request failed");
                self.notice(NoticeLevel::Error, format!("Recognition failed: {e}"));
                None
            }
        }
    }

    // =========================================================================
    // QR Scanning
    // =========================================================================

    pub(crate) fn handle_qr_tick(&mut self, generation: u64) {
        if !self.qr_loop.is_current(generation) || self.mode != CaptureMode::Scanner {
            return;
        }
        let frame = match self.source.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "No frame for QR scanning this tick");
                return;
            }
        };

        let detector = match self.source.kind() {
            SourceKind::Real => self.qr_detector.clone(),
            SourceKind::Demo => self.demo_qr_detector.clone(),
        };
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let detections = detector.detect(frame).await;
            let _ = tx.send(SessionMessage::QrScanned {
                generation,
                detections,
            });
        });
    }

    pub(crate) fn apply_qr_detections(&mut self, generation: u64, detections: Vec<QrDetection>) {
        if !self.qr_loop.is_current(generation) || self.mode != CaptureMode::Scanner {
            debug!(generation, "Discarding stale QR result");
            return;
        }
        if detections.is_empty() {
            return;
        }

        for detection in detections {
            info!(content = %detection.content, action = detection.action.action_label(), "QR code detected");
            self.notice(
                NoticeLevel::Success,
                format!("QR: {}", detection.action.describe()),
            );
            self.emit(UiEvent::QrDetected(detection));
        }
        self.haptic();
    }
}

/// Encode one frame and submit it once per kind
///
/// The submissions run independently; each posts its own result.
async fn run_recognition(
    frame: CameraFrame,
    jobs: Vec<(DetectionKind, u64)>,
    annotator: Arc<dyn Annotator>,
    tx: mpsc::UnboundedSender<SessionMessage>,
) {
    let image: Arc<str> = match encode_reference_frame(frame).await {
        Ok(encoded) => Arc::from(encoded.to_base64()),
        Err(e) => {
            warn!(error = %e, "Could not encode frame for recognition");
            for (kind, epoch) in jobs {
                let _ = tx.send(SessionMessage::Recognition {
                    kind,
                    epoch,
                    result: Err(e.clone().into()),
                });
            }
            return;
        }
    };

    for (kind, epoch) in jobs {
        let request = annotator.annotate(kind, Arc::clone(&image));
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = request.await.map_err(AppError::from);
            let _ = tx.send(SessionMessage::Recognition {
                kind,
                epoch,
                result,
            });
        });
    }
}
