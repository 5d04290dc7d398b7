// SPDX-License-Identifier: GPL-3.0-only

//! Camera session orchestrator
//!
//! [`CameraSession`] owns every piece of session state: the video source,
//! capture mode, processor flags, loops, overlay model, recording and
//! zoom/flash controls. Nothing here is global; front ends hold the session
//! and drive it.
//!
//! # Architecture
//!
//! - `state`: Mode, processor and snapshot types
//! - `loops`: Interval tasks with generation-tagged ticks
//! - `frame_processor`: Detection types, the shared recognition loop, QR decoding
//! - `overlay`: Maps recognition results onto drawable primitives
//! - `recording`: Record/stop lifecycle and chunk collection
//! - `controls`: Zoom clamping and flash toggling
//! - `events`: Events published to the presentation layer
//! - `handlers`: The session operations, grouped by domain
//!
//! # Message flow
//!
//! Loops and background work never touch the session directly. They post a
//! [`SessionMessage`] to the session's channel, and the owner feeds each one
//! back through [`CameraSession::handle_message`], so state changes are
//! applied one at a time even though recognition and decoding run
//! concurrently.

pub mod controls;
pub mod events;
pub mod frame_processor;
mod handlers;
pub mod loops;
pub mod overlay;
pub mod recording;
pub mod state;

pub use events::{NoticeLevel, UiEvent};
pub use overlay::{DrawPrimitive, OverlayFrame};
pub use state::{CaptureMode, ProcessorKind, ProcessorSet, RecordingStatus, SessionSnapshot};

use crate::backends::camera::{
    default_backend, BackendResult, CameraBackend, CameraFrame, Capabilities, Facing, SourceKind,
    VideoSource,
};
use crate::config::Config;
use crate::constants::{
    ACQUIRE_TIMEOUT, PROCESSOR_INTERVAL, QR_SCAN_INTERVAL, RECORDING_TIMER_INTERVAL,
};
use crate::errors::AppError;
use crate::gallery::{Gallery, MemoryGallery};
use crate::recognition::{annotator_from_config, Annotator};
use controls::ZoomFlashController;
use frame_processor::{
    DetectionKind, DetectionResult, FrameProcessorScheduler, QrDecoder, QrDetection, QrDetector,
    RqrrDecoder, SimulatedQrDecoder,
};
use loops::PollingLoop;
use overlay::OverlayRenderer;
use recording::RecordingController;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;

/// Completed background work, posted back to the session
#[derive(Debug)]
pub enum SessionMessage {
    /// Recognition loop tick
    ProcessorTick { generation: u64 },
    /// QR polling tick
    QrTick { generation: u64 },
    /// One recognition call finished
    Recognition {
        kind: DetectionKind,
        epoch: u64,
        result: Result<DetectionResult, AppError>,
    },
    /// One QR decode pass finished
    QrScanned {
        generation: u64,
        detections: Vec<QrDetection>,
    },
    /// Recording timer tick
    RecordingTick { recording_id: u64 },
}

/// The session orchestrator
pub struct CameraSession {
    config: Config,
    source: VideoSource,
    mode: CaptureMode,
    processors: ProcessorSet,
    scheduler: FrameProcessorScheduler,
    qr_loop: PollingLoop,
    qr_detector: QrDetector,
    demo_qr_detector: QrDetector,
    overlay: OverlayRenderer,
    recording: RecordingController,
    controls: ZoomFlashController,
    annotator: Arc<dyn Annotator>,
    gallery: Arc<dyn Gallery>,
    events: mpsc::UnboundedSender<UiEvent>,
    tx: mpsc::UnboundedSender<SessionMessage>,
    rx: mpsc::UnboundedReceiver<SessionMessage>,
}

impl CameraSession {
    pub fn builder(config: Config) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Wait for the next piece of completed background work
    ///
    /// Never returns `None` while the session is alive.
    pub async fn next_message(&mut self) -> Option<SessionMessage> {
        self.rx.recv().await
    }

    pub fn try_next_message(&mut self) -> Option<SessionMessage> {
        self.rx.try_recv().ok()
    }

    /// Apply one message
    pub fn handle_message(&mut self, message: SessionMessage) {
        trace!(?message, "Handling session message");
        match message {
            SessionMessage::ProcessorTick { generation } => self.handle_processor_tick(generation),
            SessionMessage::QrTick { generation } => self.handle_qr_tick(generation),
            SessionMessage::Recognition {
                kind,
                epoch,
                result,
            } => self.apply_recognition(kind, epoch, result),
            SessionMessage::QrScanned {
                generation,
                detections,
            } => self.apply_qr_detections(generation, detections),
            SessionMessage::RecordingTick { recording_id } => {
                self.handle_recording_tick(recording_id)
            }
        }
    }

    /// Apply every message that is already queued; returns how many
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(message) = self.try_next_message() {
            self.handle_message(message);
            handled += 1;
        }
        handled
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn processors(&self) -> ProcessorSet {
        self.processors
    }

    pub fn zoom(&self) -> f32 {
        self.controls.zoom()
    }

    pub fn flash_on(&self) -> bool {
        self.controls.flash_on()
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn facing(&self) -> Facing {
        self.source.facing()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.source.capabilities()
    }

    pub fn camera_label(&self) -> String {
        self.source.label()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_active()
    }

    /// Whether the shared recognition loop is running
    pub fn is_polling(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn is_qr_polling(&self) -> bool {
        self.qr_loop.is_running()
    }

    /// Current combined overlay of every enabled kind
    pub fn overlay(&self) -> OverlayFrame {
        self.overlay.compose(&self.processors.enabled_polling())
    }

    /// Latest frame for the preview
    pub fn preview_frame(&self) -> BackendResult<CameraFrame> {
        self.source.capture_frame()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            processors: self.processors,
            source_kind: self.source.kind(),
            facing: self.source.facing(),
            camera_label: self.source.label(),
            capabilities: self.source.capabilities(),
            zoom: self.controls.zoom(),
            flash_on: self.controls.flash_on(),
            recording: self.recording.started_at_ms().map(|started_at_ms| RecordingStatus {
                started_at_ms,
                elapsed_ms: self.recording.elapsed_ms().unwrap_or(0),
                simulated: self.recording.is_simulated(),
            }),
            polling_active: self.scheduler.is_running(),
            qr_polling_active: self.qr_loop.is_running(),
        }
    }

    fn emit(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            trace!("No UI listening for session events");
        }
    }

    fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(UiEvent::notice(level, message));
    }

    fn haptic(&self) {
        if self.config.haptic_feedback {
            self.emit(UiEvent::Haptic);
        }
    }

    fn emit_source_changed(&self) {
        self.emit(UiEvent::SourceChanged {
            kind: self.source.kind(),
            facing: self.source.facing(),
            label: self.source.label(),
            capabilities: self.source.capabilities(),
        });
    }

    fn emit_overlay(&self) {
        self.emit(UiEvent::OverlayUpdated(self.overlay()));
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.scheduler.cancel();
        self.qr_loop.stop();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("source", &self.source)
            .field("mode", &self.mode)
            .field("processors", &self.processors)
            .field("recording", &self.recording)
            .field("annotator", &self.annotator.name())
            .finish_non_exhaustive()
    }
}

/// Builds a [`CameraSession`]
///
/// Every collaborator has a default: the compiled camera backend, the
/// annotator selected by the config, an in-memory gallery and the rqrr/
/// simulated QR decoders.
pub struct SessionBuilder {
    config: Config,
    facing: Facing,
    backend: Option<Arc<dyn CameraBackend>>,
    annotator: Option<Arc<dyn Annotator>>,
    gallery: Option<Arc<dyn Gallery>>,
    qr_decoder: Option<Arc<dyn QrDecoder>>,
    demo_qr_decoder: Option<Arc<dyn QrDecoder>>,
    acquire_timeout: Duration,
    processor_interval: Duration,
    qr_interval: Duration,
    recording_timer_interval: Duration,
}

impl SessionBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            facing: Facing::default(),
            backend: None,
            annotator: None,
            gallery: None,
            qr_decoder: None,
            demo_qr_decoder: None,
            acquire_timeout: ACQUIRE_TIMEOUT,
            processor_interval: PROCESSOR_INTERVAL,
            qr_interval: QR_SCAN_INTERVAL,
            recording_timer_interval: RECORDING_TIMER_INTERVAL,
        }
    }

    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn CameraBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn annotator(mut self, annotator: Arc<dyn Annotator>) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn gallery(mut self, gallery: Arc<dyn Gallery>) -> Self {
        self.gallery = Some(gallery);
        self
    }

    /// Decoder used with a real feed
    pub fn qr_decoder(mut self, decoder: Arc<dyn QrDecoder>) -> Self {
        self.qr_decoder = Some(decoder);
        self
    }

    /// Decoder used with the demo feed
    pub fn demo_qr_decoder(mut self, decoder: Arc<dyn QrDecoder>) -> Self {
        self.demo_qr_decoder = Some(decoder);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Recognition polling period; zero runs at the shortest loop period
    pub fn processor_interval(mut self, interval: Duration) -> Self {
        self.processor_interval = interval;
        self
    }

    /// QR polling period; zero runs at the shortest loop period
    pub fn qr_interval(mut self, interval: Duration) -> Self {
        self.qr_interval = interval;
        self
    }

    pub fn recording_timer_interval(mut self, interval: Duration) -> Self {
        self.recording_timer_interval = interval;
        self
    }

    /// Build the session and the receiving end of its UI events
    ///
    /// The session starts in demo; call [`CameraSession::start`] to acquire
    /// a feed.
    pub fn build(self) -> (CameraSession, mpsc::UnboundedReceiver<UiEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (tx, rx) = mpsc::unbounded_channel();

        let backend = self.backend.unwrap_or_else(default_backend);
        let annotator = self
            .annotator
            .unwrap_or_else(|| annotator_from_config(&self.config.recognition));
        let gallery = self
            .gallery
            .unwrap_or_else(|| Arc::new(MemoryGallery::new()));
        let qr_decoder = self
            .qr_decoder
            .unwrap_or_else(|| Arc::new(RqrrDecoder::new()));
        let demo_qr_decoder = self
            .demo_qr_decoder
            .unwrap_or_else(|| Arc::new(SimulatedQrDecoder::new()));

        let session = CameraSession {
            config: self.config,
            source: VideoSource::new(backend, self.facing).with_acquire_timeout(self.acquire_timeout),
            mode: CaptureMode::default(),
            processors: ProcessorSet::default(),
            scheduler: FrameProcessorScheduler::new(self.processor_interval),
            qr_loop: PollingLoop::new(self.qr_interval, false),
            qr_detector: QrDetector::new(qr_decoder),
            demo_qr_detector: QrDetector::new(demo_qr_decoder),
            overlay: OverlayRenderer::new(),
            recording: RecordingController::new(self.recording_timer_interval),
            controls: ZoomFlashController::new(),
            annotator,
            gallery,
            events,
            tx,
            rx,
        };
        (session, events_rx)
    }
}
