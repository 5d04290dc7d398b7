// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the camera session

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use vision_camera::app::frame_processor::{
    DetectionKind, DetectionResult, FrameRegion, LabeledRegion, PixelBox, QrDecoder, QrDetection,
};
use vision_camera::app::{
    CameraSession, CaptureMode, DrawPrimitive, NoticeLevel, ProcessorKind, ProcessorSet,
    SessionMessage, UiEvent,
};
use vision_camera::backends::camera::{
    BackendResult, CameraBackend, CameraFrame, Capabilities, ChunkSink, EncoderSettings, Facing,
    FeedHandle, MediaEncoder, SourceKind, ZoomRange,
};
use vision_camera::errors::{CameraError, RecognitionError, RecordingError};
use vision_camera::gallery::{GalleryItemType, MediaPayload, MemoryGallery};
use vision_camera::recognition::Annotator;
use vision_camera::{Config, VideoQuality};

const GUARD: Duration = Duration::from_secs(10);

type Calls = Arc<Mutex<Vec<String>>>;

fn record(calls: &Calls, call: impl Into<String>) {
    calls.lock().unwrap().push(call.into());
}

fn calls_of(calls: &Calls) -> Vec<String> {
    calls.lock().unwrap().clone()
}

// =============================================================================
// Mock camera
// =============================================================================

#[derive(Clone)]
struct MockBackend {
    available: bool,
    /// `open` never completes
    hang: bool,
    failing: HashSet<Facing>,
    capabilities: Capabilities,
    /// Segments the encoder emits on stop; `None` means no encoder at all
    segments: Option<Vec<Vec<u8>>>,
    calls: Calls,
}

impl MockBackend {
    fn live() -> Self {
        Self {
            available: true,
            hang: false,
            failing: HashSet::new(),
            capabilities: Capabilities {
                zoom: Some(ZoomRange { min: 1.0, max: 4.0 }),
                torch: true,
            },
            segments: Some(vec![vec![1, 2], vec![3]]),
            calls: Arc::default(),
        }
    }

    fn without_media_api() -> Self {
        Self {
            available: false,
            ..Self::live()
        }
    }

    fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::live()
        }
    }

    fn failing(mut self, facing: Facing) -> Self {
        self.failing.insert(facing);
        self
    }

    fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    fn with_segments(mut self, segments: Option<Vec<Vec<u8>>>) -> Self {
        self.segments = segments;
        self
    }
}

impl CameraBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn open(&self, facing: Facing) -> BoxFuture<'static, BackendResult<Box<dyn FeedHandle>>> {
        record(&self.calls, format!("open:{facing}"));
        if self.hang {
            return futures::future::pending().boxed();
        }
        let result: BackendResult<Box<dyn FeedHandle>> = if self.failing.contains(&facing) {
            Err(CameraError::DeviceUnavailable("permission denied".into()))
        } else {
            Ok(Box::new(MockFeed {
                facing,
                capabilities: self.capabilities,
                segments: self.segments.clone(),
                calls: Arc::clone(&self.calls),
            }))
        };
        futures::future::ready(result).boxed()
    }
}

struct MockFeed {
    facing: Facing,
    capabilities: Capabilities,
    segments: Option<Vec<Vec<u8>>>,
    calls: Calls,
}

impl FeedHandle for MockFeed {
    fn facing(&self) -> Facing {
        self.facing
    }

    fn label(&self) -> String {
        format!("Mock {}", self.facing)
    }

    fn query_capabilities(&self) -> BackendResult<Capabilities> {
        Ok(self.capabilities)
    }

    fn capture_frame(&self) -> BackendResult<CameraFrame> {
        Ok(CameraFrame::from_rgba(64, 36, vec![128; 64 * 36 * 4]))
    }

    fn apply_zoom(&self, zoom: f32) -> BackendResult<()> {
        record(&self.calls, format!("zoom:{zoom}"));
        Ok(())
    }

    fn apply_torch(&self, on: bool) -> BackendResult<()> {
        record(&self.calls, format!("torch:{on}"));
        Ok(())
    }

    fn supports_mime(&self, _mime: &str) -> bool {
        true
    }

    fn start_encoder(
        &self,
        settings: &EncoderSettings,
        sink: ChunkSink,
    ) -> Result<Box<dyn MediaEncoder>, RecordingError> {
        let Some(segments) = self.segments.clone() else {
            return Err(RecordingError::EncoderUnavailable("no recorder".into()));
        };
        record(
            &self.calls,
            format!(
                "encode:{} {} {}kbps",
                settings.mime,
                settings.resolution(),
                settings.bitrate_kbps
            ),
        );
        Ok(Box::new(MockEncoder { sink, segments }))
    }

    fn stop(&self) {
        record(&self.calls, format!("stop:{}", self.facing));
    }
}

struct MockEncoder {
    sink: ChunkSink,
    segments: Vec<Vec<u8>>,
}

impl MediaEncoder for MockEncoder {
    fn stop(self: Box<Self>) {
        for segment in self.segments {
            self.sink.push(segment);
        }
    }
}

// =============================================================================
// Mock recognition
// =============================================================================

/// Answers every kind, labelling objects with the call number
#[derive(Default)]
struct CountingAnnotator {
    calls: Mutex<Vec<DetectionKind>>,
    counter: AtomicUsize,
    delays: Mutex<Vec<Duration>>,
    /// Requests for this kind fail
    failing: Option<DetectionKind>,
}

impl CountingAnnotator {
    /// The n-th call waits `delays[n]` before answering
    fn with_delays(delays: Vec<Duration>) -> Self {
        Self {
            delays: Mutex::new(delays),
            ..Self::default()
        }
    }

    fn failing_for(kind: DetectionKind) -> Self {
        Self {
            failing: Some(kind),
            ..Self::default()
        }
    }

    fn seen(&self) -> Vec<DetectionKind> {
        self.calls.lock().unwrap().clone()
    }
}

impl Annotator for CountingAnnotator {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn annotate(
        &self,
        kind: DetectionKind,
        _image_base64: Arc<str>,
    ) -> BoxFuture<'static, Result<DetectionResult, RecognitionError>> {
        self.calls.lock().unwrap().push(kind);
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(n)
            .copied()
            .unwrap_or_default();

        if self.failing == Some(kind) {
            let error = RecognitionError::Status {
                code: 503,
                message: "unavailable".into(),
            };
            return futures::future::ready(Err(error)).boxed();
        }

        let result = match kind {
            DetectionKind::Face => DetectionResult::Faces(vec![PixelBox {
                x: 10.0,
                y: 20.0,
                width: 100.0,
                height: 100.0,
            }]),
            DetectionKind::Object => DetectionResult::Objects(vec![LabeledRegion {
                bounds: FrameRegion {
                    x: 0.1,
                    y: 0.1,
                    width: 0.2,
                    height: 0.2,
                },
                label: format!("call{n}"),
                score: None,
            }]),
            DetectionKind::Text => DetectionResult::Text("EXIT".into()),
        };

        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(result)
        }
        .boxed()
    }
}

/// Finds the same QR code in every frame
struct FixedQrDecoder(&'static str);

impl QrDecoder for FixedQrDecoder {
    fn decode(&self, _frame: &CameraFrame) -> Vec<QrDetection> {
        vec![QrDetection::new(
            FrameRegion {
                x: 0.4,
                y: 0.4,
                width: 0.2,
                height: 0.2,
            },
            self.0.to_string(),
        )]
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn drain(events: &mut UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

fn notices(events: &[UiEvent], level: NoticeLevel) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            UiEvent::Notice { level: l, message } if *l == level => Some(message.clone()),
            _ => None,
        })
        .collect()
}

fn object_labels(event: &UiEvent) -> Vec<String> {
    match event {
        UiEvent::OverlayUpdated(frame) => frame
            .primitives
            .iter()
            .filter_map(|primitive| match primitive {
                DrawPrimitive::Box {
                    kind: DetectionKind::Object,
                    label: Some(label),
                    ..
                } => Some(label.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Feed session messages back until `done` holds
async fn pump_until(session: &mut CameraSession, mut done: impl FnMut(&CameraSession) -> bool) {
    tokio::time::timeout(GUARD, async {
        while !done(session) {
            let message = session
                .next_message()
                .await
                .expect("session channel closed");
            session.handle_message(message);
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn live_session(
    backend: MockBackend,
) -> (CameraSession, UnboundedReceiver<UiEvent>, MemoryGallery) {
    let gallery = MemoryGallery::new();
    let (mut session, events) = CameraSession::builder(Config::default())
        .backend(Arc::new(backend))
        .gallery(Arc::new(gallery.clone()))
        .build();
    assert_eq!(session.start().await, SourceKind::Real);
    (session, events, gallery)
}

fn demo_session() -> (CameraSession, UnboundedReceiver<UiEvent>, MemoryGallery) {
    let gallery = MemoryGallery::new();
    let (session, events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::without_media_api()))
        .gallery(Arc::new(gallery.clone()))
        .build();
    (session, events, gallery)
}

// =============================================================================
// Acquisition
// =============================================================================

#[tokio::test]
async fn test_no_media_api_runs_on_demo_feed() {
    let backend = MockBackend::without_media_api();
    let calls = Arc::clone(&backend.calls);
    let (mut session, mut events) = CameraSession::builder(Config::default())
        .backend(Arc::new(backend))
        .build();

    assert_eq!(session.start().await, SourceKind::Demo);
    assert_eq!(session.capabilities(), Capabilities::DEMO);
    assert_eq!(session.zoom(), 1.0);

    // Flash works without hardware in demo
    assert_eq!(session.toggle_flash(), Some(true));
    assert!(session.flash_on());
    assert!(calls_of(&calls).is_empty(), "no backend call expected");

    let events = drain(&mut events);
    assert!(
        notices(&events, NoticeLevel::Info)
            .iter()
            .any(|m| m.contains("demo feed"))
    );
    assert!(events.contains(&UiEvent::FlashChanged { on: true }));
}

#[tokio::test]
async fn test_acquisition_timeout_falls_back_to_demo() {
    let (mut session, _events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::hanging()))
        .acquire_timeout(Duration::from_millis(50))
        .build();

    let kind = tokio::time::timeout(GUARD, session.start()).await.unwrap();
    assert_eq!(kind, SourceKind::Demo);
    assert!(session.capabilities().torch);
    assert!(session.preview_frame().is_ok());
}

#[tokio::test]
async fn test_live_feed_reports_its_capabilities() {
    let (session, mut events, _gallery) = live_session(MockBackend::live()).await;

    assert_eq!(session.camera_label(), "Mock Front");
    assert_eq!(session.capabilities().zoom, Some(ZoomRange { min: 1.0, max: 4.0 }));
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        UiEvent::SourceChanged {
            kind: SourceKind::Real,
            facing: Facing::Front,
            ..
        }
    )));
}

#[tokio::test]
async fn test_denied_camera_stays_in_demo_on_retry() {
    let backend = MockBackend::live().failing(Facing::Front);
    let calls = Arc::clone(&backend.calls);
    let (mut session, _events) = CameraSession::builder(Config::default())
        .backend(Arc::new(backend))
        .build();

    assert_eq!(session.start().await, SourceKind::Demo);
    assert_eq!(session.retry_acquire().await, SourceKind::Demo);
    assert_eq!(calls_of(&calls), vec!["open:Front", "open:Front"]);
}

#[tokio::test]
async fn test_retry_acquire_goes_live() {
    let backend = MockBackend::live();
    let calls = Arc::clone(&backend.calls);
    let (mut session, _events) = CameraSession::builder(Config::default())
        .backend(Arc::new(backend))
        .build();

    assert_eq!(session.retry_acquire().await, SourceKind::Real);
    // Already live, nothing is reopened
    assert_eq!(session.retry_acquire().await, SourceKind::Real);
    assert_eq!(calls_of(&calls), vec!["open:Front"]);
}

// =============================================================================
// Zoom and flash
// =============================================================================

#[tokio::test]
async fn test_zoom_requests_are_clamped() {
    let (mut session, _events, _gallery) = demo_session();

    assert_eq!(session.set_zoom(10.0), 8.0);
    assert_eq!(session.set_zoom(0.5), 1.0);
    assert_eq!(session.set_zoom(2.5), 2.5);
    assert_eq!(session.zoom_in(), 3.0);
    assert_eq!(session.zoom_out(), 2.5);
}

#[tokio::test]
async fn test_zoom_is_forwarded_to_the_feed() {
    let backend = MockBackend::live();
    let calls = Arc::clone(&backend.calls);
    let (mut session, _events, _gallery) = live_session(backend).await;

    assert_eq!(session.set_zoom(12.0), 8.0);
    assert!(calls_of(&calls).contains(&"zoom:8".to_string()));
}

#[tokio::test]
async fn test_flash_unsupported_on_real_feed() {
    let backend = MockBackend::live().with_capabilities(Capabilities {
        zoom: None,
        torch: false,
    });
    let calls = Arc::clone(&backend.calls);
    let (mut session, mut events, _gallery) = live_session(backend).await;
    drain(&mut events);

    assert_eq!(session.toggle_flash(), None);
    assert!(!session.flash_on());
    assert!(!calls_of(&calls).iter().any(|c| c.starts_with("torch")));

    let warnings = notices(&drain(&mut events), NoticeLevel::Warning);
    assert_eq!(warnings, vec!["Flash is not supported by this camera".to_string()]);
}

#[tokio::test]
async fn test_flash_drives_the_torch() {
    let backend = MockBackend::live();
    let calls = Arc::clone(&backend.calls);
    let (mut session, _events, _gallery) = live_session(backend).await;

    assert_eq!(session.toggle_flash(), Some(true));
    assert_eq!(session.toggle_flash(), Some(false));
    let torch: Vec<String> = calls_of(&calls)
        .into_iter()
        .filter(|c| c.starts_with("torch"))
        .collect();
    assert_eq!(torch, vec!["torch:true", "torch:false"]);
}

// =============================================================================
// Facing
// =============================================================================

#[tokio::test]
async fn test_switching_facing_twice_returns_to_original() {
    let backend = MockBackend::live();
    let calls = Arc::clone(&backend.calls);
    let (mut session, _events, _gallery) = live_session(backend).await;

    assert_eq!(session.switch_facing().await, SourceKind::Real);
    assert_eq!(session.facing(), Facing::Back);
    assert_eq!(session.switch_facing().await, SourceKind::Real);
    assert_eq!(session.facing(), Facing::Front);

    let calls = calls_of(&calls);
    assert_eq!(
        calls
            .iter()
            .filter(|c| c.starts_with("open") || c.starts_with("stop"))
            .cloned()
            .collect::<Vec<_>>(),
        vec![
            "open:Front",
            "stop:Front",
            "open:Back",
            "stop:Back",
            "open:Front"
        ]
    );
}

#[tokio::test]
async fn test_failed_switch_reverts_facing_and_falls_back_to_demo() {
    let backend = MockBackend::live().failing(Facing::Back);
    let (mut session, mut events, _gallery) = live_session(backend).await;
    drain(&mut events);

    assert_eq!(session.switch_facing().await, SourceKind::Demo);
    assert_eq!(session.facing(), Facing::Front);
    assert_eq!(session.capabilities(), Capabilities::DEMO);

    let events = drain(&mut events);
    assert_eq!(notices(&events, NoticeLevel::Warning).len(), 1);
}

#[tokio::test]
async fn test_demo_switch_only_flips_the_label() {
    let (mut session, _events, _gallery) = demo_session();
    session.start().await;

    assert_eq!(session.switch_facing().await, SourceKind::Demo);
    assert_eq!(session.facing(), Facing::Back);
    assert_eq!(session.camera_label(), "Demo (Back)");
}

#[tokio::test]
async fn test_demo_switch_keeps_the_flash() {
    let (mut session, mut events, _gallery) = demo_session();
    session.start().await;
    assert_eq!(session.toggle_flash(), Some(true));
    drain(&mut events);

    session.switch_facing().await;
    assert!(session.flash_on());
    assert!(
        !drain(&mut events)
            .iter()
            .any(|e| matches!(e, UiEvent::FlashChanged { .. }))
    );
}

#[tokio::test]
async fn test_live_switch_turns_the_flash_off() {
    let backend = MockBackend::live();
    let calls = Arc::clone(&backend.calls);
    let (mut session, mut events, _gallery) = live_session(backend).await;
    assert_eq!(session.toggle_flash(), Some(true));
    drain(&mut events);

    assert_eq!(session.switch_facing().await, SourceKind::Real);
    assert!(!session.flash_on());
    assert!(drain(&mut events).contains(&UiEvent::FlashChanged { on: false }));

    // The old feed's torch goes off before the feed is stopped
    let calls = calls_of(&calls);
    let torch_off = calls.iter().rposition(|c| c == "torch:false").unwrap();
    let stopped = calls.iter().position(|c| c == "stop:Front").unwrap();
    assert!(torch_off < stopped);
}

#[tokio::test]
async fn test_shutdown_reports_the_flash_off() {
    let (mut session, mut events, _gallery) = live_session(MockBackend::live()).await;
    session.toggle_flash();
    drain(&mut events);

    session.shutdown();
    assert!(drain(&mut events).contains(&UiEvent::FlashChanged { on: false }));
}

// =============================================================================
// Modes and processors
// =============================================================================

#[tokio::test]
async fn test_scanner_then_photo_clears_everything() {
    let (mut session, _events, _gallery) = demo_session();

    assert!(session.set_processor(ProcessorKind::ObjectDetection, true));
    session.set_mode(CaptureMode::Scanner);
    assert!(session.processors().qr_scanning);
    assert!(session.is_qr_polling());

    session.set_mode(CaptureMode::Photo);
    assert_eq!(session.processors(), ProcessorSet::default());
    assert!(!session.is_polling());
    assert!(!session.is_qr_polling());
    assert!(session.overlay().is_empty());
}

#[tokio::test]
async fn test_object_then_scanner_swaps_the_loops() {
    let (mut session, _events, _gallery) = demo_session();

    session.set_processor(ProcessorKind::ObjectDetection, true);
    assert!(session.is_polling());

    session.set_mode(CaptureMode::Scanner);
    assert!(!session.is_polling());
    assert!(session.is_qr_polling());
    assert!(!session.processors().object_detection);
    assert!(session.processors().qr_scanning);
}

#[tokio::test]
async fn test_mode_change_reports_processor_toggles() {
    let (mut session, mut events, _gallery) = demo_session();
    session.set_processor(ProcessorKind::FaceDetection, true);
    drain(&mut events);

    session.set_mode(CaptureMode::Scanner);
    let toggles: Vec<UiEvent> = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, UiEvent::ProcessorToggled { .. }))
        .collect();
    assert_eq!(
        toggles,
        vec![
            UiEvent::ProcessorToggled {
                kind: ProcessorKind::FaceDetection,
                enabled: false,
            },
            UiEvent::ProcessorToggled {
                kind: ProcessorKind::QrScanning,
                enabled: true,
            },
        ]
    );

    // Re-entering the same mode changes no flag
    session.set_mode(CaptureMode::Scanner);
    assert!(
        !drain(&mut events)
            .iter()
            .any(|e| matches!(e, UiEvent::ProcessorToggled { .. }))
    );

    session.set_mode(CaptureMode::Photo);
    assert!(drain(&mut events).contains(&UiEvent::ProcessorToggled {
        kind: ProcessorKind::QrScanning,
        enabled: false,
    }));
}

#[tokio::test]
async fn test_suspend_in_scanner_pauses_qr_until_resumed() {
    let (mut session, _events, _gallery) = demo_session();
    session.set_mode(CaptureMode::Scanner);
    assert!(session.is_qr_polling());

    session.suspend_processing();
    assert!(!session.is_qr_polling());
    assert!(session.processors().qr_scanning);
    assert_eq!(session.mode(), CaptureMode::Scanner);

    session.resume_processing();
    assert!(session.is_qr_polling());
}

#[tokio::test]
async fn test_suspend_turns_recognition_processors_off() {
    let (mut session, mut events, _gallery) = demo_session();
    session.set_processor(ProcessorKind::FaceDetection, true);
    session.set_processor(ProcessorKind::ObjectDetection, true);
    drain(&mut events);

    session.suspend_processing();
    assert!(!session.is_polling());
    assert_eq!(session.processors(), ProcessorSet::default());
    assert!(session.overlay().is_empty());

    let events = drain(&mut events);
    for kind in [ProcessorKind::FaceDetection, ProcessorKind::ObjectDetection] {
        assert!(events.contains(&UiEvent::ProcessorToggled {
            kind,
            enabled: false,
        }));
    }

    // Only QR polling comes back on resume
    session.resume_processing();
    assert!(!session.is_polling());
    assert!(!session.is_qr_polling());
}

#[tokio::test]
async fn test_processors_cannot_be_enabled_in_scanner_mode() {
    let (mut session, mut events, _gallery) = demo_session();
    session.set_mode(CaptureMode::Scanner);
    drain(&mut events);

    assert!(!session.set_processor(ProcessorKind::FaceDetection, true));
    assert!(!session.processors().face_detection);
    assert!(!session.is_polling());
    assert_eq!(notices(&drain(&mut events), NoticeLevel::Info).len(), 1);
}

#[tokio::test]
async fn test_shared_loop_serves_two_processors() {
    let annotator = Arc::new(CountingAnnotator::default());
    let (mut session, _events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::without_media_api()))
        .annotator(annotator.clone())
        .processor_interval(Duration::from_millis(50))
        .build();

    session.set_processor(ProcessorKind::FaceDetection, true);
    session.set_processor(ProcessorKind::TextRecognition, true);
    assert!(session.is_polling());

    pump_until(&mut session, |s| {
        let overlay = s.overlay();
        overlay.count(DetectionKind::Face) > 0 && overlay.count(DetectionKind::Text) > 0
    })
    .await;

    let seen = annotator.seen();
    assert!(seen.contains(&DetectionKind::Face));
    assert!(seen.contains(&DetectionKind::Text));
    assert!(!seen.contains(&DetectionKind::Object));

    // One processor left keeps the loop alive, none stops it
    session.set_processor(ProcessorKind::FaceDetection, false);
    assert!(session.is_polling());
    assert_eq!(session.overlay().count(DetectionKind::Face), 0);
    session.set_processor(ProcessorKind::TextRecognition, false);
    assert!(!session.is_polling());
}

#[tokio::test]
async fn test_result_arriving_after_disable_is_discarded() {
    let annotator = Arc::new(CountingAnnotator::with_delays(vec![
        Duration::from_millis(300),
        Duration::from_millis(300),
    ]));
    let (mut session, mut events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::without_media_api()))
        .annotator(annotator.clone())
        .processor_interval(Duration::from_secs(60))
        .build();

    // First tick fires immediately and dispatches call0
    session.set_processor(ProcessorKind::ObjectDetection, true);
    let tick = tokio::time::timeout(GUARD, session.next_message())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(tick, SessionMessage::ProcessorTick { .. }));
    session.handle_message(tick);

    // Toggle off and on while call0 is in flight
    session.set_processor(ProcessorKind::ObjectDetection, false);
    session.set_processor(ProcessorKind::ObjectDetection, true);
    drain(&mut events);

    let mut recognitions = 0;
    tokio::time::timeout(GUARD, async {
        while recognitions < 2 {
            let message = session.next_message().await.unwrap();
            if matches!(message, SessionMessage::Recognition { .. }) {
                recognitions += 1;
            }
            session.handle_message(message);
        }
    })
    .await
    .unwrap();

    let labels: Vec<String> = drain(&mut events).iter().flat_map(object_labels).collect();
    assert!(!labels.iter().any(|l| l == "call0"), "stale result drawn: {labels:?}");
    assert!(labels.iter().any(|l| l == "call1"));
}

#[tokio::test]
async fn test_failing_processor_leaves_the_others_alone() {
    let annotator = Arc::new(CountingAnnotator::failing_for(DetectionKind::Object));
    let (mut session, mut events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::without_media_api()))
        .annotator(annotator.clone())
        .processor_interval(Duration::from_millis(50))
        .build();

    for kind in [
        ProcessorKind::FaceDetection,
        ProcessorKind::ObjectDetection,
        ProcessorKind::TextRecognition,
    ] {
        session.set_processor(kind, true);
    }
    drain(&mut events);

    let mut object_results = 0;
    tokio::time::timeout(GUARD, async {
        loop {
            let message = session.next_message().await.unwrap();
            if matches!(
                message,
                SessionMessage::Recognition {
                    kind: DetectionKind::Object,
                    ..
                }
            ) {
                object_results += 1;
            }
            session.handle_message(message);

            let overlay = session.overlay();
            if object_results >= 2
                && overlay.count(DetectionKind::Face) > 0
                && overlay.count(DetectionKind::Text) > 0
            {
                break;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(session.overlay().count(DetectionKind::Object), 0);
    assert!(session.processors().object_detection);
    assert!(session.is_polling());

    let events = drain(&mut events);
    assert!(
        !events.iter().any(|e| matches!(e, UiEvent::Notice { .. })),
        "polling failure surfaced: {events:?}"
    );
}

#[tokio::test]
async fn test_recognize_once_failure_is_reported() {
    let (mut session, mut events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::without_media_api()))
        .annotator(Arc::new(CountingAnnotator::failing_for(DetectionKind::Text)))
        .build();

    assert_eq!(session.recognize_once(DetectionKind::Text).await, None);
    let errors = notices(&drain(&mut events), NoticeLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Recognition failed"));
}

#[tokio::test]
async fn test_zero_intervals_still_poll() {
    let annotator = Arc::new(CountingAnnotator::default());
    let (mut session, _events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::without_media_api()))
        .annotator(annotator.clone())
        .demo_qr_decoder(Arc::new(FixedQrDecoder("zero")))
        .processor_interval(Duration::ZERO)
        .qr_interval(Duration::ZERO)
        .build();

    session.set_processor(ProcessorKind::FaceDetection, true);
    pump_until(&mut session, |s| s.overlay().count(DetectionKind::Face) > 0).await;

    session.set_mode(CaptureMode::Scanner);
    assert!(session.is_qr_polling());
    tokio::time::timeout(GUARD, async {
        loop {
            let message = session.next_message().await.unwrap();
            let scanned = matches!(message, SessionMessage::QrScanned { .. });
            session.handle_message(message);
            if scanned {
                break;
            }
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_recognize_once_reports_the_result() {
    let annotator = Arc::new(CountingAnnotator::default());
    let (mut session, mut events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::without_media_api()))
        .annotator(annotator)
        .build();

    let result = session.recognize_once(DetectionKind::Text).await;
    assert_eq!(result, Some(DetectionResult::Text("EXIT".into())));
    // Not enabled, so nothing is drawn
    assert!(session.overlay().is_empty());
    assert_eq!(
        notices(&drain(&mut events), NoticeLevel::Success),
        vec!["Text: EXIT".to_string()]
    );
}

#[tokio::test]
async fn test_scanner_reports_qr_codes() {
    let (mut session, mut events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::without_media_api()))
        .demo_qr_decoder(Arc::new(FixedQrDecoder("https://example.com")))
        .qr_interval(Duration::from_millis(20))
        .build();

    session.set_mode(CaptureMode::Scanner);
    let mut detected = Vec::new();
    tokio::time::timeout(GUARD, async {
        while detected.is_empty() {
            let message = session.next_message().await.unwrap();
            session.handle_message(message);
            detected.extend(drain(&mut events).into_iter().filter_map(|e| match e {
                UiEvent::QrDetected(detection) => Some(detection),
                _ => None,
            }));
        }
    })
    .await
    .unwrap();

    assert_eq!(detected[0].content, "https://example.com");
    assert_eq!(detected[0].action.action_label(), "Open Link");

    // Leaving scanner mode stops the QR loop
    session.set_mode(CaptureMode::Photo);
    assert!(!session.is_qr_polling());
}

// =============================================================================
// Capture
// =============================================================================

#[tokio::test]
async fn test_photo_capture_reaches_gallery() {
    let (mut session, mut events, gallery) = demo_session();
    session.set_zoom(2.0);

    let id = session.capture_photo().await.unwrap();

    let items = gallery.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
    assert_eq!(items[0].item_type, GalleryItemType::Photo);
    assert!(items[0].metadata.demo);
    assert_eq!(items[0].metadata.zoom, 2.0);
    assert_eq!(items[0].metadata.resolution.as_deref(), Some("1280x720"));
    assert_eq!(items[0].metadata.format.as_deref(), Some("image/jpeg"));
    match &items[0].media {
        MediaPayload::Jpeg(data) => assert_eq!(&data[..2], &[0xff, 0xd8]),
        other => panic!("unexpected payload {other:?}"),
    }

    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        UiEvent::CaptureCompleted { id: event_id, .. } if *event_id == id
    )));
}

#[tokio::test]
async fn test_auto_save_off_skips_the_gallery() {
    let gallery = MemoryGallery::new();
    let config = Config {
        auto_save: false,
        ..Config::default()
    };
    let (mut session, mut events) = CameraSession::builder(config)
        .backend(Arc::new(MockBackend::without_media_api()))
        .gallery(Arc::new(gallery.clone()))
        .build();

    assert!(session.capture_photo().await.is_some());
    assert!(gallery.is_empty());
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, UiEvent::CaptureCompleted { .. }))
    );
}

#[tokio::test]
async fn test_recording_requires_video_mode() {
    let (mut session, _events, _gallery) = demo_session();
    assert!(!session.start_recording());
    assert!(!session.is_recording());
}

#[tokio::test]
async fn test_simulated_recording_item() {
    let (mut session, mut events, gallery) = demo_session();
    session.set_mode(CaptureMode::Video);
    drain(&mut events);

    assert!(session.start_recording());
    assert!(session.is_recording());
    let started = drain(&mut events);
    assert!(started.contains(&UiEvent::RecordingStarted {
        simulated: true,
        mime: None,
    }));
    assert!(started.contains(&UiEvent::RecordingElapsed {
        display: "00:00".into(),
    }));

    let id = session.stop_recording().unwrap();
    let items = gallery.items();
    assert_eq!(items[0].id, id);
    assert_eq!(items[0].item_type, GalleryItemType::Video);
    assert_eq!(items[0].media, MediaPayload::Placeholder);
    assert!(items[0].metadata.demo);
    assert!(items[0].metadata.duration_ms.is_some());
}

#[tokio::test]
async fn test_real_recording_collects_every_segment() {
    let (mut session, mut events, gallery) = live_session(MockBackend::live()).await;
    session.set_mode(CaptureMode::Video);
    assert!(session.start_recording());
    assert!(drain(&mut events).contains(&UiEvent::RecordingStarted {
        simulated: false,
        mime: Some("video/webm;codecs=vp9".into()),
    }));

    let id = session.stop_recording().unwrap();
    let items = gallery.items();
    assert_eq!(items[0].id, id);
    assert!(!items[0].metadata.demo);
    assert_eq!(items[0].metadata.format.as_deref(), Some("video/webm;codecs=vp9"));
    assert_eq!(items[0].metadata.resolution.as_deref(), Some("1920x1080"));
    assert_eq!(
        items[0].media,
        MediaPayload::Blob {
            mime: "video/webm;codecs=vp9".into(),
            data: vec![1, 2, 3],
        }
    );
}

#[tokio::test]
async fn test_recording_quality_drives_the_encoder() {
    let backend = MockBackend::live();
    let calls = Arc::clone(&backend.calls);
    let gallery = MemoryGallery::new();
    let config = Config {
        quality: VideoQuality::Hd,
        ..Config::default()
    };
    let (mut session, _events) = CameraSession::builder(config)
        .backend(Arc::new(backend))
        .gallery(Arc::new(gallery.clone()))
        .build();
    session.start().await;
    session.set_mode(CaptureMode::Video);

    assert!(session.start_recording());
    session.stop_recording().unwrap();

    assert!(calls_of(&calls).contains(&"encode:video/webm;codecs=vp9 1280x720 5000kbps".to_string()));
    assert_eq!(gallery.items()[0].metadata.resolution.as_deref(), Some("1280x720"));
}

#[tokio::test]
async fn test_zero_chunk_recording_yields_no_item() {
    let backend = MockBackend::live().with_segments(Some(Vec::new()));
    let (mut session, mut events, gallery) = live_session(backend).await;
    session.set_mode(CaptureMode::Video);
    assert!(session.start_recording());
    drain(&mut events);

    assert_eq!(session.stop_recording(), None);
    assert!(gallery.is_empty());

    let events = drain(&mut events);
    assert_eq!(notices(&events, NoticeLevel::Warning).len(), 1);
    assert!(events
        .iter()
        .any(|e| matches!(e, UiEvent::RecordingStopped { item: None, .. })));
}

#[tokio::test]
async fn test_missing_encoder_records_in_simulated_mode() {
    let backend = MockBackend::live().with_segments(None);
    let (mut session, _events, gallery) = live_session(backend).await;
    session.set_mode(CaptureMode::Video);

    assert!(session.start_recording());
    assert!(session.snapshot().recording.unwrap().simulated);
    session.stop_recording().unwrap();
    assert_eq!(gallery.items()[0].media, MediaPayload::Placeholder);
    assert!(gallery.items()[0].metadata.demo);
}

#[tokio::test]
async fn test_leaving_video_mode_finishes_the_recording() {
    let (mut session, _events, gallery) = demo_session();
    session.set_mode(CaptureMode::Video);
    assert!(session.toggle_recording());

    session.set_mode(CaptureMode::Photo);
    assert!(!session.is_recording());
    assert_eq!(gallery.len(), 1);
}

#[tokio::test]
async fn test_recording_timer_ticks() {
    let (mut session, mut events) = CameraSession::builder(Config::default())
        .backend(Arc::new(MockBackend::without_media_api()))
        .recording_timer_interval(Duration::from_millis(20))
        .build();
    session.set_mode(CaptureMode::Video);
    session.start_recording();
    drain(&mut events);

    let mut ticks = 0;
    tokio::time::timeout(GUARD, async {
        while ticks < 2 {
            let message = session.next_message().await.unwrap();
            session.handle_message(message);
            ticks += drain(&mut events)
                .iter()
                .filter(|e| matches!(e, UiEvent::RecordingElapsed { .. }))
                .count();
        }
    })
    .await
    .unwrap();

    session.stop_recording();
    assert!(!session.is_recording());
}

#[tokio::test]
async fn test_shutdown_releases_the_feed() {
    let backend = MockBackend::live();
    let calls = Arc::clone(&backend.calls);
    let (mut session, _events, gallery) = live_session(backend).await;
    session.set_mode(CaptureMode::Video);
    session.start_recording();

    session.shutdown();
    assert!(!session.is_recording());
    assert_eq!(session.source_kind(), SourceKind::Demo);
    assert!(calls_of(&calls).contains(&"stop:Front".to_string()));
    assert_eq!(gallery.len(), 1);
}
