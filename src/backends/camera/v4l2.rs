// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Opens `/dev/videoN` capture nodes directly. The first capture node is
//! treated as the front camera and the second as the back camera. Frames
//! are captured on a dedicated thread and the latest one is kept for
//! `capture_frame`. Zoom maps onto `V4L2_CID_ZOOM_ABSOLUTE` and torch onto
//! the sysfs flash LED. There is no container encoder, so recording on
//! this backend is simulated.

use super::{
    BackendResult, CameraBackend, CameraFrame, Capabilities, ChunkSink, EncoderSettings, Facing,
    FeedHandle, MediaEncoder, ZoomRange,
};
use crate::constants::{ACQUIRE_TIMEOUT, REFERENCE_HEIGHT, REFERENCE_WIDTH, ZOOM_MAX, ZOOM_MIN};
use crate::errors::{CameraError, RecordingError};
use crate::flash::FlashDevice;
use crate::media::frame::yuyv_to_rgba;
use futures::future::{BoxFuture, FutureExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::control::{Control, Value};
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

/// V4L2_CID_CAMERA_CLASS_BASE + 13
const V4L2_CID_ZOOM_ABSOLUTE: u32 = 0x009a_090d;

/// Number of mmap buffers for the capture stream
const BUFFER_COUNT: u32 = 4;

/// First pause after a failed dequeue, doubled per consecutive failure
const CAPTURE_RETRY_BASE: Duration = Duration::from_millis(10);
const CAPTURE_RETRY_MAX: Duration = Duration::from_millis(500);

/// Consecutive failed dequeues after which the device counts as gone
const MAX_CAPTURE_FAILURES: u32 = 20;

/// Paces retries after failed dequeues
#[derive(Debug, Default)]
struct CaptureBackoff {
    failures: u32,
}

impl CaptureBackoff {
    /// Delay before the next attempt, `None` once the device looks gone
    fn on_failure(&mut self) -> Option<Duration> {
        self.failures += 1;
        if self.failures >= MAX_CAPTURE_FAILURES {
            return None;
        }
        let delay = CAPTURE_RETRY_BASE.saturating_mul(1 << (self.failures - 1).min(16));
        Some(delay.min(CAPTURE_RETRY_MAX))
    }

    fn on_success(&mut self) {
        self.failures = 0;
    }
}

/// Backend over V4L2 capture nodes
#[derive(Debug, Default)]
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }

    /// All `/dev/videoN` nodes that advertise video capture, sorted by name
    fn capture_devices() -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir("/dev") else {
            return Vec::new();
        };

        let mut nodes: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("video"))
            })
            .collect();
        nodes.sort();

        nodes
            .into_iter()
            .filter(|path| match Device::with_path(path) {
                Ok(dev) => dev
                    .query_caps()
                    .map(|caps| caps.capabilities.contains(Flags::VIDEO_CAPTURE))
                    .unwrap_or(false),
                Err(_) => false,
            })
            .collect()
    }
}

impl CameraBackend for V4l2Backend {
    fn name(&self) -> &'static str {
        "v4l2"
    }

    fn is_available(&self) -> bool {
        std::fs::read_dir("/dev").is_ok_and(|entries| {
            entries.flatten().any(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|n| n.starts_with("video"))
            })
        })
    }

    fn open(&self, facing: Facing) -> BoxFuture<'static, BackendResult<Box<dyn FeedHandle>>> {
        async move {
            tokio::task::spawn_blocking(move || V4l2Feed::open(facing))
                .await
                .map_err(|e| CameraError::DeviceUnavailable(format!("open task failed: {e}")))?
                .map(|feed| Box::new(feed) as Box<dyn FeedHandle>)
        }
        .boxed()
    }
}

/// Absolute zoom control range reported by the driver
#[derive(Debug, Clone, Copy)]
struct ZoomControl {
    minimum: i64,
    maximum: i64,
}

impl ZoomControl {
    /// Map a zoom factor in [1, 8] linearly onto the driver range
    fn raw_value(&self, zoom: f32) -> i64 {
        let t = ((zoom - ZOOM_MIN) / (ZOOM_MAX - ZOOM_MIN)).clamp(0.0, 1.0) as f64;
        self.minimum + ((self.maximum - self.minimum) as f64 * t).round() as i64
    }
}

/// One streaming V4L2 capture node
pub struct V4l2Feed {
    path: PathBuf,
    facing: Facing,
    card: String,
    zoom: Option<ZoomControl>,
    flash: Option<FlashDevice>,
    latest_frame: Arc<Mutex<Option<CameraFrame>>>,
    stop_signal: Arc<AtomicBool>,
    capture_thread: Mutex<Option<JoinHandle<()>>>,
}

impl V4l2Feed {
    fn open(facing: Facing) -> BackendResult<Self> {
        let devices = V4l2Backend::capture_devices();
        let index = match facing {
            Facing::Front => 0,
            Facing::Back => 1,
        };
        let path = devices.get(index).cloned().ok_or_else(|| {
            CameraError::DeviceUnavailable(format!("no {facing} capture device"))
        })?;

        let dev = Device::with_path(&path)
            .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {e}", path.display())))?;
        let card = dev
            .query_caps()
            .map(|caps| caps.card)
            .unwrap_or_else(|_| path.display().to_string());

        let zoom = dev.query_controls().ok().and_then(|controls| {
            controls
                .into_iter()
                .find(|c| c.id == V4L2_CID_ZOOM_ABSOLUTE)
                .filter(|c| c.maximum > c.minimum)
                .map(|c| ZoomControl {
                    minimum: c.minimum,
                    maximum: c.maximum,
                })
        });
        drop(dev);

        let flash = FlashDevice::discover().into_iter().next();

        let latest_frame = Arc::new(Mutex::new(None));
        let stop_signal = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(1);

        let thread_path = path.clone();
        let thread_latest = Arc::clone(&latest_frame);
        let thread_stop = Arc::clone(&stop_signal);
        let handle = thread::spawn(move || {
            if let Err(e) = capture_loop(&thread_path, thread_stop, thread_latest, ready_tx) {
                error!(path = %thread_path.display(), error = %e, "V4L2 capture loop error");
            }
        });

        let ready = ready_rx
            .recv_timeout(ACQUIRE_TIMEOUT)
            .map_err(|_| CameraError::DeviceUnavailable("capture thread did not start".into()))
            .and_then(|r| r.map_err(CameraError::DeviceUnavailable));
        if let Err(e) = ready {
            stop_signal.store(true, Ordering::SeqCst);
            let _ = handle.join();
            return Err(e);
        }

        info!(
            path = %path.display(),
            card = %card,
            zoom = zoom.is_some(),
            torch = flash.is_some(),
            "Opened V4L2 camera"
        );

        Ok(Self {
            path,
            facing,
            card,
            zoom,
            flash,
            latest_frame,
            stop_signal,
            capture_thread: Mutex::new(Some(handle)),
        })
    }
}

impl FeedHandle for V4l2Feed {
    fn facing(&self) -> Facing {
        self.facing
    }

    fn label(&self) -> String {
        self.card.clone()
    }

    fn query_capabilities(&self) -> BackendResult<Capabilities> {
        if !self.path.exists() {
            return Err(CameraError::CapabilityQueryFailed(format!(
                "{} disappeared",
                self.path.display()
            )));
        }
        Ok(Capabilities {
            zoom: self.zoom.map(|_| ZoomRange::FULL),
            torch: self.flash.is_some(),
        })
    }

    fn capture_frame(&self) -> BackendResult<CameraFrame> {
        self.latest_frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| CameraError::CaptureFailed("no frame received yet".into()))
    }

    fn apply_zoom(&self, zoom: f32) -> BackendResult<()> {
        let Some(control) = self.zoom else {
            return Err(CameraError::ControlFailed("device has no zoom control".into()));
        };
        let value = control.raw_value(zoom);
        let dev = Device::with_path(&self.path)
            .map_err(|e| CameraError::ControlFailed(e.to_string()))?;
        dev.set_control(Control {
            id: V4L2_CID_ZOOM_ABSOLUTE,
            value: Value::Integer(value),
        })
        .map_err(|e| CameraError::ControlFailed(e.to_string()))?;
        debug!(zoom, value, "Applied V4L2 zoom");
        Ok(())
    }

    fn apply_torch(&self, on: bool) -> BackendResult<()> {
        let Some(flash) = &self.flash else {
            return Err(CameraError::ControlFailed("no flash LED".into()));
        };
        let result = if on { flash.torch(1.0) } else { flash.off() };
        result.map_err(|e| CameraError::ControlFailed(format!("{}: {e}", flash.name())))
    }

    fn supports_mime(&self, _mime: &str) -> bool {
        false
    }

    fn start_encoder(
        &self,
        _settings: &EncoderSettings,
        _sink: ChunkSink,
    ) -> Result<Box<dyn MediaEncoder>, RecordingError> {
        Err(RecordingError::EncoderUnavailable(
            "V4L2 backend has no container encoder".into(),
        ))
    }

    fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        let handle = self
            .capture_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("V4L2 capture thread panicked");
            }
            if let Some(flash) = &self.flash {
                let _ = flash.off();
            }
            debug!(path = %self.path.display(), "Stopped V4L2 capture");
        }
    }
}

impl Drop for V4l2Feed {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Capture loop; runs on its own thread until `stop_signal` is set
fn capture_loop(
    path: &Path,
    stop_signal: Arc<AtomicBool>,
    latest_frame: Arc<Mutex<Option<CameraFrame>>>,
    ready: std_mpsc::SyncSender<Result<(), String>>,
) -> Result<(), String> {
    let setup = || -> Result<(Device, Format), String> {
        let dev = Device::with_path(path).map_err(|e| format!("Failed to open device: {e}"))?;

        // MJPEG first, raw YUYV as fallback
        let format = Format::new(REFERENCE_WIDTH, REFERENCE_HEIGHT, FourCC::new(b"MJPG"));
        let actual = match dev.set_format(&format) {
            Ok(f) if f.fourcc == FourCC::new(b"MJPG") => f,
            _ => {
                let format = Format::new(REFERENCE_WIDTH, REFERENCE_HEIGHT, FourCC::new(b"YUYV"));
                dev.set_format(&format)
                    .map_err(|e| format!("Failed to set format: {e}"))?
            }
        };
        Ok((dev, actual))
    };

    let (dev, format) = match setup() {
        Ok(v) => v,
        Err(e) => {
            let _ = ready.send(Err(e.clone()));
            return Err(e);
        }
    };

    let mut stream = match Stream::with_buffers(&dev, Type::VideoCapture, BUFFER_COUNT) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("Failed to create stream: {e}");
            let _ = ready.send(Err(msg.clone()));
            return Err(msg);
        }
    };

    info!(
        width = format.width,
        height = format.height,
        fourcc = %format.fourcc,
        "V4L2 capture started"
    );
    let _ = ready.send(Ok(()));

    let mjpeg = format.fourcc == FourCC::new(b"MJPG");
    let mut backoff = CaptureBackoff::default();
    while !stop_signal.load(Ordering::SeqCst) {
        let (buf, _meta) = match stream.next() {
            Ok(frame) => {
                backoff.on_success();
                frame
            }
            Err(e) => match backoff.on_failure() {
                Some(delay) => {
                    warn!(error = %e, failures = backoff.failures, "Failed to capture frame");
                    thread::sleep(delay);
                    continue;
                }
                None => {
                    *latest_frame.lock().unwrap_or_else(PoisonError::into_inner) = None;
                    return Err(format!(
                        "giving up after {} failed captures: {e}",
                        backoff.failures
                    ));
                }
            },
        };

        let frame = if mjpeg {
            match image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg) {
                Ok(img) => {
                    let rgba = img.to_rgba8();
                    CameraFrame::from_rgba(rgba.width(), rgba.height(), rgba.into_raw())
                }
                Err(e) => {
                    debug!(error = %e, "Dropping undecodable MJPEG frame");
                    continue;
                }
            }
        } else {
            let rgba = yuyv_to_rgba(buf, format.width, format.height, format.stride);
            CameraFrame::from_rgba(format.width, format.height, rgba)
        };

        *latest_frame.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
    }

    Ok(())
}
