// SPDX-License-Identifier: GPL-3.0-only

//! Video recording lifecycle
//!
//! With a real feed the controller runs the feed's container encoder and
//! collects its segments in order. Without a feed, or when no encoder can
//! be built, the recording is simulated: the same state transitions and
//! timer, but nothing is encoded.

use super::loops::LoopHandle;
use super::SessionMessage;
use crate::backends::camera::{ChunkSink, EncoderSettings, MediaEncoder, VideoSource};
use crate::constants::VideoQuality;
use crate::errors::RecordingError;
use crate::media::{negotiate_mime, ContainerFormat};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How a recording began
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingStarted {
    pub simulated: bool,
    pub mime: Option<&'static str>,
}

/// How a recording ended
#[derive(Debug, PartialEq)]
pub enum RecordingOutcome {
    /// No encoder was involved
    Simulated { duration_ms: u64 },
    /// Encoded segments concatenated in arrival order
    Media {
        duration_ms: u64,
        mime: &'static str,
        /// Encoded `WxH`
        resolution: String,
        data: Vec<u8>,
    },
    /// A real encoder ran but produced nothing
    Empty { duration_ms: u64 },
}

impl RecordingOutcome {
    pub fn duration_ms(&self) -> u64 {
        match self {
            RecordingOutcome::Simulated { duration_ms }
            | RecordingOutcome::Media { duration_ms, .. }
            | RecordingOutcome::Empty { duration_ms } => *duration_ms,
        }
    }
}

struct Encoding {
    settings: EncoderSettings,
    encoder: Box<dyn MediaEncoder>,
    chunks: mpsc::UnboundedReceiver<Vec<u8>>,
}

struct ActiveRecording {
    id: u64,
    started_at_ms: i64,
    started: Instant,
    encoding: Option<Encoding>,
    timer: LoopHandle,
}

pub struct RecordingController {
    timer_interval: Duration,
    next_id: u64,
    active: Option<ActiveRecording>,
}

impl RecordingController {
    pub fn new(timer_interval: Duration) -> Self {
        Self {
            timer_interval,
            next_id: 0,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_simulated(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.encoding.is_none())
    }

    /// Whether a timer tick belongs to the running recording
    pub fn is_current(&self, recording_id: u64) -> bool {
        self.active.as_ref().is_some_and(|a| a.id == recording_id)
    }

    pub fn started_at_ms(&self) -> Option<i64> {
        self.active.as_ref().map(|a| a.started_at_ms)
    }

    pub fn elapsed_ms(&self) -> Option<u64> {
        self.active
            .as_ref()
            .map(|a| a.started.elapsed().as_millis() as u64)
    }

    /// Start recording from the source at the given quality
    pub fn start(
        &mut self,
        source: &VideoSource,
        preferred: ContainerFormat,
        quality: VideoQuality,
        tx: &mpsc::UnboundedSender<SessionMessage>,
    ) -> Result<RecordingStarted, RecordingError> {
        if self.active.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let encoding = source.handle().and_then(|handle| {
            let mime = negotiate_mime(|m| handle.supports_mime(m), preferred);
            let settings = EncoderSettings::new(mime, quality);
            let (sink, chunks) = ChunkSink::channel();
            match handle.start_encoder(&settings, sink) {
                Ok(encoder) => Some(Encoding {
                    settings,
                    encoder,
                    chunks,
                }),
                Err(e) => {
                    warn!(mime, error = %e, "Encoder unavailable, recording in simulated mode");
                    None
                }
            }
        });

        self.next_id += 1;
        let id = self.next_id;
        let timer_tx = tx.clone();
        let timer = LoopHandle::spawn_interval(self.timer_interval, false, move || {
            timer_tx
                .send(SessionMessage::RecordingTick { recording_id: id })
                .is_ok()
        });

        let started = RecordingStarted {
            simulated: encoding.is_none(),
            mime: encoding.as_ref().map(|e| e.settings.mime),
        };
        self.active = Some(ActiveRecording {
            id,
            started_at_ms: now_ms(),
            started: Instant::now(),
            encoding,
            timer,
        });

        debug!(id, simulated = started.simulated, mime = ?started.mime, "Recording started");
        Ok(started)
    }

    /// Stop recording and collect what was encoded
    pub fn stop(&mut self) -> Result<RecordingOutcome, RecordingError> {
        let active = self.active.take().ok_or(RecordingError::NotRecording)?;
        active.timer.stop();
        let duration_ms = active.started.elapsed().as_millis() as u64;

        let Some(Encoding {
            settings,
            encoder,
            mut chunks,
        }) = active.encoding
        else {
            return Ok(RecordingOutcome::Simulated { duration_ms });
        };

        // Flushes every pending segment into the sink
        encoder.stop();

        let mut data = Vec::new();
        let mut segments = 0usize;
        while let Ok(chunk) = chunks.try_recv() {
            data.extend_from_slice(&chunk);
            segments += 1;
        }

        if data.is_empty() {
            return Ok(RecordingOutcome::Empty { duration_ms });
        }

        info!(
            mime = settings.mime,
            segments,
            bytes = data.len(),
            duration_ms,
            "Recording collected"
        );
        Ok(RecordingOutcome::Media {
            duration_ms,
            mime: settings.mime,
            resolution: settings.resolution(),
            data,
        })
    }
}

impl std::fmt::Debug for RecordingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingController")
            .field("active", &self.is_active())
            .field("simulated", &self.is_simulated())
            .finish()
    }
}

/// Wall clock in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Timer text for a recording, `MM:SS` zero-padded
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total_secs = elapsed_ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
