// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   CameraSession     │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    VideoSource      │  ← Acquisition race, demo fallback
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← open(facing) -> FeedHandle
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴──────┐
//!      ▼            ▼
//!  ┌───────┐   ┌─────────┐
//!  │ V4L2  │   │ NoMedia │
//!  └───────┘   └─────────┘
//! ```
//!
//! Backends hand out a [`FeedHandle`] for one live feed. Absence of a
//! handle means the session runs on the synthetic [`DemoFeed`].

pub mod demo;
pub mod no_media;
pub mod probe;
pub mod types;
#[cfg(feature = "v4l2")]
pub mod v4l2;
pub mod video_source;

pub use demo::DemoFeed;
pub use no_media::NoMediaBackend;
pub use probe::probe;
pub use types::*;
pub use video_source::VideoSource;

use crate::errors::RecordingError;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A source of live camera feeds
pub trait CameraBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Whether the platform exposes a media API at all
    ///
    /// When false the session never attempts acquisition and stays in demo.
    fn is_available(&self) -> bool;

    /// Open a feed for the given direction
    ///
    /// The returned future may take arbitrarily long; callers race it
    /// against their own timeout.
    fn open(&self, facing: Facing) -> BoxFuture<'static, BackendResult<Box<dyn FeedHandle>>>;
}

/// One acquired hardware feed
pub trait FeedHandle: Send + Sync {
    fn facing(&self) -> Facing;

    /// Human-readable device label
    fn label(&self) -> String;

    /// Query zoom/torch support from the device
    fn query_capabilities(&self) -> BackendResult<Capabilities>;

    /// Grab the most recent frame as RGBA
    fn capture_frame(&self) -> BackendResult<CameraFrame>;

    /// Apply an already clamped zoom factor
    fn apply_zoom(&self, zoom: f32) -> BackendResult<()>;

    fn apply_torch(&self, on: bool) -> BackendResult<()>;

    /// Whether the feed's recorder can produce the given mime type
    fn supports_mime(&self, mime: &str) -> bool;

    /// Start a container encoder that pushes encoded segments into `sink`
    fn start_encoder(
        &self,
        settings: &EncoderSettings,
        sink: ChunkSink,
    ) -> Result<Box<dyn MediaEncoder>, RecordingError>;

    /// Stop all tracks of the feed
    fn stop(&self);
}

/// A running container encoder
pub trait MediaEncoder: Send {
    /// Stop encoding. Every pending segment is pushed to the sink before this returns.
    fn stop(self: Box<Self>);
}

/// Receives encoded segments from a running encoder
#[derive(Debug, Clone)]
pub struct ChunkSink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChunkSink {
    /// Create a sink and the receiving end that collects its segments
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Push one segment. Empty segments are dropped.
    ///
    /// Returns false once the recording has been collected.
    pub fn push(&self, chunk: Vec<u8>) -> bool {
        if chunk.is_empty() {
            return !self.tx.is_closed();
        }
        self.tx.send(chunk).is_ok()
    }
}

/// Backend compiled into this build
pub fn default_backend() -> Arc<dyn CameraBackend> {
    #[cfg(feature = "v4l2")]
    {
        Arc::new(v4l2::V4l2Backend::new())
    }
    #[cfg(not(feature = "v4l2"))]
    {
        Arc::new(NoMediaBackend)
    }
}
