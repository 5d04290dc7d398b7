// SPDX-License-Identifier: GPL-3.0-only

//! Vision Camera - camera capture session with live recognition overlays
//!
//! This library provides the session orchestrator behind the `vision-camera`
//! binary: a live (or synthetic) video source, photo/video/scanner modes,
//! periodic recognition passes and the overlay model they feed.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: The [`CameraSession`] orchestrator, its state machine and loops
//! - [`backends`]: Camera backend abstraction (demo feed, V4L2)
//! - [`media`]: Reference frame preparation, JPEG/base64 encoding, mime negotiation
//! - [`recognition`]: Recognition and chat collaborators
//! - [`config`]: User settings
//! - [`gallery`] / [`storage`]: Where captured photos and videos go
//! - [`terminal`]: Terminal front end that renders the preview and overlays
//!
//! # Example
//!
//! ```ignore
//! let (mut session, mut events) = CameraSession::builder(config).build();
//! session.start().await;
//! session.set_mode(CaptureMode::Scanner);
//! while let Some(msg) = session.next_message().await {
//!     session.handle_message(msg);
//! }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod gallery;
pub mod media;
pub mod recognition;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{DetectionKind, DetectionResult, QrAction, QrDetection};
pub use app::{CameraSession, CaptureMode, ProcessorKind, SessionBuilder, UiEvent};
pub use backends::camera::types::{Capabilities, Facing, SourceKind};
pub use config::Config;
pub use constants::VideoQuality;
pub use gallery::{Gallery, GalleryItem, MemoryGallery};
