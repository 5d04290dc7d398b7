// SPDX-License-Identifier: GPL-3.0-only

//! The session's single video source
//!
//! Holds either one real [`FeedHandle`] or nothing, in which case frames
//! come from the [`DemoFeed`]. The kind is derived from the handle, so a
//! demo source can never carry a handle and vice versa.

use super::{
    probe, BackendResult, CameraBackend, CameraFrame, Capabilities, DemoFeed, Facing, FeedHandle,
    SourceKind,
};
use crate::constants::ACQUIRE_TIMEOUT;
use crate::errors::CameraError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns the live feed (or the demo placeholder) for one session
pub struct VideoSource {
    backend: Arc<dyn CameraBackend>,
    facing: Facing,
    handle: Option<Box<dyn FeedHandle>>,
    capabilities: Capabilities,
    demo: DemoFeed,
    acquire_timeout: Duration,
}

impl VideoSource {
    /// Create a source in demo state; call [`VideoSource::acquire`] to go live
    pub fn new(backend: Arc<dyn CameraBackend>, facing: Facing) -> Self {
        Self {
            backend,
            facing,
            handle: None,
            capabilities: Capabilities::DEMO,
            demo: DemoFeed::new(),
            acquire_timeout: ACQUIRE_TIMEOUT,
        }
    }

    /// Override the acquisition timeout
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn kind(&self) -> SourceKind {
        if self.handle.is_some() {
            SourceKind::Real
        } else {
            SourceKind::Demo
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The live handle, `None` in demo
    pub fn handle(&self) -> Option<&dyn FeedHandle> {
        self.handle.as_deref()
    }

    /// Whether the platform has a camera API at all
    pub fn backend_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Label for status displays
    pub fn label(&self) -> String {
        match &self.handle {
            Some(handle) => handle.label(),
            None => format!("Demo ({})", self.facing),
        }
    }

    /// Open a feed, racing the backend against the acquisition timeout
    async fn open_feed(&self, facing: Facing) -> BackendResult<Box<dyn FeedHandle>> {
        if !self.backend.is_available() {
            return Err(CameraError::DeviceUnavailable(format!(
                "{} backend has no media API",
                self.backend.name()
            )));
        }

        match tokio::time::timeout(self.acquire_timeout, self.backend.open(facing)).await {
            Ok(result) => result,
            Err(_) => Err(CameraError::DeviceUnavailable(format!(
                "no feed within {} ms",
                self.acquire_timeout.as_millis()
            ))),
        }
    }

    /// Release the current feed and try to go live facing `facing`
    ///
    /// On failure the source is left in demo with `facing` as its label
    /// and the error is returned for the caller to report.
    pub async fn acquire(&mut self, facing: Facing) -> BackendResult<()> {
        self.release();
        self.facing = facing;

        match self.open_feed(facing).await {
            Ok(handle) => {
                self.install(handle);
                Ok(())
            }
            Err(e) => {
                warn!(facing = %facing, error = %e, "Camera unavailable, using demo feed");
                self.enter_demo();
                Err(e)
            }
        }
    }

    /// Stop the current feed; safe to call in demo
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(device = %handle.label(), "Releasing camera feed");
            handle.stop();
        }
        self.capabilities = Capabilities::DEMO;
    }

    /// Toggle the facing direction
    ///
    /// In demo only the label flips. Otherwise the current feed is released
    /// and the other direction acquired; if that fails the facing reverts
    /// and the source stays in demo without a handle.
    pub async fn switch_facing(&mut self) -> BackendResult<()> {
        let previous = self.facing;
        let target = previous.toggled();

        if self.handle.is_none() {
            self.facing = target;
            debug!(facing = %target, "Switched demo facing");
            return Ok(());
        }

        self.release();
        match self.open_feed(target).await {
            Ok(handle) => {
                self.facing = target;
                self.install(handle);
                Ok(())
            }
            Err(e) => {
                warn!(
                    from = %previous,
                    to = %target,
                    error = %e,
                    "Camera switch failed, reverting facing and falling back to demo"
                );
                self.facing = previous;
                self.enter_demo();
                Err(e)
            }
        }
    }

    /// Re-query capabilities of the current feed
    pub fn refresh_capabilities(&mut self) -> Capabilities {
        self.capabilities = probe(self.handle());
        self.capabilities
    }

    /// Grab one frame from the live feed or the demo placeholder
    pub fn capture_frame(&self) -> BackendResult<CameraFrame> {
        match &self.handle {
            Some(handle) => handle.capture_frame(),
            None => Ok(self.demo.capture_frame()),
        }
    }

    fn install(&mut self, handle: Box<dyn FeedHandle>) {
        self.capabilities = probe(Some(handle.as_ref()));
        info!(
            backend = self.backend.name(),
            device = %handle.label(),
            facing = %self.facing,
            zoom = ?self.capabilities.zoom,
            torch = self.capabilities.torch,
            "Camera feed acquired"
        );
        self.handle = Some(handle);
    }

    fn enter_demo(&mut self) {
        self.handle = None;
        self.capabilities = probe(None);
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSource")
            .field("backend", &self.backend.name())
            .field("kind", &self.kind())
            .field("facing", &self.facing)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}
