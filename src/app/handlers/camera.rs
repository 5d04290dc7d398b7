// SPDX-License-Identifier: GPL-3.0-only

//! Camera source handlers
//!
//! Handles acquisition, facing switches, capability refresh and teardown.

use crate::app::{CameraSession, NoticeLevel, UiEvent};
use crate::backends::camera::{Capabilities, Facing, SourceKind};
use tracing::{debug, info, warn};

impl CameraSession {
    // =========================================================================
    // Camera Source Handlers
    // =========================================================================

    /// Try to go live with the configured facing
    ///
    /// Falls back to the demo feed when no camera can be opened in time.
    /// Either way the session is usable afterwards.
    pub async fn start(&mut self) -> SourceKind {
        let facing = self.source.facing();
        info!(facing = %facing, backend = self.source.backend_name(), "Starting camera session");
        self.acquire_source(facing).await
    }

    /// In demo, try once more to acquire a real feed
    pub async fn retry_acquire(&mut self) -> SourceKind {
        if self.source.kind() == SourceKind::Real {
            debug!("Camera already live, nothing to retry");
            return SourceKind::Real;
        }
        if !self.source.backend_available() {
            self.notice(NoticeLevel::Info, "No camera support on this system");
            return SourceKind::Demo;
        }
        let facing = self.source.facing();
        self.acquire_source(facing).await
    }

    async fn acquire_source(&mut self, facing: Facing) -> SourceKind {
        self.release_controls();
        let result = self.source.acquire(facing).await;
        self.controls.on_source_changed(&self.source);
        self.emit_source_changed();

        if let Err(e) = result {
            info!(error = %e, "Running in demo mode");
            self.notice(NoticeLevel::Info, "Camera unavailable, showing demo feed");
        }
        self.source.kind()
    }

    /// Toggle between the front and back camera
    ///
    /// A running recording is finished first. If the other camera cannot be
    /// opened the facing reverts and the session continues on the demo feed.
    /// On the demo feed only the label changes; zoom and flash stay as they
    /// are.
    pub async fn switch_facing(&mut self) -> SourceKind {
        if self.recording.is_active() {
            self.stop_recording();
        }

        let live = self.source.kind() == SourceKind::Real;
        if live {
            self.release_controls();
        }
        let result = self.source.switch_facing().await;
        if live {
            self.controls.on_source_changed(&self.source);
        }

        match result {
            Ok(()) => {
                info!(facing = %self.source.facing(), kind = ?self.source.kind(), "Switched camera");
            }
            Err(e) => {
                warn!(error = %e, facing = %self.source.facing(), "Camera switch failed");
                self.notice(
                    NoticeLevel::Warning,
                    "Could not switch camera, showing demo feed",
                );
            }
        }

        self.emit_source_changed();
        self.haptic();
        self.source.kind()
    }

    /// Re-query zoom/torch support of the live feed
    pub fn refresh_capabilities(&mut self) -> Capabilities {
        let capabilities = self.source.refresh_capabilities();
        debug!(?capabilities, "Refreshed capabilities");
        self.emit_source_changed();
        capabilities
    }

    /// Stop every loop, finish any recording and release the feed
    pub fn shutdown(&mut self) {
        info!("Shutting down camera session");
        self.scheduler.cancel();
        self.qr_loop.stop();
        if self.recording.is_active() {
            self.stop_recording();
        }
        self.release_controls();
        self.source.release();
        self.emit_source_changed();
    }

    /// Turn the torch off ahead of a feed change and tell the UI
    fn release_controls(&mut self) {
        if self.controls.release(&self.source) {
            self.emit(UiEvent::FlashChanged { on: false });
        }
    }
}
