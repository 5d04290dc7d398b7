// SPDX-License-Identifier: GPL-3.0-only

//! Zoom and flash handlers

use crate::app::{CameraSession, NoticeLevel, UiEvent};
use crate::constants::ZOOM_STEP;
use tracing::{debug, warn};

impl CameraSession {
    /// Set the zoom factor, clamped to 1x..8x
    ///
    /// The indicator always shows the clamped value, whether or not the
    /// hardware accepted it.
    pub fn set_zoom(&mut self, value: f32) -> f32 {
        let outcome = self.controls.set_zoom(value, &self.source);
        debug!(requested = value, zoom = outcome.zoom, forwarded = outcome.hardware.is_some(), "Zoom set");
        self.emit(UiEvent::ZoomChanged { zoom: outcome.zoom });
        self.haptic();
        outcome.zoom
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.controls.zoom() + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.controls.zoom() - ZOOM_STEP)
    }

    /// Toggle the torch; returns the new state, or `None` when unsupported
    pub fn toggle_flash(&mut self) -> Option<bool> {
        match self.controls.toggle_flash(&self.source) {
            Ok(on) => {
                self.emit(UiEvent::FlashChanged { on });
                self.haptic();
                Some(on)
            }
            Err(e) => {
                warn!(error = %e, camera = %self.source.label(), "Flash toggle rejected");
                self.notice(NoticeLevel::Warning, "Flash is not supported by this camera");
                None
            }
        }
    }
}
