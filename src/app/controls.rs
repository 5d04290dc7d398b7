// SPDX-License-Identifier: GPL-3.0-only

//! Zoom and flash controls
//!
//! The UI state always reflects the request. Hardware is only touched with
//! a real feed, and a hardware failure does not roll the UI state back.

use crate::backends::camera::{SourceKind, VideoSource};
use crate::constants::{ZOOM_MAX, ZOOM_MIN};
use crate::errors::{CameraError, ControlError};
use tracing::{debug, warn};

/// Clamp a zoom request into the supported range; NaN maps to no zoom
pub fn clamp_zoom(value: f32) -> f32 {
    if value.is_nan() {
        ZOOM_MIN
    } else {
        value.clamp(ZOOM_MIN, ZOOM_MAX)
    }
}

/// Result of a zoom request
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomOutcome {
    /// Stored, clamped value
    pub zoom: f32,
    /// Hardware result, `None` when nothing was forwarded
    pub hardware: Option<Result<(), CameraError>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomFlashController {
    zoom: f32,
    flash_on: bool,
}

impl Default for ZoomFlashController {
    fn default() -> Self {
        Self {
            zoom: ZOOM_MIN,
            flash_on: false,
        }
    }
}

impl ZoomFlashController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn flash_on(&self) -> bool {
        self.flash_on
    }

    pub fn set_zoom(&mut self, value: f32, source: &VideoSource) -> ZoomOutcome {
        self.zoom = clamp_zoom(value);
        ZoomOutcome {
            zoom: self.zoom,
            hardware: self.forward_zoom(source),
        }
    }

    /// Flip the flash flag
    ///
    /// Fails only for a real feed without torch support. With a real feed
    /// the torch is applied, but a hardware error leaves the flag flipped.
    pub fn toggle_flash(&mut self, source: &VideoSource) -> Result<bool, ControlError> {
        if source.kind() == SourceKind::Real && !source.capabilities().torch {
            return Err(ControlError::FlashUnsupported);
        }

        self.flash_on = !self.flash_on;
        if let Some(handle) = source.handle() {
            match handle.apply_torch(self.flash_on) {
                Ok(()) => debug!(on = self.flash_on, "Applied torch"),
                Err(e) => warn!(on = self.flash_on, error = %e, "Torch control failed"),
            }
        }
        Ok(self.flash_on)
    }

    /// Bring a freshly acquired feed in line with the controls
    ///
    /// The zoom level carries over. The flash was already cleared by
    /// [`ZoomFlashController::release`].
    pub fn on_source_changed(&self, source: &VideoSource) {
        if self.zoom > ZOOM_MIN {
            let _ = self.forward_zoom(source);
        }
    }

    /// Turn the torch off before the feed goes away
    ///
    /// Returns whether the flash flag changed.
    pub fn release(&mut self, source: &VideoSource) -> bool {
        let was_on = self.flash_on;
        if was_on {
            if let Some(handle) = source.handle() {
                if let Err(e) = handle.apply_torch(false) {
                    debug!(error = %e, "Could not turn torch off");
                }
            }
        }
        self.flash_on = false;
        was_on
    }

    fn forward_zoom(&self, source: &VideoSource) -> Option<Result<(), CameraError>> {
        let handle = source.handle()?;
        if !source.capabilities().supports_zoom() {
            return None;
        }
        let result = handle.apply_zoom(self.zoom);
        if let Err(e) = &result {
            warn!(zoom = self.zoom, error = %e, "Zoom control failed");
        }
        Some(result)
    }
}
