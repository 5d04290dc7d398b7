// SPDX-License-Identifier: GPL-3.0-only

//! Capture mode transitions

use crate::app::{CameraSession, CaptureMode, ProcessorKind, SessionMessage, UiEvent};
use tracing::{debug, info};

impl CameraSession {
    /// Switch capture mode
    ///
    /// Total over all modes, including the current one: every transition
    /// cancels both loops, clears all processors and overlays, and in
    /// scanner mode turns QR scanning on. Leaving video mode finishes a
    /// running recording. Every processor flag that changes is reported.
    pub fn set_mode(&mut self, mode: CaptureMode) {
        let previous = self.mode;
        let before = self.processors;
        if previous == CaptureMode::Video && mode != CaptureMode::Video && self.recording.is_active()
        {
            self.stop_recording();
        }

        self.scheduler.cancel();
        self.qr_loop.stop();
        self.processors.clear();
        self.overlay.clear();
        self.emit_overlay();

        self.mode = mode;
        if mode == CaptureMode::Scanner {
            self.processors.qr_scanning = true;
            self.start_qr_polling();
        }

        info!(event = "switchMode", from = ?previous, to = ?mode, "Capture mode changed");
        self.emit(UiEvent::ModeChanged { mode });
        for kind in ProcessorKind::ALL {
            let enabled = self.processors.is_enabled(kind);
            if before.is_enabled(kind) != enabled {
                self.emit(UiEvent::ProcessorToggled { kind, enabled });
            }
        }
        self.haptic();
    }

    pub(crate) fn start_qr_polling(&mut self) {
        let generation = self
            .qr_loop
            .start(&self.tx, |generation| SessionMessage::QrTick { generation });
        debug!(generation, "Started QR polling");
    }
}
