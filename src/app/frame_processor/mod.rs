// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module for periodic frame analysis
//!
//! The [`scheduler`] owns the shared recognition loop for faces, objects
//! and text. QR scanning runs its own loop in scanner mode and decodes
//! locally through the [`tasks`] module.

pub mod scheduler;
pub mod tasks;
pub mod types;

pub use scheduler::{FrameProcessorScheduler, LoopTransition};
pub use tasks::{QrDecoder, QrDetector, RqrrDecoder, SimulatedQrDecoder};
pub use types::{
    DetectionKind, DetectionResult, FrameRegion, LabeledRegion, PixelBox, QrAction, QrDetection,
    WifiSecurity,
};
