// SPDX-License-Identifier: GPL-3.0-only

//! Media utilities for frames and recordings
//!
//! # Modules
//!
//! - [`frame`]: Letterboxing into the reference frame, JPEG/base64 encoding,
//!   YUYV conversion for raw capture
//! - [`mime`]: Recording container preference and mime negotiation

pub mod frame;
pub mod mime;

// Re-export commonly used types
pub use frame::{encode_base64, encode_jpeg, encode_reference_frame, prepare_reference_frame, EncodedFrame};
pub use mime::{negotiate_mime, ContainerFormat};
