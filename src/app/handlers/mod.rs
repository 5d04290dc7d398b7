// SPDX-License-Identifier: GPL-3.0-only

//! Session operation handlers
//!
//! Each module adds an `impl CameraSession` block for one functional
//! domain, keeping related operations together.

mod camera;
mod capture;
mod controls;
mod mode;
mod processing;
