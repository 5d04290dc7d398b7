// SPDX-License-Identifier: GPL-3.0-only

//! Backend for platforms without any camera API

use super::{BackendResult, CameraBackend, Facing, FeedHandle};
use crate::errors::CameraError;
use futures::future::{self, BoxFuture, FutureExt};

/// Reports no media API; every session built on it runs in demo mode
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMediaBackend;

impl CameraBackend for NoMediaBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn open(&self, _facing: Facing) -> BoxFuture<'static, BackendResult<Box<dyn FeedHandle>>> {
        future::ready(Err(CameraError::DeviceUnavailable(
            "no camera API in this build".into(),
        )))
        .boxed()
    }
}
