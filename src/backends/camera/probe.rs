// SPDX-License-Identifier: GPL-3.0-only

//! Capability probing

use super::{Capabilities, FeedHandle};
use tracing::{debug, warn};

/// Declare the capability set for a feed
///
/// Without a handle (demo) every control is reported as available. A failed
/// query on a real handle falls back to [`Capabilities::SAFE_DEFAULT`].
pub fn probe(handle: Option<&dyn FeedHandle>) -> Capabilities {
    let Some(handle) = handle else {
        return Capabilities::DEMO;
    };

    match handle.query_capabilities() {
        Ok(caps) => {
            debug!(
                device = %handle.label(),
                zoom = ?caps.zoom,
                torch = caps.torch,
                "Probed camera capabilities"
            );
            caps
        }
        Err(e) => {
            warn!(device = %handle.label(), error = %e, "Capability query failed, using safe defaults");
            Capabilities::SAFE_DEFAULT
        }
    }
}
