// SPDX-License-Identifier: GPL-3.0-only

//! Recorder mime negotiation

use crate::constants::{FALLBACK_MIME, MIME_PREFERENCES};
use serde::{Deserialize, Serialize};

/// Preferred recording container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    WebM,
    Mp4,
}

impl ContainerFormat {
    pub const ALL: [ContainerFormat; 2] = [ContainerFormat::WebM, ContainerFormat::Mp4];

    pub fn display_name(&self) -> &'static str {
        match self {
            ContainerFormat::WebM => "WebM",
            ContainerFormat::Mp4 => "MP4",
        }
    }

    /// File extension for recordings in this container
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::WebM => "webm",
            ContainerFormat::Mp4 => "mp4",
        }
    }

    /// Container a mime type belongs to
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        match essence {
            "video/webm" => Some(ContainerFormat::WebM),
            "video/mp4" => Some(ContainerFormat::Mp4),
            _ => None,
        }
    }
}

/// Pick the recorder mime type
///
/// Candidates are tried in preference order (VP9 WebM, WebM, MP4), with the
/// ones matching `preferred` moved to the front. The first one `supports`
/// accepts wins; if none is supported the fallback container is returned.
pub fn negotiate_mime(supports: impl Fn(&str) -> bool, preferred: ContainerFormat) -> &'static str {
    let (matching, others): (Vec<&'static str>, Vec<&'static str>) = MIME_PREFERENCES
        .iter()
        .copied()
        .partition(|mime| ContainerFormat::from_mime(mime) == Some(preferred));

    matching
        .into_iter()
        .chain(others)
        .find(|mime| supports(mime))
        .unwrap_or(FALLBACK_MIME)
}
