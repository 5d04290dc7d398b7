// SPDX-License-Identifier: GPL-3.0-only

//! Gallery collaborator
//!
//! The session hands every captured photo and finished recording to a
//! [`Gallery`]. Browsing and thumbnails are the gallery's business.

use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryItemType {
    Photo,
    Video,
}

/// Metadata stored with an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryMetadata {
    /// Camera label, e.g. "Front"
    pub camera: String,
    pub zoom: f32,
    /// `WxH` of the photo or the encoded video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Recording length, videos only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Produced without a hardware feed or encoder
    pub demo: bool,
    /// Mime type of the media blob, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Media attached to an item
#[derive(Clone, PartialEq)]
pub enum MediaPayload {
    Jpeg(Vec<u8>),
    Blob { mime: String, data: Vec<u8> },
    /// Simulated recording, nothing was encoded
    Placeholder,
}

impl MediaPayload {
    pub fn len(&self) -> usize {
        match self {
            MediaPayload::Jpeg(data) | MediaPayload::Blob { data, .. } => data.len(),
            MediaPayload::Placeholder => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaPayload::Jpeg(data) => write!(f, "Jpeg({} bytes)", data.len()),
            MediaPayload::Blob { mime, data } => write!(f, "Blob({mime}, {} bytes)", data.len()),
            MediaPayload::Placeholder => write!(f, "Placeholder"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub id: Uuid,
    pub item_type: GalleryItemType,
    /// RFC 3339
    pub timestamp: String,
    pub metadata: GalleryMetadata,
    pub media: MediaPayload,
}

impl GalleryItem {
    pub fn new(item_type: GalleryItemType, metadata: GalleryMetadata, media: MediaPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_type,
            timestamp: chrono::Utc::now().to_rfc3339(),
            metadata,
            media,
        }
    }
}

/// Receives captured items
pub trait Gallery: Send + Sync {
    fn add(&self, item: GalleryItem) -> AppResult<()>;
}

/// In-memory gallery, newest item first
#[derive(Debug, Default, Clone)]
pub struct MemoryGallery {
    items: Arc<Mutex<Vec<GalleryItem>>>,
}

impl MemoryGallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<GalleryItem> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Gallery for MemoryGallery {
    fn add(&self, item: GalleryItem) -> AppResult<()> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> GalleryMetadata {
        GalleryMetadata {
            camera: "Front".into(),
            zoom: 1.0,
            resolution: Some("1280x720".into()),
            duration_ms: None,
            demo: true,
            format: None,
        }
    }

    #[test]
    fn newest_item_comes_first() {
        let gallery = MemoryGallery::new();
        let first = GalleryItem::new(GalleryItemType::Photo, metadata(), MediaPayload::Jpeg(vec![1]));
        let second = GalleryItem::new(GalleryItemType::Video, metadata(), MediaPayload::Placeholder);
        gallery.add(first.clone()).unwrap();
        gallery.add(second.clone()).unwrap();

        let items = gallery.items();
        assert_eq!(items[0].id, second.id);
        assert_eq!(items[1].id, first.id);
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let item = GalleryItem::new(GalleryItemType::Photo, metadata(), MediaPayload::Placeholder);
        assert!(chrono::DateTime::parse_from_rfc3339(&item.timestamp).is_ok());
    }

    #[test]
    fn metadata_skips_absent_fields() {
        let json = serde_json::to_value(metadata()).unwrap();
        assert_eq!(json["resolution"], "1280x720");
        assert!(json.get("duration_ms").is_none());
    }
}
