// SPDX-License-Identifier: GPL-3.0-only

//! On-disk gallery
//!
//! Photos go to `~/Pictures/vision-camera`, videos to `~/Videos/vision-camera`.
//! Every item, including simulated recordings without media, is appended
//! to a JSON Lines index next to the photos.

use crate::constants::APP_DIR_NAME;
use crate::errors::{AppError, AppResult};
use crate::gallery::{Gallery, GalleryItem, GalleryItemType, GalleryMetadata, MediaPayload};
use crate::media::ContainerFormat;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

const INDEX_FILE_NAME: &str = "gallery.jsonl";

/// One line of the gallery index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub item_type: GalleryItemType,
    pub timestamp: String,
    pub metadata: GalleryMetadata,
    /// Media file, absent for simulated recordings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Gallery that writes media files and a JSON index
#[derive(Debug)]
pub struct DirectoryGallery {
    photos_dir: PathBuf,
    videos_dir: PathBuf,
    // Serializes index appends
    index_lock: Mutex<()>,
}

impl DirectoryGallery {
    pub fn new(photos_dir: PathBuf, videos_dir: PathBuf) -> Self {
        Self {
            photos_dir,
            videos_dir,
            index_lock: Mutex::new(()),
        }
    }

    /// Gallery in the user's picture and video directories
    pub fn in_user_dirs() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let photos = dirs::picture_dir()
            .unwrap_or_else(|| home.join("Pictures"))
            .join(APP_DIR_NAME);
        let videos = dirs::video_dir()
            .unwrap_or_else(|| home.join("Videos"))
            .join(APP_DIR_NAME);
        Self::new(photos, videos)
    }

    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }

    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.photos_dir.join(INDEX_FILE_NAME)
    }

    /// Read the index back, newest last; unreadable lines are skipped
    pub fn entries(&self) -> AppResult<Vec<IndexEntry>> {
        let content = match std::fs::read_to_string(self.index_path()) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable index line");
                    None
                }
            })
            .collect())
    }

    fn write_media(&self, item: &GalleryItem) -> AppResult<Option<PathBuf>> {
        let (dir, prefix, extension, data) = match &item.media {
            MediaPayload::Jpeg(data) => (&self.photos_dir, "IMG", "jpg", data),
            MediaPayload::Blob { mime, data } => {
                let extension = ContainerFormat::from_mime(mime)
                    .unwrap_or_default()
                    .extension();
                (&self.videos_dir, "VID", extension, data)
            }
            MediaPayload::Placeholder => return Ok(None),
        };

        std::fs::create_dir_all(dir)?;
        let path = dir.join(file_name(prefix, item, extension));
        std::fs::write(&path, data)?;
        info!(path = %path.display(), bytes = data.len(), "Saved media");
        Ok(Some(path))
    }

    fn append_index(&self, entry: &IndexEntry) -> AppResult<()> {
        let line = serde_json::to_string(entry).map_err(|e| AppError::Other(e.to_string()))?;
        let _guard = self
            .index_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        std::fs::create_dir_all(&self.photos_dir)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.index_path())?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl Gallery for DirectoryGallery {
    fn add(&self, item: GalleryItem) -> AppResult<()> {
        let file = self.write_media(&item)?;
        self.append_index(&IndexEntry {
            id: item.id,
            item_type: item.item_type,
            timestamp: item.timestamp,
            metadata: item.metadata,
            file,
        })
    }
}

/// `IMG_20240131_142501_1a2b3c4d.jpg`
fn file_name(prefix: &str, item: &GalleryItem, extension: &str) -> String {
    let stamp = chrono::DateTime::parse_from_rfc3339(&item.timestamp)
        .map(|t| t.format("%Y%m%d_%H%M%S").to_string())
        .unwrap_or_else(|_| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
    let short_id: String = item.id.simple().to_string().chars().take(8).collect();
    format!("{prefix}_{stamp}_{short_id}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_gallery() -> (DirectoryGallery, PathBuf) {
        let root = std::env::temp_dir().join(format!("vision-camera-gallery-{}", Uuid::new_v4()));
        let gallery = DirectoryGallery::new(root.join("photos"), root.join("videos"));
        (gallery, root)
    }

    fn metadata(demo: bool) -> GalleryMetadata {
        GalleryMetadata {
            camera: "Back".into(),
            zoom: 2.0,
            resolution: None,
            duration_ms: Some(1500),
            demo,
            format: None,
        }
    }

    #[test]
    fn photo_and_video_land_in_their_directories() {
        let (gallery, root) = temp_gallery();

        let photo = GalleryItem::new(
            GalleryItemType::Photo,
            metadata(false),
            MediaPayload::Jpeg(vec![0xff, 0xd8, 0xff]),
        );
        let video = GalleryItem::new(
            GalleryItemType::Video,
            metadata(false),
            MediaPayload::Blob {
                mime: "video/mp4".into(),
                data: vec![1, 2, 3, 4],
            },
        );
        gallery.add(photo.clone()).unwrap();
        gallery.add(video.clone()).unwrap();

        let entries = gallery.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, photo.id);

        let photo_file = entries[0].file.clone().unwrap();
        assert!(photo_file.starts_with(gallery.photos_dir()));
        assert!(photo_file.to_string_lossy().ends_with(".jpg"));
        assert_eq!(std::fs::read(&photo_file).unwrap(), vec![0xff, 0xd8, 0xff]);

        let video_file = entries[1].file.clone().unwrap();
        assert!(video_file.starts_with(gallery.videos_dir()));
        assert!(video_file.to_string_lossy().ends_with(".mp4"));

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn simulated_recording_is_indexed_without_a_file() {
        let (gallery, root) = temp_gallery();
        let item = GalleryItem::new(GalleryItemType::Video, metadata(true), MediaPayload::Placeholder);
        gallery.add(item).unwrap();

        let entries = gallery.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].file.is_none());
        assert!(entries[0].metadata.demo);
        assert!(!gallery.videos_dir().exists());

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn missing_index_is_empty() {
        let (gallery, _root) = temp_gallery();
        assert!(gallery.entries().unwrap().is_empty());
    }
}
