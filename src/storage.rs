// SPDX-License-Identifier: GPL-3.0-only

//! Photo collection store and on-disk archive
//!
//! [`PhotoStore`] is the in-memory gallery and sole owner of every [`Photo`].
//! [`PhotoArchive`] optionally mirrors committed photos to a directory.

use crate::backends::camera::RawImage;
use crate::errors::PhotoError;
use crate::pipelines::photo::{EncodedImage, FilterParameters, PhotoEncoder};
use crate::props::PhotoProp;
use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Unique, time-derived photo identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(String);

impl PhotoId {
    /// `<unix-millis>-<8 hex chars>` for the given capture instant
    pub fn generate(at: DateTime<Local>) -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", at.timestamp_millis(), &uuid[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A committed capture
#[derive(Debug, Clone)]
pub struct Photo {
    pub id: PhotoId,
    /// Composited image (or the raw still when no overlay applied)
    pub image: EncodedImage,
    pub thumbnail: Option<EncodedImage>,
    /// Capture instant
    pub timestamp: DateTime<Local>,
    pub filters: FilterParameters,
    pub props: Vec<PhotoProp>,
    /// At least one enabled overlay existed at capture time
    pub processed: bool,
}

impl Photo {
    /// New photo with identity filters and no props
    pub fn new(image: EncodedImage, thumbnail: Option<EncodedImage>, processed: bool) -> Self {
        let timestamp = Local::now();
        Self {
            id: PhotoId::generate(timestamp),
            image,
            thumbnail,
            timestamp,
            filters: FilterParameters::identity(),
            props: Vec::new(),
            processed,
        }
    }

    /// Thumbnail if one was generated, else the full image
    pub fn thumbnail_or_image(&self) -> &EncodedImage {
        self.thumbnail.as_ref().unwrap_or(&self.image)
    }
}

/// In-memory photo collection, most recent first
#[derive(Debug, Default)]
pub struct PhotoStore {
    photos: Vec<Photo>,
}

impl PhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a photo at the front
    pub fn append(&mut self, photo: Photo) {
        debug!(photo_id = %photo.id, "Photo appended");
        self.photos.insert(0, photo);
    }

    /// Remove a photo; `None` if it was not there
    pub fn delete(&mut self, id: &PhotoId) -> Option<Photo> {
        let index = self.photos.iter().position(|p| &p.id == id)?;
        debug!(photo_id = %id, "Photo deleted");
        Some(self.photos.remove(index))
    }

    /// Replace a photo's filters wholesale; `false` if it was not there
    pub fn update_filters(&mut self, id: &PhotoId, filters: FilterParameters) -> bool {
        match self.get_mut(id) {
            Some(photo) => {
                photo.filters = filters;
                true
            }
            None => false,
        }
    }

    /// Replace a photo's prop list wholesale; `false` if it was not there
    pub fn update_props(&mut self, id: &PhotoId, props: Vec<PhotoProp>) -> bool {
        match self.get_mut(id) {
            Some(photo) => {
                photo.props = props;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|p| &p.id == id)
    }

    fn get_mut(&mut self, id: &PhotoId) -> Option<&mut Photo> {
        self.photos.iter_mut().find(|p| &p.id == id)
    }

    /// All photos, newest first
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn latest(&self) -> Option<&Photo> {
        self.photos.first()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Photos that had overlays applied at capture
    pub fn processed(&self) -> impl Iterator<Item = &Photo> {
        self.photos.iter().filter(|p| p.processed)
    }

    /// Photos captured without overlays
    pub fn unprocessed(&self) -> impl Iterator<Item = &Photo> {
        self.photos.iter().filter(|p| !p.processed)
    }
}

/// Directory mirror of committed photos
///
/// ```text
/// <root>/IMG_<timestamp>.jpg
/// <root>/thumbnails/IMG_<timestamp>.jpg
/// <root>/unprocessed/IMG_<timestamp>.<ext>
/// ```
#[derive(Debug, Clone)]
pub struct PhotoArchive {
    root: PathBuf,
}

impl PhotoArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/Pictures/photobooth`, if a pictures directory is known
    pub fn default_dir() -> Option<PathBuf> {
        dirs::picture_dir().map(|dir| dir.join("photobooth"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_stem(photo_time: DateTime<Local>) -> String {
        format!("IMG_{}", photo_time.format("%Y%m%d_%H%M%S_%3f"))
    }

    /// Write the photo and its thumbnail
    ///
    /// Returns the path of the full image.
    pub async fn save_photo(&self, photo: &Photo) -> Result<PathBuf, PhotoError> {
        let stem = Self::file_stem(photo.timestamp);
        let image_path = self
            .root
            .join(format!("{}.{}", stem, photo.image.extension()));
        let thumbnail = photo.thumbnail.clone().map(|thumb| {
            let path = self
                .root
                .join("thumbnails")
                .join(format!("{}.{}", stem, thumb.extension()));
            (thumb, path)
        });
        let image = photo.image.clone();

        let saved = tokio::task::spawn_blocking(move || {
            let saved = PhotoEncoder::save(&image, &image_path)?;
            if let Some((thumb, path)) = thumbnail {
                PhotoEncoder::save(&thumb, &path)?;
            }
            Ok::<_, PhotoError>(saved)
        })
        .await??;

        info!(photo_id = %photo.id, path = %saved.display(), "Photo archived");
        Ok(saved)
    }

    /// Keep the uncomposited still next to the archive
    pub async fn save_original(&self, photo: &Photo, raw: &RawImage) -> Result<PathBuf, PhotoError> {
        let original = EncodedImage::from_raw(raw);
        let path = self.root.join("unprocessed").join(format!(
            "{}.{}",
            Self::file_stem(photo.timestamp),
            original.extension()
        ));

        let saved =
            tokio::task::spawn_blocking(move || PhotoEncoder::save(&original, &path)).await??;
        debug!(photo_id = %photo.id, path = %saved.display(), "Original still kept");
        Ok(saved)
    }

    /// Archived photo files, newest first
    pub async fn list(&self) -> Vec<PathBuf> {
        let root = self.root.clone();
        let mut entries = tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            if let Ok(entries) = std::fs::read_dir(&root) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    let is_image = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(crate::constants::file_formats::is_image_extension);
                    if path.is_file() && is_image {
                        files.push(path);
                    }
                }
            }
            files
        })
        .await
        .unwrap_or_default();

        // File names embed the capture time, so name order is capture order
        entries.sort_by(|a, b| b.cmp(a));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_id_format() {
        let at = Local::now();
        let id = PhotoId::generate(at);
        let (millis, suffix) = id.as_str().split_once('-').unwrap();
        assert_eq!(millis, at.timestamp_millis().to_string());
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_photo_ids_unique_within_same_instant() {
        let at = Local::now();
        assert_ne!(PhotoId::generate(at), PhotoId::generate(at));
    }
}
