// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation store.
//!
//! Keeps uploaded images and one saved annotation list per image. The
//! local implementation lays a directory out as:
//!
//! ```text
//! <root>/images.json              image records
//! <root>/images/<uuid>.<ext>      stored image files
//! <root>/annotations/<uuid>.json  saved annotation list per image
//! ```

use crate::io::serialization::annotations_from_str;
use crate::models::annotation::Annotation;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const INDEX_FILE: &str = "images.json";
const IMAGES_DIR: &str = "images";
const ANNOTATIONS_DIR: &str = "annotations";

/// A stored image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    /// Original file name of the upload.
    pub filename: String,
    /// Location the stored file can be opened from.
    pub public_url: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence backend for images and their annotations.
pub trait AnnotationStore {
    /// Copy an image into the store and record it.
    fn upload_image(&mut self, path: &Path) -> Result<ImageRecord>;

    /// All stored images, newest first.
    fn list_images(&self) -> Result<Vec<ImageRecord>>;

    /// Saved annotations for an image. An image with no saved work yields
    /// an empty list.
    fn load_annotations(&self, image_id: &str) -> Result<Vec<Annotation>>;

    /// Replace the saved annotations for an image.
    fn save_annotations(&mut self, image_id: &str, annotations: &[Annotation]) -> Result<()>;

    /// Remove an image, its stored file and its annotations. Returns false
    /// if the image is unknown.
    fn delete_image(&mut self, image_id: &str) -> Result<bool>;
}

/// Directory-backed store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [root.join(IMAGES_DIR), root.join(ANNOTATIONS_DIR)] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create store directory {}", dir.display()))?;
        }
        log::info!("Annotation store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the stored file for a record.
    pub fn image_path(&self, record: &ImageRecord) -> PathBuf {
        PathBuf::from(&record.public_url)
    }

    pub fn find_image(&self, image_id: &str) -> Result<Option<ImageRecord>> {
        Ok(self.read_index()?.into_iter().find(|r| r.id == image_id))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn annotations_path(&self, image_id: &str) -> Result<PathBuf> {
        // Ids become file names; only accept what we generate.
        let id = Uuid::parse_str(image_id).map_err(|_| anyhow!("Invalid image id {:?}", image_id))?;
        Ok(self.root.join(ANNOTATIONS_DIR).join(format!("{}.json", id)))
    }

    fn read_index(&self) -> Result<Vec<ImageRecord>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Corrupt image index {}", path.display()))
    }

    fn write_index(&self, records: &[ImageRecord]) -> Result<()> {
        write_replacing(&self.index_path(), &serde_json::to_string_pretty(records)?)
    }
}

/// Replace `path` by writing a sibling temp file and renaming it over.
fn write_replacing(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

impl AnnotationStore for LocalStore {
    fn upload_image(&mut self, path: &Path) -> Result<ImageRecord> {
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Not a file: {}", path.display()))?
            .to_string();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "png".to_string());

        let id = Uuid::new_v4().to_string();
        let stored = self.root.join(IMAGES_DIR).join(format!("{}.{}", id, ext));
        std::fs::copy(path, &stored)
            .with_context(|| format!("Failed to upload {}", path.display()))?;

        let record = ImageRecord {
            id,
            filename,
            public_url: stored.to_string_lossy().into_owned(),
            created_at: Utc::now(),
        };
        let mut records = self.read_index()?;
        records.push(record.clone());
        self.write_index(&records)?;
        log::info!("Uploaded {} as {}", record.filename, record.id);
        Ok(record)
    }

    fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let mut records = self.read_index()?;
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn load_annotations(&self, image_id: &str) -> Result<Vec<Annotation>> {
        let path = self.annotations_path(image_id)?;
        if !path.exists() {
            log::debug!("No saved annotations for {}", image_id);
            return Ok(Vec::new());
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        annotations_from_str(&json).with_context(|| format!("Corrupt annotation file {}", path.display()))
    }

    fn save_annotations(&mut self, image_id: &str, annotations: &[Annotation]) -> Result<()> {
        let path = self.annotations_path(image_id)?;
        if self.find_image(image_id)?.is_none() {
            bail!("Unknown image {}", image_id);
        }
        write_replacing(&path, &serde_json::to_string_pretty(annotations)?)?;
        log::info!("Saved {} annotations for {}", annotations.len(), image_id);
        Ok(())
    }

    fn delete_image(&mut self, image_id: &str) -> Result<bool> {
        let annotations = self.annotations_path(image_id)?;
        let mut records = self.read_index()?;
        let Some(pos) = records.iter().position(|r| r.id == image_id) else {
            return Ok(false);
        };
        let record = records.remove(pos);

        match std::fs::remove_file(self.image_path(&record)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Stored file for {} was already gone", record.id);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", record.public_url))
            }
        }
        if annotations.exists() {
            std::fs::remove_file(&annotations)
                .with_context(|| format!("Failed to remove {}", annotations.display()))?;
        }
        self.write_index(&records)?;
        log::info!("Deleted image {} ({})", record.id, record.filename);
        Ok(true)
    }
}
