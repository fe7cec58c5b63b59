//! Media store for uploaded sighting images.
//!
//! Images are written under the images directory with a deterministic,
//! sanitized filename: `{category}_{YYYYMMDD_HHMMSS}_{sanitized-name}`.
//! Observations reference images by path relative to the sightings root
//! (`images/<filename>`), so the same path works as a URL path segment.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::models::Category;

/// Directory name under the sightings root that holds image files.
pub const IMAGES_SUBDIR: &str = "images";

/// Sanitize a filename: characters outside `[A-Za-z0-9_.-]` become
/// underscores, whitespace and underscore runs collapse to one underscore,
/// and the extension is preserved in lower case.
pub fn sanitize_filename(name: &str) -> String {
    let (stem, ext) = split_extension(name);

    let mut sanitized = String::with_capacity(stem.len());
    let mut last_was_underscore = false;
    for c in stem.chars() {
        let mapped = if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            c
        } else {
            '_'
        };
        if mapped == '_' {
            if !last_was_underscore {
                sanitized.push('_');
            }
            last_was_underscore = true;
        } else {
            sanitized.push(mapped);
            last_was_underscore = false;
        }
    }

    let trimmed = sanitized.trim_matches('_');
    let stem = if trimmed.is_empty() { "image" } else { trimmed };

    match ext {
        Some(ext) => format!("{}.{}", stem, sanitize_extension(ext)),
        None => stem.to_string(),
    }
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

fn sanitize_extension(ext: &str) -> String {
    ext.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Construct the stored filename for an upload.
pub fn stored_filename(category: Category, when: DateTime<Local>, original_name: &str) -> String {
    format!(
        "{}_{}_{}",
        category.as_str(),
        when.format("%Y%m%d_%H%M%S"),
        sanitize_filename(original_name)
    )
}

/// Store for image files on disk.
///
/// The media store exclusively owns image bytes; observations only reference
/// them by relative path.
#[derive(Clone)]
pub struct MediaStore {
    sightings_dir: PathBuf,
}

impl MediaStore {
    pub fn new(sightings_dir: PathBuf) -> Self {
        Self { sightings_dir }
    }

    /// The directory image files live in.
    pub fn images_dir(&self) -> PathBuf {
        self.sightings_dir.join(IMAGES_SUBDIR)
    }

    /// Resolve a relative image path (as stored on an observation) to the
    /// absolute file path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.sightings_dir.join(relative)
    }

    /// Write image bytes to durable storage and return the relative path.
    ///
    /// Timestamp granularity is one second; a same-second collision gets a
    /// numeric suffix before the extension rather than overwriting.
    pub fn save_image(
        &self,
        category: Category,
        original_name: &str,
        bytes: &[u8],
    ) -> anyhow::Result<String> {
        let images_dir = self.images_dir();
        std::fs::create_dir_all(&images_dir)?;

        let filename = stored_filename(category, Local::now(), original_name);
        let filename = unique_filename(&images_dir, &filename);

        let full_path = images_dir.join(&filename);
        std::fs::write(&full_path, bytes)?;

        Ok(format!("{}/{}", IMAGES_SUBDIR, filename))
    }

    /// Remove a previously written image. Used to undo the image write when
    /// a later ingestion step fails.
    pub fn remove(&self, relative: &str) -> std::io::Result<()> {
        std::fs::remove_file(self.resolve(relative))
    }

    /// Delete every stored image. Returns the number of files removed.
    pub fn clear(&self) -> anyhow::Result<u64> {
        let images_dir = self.images_dir();
        if !images_dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in std::fs::read_dir(&images_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Pick a filename that does not yet exist in `dir`, suffixing `_1`, `_2`, ...
/// before the extension on collision.
fn unique_filename(dir: &Path, filename: &str) -> String {
    if !dir.join(filename).exists() {
        return filename.to_string();
    }

    let (stem, ext) = split_extension(filename);
    for n in 1.. {
        let candidate = match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        };
        if !dir.join(&candidate).exists() {
            return candidate;
        }
    }
    unreachable!()
}
