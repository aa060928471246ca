//! Archive intake: filter, sanitize, and extract image entries
//!
//! Extraction is all-or-nothing. Accepted entries are written into a staging
//! directory under generated keys; any read or write failure abandons the
//! whole staging area so the previous session is never half-replaced.

use std::io::{Cursor, Read};
use std::path::{Component, Path};

use tracing::{debug, warn};
use uuid::Uuid;
use zip::ZipArchive;

use crate::error::{AppError, Result};
use crate::session::ImageRecord;

/// File extensions accepted as images, lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Decode `bytes` as a zip archive and write every accepted image entry into
/// `staging_dir`. Records come back in central directory order with dense
/// ids starting at 0. Non-image entries, directories, hidden files, and
/// macOS metadata are skipped without error.
pub fn extract_archive(
    bytes: &[u8],
    staging_dir: &Path,
    max_extracted_bytes: u64,
) -> Result<Vec<ImageRecord>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::InvalidArchive(format!("failed to read archive: {}", e)))?;

    let mut records: Vec<ImageRecord> = Vec::new();
    let mut skipped = 0usize;
    let mut budget = max_extracted_bytes;

    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| {
            AppError::InvalidArchive(format!("failed to read archive entry {}: {}", i, e))
        })?;
        if entry.is_dir() {
            continue;
        }
        if !is_image_entry(entry.name()) {
            skipped += 1;
            debug!("Skipping non-image entry '{}'", entry.name());
            continue;
        }
        let name = match sanitize_entry_name(entry.name()) {
            Some(name) => name,
            None => {
                skipped += 1;
                warn!("Skipping entry with no usable path: '{}'", entry.name());
                continue;
            }
        };

        if entry.size() > budget {
            return Err(AppError::TooLarge(format!(
                "archive contents exceed {} bytes uncompressed",
                max_extracted_bytes
            )));
        }
        // Entry headers may understate sizes, so the read itself is capped too.
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .take(budget.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|e| {
                AppError::InvalidArchive(format!("failed to read entry '{}': {}", name, e))
            })?;
        if data.len() as u64 > budget {
            return Err(AppError::TooLarge(format!(
                "archive contents exceed {} bytes uncompressed",
                max_extracted_bytes
            )));
        }
        budget -= data.len() as u64;

        let ext = extension_of(&name).to_ascii_lowercase();
        let storage_key = format!("{}.{}", Uuid::new_v4(), ext);
        let blob_path = staging_dir.join(&storage_key);
        std::fs::write(&blob_path, &data).map_err(|e| {
            AppError::StorageFailure(format!("failed to write blob {}: {}", storage_key, e))
        })?;

        let id = records.len() as u64;
        debug!("Extracted '{}' ({} bytes) as {}", name, data.len(), storage_key);
        records.push(ImageRecord {
            id,
            original_name: name,
            storage_key,
            content_type: content_type_for(&ext),
            size_bytes: data.len() as u64,
            order: id,
        });
    }

    if skipped > 0 {
        debug!("Skipped {} entries during extraction", skipped);
    }
    Ok(records)
}

/// Accept an entry if it looks like an image and is not metadata. Hidden
/// files, anything under a dotted directory, and macOS resource forks are
/// all rejected here, which also covers `..`-style traversal names.
fn is_image_entry(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower.contains("__macosx") || lower.contains("/.") || lower.starts_with('.') {
        return false;
    }
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}

/// Reduce an entry name to a safe relative path. Only normal components
/// survive; absolute prefixes and traversal components are dropped.
fn sanitize_entry_name(raw: &str) -> Option<String> {
    let parts: Vec<String> = Path::new(raw)
        .components()
        .filter_map(|component| match component {
            Component::Normal(value) => Some(value.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Extension of a name already known to carry one of [`IMAGE_EXTENSIONS`].
fn extension_of(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or("")
}

/// MIME type for an accepted image extension, lowercase.
fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
