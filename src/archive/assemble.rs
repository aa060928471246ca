//! Export assembly: build a zip of blobs grouped into label directories

use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use tracing::warn;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppError, Result};
use crate::labels::DEFAULT_LABEL;
use crate::session::{basename, ExportEntry};

/// Entry left out of an export archive because its blob was unreadable
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub id: u64,
    pub original_name: String,
    pub reason: String,
}

/// Finished export archive plus per-entry bookkeeping
#[derive(Debug)]
pub struct ExportOutcome {
    pub bytes: Vec<u8>,
    pub entry_count: usize,
    pub skipped: Vec<SkippedEntry>,
}

/// Assemble `entries` into a zip whose paths are `<label>/<basename>`.
///
/// Blobs are read from `blob_dir`. An unreadable blob skips that entry and
/// the rest of the archive still builds; a failure while writing the archive
/// itself fails the whole export. Name collisions within a label directory
/// get a `-1`, `-2` suffix on the filename stem.
pub fn build_labeled_archive(blob_dir: &Path, entries: &[ExportEntry]) -> Result<ExportOutcome> {
    if entries.is_empty() {
        return Err(AppError::EmptySelection);
    }

    let mut skipped: Vec<SkippedEntry> = Vec::new();
    let mut entry_count = 0usize;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut cursor);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut used_paths: HashSet<String> = HashSet::new();

        for entry in entries {
            let blob_path = blob_dir.join(&entry.record.storage_key);
            let bytes = match fs::read(&blob_path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        "Skipping '{}' in export: {}",
                        entry.record.original_name, e
                    );
                    skipped.push(SkippedEntry {
                        id: entry.record.id,
                        original_name: entry.record.original_name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let archive_path = place(&mut used_paths, entry);
            writer.start_file(archive_path.as_str(), options).map_err(|e| {
                AppError::StorageFailure(format!(
                    "failed to start archive entry '{}': {}",
                    archive_path, e
                ))
            })?;
            writer.write_all(&bytes).map_err(|e| {
                AppError::StorageFailure(format!(
                    "failed to write archive entry '{}': {}",
                    archive_path, e
                ))
            })?;
            entry_count += 1;
        }

        writer
            .finish()
            .map_err(|e| AppError::StorageFailure(format!("failed to finalize archive: {}", e)))?;
    }

    Ok(ExportOutcome {
        bytes: cursor.into_inner(),
        entry_count,
        skipped,
    })
}

/// Pick the archive path for an entry, disambiguating collisions within its
/// label directory.
fn place(used: &mut HashSet<String>, entry: &ExportEntry) -> String {
    let label_dir = sanitize_component(&entry.label, DEFAULT_LABEL);
    let base = sanitize_component(
        basename(&entry.record.original_name),
        &entry.record.storage_key,
    );

    let mut candidate = format!("{}/{}", label_dir, base);
    let (stem, ext) = split_name(&base);
    let mut n = 0usize;
    while used.contains(&candidate) {
        n += 1;
        candidate = match ext {
            Some(ext) => format!("{}/{}-{}.{}", label_dir, stem, n, ext),
            None => format!("{}/{}-{}", label_dir, stem, n),
        };
    }
    used.insert(candidate.clone());
    candidate
}

/// Strip path separators and control characters from a single archive path
/// component. Falls back when nothing printable remains.
fn sanitize_component(value: &str, fallback: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}
