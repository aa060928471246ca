//! Filesystem-backed storage for extracted image blobs
//!
//! All blobs live under a single working directory. Each upload extracts
//! into a staging directory first; the staging directory is renamed into
//! place only after extraction fully succeeds, so a failed upload never
//! disturbs the blobs already being served.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Handle to the working directory holding image blobs
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the working directory and remove anything left behind by a
    /// previous process. Blobs are only meaningful to the process that
    /// extracted them, so startup always begins from an empty directory.
    pub fn prepare_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let mut removed = 0usize;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let result = if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove leftover {}: {}", path.display(), e),
            }
        }
        if removed > 0 {
            debug!(
                "Cleared {} leftover entries from {}",
                removed,
                self.root.display()
            );
        }
        Ok(())
    }

    /// Open a fresh staging area for an extraction.
    pub fn create_staging(&self) -> Result<StagingArea> {
        let temp = tempfile::Builder::new()
            .prefix("staging-")
            .tempdir_in(&self.root)
            .map_err(|e| {
                AppError::StorageFailure(format!("failed to create staging directory: {}", e))
            })?;
        Ok(StagingArea {
            temp,
            session_id: Uuid::new_v4(),
        })
    }

    /// Directory a promoted session's blobs live in.
    pub fn session_dir(&self, session_id: Uuid) -> PathBuf {
        self.root.join(format!("session-{}", session_id))
    }

    /// Best-effort removal of a retired session directory. Only paths inside
    /// the working directory are ever touched.
    pub fn remove_session_dir(&self, dir: &Path) {
        if !dir.starts_with(&self.root) {
            warn!(
                "Refusing to remove {} outside working directory {}",
                dir.display(),
                self.root.display()
            );
            return;
        }
        match fs::remove_dir_all(dir) {
            Ok(()) => debug!("Removed session directory {}", dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", dir.display(), e),
        }
    }
}

/// Staging directory for an in-flight extraction
///
/// Dropping the staging area before [`StagingArea::promote`] deletes the
/// directory and everything written into it.
#[derive(Debug)]
pub struct StagingArea {
    temp: TempDir,
    session_id: Uuid,
}

impl StagingArea {
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Rename the staging directory into its final session location. The
    /// rename stays within the working directory, so it is atomic on every
    /// platform we care about. On failure the staged blobs are deleted.
    pub fn promote(self, store: &BlobStore) -> Result<PathBuf> {
        let target = store.session_dir(self.session_id);
        let source = self.temp.into_path();
        match fs::rename(&source, &target) {
            Ok(()) => Ok(target),
            Err(e) => {
                let _ = fs::remove_dir_all(&source);
                Err(AppError::StorageFailure(format!(
                    "failed to promote staging directory: {}",
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_root_clears_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("blobs");
        fs::create_dir_all(root.join("session-old")).unwrap();
        fs::write(root.join("session-old/a.png"), b"x").unwrap();
        fs::write(root.join("stray.txt"), b"y").unwrap();

        let store = BlobStore::new(&root);
        store.prepare_root().unwrap();

        assert!(root.exists());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_staging_promote_moves_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        store.prepare_root().unwrap();

        let staging = store.create_staging().unwrap();
        fs::write(staging.path().join("blob.png"), b"pixels").unwrap();
        let session_id = staging.session_id();

        let promoted = staging.promote(&store).unwrap();
        assert_eq!(promoted, store.session_dir(session_id));
        assert_eq!(fs::read(promoted.join("blob.png")).unwrap(), b"pixels");
    }

    #[test]
    fn test_dropped_staging_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        store.prepare_root().unwrap();

        let staged_path;
        {
            let staging = store.create_staging().unwrap();
            staged_path = staging.path().to_path_buf();
            fs::write(staging.path().join("blob.png"), b"pixels").unwrap();
        }
        assert!(!staged_path.exists());
    }

    #[test]
    fn test_remove_session_dir_refuses_outside_paths() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let outside = other.path().join("victim");
        fs::create_dir_all(&outside).unwrap();

        store.remove_session_dir(&outside);
        assert!(outside.exists());
    }
}
