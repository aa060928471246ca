//! Export orchestration: snapshot under the session lock, assemble without it

use std::sync::Arc;

use tracing::warn;

use crate::archive::{build_labeled_archive, ExportOutcome};
use crate::error::{AppError, Result};
use crate::session::{NamedPick, SessionManager};

/// Which images an export covers
#[derive(Debug, Clone)]
pub enum ExportSelection {
    /// Every image in the session
    All,
    /// Images picked by id
    Ids(Vec<u64>),
    /// Images picked by original filename, labels supplied by the caller
    Named(Vec<NamedPick>),
}

pub struct ExportService {
    sessions: Arc<SessionManager>,
}

impl ExportService {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    /// Build the labeled archive for `selection`.
    ///
    /// The selection is resolved into a snapshot while holding the read
    /// lock; the archive itself is assembled on a blocking thread with no
    /// lock held. A session swap racing the assembly shows up as skipped
    /// entries, never as a torn archive.
    pub async fn export(&self, selection: ExportSelection) -> Result<ExportOutcome> {
        let snapshot = match selection {
            ExportSelection::All => self.sessions.snapshot_all().await?,
            ExportSelection::Ids(ids) => self.sessions.snapshot_selected(&ids).await?,
            ExportSelection::Named(picks) => self.sessions.snapshot_named(&picks).await?,
        };

        let outcome = tokio::task::spawn_blocking(move || {
            build_labeled_archive(&snapshot.dir, &snapshot.entries)
        })
        .await
        .map_err(|e| AppError::StorageFailure(format!("export task failed: {}", e)))??;

        if !outcome.skipped.is_empty() {
            warn!(
                "Export finished with {} of {} entries skipped",
                outcome.skipped.len(),
                outcome.entry_count + outcome.skipped.len()
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ImageRecord, WorkingSession};
    use std::io::Cursor;
    use uuid::Uuid;

    async fn seeded_manager(dir: &std::path::Path, names: &[&str]) -> Arc<SessionManager> {
        let images: Vec<ImageRecord> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let key = format!("{}.png", i);
                std::fs::write(dir.join(&key), format!("blob-{}", i)).unwrap();
                ImageRecord {
                    id: i as u64,
                    original_name: name.to_string(),
                    storage_key: key,
                    content_type: "image/png",
                    size_bytes: 6,
                    order: i as u64,
                }
            })
            .collect();
        let manager = Arc::new(SessionManager::new());
        let session = WorkingSession::from_extraction(Uuid::new_v4(), dir.to_path_buf(), images);
        manager.replace(session).await;
        manager
    }

    fn archive_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_export_all_groups_by_label() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let manager = seeded_manager(dir.path(), &["a.png", "b.png"]).await;
            manager.add_label("cat").await.unwrap();
            manager.set_label(1, "cat").await.unwrap();

            let service = ExportService::new(manager);
            let outcome = service.export(ExportSelection::All).await.unwrap();
            assert_eq!(outcome.entry_count, 2);
            assert_eq!(archive_names(&outcome.bytes), ["None/a.png", "cat/b.png"]);
        });
    }

    #[test]
    fn test_export_selected_subset() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let manager = seeded_manager(dir.path(), &["a.png", "b.png", "c.png"]).await;

            let service = ExportService::new(manager);
            let outcome = service
                .export(ExportSelection::Ids(vec![2, 0]))
                .await
                .unwrap();
            assert_eq!(archive_names(&outcome.bytes), ["None/a.png", "None/c.png"]);
        });
    }

    #[test]
    fn test_export_named_uses_caller_labels() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let manager = seeded_manager(dir.path(), &["a.png"]).await;

            let service = ExportService::new(manager);
            let picks = vec![NamedPick {
                filename: "a.png".to_string(),
                label: "review".to_string(),
            }];
            let outcome = service
                .export(ExportSelection::Named(picks))
                .await
                .unwrap();
            assert_eq!(archive_names(&outcome.bytes), ["review/a.png"]);
        });
    }

    #[test]
    fn test_export_after_clear_is_empty_selection() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let manager = seeded_manager(dir.path(), &["a.png"]).await;
            manager.reset().await;

            let service = ExportService::new(manager);
            let err = service.export(ExportSelection::All).await.unwrap_err();
            assert!(matches!(err, AppError::EmptySelection));
        });
    }
}
