//! Working session state and the manager that guards it
//!
//! The process serves at most one uploaded archive at a time. All state tied
//! to that archive, the image records, their label assignments, and the blob
//! directory backing them, lives in a [`WorkingSession`]. A successful upload
//! swaps in a whole new session; clearing swaps in an empty one. The swap is
//! the only atomicity boundary callers may rely on.
//!
//! [`SessionManager`] wraps the session and the label set behind a single
//! reader/writer lock. Mutations hold the write lock briefly; exports take a
//! consistent snapshot under the read lock and do their archive work without
//! holding any lock at all.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::labels::{LabelAssignments, LabelSet, DEFAULT_LABEL};
use crate::pagination::{self, PageBounds};

/// One extracted image tracked by the current session
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Dense id assigned at extraction, starting at 0
    pub id: u64,
    /// Entry name as it appeared inside the archive, sanitized
    pub original_name: String,
    /// Blob filename inside the session directory
    pub storage_key: String,
    /// MIME type derived from the file extension
    pub content_type: &'static str,
    /// Uncompressed size in bytes
    pub size_bytes: u64,
    /// Position in the archive's central directory
    pub order: u64,
}

/// All state tied to one uploaded archive
#[derive(Debug)]
pub struct WorkingSession {
    session_id: Uuid,
    created_at: DateTime<Utc>,
    dir: Option<PathBuf>,
    images: Vec<ImageRecord>,
    assignments: LabelAssignments,
}

impl WorkingSession {
    /// The session in place before any upload: no images, no blob directory.
    pub fn empty() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            dir: None,
            images: Vec::new(),
            assignments: LabelAssignments::default(),
        }
    }

    /// Session backed by a promoted blob directory. Every image starts
    /// unlabeled.
    pub fn from_extraction(session_id: Uuid, dir: PathBuf, images: Vec<ImageRecord>) -> Self {
        let assignments = LabelAssignments::for_ids(images.iter().map(|record| record.id));
        Self {
            session_id,
            created_at: Utc::now(),
            dir: Some(dir),
            images,
            assignments,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Blob directory, present once at least one upload promoted.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    fn age_seconds(&self) -> i64 {
        Utc::now().signed_duration_since(self.created_at).num_seconds()
    }

    /// Ids are dense and equal to their index, so lookup is a bounds check.
    fn find(&self, id: u64) -> Option<&ImageRecord> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.images.get(index))
            .filter(|record| record.id == id)
    }
}

/// One image as it appears in a page listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageItem {
    pub id: u64,
    pub label: String,
}

/// One resolved page of the image list
#[derive(Debug)]
pub struct PageView {
    pub items: Vec<PageItem>,
    pub bounds: PageBounds,
}

/// Image and label captured for one export entry
#[derive(Debug, Clone)]
pub struct ExportEntry {
    pub record: ImageRecord,
    pub label: String,
}

/// Consistent view of an export selection, taken under the session lock
#[derive(Debug)]
pub struct ExportSnapshot {
    /// Blob directory the entries resolve against
    pub dir: PathBuf,
    /// Selected entries in upload order
    pub entries: Vec<ExportEntry>,
}

/// A filename-keyed selection entry with a caller-supplied label
#[derive(Debug, Clone)]
pub struct NamedPick {
    pub filename: String,
    pub label: String,
}

struct ManagedState {
    session: WorkingSession,
    labels: LabelSet,
}

/// Owner of the process-wide working session and label set
pub struct SessionManager {
    state: RwLock<ManagedState>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ManagedState {
                session: WorkingSession::empty(),
                labels: LabelSet::new(),
            }),
        }
    }

    /// Swap in a freshly extracted session. Returns the retired session so
    /// the caller can release its blob directory. The label set survives the
    /// swap; assignments do not.
    pub async fn replace(&self, incoming: WorkingSession) -> WorkingSession {
        let mut state = self.state.write().await;
        let outgoing = std::mem::replace(&mut state.session, incoming);
        info!(
            "Session {} active with {} images (retired session {} had {} images, lived {}s)",
            state.session.session_id(),
            state.session.image_count(),
            outgoing.session_id(),
            outgoing.image_count(),
            outgoing.age_seconds()
        );
        outgoing
    }

    /// Retire the current session and leave an empty one in place.
    /// Idempotent: clearing an already empty session is a no-op swap.
    pub async fn reset(&self) -> WorkingSession {
        let mut state = self.state.write().await;
        let outgoing = std::mem::replace(&mut state.session, WorkingSession::empty());
        if outgoing.image_count() > 0 {
            info!(
                "Cleared {} images from session {}",
                outgoing.image_count(),
                outgoing.session_id()
            );
        } else {
            debug!("Clear requested on an empty session");
        }
        outgoing
    }

    pub async fn image_count(&self) -> usize {
        self.state.read().await.session.image_count()
    }

    /// Resolve one page of the image list joined with current labels.
    pub async fn page(&self, page: usize, page_size: usize, max_page_size: usize) -> PageView {
        let state = self.state.read().await;
        let bounds = pagination::resolve(
            page,
            page_size,
            state.session.images.len(),
            max_page_size,
        );
        let items = state.session.images[bounds.range()]
            .iter()
            .map(|record| PageItem {
                id: record.id,
                label: state.session.assignments.label_of(record.id).to_string(),
            })
            .collect();
        PageView { items, bounds }
    }

    /// Locate the blob path and MIME type for an image id.
    pub async fn blob_for(&self, id: u64) -> Result<(PathBuf, &'static str)> {
        let state = self.state.read().await;
        let record = state.session.find(id).ok_or(AppError::NotFound(id))?;
        let dir = state.session.dir().ok_or(AppError::NotFound(id))?;
        Ok((dir.join(&record.storage_key), record.content_type))
    }

    /// Labels currently in the set, insertion order.
    pub async fn labels(&self) -> Vec<String> {
        self.state.read().await.labels.names().to_vec()
    }

    pub async fn add_label(&self, label: &str) -> Result<Vec<String>> {
        let mut state = self.state.write().await;
        state.labels.add(label)?;
        debug!("Label '{}' added", label.trim());
        Ok(state.labels.names().to_vec())
    }

    /// Remove a label and move its images back to the unlabeled sentinel.
    /// Returns the updated label set and how many images were reassigned.
    pub async fn remove_label(&self, label: &str) -> Result<(Vec<String>, usize)> {
        let mut state = self.state.write().await;
        state.labels.remove(label)?;
        let reassigned = state.session.assignments.clear_label(label);
        if reassigned > 0 {
            info!(
                "Label '{}' removed, {} images reassigned to {}",
                label, reassigned, DEFAULT_LABEL
            );
        }
        Ok((state.labels.names().to_vec(), reassigned))
    }

    pub async fn set_label(&self, id: u64, label: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.session.assignments.contains(id) {
            return Err(AppError::UnknownImage(format!("id {}", id)));
        }
        if !state.labels.contains(label) {
            return Err(AppError::UnknownLabel(label.to_string()));
        }
        state.session.assignments.set(id, label);
        debug!("Image {} labeled '{}'", id, label);
        Ok(())
    }

    /// Snapshot every image in the session for export.
    pub async fn snapshot_all(&self) -> Result<ExportSnapshot> {
        let state = self.state.read().await;
        let entries = state
            .session
            .images
            .iter()
            .map(|record| ExportEntry {
                record: record.clone(),
                label: state.session.assignments.label_of(record.id).to_string(),
            })
            .collect();
        Self::sealed(&state, entries)
    }

    /// Snapshot a subset of images by id. Every id must belong to the
    /// current session; entries come out in upload order regardless of the
    /// order ids were given in.
    pub async fn snapshot_selected(&self, ids: &[u64]) -> Result<ExportSnapshot> {
        if ids.is_empty() {
            return Err(AppError::EmptySelection);
        }
        let state = self.state.read().await;
        for id in ids {
            if !state.session.assignments.contains(*id) {
                return Err(AppError::UnknownImage(format!("id {}", id)));
            }
        }
        let wanted: HashSet<u64> = ids.iter().copied().collect();
        let entries = state
            .session
            .images
            .iter()
            .filter(|record| wanted.contains(&record.id))
            .map(|record| ExportEntry {
                record: record.clone(),
                label: state.session.assignments.label_of(record.id).to_string(),
            })
            .collect();
        Self::sealed(&state, entries)
    }

    /// Snapshot a selection keyed by original filename, labels supplied by
    /// the caller. Each filename must match exactly one image's basename.
    pub async fn snapshot_named(&self, picks: &[NamedPick]) -> Result<ExportSnapshot> {
        if picks.is_empty() {
            return Err(AppError::EmptySelection);
        }
        let state = self.state.read().await;
        let mut entries: Vec<ExportEntry> = Vec::with_capacity(picks.len());
        for pick in picks {
            let mut matches = state
                .session
                .images
                .iter()
                .filter(|record| basename(&record.original_name) == pick.filename);
            let record = matches
                .next()
                .ok_or_else(|| AppError::UnknownImage(pick.filename.clone()))?;
            if matches.next().is_some() {
                return Err(AppError::UnknownImage(format!(
                    "{} matches more than one image",
                    pick.filename
                )));
            }
            entries.push(ExportEntry {
                record: record.clone(),
                label: pick.label.clone(),
            });
        }
        entries.sort_by_key(|entry| entry.record.order);
        Self::sealed(&state, entries)
    }

    fn sealed(state: &ManagedState, entries: Vec<ExportEntry>) -> Result<ExportSnapshot> {
        if entries.is_empty() {
            return Err(AppError::EmptySelection);
        }
        let dir = state
            .session
            .dir
            .clone()
            .ok_or(AppError::EmptySelection)?;
        Ok(ExportSnapshot { dir, entries })
    }
}

/// Basename of a sanitized archive entry name.
pub(crate) fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, name: &str) -> ImageRecord {
        ImageRecord {
            id,
            original_name: name.to_string(),
            storage_key: format!("{}.png", id),
            content_type: "image/png",
            size_bytes: 3,
            order: id,
        }
    }

    fn session_with(names: &[&str]) -> WorkingSession {
        let images = names
            .iter()
            .enumerate()
            .map(|(i, name)| record(i as u64, name))
            .collect();
        WorkingSession::from_extraction(Uuid::new_v4(), PathBuf::from("/tmp/session-test"), images)
    }

    #[test]
    fn test_replace_returns_retired_session() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            let first = session_with(&["a.png", "b.jpg"]);
            let retired = manager.replace(first).await;
            assert_eq!(retired.image_count(), 0);

            let second = session_with(&["c.png"]);
            let retired = manager.replace(second).await;
            assert_eq!(retired.image_count(), 2);
            assert_eq!(manager.image_count().await, 1);
        });
    }

    #[test]
    fn test_reset_is_idempotent() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            manager.replace(session_with(&["a.png"])).await;

            let retired = manager.reset().await;
            assert_eq!(retired.image_count(), 1);
            assert!(retired.dir().is_some());

            let retired = manager.reset().await;
            assert_eq!(retired.image_count(), 0);
            assert!(retired.dir().is_none());
        });
    }

    #[test]
    fn test_page_joins_current_labels() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            manager.replace(session_with(&["a.png", "b.jpg", "c.gif"])).await;
            manager.add_label("cat").await.unwrap();
            manager.set_label(1, "cat").await.unwrap();

            let view = manager.page(1, 2, 200).await;
            assert_eq!(view.bounds.total_count, 3);
            assert_eq!(view.bounds.total_pages, 2);
            assert_eq!(
                view.items,
                vec![
                    PageItem { id: 0, label: "None".into() },
                    PageItem { id: 1, label: "cat".into() },
                ]
            );

            let view = manager.page(2, 2, 200).await;
            assert_eq!(view.items, vec![PageItem { id: 2, label: "None".into() }]);
        });
    }

    #[test]
    fn test_set_label_validates_both_sides() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            manager.replace(session_with(&["a.png"])).await;

            let err = manager.set_label(9, "None").await.unwrap_err();
            assert!(matches!(err, AppError::UnknownImage(_)));

            let err = manager.set_label(0, "cat").await.unwrap_err();
            assert!(matches!(err, AppError::UnknownLabel(_)));
        });
    }

    #[test]
    fn test_label_set_survives_session_swap() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            manager.add_label("cat").await.unwrap();
            manager.replace(session_with(&["a.png"])).await;
            manager.set_label(0, "cat").await.unwrap();

            manager.replace(session_with(&["b.png"])).await;
            assert_eq!(manager.labels().await, ["None", "cat"]);
            // the new session's assignments start fresh
            let view = manager.page(1, 10, 200).await;
            assert_eq!(view.items[0].label, "None");
        });
    }

    #[test]
    fn test_remove_label_cascades() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            manager.replace(session_with(&["a.png", "b.png"])).await;
            manager.add_label("cat").await.unwrap();
            manager.set_label(0, "cat").await.unwrap();
            manager.set_label(1, "cat").await.unwrap();

            let (labels, reassigned) = manager.remove_label("cat").await.unwrap();
            assert_eq!(labels, ["None"]);
            assert_eq!(reassigned, 2);
            let view = manager.page(1, 10, 200).await;
            assert!(view.items.iter().all(|item| item.label == "None"));
        });
    }

    #[test]
    fn test_blob_for_unknown_id() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            let err = manager.blob_for(0).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(0)));

            manager.replace(session_with(&["a.png"])).await;
            let (path, content_type) = manager.blob_for(0).await.unwrap();
            assert!(path.ends_with("0.png"));
            assert_eq!(content_type, "image/png");
        });
    }

    #[test]
    fn test_snapshot_selected_orders_and_validates() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            manager.replace(session_with(&["a.png", "b.png", "c.png"])).await;

            let snapshot = manager.snapshot_selected(&[2, 0]).await.unwrap();
            let ids: Vec<u64> = snapshot.entries.iter().map(|e| e.record.id).collect();
            assert_eq!(ids, [0, 2]);

            let err = manager.snapshot_selected(&[0, 9]).await.unwrap_err();
            assert!(matches!(err, AppError::UnknownImage(_)));

            let err = manager.snapshot_selected(&[]).await.unwrap_err();
            assert!(matches!(err, AppError::EmptySelection));
        });
    }

    #[test]
    fn test_snapshot_named_resolves_basenames() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            manager
                .replace(session_with(&["photos/a.png", "b.png", "other/b.png"]))
                .await;

            let picks = vec![NamedPick {
                filename: "a.png".to_string(),
                label: "cat".to_string(),
            }];
            let snapshot = manager.snapshot_named(&picks).await.unwrap();
            assert_eq!(snapshot.entries.len(), 1);
            assert_eq!(snapshot.entries[0].label, "cat");
            assert_eq!(snapshot.entries[0].record.id, 0);

            // two images share the basename b.png
            let picks = vec![NamedPick {
                filename: "b.png".to_string(),
                label: "dog".to_string(),
            }];
            let err = manager.snapshot_named(&picks).await.unwrap_err();
            assert!(matches!(err, AppError::UnknownImage(_)));

            let picks = vec![NamedPick {
                filename: "missing.png".to_string(),
                label: "dog".to_string(),
            }];
            let err = manager.snapshot_named(&picks).await.unwrap_err();
            assert!(matches!(err, AppError::UnknownImage(_)));
        });
    }

    #[test]
    fn test_snapshot_all_empty_session() {
        tokio_test::block_on(async {
            let manager = SessionManager::new();
            let err = manager.snapshot_all().await.unwrap_err();
            assert!(matches!(err, AppError::EmptySelection));
        });
    }
}
