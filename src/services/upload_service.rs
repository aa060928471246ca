//! Upload orchestration: staging, extraction, and the session swap

use std::sync::Arc;

use tracing::info;

use crate::archive::extract_archive;
use crate::error::{AppError, Result};
use crate::session::{SessionManager, WorkingSession};
use crate::store::BlobStore;

pub struct UploadService {
    store: Arc<BlobStore>,
    sessions: Arc<SessionManager>,
    max_extracted_bytes: u64,
}

impl UploadService {
    pub fn new(
        store: Arc<BlobStore>,
        sessions: Arc<SessionManager>,
        max_extracted_bytes: u64,
    ) -> Self {
        Self {
            store,
            sessions,
            max_extracted_bytes,
        }
    }

    /// Extract `bytes` into a fresh session and swap it in, returning how
    /// many images were extracted.
    ///
    /// Extraction happens in a staging directory on a blocking thread. The
    /// previous session stays fully intact unless extraction succeeds; once
    /// the swap lands, the retired session's blob directory is released.
    pub async fn ingest_archive(&self, bytes: Vec<u8>) -> Result<usize> {
        let staging = self.store.create_staging()?;
        let max_extracted = self.max_extracted_bytes;
        let (staging, records) = tokio::task::spawn_blocking(move || {
            let records = extract_archive(&bytes, staging.path(), max_extracted)?;
            Ok::<_, AppError>((staging, records))
        })
        .await
        .map_err(|e| AppError::StorageFailure(format!("extraction task failed: {}", e)))??;

        let count = records.len();
        let session_id = staging.session_id();
        let dir = staging.promote(&self.store)?;

        let incoming = WorkingSession::from_extraction(session_id, dir, records);
        let outgoing = self.sessions.replace(incoming).await;
        if let Some(old_dir) = outgoing.dir() {
            self.store.remove_session_dir(old_dir);
        }

        info!("Ingested archive with {} images", count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn fixture_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut cursor);
            let options = FileOptions::default();
            for (name, bytes) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn service_with_store(root: &std::path::Path) -> (UploadService, Arc<SessionManager>) {
        let store = Arc::new(BlobStore::new(root));
        store.prepare_root().unwrap();
        let sessions = Arc::new(SessionManager::new());
        (
            UploadService::new(store, sessions.clone(), u64::MAX),
            sessions,
        )
    }

    #[test]
    fn test_ingest_promotes_session() {
        tokio_test::block_on(async {
            let root = tempfile::tempdir().unwrap();
            let (service, sessions) = service_with_store(root.path());

            let bytes = fixture_zip(&[("a.png", b"aaa"), ("skip.txt", b"no"), ("b.jpg", b"bb")]);
            let count = service.ingest_archive(bytes).await.unwrap();
            assert_eq!(count, 2);
            assert_eq!(sessions.image_count().await, 2);

            let (blob_path, _) = sessions.blob_for(0).await.unwrap();
            assert_eq!(std::fs::read(blob_path).unwrap(), b"aaa");
            // no staging leftovers beside the session directory
            assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
        });
    }

    #[test]
    fn test_reupload_releases_previous_blobs() {
        tokio_test::block_on(async {
            let root = tempfile::tempdir().unwrap();
            let (service, sessions) = service_with_store(root.path());

            service
                .ingest_archive(fixture_zip(&[("a.png", b"a"), ("b.png", b"b")]))
                .await
                .unwrap();
            let (first_blob, _) = sessions.blob_for(0).await.unwrap();

            service
                .ingest_archive(fixture_zip(&[("c.png", b"c")]))
                .await
                .unwrap();
            assert_eq!(sessions.image_count().await, 1);
            assert!(!first_blob.exists());
            // ids restart from zero for the new session
            let (blob_path, _) = sessions.blob_for(0).await.unwrap();
            assert_eq!(std::fs::read(blob_path).unwrap(), b"c");
        });
    }

    #[test]
    fn test_failed_ingest_keeps_previous_session() {
        tokio_test::block_on(async {
            let root = tempfile::tempdir().unwrap();
            let (service, sessions) = service_with_store(root.path());

            service
                .ingest_archive(fixture_zip(&[("a.png", b"a")]))
                .await
                .unwrap();

            let err = service.ingest_archive(b"not a zip".to_vec()).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidArchive(_)));
            assert_eq!(sessions.image_count().await, 1);
            let (blob_path, _) = sessions.blob_for(0).await.unwrap();
            assert!(blob_path.exists());
            // failed staging directory was cleaned up
            assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
        });
    }
}
