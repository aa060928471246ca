//! Archive upload endpoint

use axum::extract::{Multipart, State};
use axum::response::Json;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::server::app::AppState;
use crate::services::UploadService;

/// Multipart form accepted by the upload endpoint (documentation only)
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct UploadForm {
    /// Zip archive containing the images
    #[schema(format = Binary)]
    pub zipfile: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub total: usize,
}

/// Upload a zip archive; its images replace the working session
#[utoipa::path(
    post,
    path = "/api/upload-zip",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Archive extracted", body = UploadResponse),
        (status = 400, description = "Upload is not a readable zip archive"),
        (status = 413, description = "Archive exceeds the configured size limit")
    )
)]
pub async fn upload_zip(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut archive_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidArchive(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "zipfile" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidArchive(format!("failed to read upload: {}", e)))?;
            archive_bytes = Some(bytes.to_vec());
        }
    }

    let bytes = archive_bytes.ok_or_else(|| {
        AppError::InvalidArchive("missing multipart field 'zipfile'".to_string())
    })?;
    info!("Received archive upload ({} bytes)", bytes.len());

    let service = UploadService::new(
        state.store.clone(),
        state.sessions.clone(),
        state.config.max_extracted_bytes,
    );
    let total = service.ingest_archive(bytes).await?;

    Ok(Json(UploadResponse {
        message: format!("Extracted {} images", total),
        total,
    }))
}
