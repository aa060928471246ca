//! Export endpoints returning zip archives

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::archive::ExportOutcome;
use crate::error::{AppError, Result};
use crate::server::app::AppState;
use crate::services::{ExportSelection, ExportService};
use crate::session::NamedPick;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectedImagesRequest {
    pub selected_ids: Vec<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NamedImage {
    pub filename: String,
    pub label: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NamedImagesRequest {
    pub images: Vec<NamedImage>,
}

/// Download every image, grouped into one directory per label
#[utoipa::path(
    get,
    path = "/api/download-all-images",
    responses(
        (status = 200, description = "Zip archive of all images", content_type = "application/zip"),
        (status = 400, description = "Session holds no images")
    )
)]
pub async fn download_all(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let outcome = ExportService::new(state.sessions.clone())
        .export(ExportSelection::All)
        .await?;
    zip_response(outcome)
}

/// Download a subset of images picked by id
#[utoipa::path(
    post,
    path = "/api/download-selected-images",
    request_body = SelectedImagesRequest,
    responses(
        (status = 200, description = "Zip archive of the selected images", content_type = "application/zip"),
        (status = 400, description = "Selection is empty"),
        (status = 404, description = "Selection references an unknown image")
    )
)]
pub async fn download_selected(
    State(state): State<AppState>,
    Json(payload): Json<SelectedImagesRequest>,
) -> Result<impl IntoResponse> {
    let outcome = ExportService::new(state.sessions.clone())
        .export(ExportSelection::Ids(payload.selected_ids))
        .await?;
    zip_response(outcome)
}

/// Filename-keyed download with labels supplied by the client
///
/// Kept for clients that track labels themselves and reference images by
/// their original filename. Each filename must match exactly one image.
#[utoipa::path(
    post,
    path = "/api/download-images",
    request_body = NamedImagesRequest,
    responses(
        (status = 200, description = "Zip archive of the named images", content_type = "application/zip"),
        (status = 400, description = "Selection is empty"),
        (status = 404, description = "A filename is unknown or ambiguous")
    )
)]
pub async fn download_named(
    State(state): State<AppState>,
    Json(payload): Json<NamedImagesRequest>,
) -> Result<impl IntoResponse> {
    let picks: Vec<NamedPick> = payload
        .images
        .into_iter()
        .map(|image| NamedPick {
            filename: image.filename,
            label: image.label,
        })
        .collect();
    let outcome = ExportService::new(state.sessions.clone())
        .export(ExportSelection::Named(picks))
        .await?;
    zip_response(outcome)
}

fn zip_response(outcome: ExportOutcome) -> Result<(HeaderMap, Vec<u8>)> {
    let filename = format!("labeled_images_{}.zip", Uuid::new_v4());
    info!(
        "Serving export {} with {} entries ({} skipped)",
        filename,
        outcome.entry_count,
        outcome.skipped.len()
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)).map_err(
            |e| AppError::StorageFailure(format!("failed to build response header: {}", e)),
        )?,
    );
    Ok((headers, outcome.bytes))
}
