//! Image listing and raw image bytes

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, Result};
use crate::server::app::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<usize>,
    /// Images per page
    pub limit: Option<usize>,
}

/// One image as served to clients
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageView {
    pub id: u64,
    pub url: String,
    pub label: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImagesResponse {
    pub images: Vec<ImageView>,
    pub total: usize,
}

/// One page of the image list, oldest upload position first
#[utoipa::path(
    get,
    path = "/api/images",
    params(PageQuery),
    responses((status = 200, description = "Page of images", body = ImagesResponse))
)]
pub async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<ImagesResponse> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(state.config.default_page_size);
    let view = state
        .sessions
        .page(page, limit, state.config.max_page_size)
        .await;

    let images = view
        .items
        .into_iter()
        .map(|item| ImageView {
            url: format!("/images/{}", item.id),
            id: item.id,
            label: item.label,
        })
        .collect();

    Json(ImagesResponse {
        images,
        total: view.bounds.total_count,
    })
}

/// Raw bytes of one image
#[utoipa::path(
    get,
    path = "/images/{id}",
    params(("id" = u64, Path, description = "Image id")),
    responses(
        (status = 200, description = "Image bytes with the stored content type"),
        (status = 404, description = "Id is not part of the current session")
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse> {
    let (blob_path, content_type) = state.sessions.blob_for(id).await?;

    // The session can move on between resolving the id and reading the blob;
    // a vanished file means the id went stale, not that storage broke.
    let bytes = match tokio::fs::read(&blob_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(id));
        }
        Err(e) => {
            return Err(AppError::StorageFailure(format!(
                "failed to read blob for image {}: {}",
                id, e
            )));
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    Ok((headers, bytes))
}
