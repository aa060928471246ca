//! Label registry endpoints

use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::MessageResponse;
use crate::error::Result;
use crate::server::app::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLabelRequest {
    pub image_id: u64,
    pub label: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddLabelRequest {
    pub label: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LabelListResponse {
    pub labels: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LabelMutationResponse {
    pub message: String,
    pub labels: Vec<String>,
}

/// Assign a label to one image
#[utoipa::path(
    post,
    path = "/api/update-label",
    request_body = UpdateLabelRequest,
    responses(
        (status = 200, description = "Label assigned", body = MessageResponse),
        (status = 404, description = "Image is not part of the current session"),
        (status = 400, description = "Label is not in the label set")
    )
)]
pub async fn update_label(
    State(state): State<AppState>,
    Json(payload): Json<UpdateLabelRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .sessions
        .set_label(payload.image_id, &payload.label)
        .await?;
    Ok(Json(MessageResponse {
        message: format!("Image {} labeled '{}'", payload.image_id, payload.label),
    }))
}

/// Labels currently in the set, insertion order
#[utoipa::path(
    get,
    path = "/api/labels",
    responses((status = 200, description = "Current label set", body = LabelListResponse))
)]
pub async fn list_labels(State(state): State<AppState>) -> Json<LabelListResponse> {
    Json(LabelListResponse {
        labels: state.sessions.labels().await,
    })
}

/// Add a label to the set
#[utoipa::path(
    post,
    path = "/api/labels",
    request_body = AddLabelRequest,
    responses(
        (status = 200, description = "Label added", body = LabelMutationResponse),
        (status = 400, description = "Label name failed validation"),
        (status = 409, description = "Label already exists")
    )
)]
pub async fn add_label(
    State(state): State<AppState>,
    Json(payload): Json<AddLabelRequest>,
) -> Result<Json<LabelMutationResponse>> {
    let labels = state.sessions.add_label(&payload.label).await?;
    Ok(Json(LabelMutationResponse {
        message: format!("Label '{}' added", payload.label.trim()),
        labels,
    }))
}

/// Remove a label; its images fall back to the unlabeled sentinel
#[utoipa::path(
    delete,
    path = "/api/labels/{label}",
    params(("label" = String, Path, description = "Label to remove")),
    responses(
        (status = 200, description = "Label removed", body = LabelMutationResponse),
        (status = 403, description = "Label is protected"),
        (status = 400, description = "Label is not in the set")
    )
)]
pub async fn remove_label(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<LabelMutationResponse>> {
    let (labels, reassigned) = state.sessions.remove_label(&label).await?;
    Ok(Json(LabelMutationResponse {
        message: format!("Label '{}' removed, {} images reassigned", label, reassigned),
        labels,
    }))
}
