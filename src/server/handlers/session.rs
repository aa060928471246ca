//! Session lifecycle endpoints

use axum::extract::State;
use axum::response::Json;

use super::MessageResponse;
use crate::server::app::AppState;

/// Clear the working session and release its blobs. Idempotent.
#[utoipa::path(
    post,
    path = "/api/clear-images",
    responses((status = 200, description = "Session cleared", body = MessageResponse))
)]
pub async fn clear_images(State(state): State<AppState>) -> Json<MessageResponse> {
    let outgoing = state.sessions.reset().await;
    if let Some(dir) = outgoing.dir() {
        state.store.remove_session_dir(dir);
    }
    Json(MessageResponse {
        message: "All images cleared successfully".to_string(),
    })
}

/// Reset hook for clients that flush their state on page unload
#[utoipa::path(
    post,
    path = "/api/cleanup",
    responses((status = 200, description = "Session cleared", body = MessageResponse))
)]
pub async fn cleanup(State(state): State<AppState>) -> Json<MessageResponse> {
    let outgoing = state.sessions.reset().await;
    if let Some(dir) = outgoing.dir() {
        state.store.remove_session_dir(dir);
    }
    Json(MessageResponse {
        message: "Cleanup successful".to_string(),
    })
}
