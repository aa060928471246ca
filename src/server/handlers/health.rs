use axum::response::Json;
use serde_json::{json, Value};

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy"))
)]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "ziplabel",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
