pub mod download;
pub mod health;
pub mod images;
pub mod labels;
pub mod session;
pub mod upload;

use serde::Serialize;
use utoipa::ToSchema;

/// Plain acknowledgement body shared by mutation endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
