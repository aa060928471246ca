use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{self, download, health, images, labels, session, upload};
use crate::config::AppConfig;
use crate::session::SessionManager;
use crate::store::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionManager>,
    pub store: Arc<BlobStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        upload::upload_zip,
        images::list_images,
        images::get_image,
        labels::update_label,
        labels::list_labels,
        labels::add_label,
        labels::remove_label,
        download::download_all,
        download::download_selected,
        download::download_named,
        session::clear_images,
        session::cleanup,
    ),
    components(schemas(
        upload::UploadForm,
        upload::UploadResponse,
        images::ImageView,
        images::ImagesResponse,
        labels::UpdateLabelRequest,
        labels::AddLabelRequest,
        labels::LabelListResponse,
        labels::LabelMutationResponse,
        download::SelectedImagesRequest,
        download::NamedImage,
        download::NamedImagesRequest,
        handlers::MessageResponse,
    ))
)]
pub struct ApiDoc;

pub fn create_app(state: AppState, cors_origin: Option<&str>) -> Result<Router> {
    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let max_upload = state.config.max_upload_bytes;
    let app = Router::new()
        // Health check endpoint
        .route("/health", get(health::health_check))
        // Raw image bytes referenced by ImageView.url
        .route("/images/:id", get(images::get_image))
        // API routes
        .nest("/api", api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(ServiceBuilder::new().layer(cors))
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Upload and listing
        .route("/upload-zip", post(upload::upload_zip))
        .route("/images", get(images::list_images))
        // Label registry
        .route("/update-label", post(labels::update_label))
        .route("/labels", get(labels::list_labels))
        .route("/labels", post(labels::add_label))
        .route("/labels/:label", delete(labels::remove_label))
        // Exports
        .route("/download-all-images", get(download::download_all))
        .route(
            "/download-selected-images",
            post(download::download_selected),
        )
        .route("/download-images", post(download::download_named))
        // Session lifecycle
        .route("/clear-images", post(session::clear_images))
        .route("/cleanup", post(session::cleanup))
}
