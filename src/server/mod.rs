pub mod app;
pub mod handlers;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::AppConfig;
use crate::session::SessionManager;
use crate::store::BlobStore;

use app::AppState;

pub async fn start_server(config: AppConfig) -> Result<()> {
    let store = Arc::new(BlobStore::new(&config.data_dir));
    store.prepare_root()?;
    info!("Blob storage ready at {}", config.data_dir.display());

    let sessions = Arc::new(SessionManager::new());
    let port = config.port;
    let cors_origin = config.cors_origin.clone();
    let state = AppState {
        config: Arc::new(config),
        sessions,
        store,
    };

    let app = app::create_app(state, cors_origin.as_deref())?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                       - Health check");
    info!("  /docs                         - Swagger UI documentation");
    info!("  /api/upload-zip               - Upload a zip of images (POST)");
    info!("  /api/images                   - Paginated image listing");
    info!("  /images/:id                   - Raw image bytes");
    info!("  /api/labels                   - Label set (GET, POST, DELETE /:label)");
    info!("  /api/update-label             - Assign a label to an image (POST)");
    info!("  /api/download-all-images      - Export all images as a zip");
    info!("  /api/download-selected-images - Export selected images (POST)");
    info!("  /api/download-images          - Filename-keyed export (POST)");
    info!("  /api/clear-images             - Clear the working session (POST)");
    info!("  /api/cleanup                  - Clear on page unload (POST)");
}
