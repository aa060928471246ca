//! Runtime configuration for the server

use std::path::PathBuf;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default working directory for extracted image blobs.
pub const DEFAULT_DATA_DIR: &str = "uploads";
/// Default cap on the uploaded request body, in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;
/// Default cap on the total uncompressed size of archive contents, in bytes.
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 512 * 1024 * 1024;
/// Page size used when the client omits `limit`.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Upper bound on any requested page size.
pub const MAX_PAGE_SIZE: usize = 200;

/// Server configuration assembled from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// Directory holding extracted image blobs
    pub data_dir: PathBuf,
    /// Optional CORS origin; `None` allows any origin
    pub cors_origin: Option<String>,
    /// Maximum accepted upload body size in bytes
    pub max_upload_bytes: usize,
    /// Maximum total uncompressed size of an archive's contents in bytes
    pub max_extracted_bytes: u64,
    /// Page size applied when a request omits `limit`
    pub default_page_size: usize,
    /// Largest page size a request may ask for
    pub max_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cors_origin: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}
