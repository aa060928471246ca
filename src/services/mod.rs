pub mod export_service;
pub mod upload_service;

pub use export_service::*;
pub use upload_service::*;
