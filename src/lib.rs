pub mod archive;
pub mod config;
pub mod error;
pub mod labels;
pub mod pagination;
pub mod session;
pub mod store;

pub mod server;
pub mod services;
