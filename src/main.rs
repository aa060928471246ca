use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use ziplabel::config::AppConfig;
use ziplabel::server;

#[derive(Parser)]
#[clap(author, version, about)]
struct ServerArgs {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(short, long, default_value = "8000")]
    port: u16,
    /// Directory extracted images are stored under
    #[clap(short, long, default_value = "uploads")]
    data_dir: String,
    #[clap(long)]
    cors_origin: Option<String>,
    /// Maximum accepted upload size in megabytes
    #[clap(long, default_value = "64")]
    max_upload_mb: usize,
    /// Maximum total uncompressed archive size in megabytes
    #[clap(long, default_value = "512")]
    max_extracted_mb: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    setup_logging(&args.log_level);

    let config = AppConfig {
        port: args.port,
        data_dir: args.data_dir.into(),
        cors_origin: args.cors_origin,
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
        max_extracted_bytes: args.max_extracted_mb * 1024 * 1024,
        ..AppConfig::default()
    };

    info!("Starting server on port {}", config.port);
    server::start_server(config).await?;

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .without_time()
        .init();
}
