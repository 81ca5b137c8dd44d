use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod assembly;
mod config;
mod correction;
mod error;
mod geometry;
mod job;
mod ordering;
mod raster;
mod server;
mod storage;

use error::ConvertError;
use storage::{Credentials, FileSecretProvider, LocalStorage, SecretProvider};

#[derive(Parser, Debug)]
#[command(name = "scan2pdf-server")]
#[command(about = "Turns photographed document pages into a single clean PDF")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "SCAN2PDF_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SCAN2PDF_PORT", default_value = "8080")]
    pub port: u16,

    /// Directory whose sub-directories act as storage folders
    #[arg(long, env = "SCAN2PDF_STORAGE_ROOT")]
    pub storage_root: Option<PathBuf>,

    /// JSON credentials file (runs anonymously if not set)
    #[arg(long, env = "SCAN2PDF_CREDENTIALS_FILE")]
    pub credentials_file: Option<PathBuf>,

    /// Base URL reported for stored documents instead of file:// paths
    #[arg(long, env = "SCAN2PDF_PUBLIC_URL_BASE")]
    pub public_url_base: Option<String>,

    /// Attempts per image download
    #[arg(long, default_value = "3")]
    pub download_attempts: u32,

    /// Delay between download attempts in milliseconds
    #[arg(long, default_value = "2000")]
    pub download_retry_delay_ms: u64,

    /// Pages fetched and corrected concurrently per job
    #[arg(long, default_value = "4")]
    pub page_concurrency: usize,

    /// JPEG quality for embedded pages (1-100)
    #[arg(long, default_value = "90")]
    pub jpeg_quality: u8,

    /// Maximum request body size in bytes (default: 1MB)
    #[arg(long, default_value = "1048576")]
    pub max_request_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from(args);

    tracing::info!("Starting scan2pdf-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Binding to {}:{}", config.host, config.port);

    let credentials = match &config.credentials_file {
        Some(path) => FileSecretProvider::new(path)
            .credentials()
            .map_err(|e| ConvertError::Configuration(e.to_string()))?,
        None => {
            tracing::warn!("No credentials file configured, running anonymously");
            Credentials::anonymous()
        }
    };

    std::fs::create_dir_all(&config.storage_root).map_err(|e| {
        ConvertError::Configuration(format!(
            "cannot create storage root {}: {}",
            config.storage_root.display(),
            e
        ))
    })?;
    tracing::info!("Storage root: {}", config.storage_root.display());

    let storage = LocalStorage::new(&config.storage_root, credentials, config.retry)
        .with_public_url_base(config.public_url_base.clone());

    server::run(config, Arc::new(storage)).await
}
