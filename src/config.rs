use crate::job::JobSettings;
use crate::storage::RetryPolicy;
use crate::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage_root: PathBuf,
    pub credentials_file: Option<PathBuf>,
    pub public_url_base: Option<String>,
    pub retry: RetryPolicy,
    pub page_concurrency: usize,
    pub jpeg_quality: u8,
    pub max_request_size: usize,
}

impl Config {
    pub fn job_settings(&self) -> JobSettings {
        JobSettings {
            page_concurrency: self.page_concurrency,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            storage_root: default_storage_root(),
            credentials_file: None,
            public_url_base: None,
            retry: RetryPolicy::default(),
            page_concurrency: 4,
            jpeg_quality: 90,
            max_request_size: 1024 * 1024,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            storage_root: args.storage_root.unwrap_or_else(default_storage_root),
            credentials_file: args.credentials_file,
            public_url_base: args.public_url_base,
            retry: RetryPolicy {
                attempts: args.download_attempts.max(1),
                delay: Duration::from_millis(args.download_retry_delay_ms),
            },
            page_concurrency: args.page_concurrency.max(1),
            jpeg_quality: args.jpeg_quality.clamp(1, 100),
            max_request_size: args.max_request_size,
        }
    }
}

/// `<data_local_dir>/scan2pdf`, or `./scan2pdf-data` when the platform has none
pub fn default_storage_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("scan2pdf"))
        .unwrap_or_else(|| PathBuf::from("scan2pdf-data"))
}
