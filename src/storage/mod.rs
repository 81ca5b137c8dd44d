//! Collaborators at the edge of the conversion core
//!
//! Conversion jobs only see [`RemoteStorage`] and [`SecretProvider`]. The
//! service wires a filesystem-backed [`LocalStorage`] into them at startup.

pub mod local;
#[cfg(test)]
pub mod memory;
pub mod retry;
pub mod secrets;

pub use local::LocalStorage;
pub use retry::RetryPolicy;
pub use secrets::{Credentials, FileSecretProvider, SecretProvider};

use crate::assembly::Artifact;
use crate::raster::RasterImage;
use thiserror::Error;

/// A listed source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub id: String,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid identifier '{0}'")]
    InvalidId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("Credentials unavailable: {0}")]
    Credentials(String),
}

/// Where source images come from and where finished documents go
pub trait RemoteStorage: Send + Sync {
    /// Backend identifier reported by the service
    fn name(&self) -> &'static str;

    /// JPEG and PNG images in a folder, sorted by name
    fn list_images(&self, folder_id: &str) -> Result<Vec<SourceEntry>, StorageError>;

    /// Fetch and decode one image, retrying transient failures internally
    fn download_image(&self, id: &str) -> Result<RasterImage, StorageError>;

    /// Store the document and return its URL
    fn upload_document(
        &self,
        artifact: &Artifact,
        name: &str,
        folder_id: &str,
    ) -> Result<String, StorageError>;
}
