use super::{RemoteStorage, SourceEntry, StorageError};
use crate::assembly::Artifact;
use crate::raster::RasterImage;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// In-process storage for exercising conversion jobs
#[derive(Default)]
pub struct MemoryStorage {
    folders: HashMap<String, Vec<SourceEntry>>,
    images: HashMap<String, Vec<u8>>,
    delays: HashMap<String, Duration>,
    pub uploads: Mutex<Vec<(String, String, Artifact)>>,
    pub fail_uploads: bool,
}

impl MemoryStorage {
    pub fn with_image(mut self, folder: &str, name: &str, bytes: Vec<u8>) -> Self {
        let id = format!("{}/{}", folder, name);
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(SourceEntry {
                name: name.to_string(),
                id: id.clone(),
            });
        self.images.insert(id, bytes);
        self
    }

    /// Hold downloads of `id` back so they finish after quicker ones
    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn with_folder(mut self, folder: &str) -> Self {
        self.folders.entry(folder.to_string()).or_default();
        self
    }
}

impl RemoteStorage for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn list_images(&self, folder_id: &str) -> Result<Vec<SourceEntry>, StorageError> {
        self.folders
            .get(folder_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(folder_id.to_string()))
    }

    fn download_image(&self, id: &str) -> Result<RasterImage, StorageError> {
        let bytes = self
            .images
            .get(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        if let Some(delay) = self.delays.get(id) {
            std::thread::sleep(*delay);
        }
        RasterImage::decode(bytes).map_err(|e| StorageError::Exhausted {
            attempts: 1,
            last_error: e.to_string(),
        })
    }

    fn upload_document(
        &self,
        artifact: &Artifact,
        name: &str,
        folder_id: &str,
    ) -> Result<String, StorageError> {
        if self.fail_uploads {
            return Err(StorageError::Io(std::io::Error::other("quota exceeded")));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((folder_id.to_string(), name.to_string(), artifact.clone()));
        Ok(format!("memory://{}/{}", folder_id, name))
    }
}
