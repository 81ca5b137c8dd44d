use super::{Credentials, RemoteStorage, RetryPolicy, SourceEntry, StorageError};
use crate::assembly::Artifact;
use crate::raster::RasterImage;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File extensions accepted as source images
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Folders are directories under `root`; ids are `"{folder}/{file}"`
pub struct LocalStorage {
    root: PathBuf,
    credentials: Credentials,
    retry: RetryPolicy,
    public_url_base: Option<String>,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, credentials: Credentials, retry: RetryPolicy) -> Self {
        Self {
            root: root.into(),
            credentials,
            retry,
            public_url_base: None,
        }
    }

    /// Report `{base}/{folder}/{name}` URLs instead of `file://` paths
    pub fn with_public_url_base(mut self, base: Option<String>) -> Self {
        self.public_url_base = base.map(|b| b.trim_end_matches('/').to_string());
        self
    }

    fn folder_path(&self, folder_id: &str) -> Result<PathBuf, StorageError> {
        validate_component(folder_id)?;
        let path = self.root.join(folder_id);
        if !path.is_dir() {
            return Err(StorageError::NotFound(format!("folder '{}'", folder_id)));
        }
        Ok(path)
    }

    fn file_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        let (folder, file) = id
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidId(id.to_string()))?;
        validate_component(file)?;
        Ok(self.folder_path(folder)?.join(file))
    }
}

impl RemoteStorage for LocalStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    fn list_images(&self, folder_id: &str) -> Result<Vec<SourceEntry>, StorageError> {
        let folder = self.folder_path(folder_id)?;

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&folder)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_image_name(&name) {
                continue;
            }
            entries.push(SourceEntry {
                id: format!("{}/{}", folder_id, name),
                name,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::info!(
            "Listed {} images in folder '{}'",
            entries.len(),
            folder_id
        );
        Ok(entries)
    }

    fn download_image(&self, id: &str) -> Result<RasterImage, StorageError> {
        let path = self.file_path(id)?;

        let image = self.retry.run(&format!("Download of '{}'", id), || {
            if !path.is_file() {
                return Err(StorageError::NotFound(id.to_string()));
            }
            let bytes = std::fs::read(&path)?;
            RasterImage::decode(&bytes).map_err(|e| StorageError::Decode(e.to_string()))
        })?;

        tracing::info!(
            "Downloaded '{}' ({}x{})",
            id,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    fn upload_document(
        &self,
        artifact: &Artifact,
        name: &str,
        folder_id: &str,
    ) -> Result<String, StorageError> {
        validate_component(name)?;
        let folder = self.folder_path(folder_id)?;

        // Write beside the target so the rename stays on one filesystem
        let mut staged = tempfile::NamedTempFile::new_in(&folder)?;
        staged.write_all(&artifact.bytes)?;
        staged.flush()?;

        let target = folder.join(name);
        staged
            .persist(&target)
            .map_err(|e| StorageError::Io(e.error))?;

        let url = match &self.public_url_base {
            Some(base) => format!("{}/{}/{}", base, folder_id, name),
            None => {
                let absolute = target.canonicalize().unwrap_or(target);
                format!("file://{}", absolute.display())
            }
        };

        tracing::info!(
            "Stored '{}' for {} ({} bytes): {}",
            name,
            self.credentials.principal,
            artifact.bytes.len(),
            url
        );
        Ok(url)
    }
}

/// Reject empty names and anything that could leave the storage root
fn validate_component(component: &str) -> Result<(), StorageError> {
    let invalid = component.is_empty()
        || component == "."
        || component == ".."
        || component.contains(['/', '\\'])
        || component.contains('\0');
    if invalid {
        return Err(StorageError::InvalidId(component.to_string()));
    }
    Ok(())
}

fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::test_support::png_bytes;
    use image::{DynamicImage, RgbImage};
    use std::time::Duration;

    fn storage(root: &Path) -> LocalStorage {
        LocalStorage::new(
            root,
            Credentials::anonymous(),
            RetryPolicy {
                attempts: 2,
                delay: Duration::from_millis(1),
            },
        )
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        let img = DynamicImage::ImageRgb8(RgbImage::new(w, h));
        std::fs::write(path, png_bytes(&img)).unwrap();
    }

    #[test]
    fn test_list_filters_and_sorts_images() {
        let root = tempfile::tempdir().unwrap();
        let folder = root.path().join("F1");
        std::fs::create_dir(&folder).unwrap();
        write_png(&folder.join("scan.2.png"), 4, 4);
        write_png(&folder.join("scan.1.JPG"), 4, 4);
        std::fs::write(folder.join("notes.txt"), "x").unwrap();
        std::fs::create_dir(folder.join("nested.png")).unwrap();

        let entries = storage(root.path()).list_images("F1").unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["scan.1.JPG", "scan.2.png"]);
        assert_eq!(entries[1].id, "F1/scan.2.png");
    }

    #[test]
    fn test_unknown_or_escaping_folder_rejected() {
        let root = tempfile::tempdir().unwrap();
        let store = storage(root.path());
        assert!(matches!(store.list_images("missing"), Err(StorageError::NotFound(_))));
        assert!(matches!(store.list_images(".."), Err(StorageError::InvalidId(_))));
        assert!(matches!(
            store.download_image("../etc/passwd"),
            Err(StorageError::InvalidId(_))
        ));
    }

    #[test]
    fn test_download_decodes_image() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("F1")).unwrap();
        write_png(&root.path().join("F1/page.png"), 12, 7);

        let image = storage(root.path()).download_image("F1/page.png").unwrap();
        assert_eq!((image.width(), image.height()), (12, 7));
    }

    #[test]
    fn test_corrupt_download_exhausts_retries() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("F1")).unwrap();
        std::fs::write(root.path().join("F1/bad.jpg"), b"garbage").unwrap();

        let err = storage(root.path()).download_image("F1/bad.jpg").unwrap_err();
        assert!(matches!(err, StorageError::Exhausted { attempts: 2, .. }));
    }

    #[test]
    fn test_upload_writes_document_and_reports_url() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("F2")).unwrap();
        let artifact = Artifact {
            bytes: b"%PDF-1.5 test".to_vec(),
            page_count: 1,
        };

        let url = storage(root.path())
            .upload_document(&artifact, "out.pdf", "F2")
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("F2/out.pdf"));
        assert_eq!(
            std::fs::read(root.path().join("F2/out.pdf")).unwrap(),
            artifact.bytes
        );

        let public = storage(root.path())
            .with_public_url_base(Some("https://files.example.org/".into()))
            .upload_document(&artifact, "again.pdf", "F2")
            .unwrap();
        assert_eq!(public, "https://files.example.org/F2/again.pdf");
    }

    #[test]
    fn test_upload_to_missing_folder_fails() {
        let root = tempfile::tempdir().unwrap();
        let artifact = Artifact {
            bytes: vec![1, 2, 3],
            page_count: 1,
        };
        assert!(storage(root.path())
            .upload_document(&artifact, "out.pdf", "nowhere")
            .is_err());
    }
}
