use super::StorageError;
use serde::Deserialize;
use std::path::PathBuf;

/// Identity the service acts as against its storage backend
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub principal: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self {
            principal: "anonymous".to_string(),
            scopes: Vec::new(),
        }
    }
}

/// Source of storage credentials, consulted once at startup
pub trait SecretProvider {
    fn credentials(&self) -> Result<Credentials, StorageError>;
}

/// Reads credentials from a JSON file
pub struct FileSecretProvider {
    path: PathBuf,
}

impl FileSecretProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SecretProvider for FileSecretProvider {
    fn credentials(&self) -> Result<Credentials, StorageError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            StorageError::Credentials(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let credentials: Credentials = serde_json::from_str(&raw).map_err(|e| {
            StorageError::Credentials(format!("malformed {}: {}", self.path.display(), e))
        })?;

        if credentials.principal.trim().is_empty() {
            return Err(StorageError::Credentials(format!(
                "{} has an empty principal",
                self.path.display()
            )));
        }

        tracing::info!("Loaded credentials for '{}'", credentials.principal);
        Ok(credentials)
    }
}
