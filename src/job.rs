//! One conversion job: resolve, fetch, correct, assemble, store

use crate::assembly::{Artifact, DocumentAssembler};
use crate::correction::{CorrectionOptions, Pipeline};
use crate::error::{ConvertError, PageWarning};
use crate::ordering::{self, ResolvedPage};
use crate::raster::RasterImage;
use crate::storage::RemoteStorage;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Conversion request as posted by clients
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub key: Option<String>,
    pub file_order: Option<Vec<u32>>,
    #[serde(default)]
    pub apply_perspective_correction: bool,
    #[serde(default)]
    pub apply_contrast_improvement: bool,
    pub name: Option<String>,
    pub source_folder_id: Option<String>,
    #[serde(alias = "folderId")]
    pub destination_folder_id: Option<String>,
}

/// A request with every required parameter present
#[derive(Debug, Clone)]
pub struct ConvertJob {
    pub key: String,
    pub file_order: Vec<u32>,
    pub options: CorrectionOptions,
    pub name: String,
    pub source_folder_id: String,
    pub destination_folder_id: String,
}

impl ConvertRequest {
    /// Check required parameters, naming every one that is missing or empty
    pub fn validate(self) -> Result<ConvertJob, ConvertError> {
        let present =
            |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        if !present(&self.key) {
            missing.push("key");
        }
        if self.file_order.as_ref().map_or(true, |o| o.is_empty()) {
            missing.push("fileOrder");
        }
        if !present(&self.name) {
            missing.push("name");
        }
        if !present(&self.source_folder_id) {
            missing.push("sourceFolderId");
        }
        if !present(&self.destination_folder_id) {
            missing.push("destinationFolderId");
        }

        if !missing.is_empty() {
            return Err(ConvertError::MissingParameters(
                missing.into_iter().map(String::from).collect(),
            ));
        }

        Ok(ConvertJob {
            key: self.key.unwrap_or_default(),
            file_order: self.file_order.unwrap_or_default(),
            options: CorrectionOptions {
                apply_perspective_correction: self.apply_perspective_correction,
                apply_contrast_improvement: self.apply_contrast_improvement,
            },
            name: self.name.unwrap_or_default(),
            source_folder_id: self.source_folder_id.unwrap_or_default(),
            destination_folder_id: self.destination_folder_id.unwrap_or_default(),
        })
    }
}

/// Successful conversion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub message: String,
    pub artifact_url: String,
    pub page_count: usize,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
}

/// Job tuning shared by every request
#[derive(Debug, Clone, Copy)]
pub struct JobSettings {
    pub page_concurrency: usize,
    pub jpeg_quality: u8,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            page_concurrency: 4,
            jpeg_quality: 90,
        }
    }
}

struct PageOutcome {
    image: Option<RasterImage>,
    warnings: Vec<PageWarning>,
}

/// Runs conversion jobs against one storage backend
#[derive(Clone)]
pub struct Converter {
    storage: Arc<dyn RemoteStorage>,
    settings: JobSettings,
}

impl Converter {
    pub fn new(storage: Arc<dyn RemoteStorage>, settings: JobSettings) -> Self {
        Self { storage, settings }
    }

    pub fn storage(&self) -> &Arc<dyn RemoteStorage> {
        &self.storage
    }

    pub fn settings(&self) -> JobSettings {
        self.settings
    }

    pub async fn convert(&self, request: ConvertRequest) -> Result<ConvertResponse, ConvertError> {
        let start = Instant::now();
        let job = request.validate()?;

        tracing::info!(
            "Converting '{}' pages {:?} from folder '{}' (perspective: {}, contrast: {})",
            job.key,
            job.file_order,
            job.source_folder_id,
            job.options.apply_perspective_correction,
            job.options.apply_contrast_improvement
        );

        let candidates = {
            let storage = self.storage.clone();
            let folder = job.source_folder_id.clone();
            tokio::task::spawn_blocking(move || storage.list_images(&folder))
                .await
                .map_err(|e| ConvertError::Internal(format!("Listing task failed: {}", e)))?
                .map_err(|e| ConvertError::Listing {
                    folder_id: job.source_folder_id.clone(),
                    message: e.to_string(),
                })?
        };

        let resolved = ordering::resolve(&job.key, &candidates, &job.file_order);
        let mut warnings: Vec<PageWarning> = resolved
            .unresolved
            .iter()
            .map(|request| PageWarning::Unresolved {
                ordinal: request.ordinal,
                prefix: request.expected_prefix(),
            })
            .collect();

        tracing::info!(
            "Resolved {} of {} requested pages",
            resolved.len(),
            job.file_order.len()
        );

        if resolved.is_empty() {
            tracing::warn!(
                "No source image in '{}' matches key '{}'",
                job.source_folder_id,
                job.key
            );
        }

        let pipeline = Arc::new(Pipeline::from_options(job.options));
        tracing::debug!("Correction stages: {:?}", pipeline.stage_names());
        let outcomes: Vec<PageOutcome> = stream::iter(resolved.pages)
            .map(|page| self.process_page(page, pipeline.clone()))
            .buffered(self.settings.page_concurrency.max(1))
            .collect()
            .await;

        let mut pages = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            warnings.extend(outcome.warnings);
            pages.extend(outcome.image);
        }

        if pages.is_empty() {
            tracing::error!("No pages survived for '{}'", job.key);
            return Err(ConvertError::EmptyResult);
        }

        let artifact = self.assemble(pages).await?;
        let page_count = artifact.page_count;

        let artifact_url = {
            let storage = self.storage.clone();
            let name = job.name.clone();
            let folder = job.destination_folder_id.clone();
            tokio::task::spawn_blocking(move || storage.upload_document(&artifact, &name, &folder))
                .await
                .map_err(|e| ConvertError::Internal(format!("Upload task failed: {}", e)))?
                .map_err(|e| ConvertError::Upload {
                    name: job.name.clone(),
                    message: e.to_string(),
                })?
        };

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "PDF conversion completed in {}ms: {} pages, {} warnings, {}",
            processing_time_ms,
            page_count,
            warnings.len(),
            artifact_url
        );

        Ok(ConvertResponse {
            message: "PDF conversion completed successfully".to_string(),
            artifact_url,
            page_count,
            warnings: warnings.iter().map(|w| w.to_string()).collect(),
            processing_time_ms,
        })
    }

    /// Fetch and correct one page on the blocking pool
    async fn process_page(&self, page: ResolvedPage, pipeline: Arc<Pipeline>) -> PageOutcome {
        let storage = self.storage.clone();
        let ordinal = page.ordinal;
        let id = page.source.id.clone();

        let task = tokio::task::spawn_blocking(move || {
            let raw = storage.download_image(&id).map_err(|e| ConvertError::Fetch {
                id: id.clone(),
                message: e.to_string(),
            })?;
            Ok::<_, ConvertError>(pipeline.process(raw))
        });

        match task.await {
            Ok(Ok(corrected)) => {
                tracing::debug!(
                    "Page {} corrected in {}ms ({:?})",
                    ordinal,
                    corrected.total_time_ms,
                    corrected.steps
                );
                PageOutcome {
                    image: Some(corrected.image),
                    warnings: corrected
                        .warnings
                        .into_iter()
                        .map(|w| PageWarning::Correction {
                            ordinal,
                            stage: w.stage,
                            message: w.message,
                        })
                        .collect(),
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Page {} dropped: {}", ordinal, e);
                PageOutcome {
                    image: None,
                    warnings: vec![PageWarning::Fetch {
                        ordinal,
                        message: e.to_string(),
                    }],
                }
            }
            Err(e) => {
                tracing::error!("Page {} task failed: {}", ordinal, e);
                PageOutcome {
                    image: None,
                    warnings: vec![PageWarning::Fetch {
                        ordinal,
                        message: format!("processing task failed: {}", e),
                    }],
                }
            }
        }
    }

    async fn assemble(&self, pages: Vec<RasterImage>) -> Result<Artifact, ConvertError> {
        let assembler = DocumentAssembler::new(self.settings.jpeg_quality);
        tokio::task::spawn_blocking(move || assembler.assemble(&pages))
            .await
            .map_err(|e| ConvertError::Internal(format!("Assembly task failed: {}", e)))?
    }
}
