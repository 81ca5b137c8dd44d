//! Per-page image correction
//!
//! Each correction is a [`CorrectionStage`]; a [`Pipeline`] holds the active
//! stages for a job, built once from [`CorrectionOptions`].

pub mod boundary;
pub mod contrast;
pub mod orientation;
pub mod perspective;
pub mod pipeline;

pub use pipeline::{CorrectionOptions, Pipeline};

use crate::raster::RasterImage;
use thiserror::Error;

/// A stage could not improve the image; the caller keeps its input
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage}: {message}")]
pub struct CorrectionWarning {
    pub stage: &'static str,
    pub message: String,
}

impl CorrectionWarning {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// One correction applied to every page of a job
pub trait CorrectionStage: Send + Sync {
    /// Stage identifier used in logs and timings
    fn name(&self) -> &'static str;

    /// Produce a corrected copy of `image`
    fn apply(&self, image: &RasterImage) -> Result<RasterImage, CorrectionWarning>;
}
