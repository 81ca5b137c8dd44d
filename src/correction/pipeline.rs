use super::contrast::ContrastEnhancer;
use super::orientation::OrientationNormalizer;
use super::perspective::PerspectiveCorrection;
use super::{CorrectionStage, CorrectionWarning};
use crate::raster::RasterImage;
use serde::Serialize;
use std::time::Instant;

/// Which optional stages run. Orientation is always fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorrectionOptions {
    pub apply_perspective_correction: bool,
    pub apply_contrast_improvement: bool,
}

/// Timing information for a single correction stage
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of correcting one page
#[derive(Debug, Clone)]
pub struct CorrectionResult {
    pub image: RasterImage,
    /// Stages that fell back to their input
    pub warnings: Vec<CorrectionWarning>,
    pub steps: Vec<StepTiming>,
    pub total_time_ms: u64,
}

/// Ordered correction stages shared by every page of a job
pub struct Pipeline {
    stages: Vec<Box<dyn CorrectionStage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn CorrectionStage>>) -> Self {
        Self { stages }
    }

    pub fn from_options(options: CorrectionOptions) -> Self {
        let mut stages: Vec<Box<dyn CorrectionStage>> = vec![Box::new(OrientationNormalizer)];

        if options.apply_perspective_correction {
            stages.push(Box::new(PerspectiveCorrection));
        }
        if options.apply_contrast_improvement {
            stages.push(Box::new(ContrastEnhancer));
        }

        Self::new(stages)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order. A failing stage never aborts the page.
    pub fn process(&self, image: RasterImage) -> CorrectionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();
        let mut steps = Vec::with_capacity(self.stages.len());

        let mut img = image;
        for stage in &self.stages {
            img = self.run_step(stage.as_ref(), img, &mut steps, &mut warnings);
        }

        CorrectionResult {
            image: img,
            warnings,
            steps,
            total_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn run_step(
        &self,
        stage: &dyn CorrectionStage,
        img: RasterImage,
        timings: &mut Vec<StepTiming>,
        warnings: &mut Vec<CorrectionWarning>,
    ) -> RasterImage {
        let step_start = Instant::now();
        let result = keep_on_warning(stage.apply(&img), img, warnings);
        timings.push(StepTiming {
            name: stage.name().to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        result
    }
}

/// Take the corrected image, or fall back to `original` and log the warning
pub fn keep_on_warning(
    outcome: Result<RasterImage, CorrectionWarning>,
    original: RasterImage,
    warnings: &mut Vec<CorrectionWarning>,
) -> RasterImage {
    match outcome {
        Ok(corrected) => corrected,
        Err(warning) => {
            tracing::warn!("{} correction skipped: {}", warning.stage, warning.message);
            warnings.push(warning);
            original
        }
    }
}
