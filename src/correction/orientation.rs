use super::{CorrectionStage, CorrectionWarning};
use crate::raster::{Orientation, RasterImage};

/// Rotate pixels upright according to the orientation metadata and clear it
pub struct OrientationNormalizer;

impl CorrectionStage for OrientationNormalizer {
    fn name(&self) -> &'static str {
        "orientation"
    }

    fn apply(&self, image: &RasterImage) -> Result<RasterImage, CorrectionWarning> {
        Ok(normalize(image))
    }
}

/// Never fails: absent metadata means the image is already upright
pub fn normalize(image: &RasterImage) -> RasterImage {
    let pixels = image.image();
    let rotated = match image.orientation() {
        Some(Orientation::Rotate180) => pixels.rotate180(),
        Some(Orientation::Rotate90Cw) => pixels.rotate90(),
        Some(Orientation::Rotate90Ccw) => pixels.rotate270(),
        Some(Orientation::Normal) => pixels.clone(),
        None => {
            tracing::debug!("No orientation metadata, leaving image as is");
            pixels.clone()
        }
    };

    if let Some(orientation) = image.orientation() {
        tracing::debug!(
            "Applied {} orientation: {}x{} -> {}x{}",
            orientation.as_str(),
            image.width(),
            image.height(),
            rotated.width(),
            rotated.height()
        );
    }

    RasterImage::new(rotated)
}
