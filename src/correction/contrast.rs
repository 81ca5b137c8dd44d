use super::{CorrectionStage, CorrectionWarning};
use crate::raster::RasterImage;
use image::DynamicImage;
use imageproc::contrast::equalize_histogram;

/// Global histogram equalization of the luminance channel.
/// The output is always single-channel.
pub struct ContrastEnhancer;

impl CorrectionStage for ContrastEnhancer {
    fn name(&self) -> &'static str {
        "contrast"
    }

    fn apply(&self, image: &RasterImage) -> Result<RasterImage, CorrectionWarning> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CorrectionWarning::new(self.name(), "image has no pixels"));
        }

        let gray = image.image().to_luma8();
        let equalized = equalize_histogram(&gray);
        Ok(RasterImage::new(DynamicImage::ImageLuma8(equalized)))
    }
}
