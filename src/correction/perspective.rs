use super::{boundary, CorrectionStage, CorrectionWarning};
use crate::geometry::Quadrilateral;
use crate::raster::RasterImage;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

const STAGE: &str = "perspective";

/// Boundary detection followed by rectification of the detected page
pub struct PerspectiveCorrection;

impl CorrectionStage for PerspectiveCorrection {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn apply(&self, image: &RasterImage) -> Result<RasterImage, CorrectionWarning> {
        let quad = boundary::detect(image).ok_or_else(|| {
            CorrectionWarning::new(STAGE, "no document boundary found")
        })?;
        rectify(image, &quad)
    }
}

/// Warp the interior of `quad` onto an upright rectangle.
///
/// Output size follows [`Quadrilateral::rectified_size`]. Grayscale input stays
/// grayscale; anything else is resampled as RGB.
pub fn rectify(image: &RasterImage, quad: &Quadrilateral) -> Result<RasterImage, CorrectionWarning> {
    let (width, height) = quad.rectified_size();
    if width < 2 || height < 2 {
        return Err(CorrectionWarning::new(
            STAGE,
            format!("degenerate boundary yields a {}x{} page", width, height),
        ));
    }

    let right = (width - 1) as f32;
    let bottom = (height - 1) as f32;
    let src = quad.corners().map(|p| (p.x, p.y));
    let dst = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];

    let projection = Projection::from_control_points(src, dst).ok_or_else(|| {
        CorrectionWarning::new(STAGE, "boundary corners do not define a projective transform")
    })?;

    let warped = match image.image() {
        DynamicImage::ImageLuma8(gray) => {
            let mut out = GrayImage::new(width, height);
            warp_into(gray, &projection, Interpolation::Bilinear, Luma([0]), &mut out);
            DynamicImage::ImageLuma8(out)
        }
        other => {
            let rgb = other.to_rgb8();
            let mut out = RgbImage::new(width, height);
            warp_into(&rgb, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
            DynamicImage::ImageRgb8(out)
        }
    };

    tracing::debug!(
        "Rectified {}x{} page to {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );

    Ok(RasterImage::new(warped))
}
