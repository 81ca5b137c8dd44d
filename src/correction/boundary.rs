use crate::geometry::{approximate_closed_polygon, perimeter, polygon_area, Point, Quadrilateral};
use crate::raster::RasterImage;
use imageproc::contours::find_contours;
use imageproc::edges::canny;

/// Canny hysteresis thresholds
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 200.0;
/// Polygon approximation tolerance as a fraction of the contour perimeter
const APPROX_EPSILON_RATIO: f64 = 0.02;

/// Find the largest four-sided contour, the most likely document edge
pub fn detect(image: &RasterImage) -> Option<Quadrilateral> {
    let gray = image.image().to_luma8();
    let edges = canny(&gray, CANNY_LOW, CANNY_HIGH);

    let mut contours: Vec<(f64, Vec<Point>)> = find_contours::<i32>(&edges)
        .into_iter()
        .map(|contour| {
            let points: Vec<Point> = contour.points.into_iter().map(Point::from).collect();
            (polygon_area(&points), points)
        })
        .collect();

    tracing::debug!("Found {} contours", contours.len());

    contours.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (area, points) in &contours {
        let epsilon = APPROX_EPSILON_RATIO * perimeter(points);
        let approx = approximate_closed_polygon(points, epsilon);
        if let &[a, b, c, d] = approx.as_slice() {
            let quad = Quadrilateral::from_unordered([a, b, c, d]);
            tracing::debug!("Document boundary found (area {:.0}): {:?}", area, quad);
            return Some(quad);
        }
    }

    None
}
