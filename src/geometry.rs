//! Planar geometry shared by boundary detection and rectification

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<imageproc::point::Point<i32>> for Point {
    fn from(p: imageproc::point::Point<i32>) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

/// Document corners in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quadrilateral {
    /// Label four points regardless of the order they arrive in.
    ///
    /// Smallest `x + y` is top-left and largest is bottom-right; smallest
    /// `y - x` is top-right and largest is bottom-left.
    pub fn from_unordered(points: [Point; 4]) -> Self {
        let by = |key: fn(&Point) -> f32, pick_max: bool| -> Point {
            let mut best = points[0];
            for p in &points[1..] {
                let better = if pick_max {
                    key(p) > key(&best)
                } else {
                    key(p) < key(&best)
                };
                if better {
                    best = *p;
                }
            }
            best
        };

        let sum = |p: &Point| p.x + p.y;
        let diff = |p: &Point| p.y - p.x;

        Self {
            top_left: by(sum, false),
            top_right: by(diff, false),
            bottom_right: by(sum, true),
            bottom_left: by(diff, true),
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Output size of the rectified page: the longer of each pair of
    /// opposite edges, truncated to whole pixels
    pub fn rectified_size(&self) -> (u32, u32) {
        let width = self
            .bottom_right
            .distance(&self.bottom_left)
            .max(self.top_right.distance(&self.top_left));
        let height = self
            .top_right
            .distance(&self.bottom_right)
            .max(self.top_left.distance(&self.bottom_left));

        (width as u32, height as u32)
    }
}

/// Enclosed area of a closed polygon (shoelace formula)
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut twice_area = 0.0f64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }

    (twice_area / 2.0).abs()
}

/// Perimeter of a closed polygon
pub fn perimeter(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .iter()
        .enumerate()
        .map(|(i, p)| p.distance(&points[(i + 1) % points.len()]) as f64)
        .sum()
}

/// Douglas-Peucker simplification of a closed curve.
///
/// The curve is split at two mutually distant points, which are always kept,
/// and each half is simplified as an open chain.
pub fn approximate_closed_polygon(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let farthest_from = |origin: usize| -> usize {
        let mut best = origin;
        let mut best_dist = 0.0f32;
        for (i, p) in points.iter().enumerate() {
            let d = p.distance(&points[origin]);
            if d > best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    };

    let a = farthest_from(0);
    let b = farthest_from(a);
    if a == b {
        return vec![points[a]];
    }
    let (start, end) = (a.min(b), a.max(b));

    let first_half = &points[start..=end];
    let mut second_half: Vec<Point> = points[end..].to_vec();
    second_half.extend_from_slice(&points[..=start]);

    let mut out = Vec::new();
    simplify_chain(first_half, epsilon, &mut out);
    simplify_chain(&second_half, epsilon, &mut out);
    out
}

/// Push the kept vertices of an open chain, excluding its last point
fn simplify_chain(chain: &[Point], epsilon: f64, out: &mut Vec<Point>) {
    if chain.len() < 3 {
        if let Some(first) = chain.first() {
            out.push(*first);
        }
        return;
    }

    let first = chain[0];
    let last = chain[chain.len() - 1];
    let mut max_dist = 0.0f64;
    let mut index = 0;
    for (i, p) in chain.iter().enumerate().take(chain.len() - 1).skip(1) {
        let d = segment_distance(p, &first, &last);
        if d > max_dist {
            max_dist = d;
            index = i;
        }
    }

    if max_dist > epsilon {
        simplify_chain(&chain[..=index], epsilon, out);
        simplify_chain(&chain[index..], epsilon, out);
    } else {
        out.push(first);
    }
}

/// Distance from `p` to the line through `a` and `b`
fn segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return p.distance(a) as f64;
    }
    ((p.x - a.x) as f64 * dy - (p.y - a.y) as f64 * dx).abs() / len
}
