// src/detection/region.rs
//
// Left/right search regions. Both trapezoids share the vertical midline and
// start at 60% of the image height, so the sky and the opposite half never
// contribute segments to a side.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

/// Top edge of both regions as a fraction of image height.
pub const REGION_TOP_RATIO: f64 = 0.6;

#[derive(Debug, Clone, Copy, Default)]
pub struct RegionSplitter;

impl RegionSplitter {
    pub fn new() -> Self {
        Self
    }

    /// Polygon vertices of the left region, in pixels.
    pub fn left_vertices(width: u32, height: u32) -> [Point<i32>; 4] {
        let (w, h) = (f64::from(width), f64::from(height));
        [
            vertex(-0.1 * w, h),
            vertex(0.4 * w, REGION_TOP_RATIO * h),
            vertex(0.5 * w, REGION_TOP_RATIO * h),
            vertex(0.5 * w, h),
        ]
    }

    /// Mirror of the left region about `x = 0.5 * width`.
    pub fn right_vertices(width: u32, height: u32) -> [Point<i32>; 4] {
        let (w, h) = (f64::from(width), f64::from(height));
        [
            vertex(1.1 * w, h),
            vertex(0.6 * w, REGION_TOP_RATIO * h),
            vertex(0.5 * w, REGION_TOP_RATIO * h),
            vertex(0.5 * w, h),
        ]
    }

    /// Split a binary edge map into (left, right) masked copies.
    pub fn split(&self, edges: &GrayImage) -> (GrayImage, GrayImage) {
        let (width, height) = edges.dimensions();
        let left = apply_mask(edges, &Self::left_vertices(width, height));
        let right = apply_mask(edges, &Self::right_vertices(width, height));
        (left, right)
    }
}

fn vertex(x: f64, y: f64) -> Point<i32> {
    // Truncation toward zero, matching an int32 cast of the float vertices.
    Point::new(x as i32, y as i32)
}

/// Polygon without repeated neighbours or a closing duplicate. Narrow frames
/// truncate several vertices onto the same pixel.
fn distinct_vertices(polygon: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut out: Vec<Point<i32>> = Vec::with_capacity(polygon.len());
    for &p in polygon {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

fn apply_mask(edges: &GrayImage, polygon: &[Point<i32>]) -> GrayImage {
    let (width, height) = edges.dimensions();
    let vertices = distinct_vertices(polygon);
    if vertices.len() < 3 {
        // Region collapsed to a point or a line: nothing inside it
        return GrayImage::new(width, height);
    }
    let mut mask = GrayImage::new(width, height);
    draw_polygon_mut(&mut mask, &vertices, Luma([255u8]));

    let mut masked = GrayImage::new(width, height);
    for (x, y, pixel) in masked.enumerate_pixels_mut() {
        let edge = edges.get_pixel(x, y).0[0];
        let keep = mask.get_pixel(x, y).0[0];
        *pixel = Luma([edge & keep]);
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(points: &[(u32, u32)], width: u32, height: u32) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for &(x, y) in points {
            img.put_pixel(x, y, Luma([255]));
        }
        img
    }

    #[test]
    fn test_vertices_for_600x400() {
        let left = RegionSplitter::left_vertices(600, 400);
        assert_eq!(left[0], Point::new(-60, 400));
        assert_eq!(left[1], Point::new(240, 240));
        assert_eq!(left[2], Point::new(300, 240));
        assert_eq!(left[3], Point::new(300, 400));

        let right = RegionSplitter::right_vertices(600, 400);
        assert_eq!(right[0], Point::new(660, 400));
        assert_eq!(right[1], Point::new(360, 240));
    }

    #[test]
    fn test_split_routes_pixels_to_their_side() {
        let edges = lit(&[(100, 399), (500, 399), (300, 100)], 600, 400);
        let (left, right) = RegionSplitter::new().split(&edges);

        assert_eq!(left.get_pixel(100, 399).0[0], 255);
        assert_eq!(left.get_pixel(500, 399).0[0], 0);
        assert_eq!(right.get_pixel(500, 399).0[0], 255);
        assert_eq!(right.get_pixel(100, 399).0[0], 0);

        // Above the region top: discarded on both sides
        assert_eq!(left.get_pixel(300, 100).0[0], 0);
        assert_eq!(right.get_pixel(300, 100).0[0], 0);
    }

    #[test]
    fn test_one_pixel_wide_frame() {
        // Left trapezoid truncates to a vertical line at x = 0
        assert_eq!(
            distinct_vertices(&RegionSplitter::left_vertices(1, 10)),
            vec![Point::new(0, 10), Point::new(0, 6)]
        );

        let edges = GrayImage::from_pixel(1, 10, Luma([255]));
        let (left, right) = RegionSplitter::new().split(&edges);
        assert_eq!(left.dimensions(), (1, 10));
        assert_eq!(right.dimensions(), (1, 10));
        assert!(left.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_distinct_vertices_drops_repeats() {
        let square = [
            Point::new(0, 0),
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 0),
        ];
        assert_eq!(
            distinct_vertices(&square),
            vec![Point::new(0, 0), Point::new(4, 0), Point::new(4, 4)]
        );
    }

    #[test]
    fn test_split_is_an_and_not_a_fill() {
        let edges = GrayImage::new(600, 400);
        let (left, right) = RegionSplitter::new().split(&edges);
        assert!(left.pixels().all(|p| p.0[0] == 0));
        assert!(right.pixels().all(|p| p.0[0] == 0));
    }
}
