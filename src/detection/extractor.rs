// src/detection/extractor.rs
//
// Line-segment extraction contract plus a pure-Rust backend.
//
// The tracker only ever sees `LineSegment`s, so any detector (OpenCV's
// probabilistic Hough, a learned model, a test stub) can sit behind
// `LineExtractor` without touching fitting or fusion.

use crate::types::{HoughConfig, LineSegment};
use anyhow::Result;
use image::GrayImage;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use tracing::debug;

/// Turns a masked binary edge image into raw line segments.
///
/// An empty vector means "nothing found"; `Err` is reserved for backend
/// failures.
pub trait LineExtractor {
    fn extract(&self, region: &GrayImage) -> Result<Vec<LineSegment>>;
}

impl<F> LineExtractor for F
where
    F: Fn(&GrayImage) -> Result<Vec<LineSegment>>,
{
    fn extract(&self, region: &GrayImage) -> Result<Vec<LineSegment>> {
        self(region)
    }
}

/// Accumulator peaks closer than this (in r pixels / degrees) are merged.
const SUPPRESSION_RADIUS: u32 = 8;

/// Hough voting via `imageproc`, followed by a walk along every voted line
/// that cuts it into segments at gaps wider than `max_line_gap`.
///
/// imageproc votes on a fixed 1 px / 1 degree grid, so
/// `distance_resolution` and `angle_resolution` are not used here.
#[derive(Debug, Clone)]
pub struct HoughSegmentExtractor {
    params: HoughConfig,
}

impl HoughSegmentExtractor {
    pub fn new(params: HoughConfig) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HoughConfig {
        &self.params
    }

    fn segments_along(&self, region: &GrayImage, line: &PolarLine) -> Vec<LineSegment> {
        let (width, height) = region.dimensions();
        let theta = f64::from(line.angle_in_degrees).to_radians();
        let (sin, cos) = theta.sin_cos();
        let r = f64::from(line.r);

        // Step along whichever axis the line advances fastest in.
        let steep = cos.abs() > sin.abs();
        let samples: Vec<(i64, i64)> = if steep {
            (0..i64::from(height))
                .map(|y| (((r - y as f64 * sin) / cos).round() as i64, y))
                .collect()
        } else {
            (0..i64::from(width))
                .map(|x| (x, ((r - x as f64 * cos) / sin).round() as i64))
                .collect()
        };

        let is_hit = |x: i64, y: i64| -> bool {
            let offsets: [(i64, i64); 3] = if steep {
                [(0, 0), (-1, 0), (1, 0)]
            } else {
                [(0, 0), (0, -1), (0, 1)]
            };
            offsets.iter().any(|(dx, dy)| lit(region, x + dx, y + dy))
        };

        let mut segments = Vec::new();
        let mut run: Option<((i64, i64), (i64, i64))> = None;
        let mut gap = 0.0f64;

        for &(x, y) in &samples {
            if is_hit(x, y) {
                run = match run {
                    Some((start, _)) => Some((start, (x, y))),
                    None => Some(((x, y), (x, y))),
                };
                gap = 0.0;
            } else if let Some((start, end)) = run {
                gap += 1.0;
                if gap > self.params.max_line_gap {
                    self.push_if_long(&mut segments, start, end);
                    run = None;
                }
            }
        }
        if let Some((start, end)) = run {
            self.push_if_long(&mut segments, start, end);
        }
        segments
    }

    fn push_if_long(&self, out: &mut Vec<LineSegment>, start: (i64, i64), end: (i64, i64)) {
        let segment = LineSegment::new(start.0 as i32, start.1 as i32, end.0 as i32, end.1 as i32);
        if segment.length() >= self.params.min_line_length {
            out.push(segment);
        }
    }
}

impl Default for HoughSegmentExtractor {
    fn default() -> Self {
        Self::new(HoughConfig::default())
    }
}

impl LineExtractor for HoughSegmentExtractor {
    fn extract(&self, region: &GrayImage) -> Result<Vec<LineSegment>> {
        let options = LineDetectionOptions {
            vote_threshold: self.params.vote_threshold,
            suppression_radius: SUPPRESSION_RADIUS,
        };
        let lines = detect_lines(region, options);

        let segments: Vec<LineSegment> = lines
            .iter()
            .flat_map(|line| self.segments_along(region, line))
            .collect();

        debug!(
            "Hough: {} voted lines -> {} segments",
            lines.len(),
            segments.len()
        );
        Ok(segments)
    }
}

fn lit(img: &GrayImage, x: i64, y: i64) -> bool {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return false;
    }
    img.get_pixel(x as u32, y as u32).0[0] > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_line_segment_mut;

    fn extractor(max_gap: f64) -> HoughSegmentExtractor {
        HoughSegmentExtractor::new(HoughConfig {
            max_line_gap: max_gap,
            ..HoughConfig::default()
        })
    }

    #[test]
    fn test_extracts_diagonal_segment() {
        let mut img = GrayImage::new(100, 100);
        draw_line_segment_mut(&mut img, (10.0, 90.0), (90.0, 10.0), Luma([255]));

        let segments = extractor(5.0).extract(&img).unwrap();
        assert!(!segments.is_empty());
        for seg in &segments {
            let (slope, _) = seg.slope_intercept().unwrap();
            assert!((slope + 1.0).abs() < 0.2, "slope={}", slope);
            assert!(seg.length() >= 20.0);
        }
    }

    #[test]
    fn test_empty_region_yields_nothing() {
        let img = GrayImage::new(100, 100);
        assert!(extractor(300.0).extract(&img).unwrap().is_empty());
    }

    #[test]
    fn test_gap_splits_segment() {
        let mut img = GrayImage::new(200, 50);
        draw_line_segment_mut(&mut img, (0.0, 25.0), (79.0, 25.0), Luma([255]));
        draw_line_segment_mut(&mut img, (120.0, 25.0), (199.0, 25.0), Luma([255]));

        let bridged = extractor(300.0).extract(&img).unwrap();
        assert!(bridged.iter().any(|s| s.length() > 150.0));

        let split = extractor(10.0).extract(&img).unwrap();
        assert!(!split.is_empty());
        assert!(split.iter().all(|s| s.length() < 100.0));
    }

    #[test]
    fn test_closure_extractor() {
        let stub = |_: &GrayImage| -> Result<Vec<LineSegment>> {
            Ok(vec![LineSegment::new(0, 10, 10, 0)])
        };
        let img = GrayImage::new(4, 4);
        assert_eq!(stub.extract(&img).unwrap().len(), 1);
    }
}
