// src/detection/line_fitter.rs

use crate::types::{FittedLine, LineSegment};
use tracing::debug;

/// Collapse one side's segments into a single line: the length-weighted
/// mean of every non-vertical segment's (slope, intercept).
///
/// This is a centroid, not a regression. A single long outlier segment
/// drags the result. Returns `None` when nothing usable remains.
pub fn fit_line(segments: &[LineSegment]) -> Option<FittedLine> {
    let lines: Vec<(f64, f64, f64)> = segments
        .iter()
        .filter_map(|segment| {
            let (slope, intercept) = segment.slope_intercept()?;
            Some((segment.length(), slope, intercept))
        })
        .collect();

    let discarded = segments.len() - lines.len();
    if discarded > 0 {
        debug!("Line fit: dropped {} vertical segments", discarded);
    }

    let total_length: f64 = lines.iter().map(|(length, _, _)| length).sum();
    if lines.is_empty() || total_length <= 0.0 {
        return None;
    }

    // Normalize weights first so a lone segment keeps its exact line.
    let mut slope = 0.0;
    let mut intercept = 0.0;
    for (length, s, b) in &lines {
        let weight = length / total_length;
        slope += weight * s;
        intercept += weight * b;
    }

    Some(FittedLine { slope, intercept })
}
