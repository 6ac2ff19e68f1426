// src/detection/extrapolator.rs
//
// Fitted line -> two image-space endpoints on fixed rows.
//
// Near row is the bottom of the image, far row is the top of the search
// regions. When the line leaves the image horizontally before reaching a
// row, the endpoint is pinned to the image border and its row is pulled
// toward where the line actually meets that border.

use super::region::REGION_TOP_RATIO;
use crate::types::{FittedLine, ImageLane, ImagePoint};

#[derive(Debug, Clone, Copy)]
pub struct Extrapolator {
    y_near: f64,
    y_far: f64,
    x_max: i32,
}

impl Extrapolator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            y_near: f64::from(height) - 1.0,
            y_far: f64::from(height) * REGION_TOP_RATIO,
            x_max: width as i32 - 1,
        }
    }

    pub fn y_near(&self) -> f64 {
        self.y_near
    }

    pub fn y_far(&self) -> f64 {
        self.y_far
    }

    /// `None` for flat or non-finite slopes; those cannot be solved for x.
    pub fn extrapolate(&self, line: &FittedLine) -> Option<ImageLane> {
        let FittedLine { slope, intercept } = *line;
        if slope == 0.0 || !slope.is_finite() || !intercept.is_finite() {
            return None;
        }
        let x_max = f64::from(self.x_max);
        let y_at_xmax = x_max * slope + intercept;

        let x1 = ((self.y_near - intercept) / slope) as i32;
        let near = if x1 < 0 {
            ImagePoint::new(0, self.y_near.min(intercept) as i32)
        } else if x1 > self.x_max {
            ImagePoint::new(self.x_max, self.y_near.min(y_at_xmax) as i32)
        } else {
            ImagePoint::new(x1, self.y_near as i32)
        };

        // The far clamp is bounded by the near endpoint's final row.
        let near_row = f64::from(near.y);
        let x2 = ((self.y_far - intercept) / slope) as i32;
        let far = if x2 < 0 {
            ImagePoint::new(0, near_row.min(self.y_far.max(intercept)) as i32)
        } else if x2 > self.x_max {
            ImagePoint::new(self.x_max, near_row.min(self.y_far.max(y_at_xmax)) as i32)
        } else {
            ImagePoint::new(x2, self.y_far as i32)
        };

        Some(ImageLane::new(near, far))
    }
}
