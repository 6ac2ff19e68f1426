// src/detection/opencv_backend.rs
//
// OpenCV-backed collaborators, enabled with the `opencv` feature.
// Canny + probabilistic Hough with the full parameter set.

use super::edges::EdgeDetector;
use super::extractor::LineExtractor;
use crate::types::{EdgeConfig, HoughConfig, LineSegment};
use anyhow::{Context, Result};
use image::GrayImage;
use opencv::{
    core::{Mat, Vec4i, Vector},
    imgproc,
    prelude::*,
};
use tracing::debug;

fn to_mat(img: &GrayImage) -> Result<Mat> {
    let (width, height) = img.dimensions();
    let view = Mat::new_rows_cols_with_data(height as i32, width as i32, img.as_raw())
        .context("Failed to wrap image buffer")?;
    view.try_clone().context("Failed to copy image into Mat")
}

#[derive(Debug, Clone)]
pub struct OpenCvCannyEdgeDetector {
    pub low_threshold: f64,
    pub high_threshold: f64,
}

impl OpenCvCannyEdgeDetector {
    pub fn from_config(config: &EdgeConfig) -> Self {
        Self {
            low_threshold: f64::from(config.low_threshold),
            high_threshold: f64::from(config.high_threshold),
        }
    }
}

impl EdgeDetector for OpenCvCannyEdgeDetector {
    fn detect(&self, gray: &GrayImage) -> Result<GrayImage> {
        let src = to_mat(gray)?;
        let mut edges = Mat::default();
        imgproc::canny(
            &src,
            &mut edges,
            self.low_threshold,
            self.high_threshold,
            3,
            false,
        )
        .context("Canny failed")?;

        let (width, height) = gray.dimensions();
        let bytes = edges.data_bytes().context("Edge Mat is not continuous")?;
        GrayImage::from_raw(width, height, bytes.to_vec())
            .context("Edge Mat has unexpected size")
    }
}

#[derive(Debug, Clone)]
pub struct OpenCvHoughExtractor {
    params: HoughConfig,
}

impl OpenCvHoughExtractor {
    pub fn new(params: HoughConfig) -> Self {
        Self { params }
    }
}

impl LineExtractor for OpenCvHoughExtractor {
    fn extract(&self, region: &GrayImage) -> Result<Vec<LineSegment>> {
        let src = to_mat(region)?;
        let mut lines: Vector<Vec4i> = Vector::new();
        imgproc::hough_lines_p(
            &src,
            &mut lines,
            self.params.distance_resolution,
            self.params.angle_resolution,
            self.params.vote_threshold as i32,
            self.params.min_line_length,
            self.params.max_line_gap,
        )
        .context("HoughLinesP failed")?;

        let segments: Vec<LineSegment> = lines
            .iter()
            .map(|l| LineSegment::new(l[0], l[1], l[2], l[3]))
            .collect();
        debug!("HoughLinesP: {} segments", segments.len());
        Ok(segments)
    }
}
