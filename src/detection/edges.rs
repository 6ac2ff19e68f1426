// src/detection/edges.rs

use crate::types::{EdgeConfig, Frame};
use anyhow::Result;
use image::{imageops, GrayImage, RgbImage};

/// Binary edge extraction: `(image, low, high) -> edge map` with edge
/// pixels at 255 and background at 0.
pub trait EdgeDetector {
    fn detect(&self, gray: &GrayImage) -> Result<GrayImage>;
}

/// Canny edge detector backed by `imageproc`.
#[derive(Debug, Clone)]
pub struct CannyEdgeDetector {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl CannyEdgeDetector {
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            low_threshold,
            high_threshold,
        }
    }

    pub fn from_config(config: &EdgeConfig) -> Self {
        Self::new(config.low_threshold, config.high_threshold)
    }
}

impl Default for CannyEdgeDetector {
    fn default() -> Self {
        Self::from_config(&EdgeConfig::default())
    }
}

impl EdgeDetector for CannyEdgeDetector {
    fn detect(&self, gray: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::edges::canny(
            gray,
            self.low_threshold,
            self.high_threshold,
        ))
    }
}

/// Luma conversion of an RGB frame. `None` for anything that is not a
/// complete 3-channel buffer.
pub fn to_grayscale(frame: &Frame) -> Option<GrayImage> {
    if !frame.is_well_formed() {
        return None;
    }
    let rgb = RgbImage::from_raw(frame.width as u32, frame.height as u32, frame.data.clone())?;
    Some(imageops::grayscale(&rgb))
}
