// src/detection/mod.rs
//
// Image-space lane detection.
//
// Edge map → region split → line extraction → line fit → extrapolation

pub mod edges;
pub mod extractor;
pub mod extrapolator;
pub mod line_fitter;
#[cfg(feature = "opencv")]
pub mod opencv_backend;
pub mod region;

pub use edges::{to_grayscale, CannyEdgeDetector, EdgeDetector};
pub use extractor::{HoughSegmentExtractor, LineExtractor};
pub use extrapolator::Extrapolator;
pub use line_fitter::fit_line;
#[cfg(feature = "opencv")]
pub use opencv_backend::{OpenCvCannyEdgeDetector, OpenCvHoughExtractor};
pub use region::RegionSplitter;
