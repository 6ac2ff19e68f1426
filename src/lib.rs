// src/lib.rs
//
// Ego-lane tracking for a camera + depth sensor rig.
//
// Each frame: detect left/right lane lines in the image, lift them into the
// world frame through the depth buffer, and fuse them with the previous
// estimate into a lane center, a signed lateral offset and a confidence.

pub mod analysis;
pub mod config;
pub mod detection;
pub mod logging;
pub mod pipeline;
pub mod types;

pub use analysis::{LaneTracker, TrackerError, TrackerEvent, TrackerState};
pub use pipeline::{LanePipeline, PipelineEvent, PipelineMetrics};
pub use types::{
    CameraCalibration, Config, DepthFrame, Frame, ImageLane, LaneEstimate, LineSegment, WorldLane,
};
