// src/types.rs

use nalgebra::{Matrix3, Matrix4, Point2, Point3};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub edges: EdgeConfig,
    pub hough: HoughConfig,
    pub projection: ProjectionConfig,
    pub tracker: TrackerConfig,
    pub logging: LoggingConfig,
}

/// Canny hysteresis thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            low_threshold: 70.0,
            high_threshold: 140.0,
        }
    }
}

/// Parameters handed to the line extractor for each search region.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    /// Accumulator distance resolution (pixels)
    pub distance_resolution: f64,
    /// Accumulator angle resolution (radians)
    pub angle_resolution: f64,
    pub vote_threshold: u32,
    /// Segments shorter than this are dropped (pixels)
    pub min_line_length: f64,
    /// Largest gap bridged between collinear edge pixels (pixels)
    pub max_line_gap: f64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            distance_resolution: 1.0,
            angle_resolution: std::f64::consts::PI / 180.0,
            vote_threshold: 20,
            min_line_length: 20.0,
            max_line_gap: 300.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Converts normalized depth-buffer units to world distance units.
    /// Calibration assumption carried over from the simulator setup; it is
    /// not derived from the camera model.
    pub depth_scale: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self { depth_scale: 1000.0 }
    }
}

/// Fusion constants for the lane tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Confidence multiplier when only one side was detected
    pub single_side_penalty: f64,
    /// Confidence multiplier when both candidates collapse to one lane
    pub duplicate_penalty: f64,
    /// Candidates whose near-row x differ by less than this fraction of the
    /// image width are treated as the same physical line. Pixel heuristic,
    /// needs empirical validation per camera.
    pub duplicate_width_ratio: f64,
    /// Frame-to-frame offset jump (world units) that counts as a crossing
    pub crossing_threshold: f64,
    /// Confidence multiplier on a crossing event
    pub crossing_penalty: f64,
    /// Share of the previous accumulator kept when a crossing fires
    pub accumulator_carry: f64,
    /// Per-frame multiplicative decay of the offset accumulator
    pub accumulator_decay: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            single_side_penalty: 0.4,
            duplicate_penalty: 0.4,
            duplicate_width_ratio: 0.5,
            crossing_threshold: 2.0,
            crossing_penalty: 0.5,
            accumulator_carry: 0.6,
            accumulator_decay: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// FRAME INPUTS
// ============================================================================

/// Raw interleaved 8-bit camera frame as delivered by the sensor layer.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub timestamp_ms: f64,
}

impl Frame {
    pub fn rgb(data: Vec<u8>, width: usize, height: usize, timestamp_ms: f64) -> Self {
        Self {
            data,
            width,
            height,
            channels: 3,
            timestamp_ms,
        }
    }

    /// True when the frame is a complete 3-channel RGB buffer.
    pub fn is_well_formed(&self) -> bool {
        self.channels == 3
            && self.width > 0
            && self.height > 0
            && self.data.len() == self.width * self.height * 3
    }
}

/// Row-major depth buffer in normalized depth units.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl DepthFrame {
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    pub fn filled(value: f32, width: usize, height: usize) -> Self {
        Self::new(vec![value; width * height], width, height)
    }

    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.width * self.height
    }

    /// Depth at (row, col). Indices outside the buffer are clamped to its edge.
    pub fn sample(&self, row: i64, col: i64) -> f32 {
        let r = row.clamp(0, self.height as i64 - 1) as usize;
        let c = col.clamp(0, self.width as i64 - 1) as usize;
        self.data[r * self.width + c]
    }
}

/// Camera model and vehicle pose for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraCalibration {
    pub intrinsics: Matrix3<f64>,
    /// Camera-to-vehicle transform
    pub extrinsic: Matrix4<f64>,
    /// Vehicle-to-world transform
    pub vehicle_pose: Matrix4<f64>,
}

impl CameraCalibration {
    pub fn new(intrinsics: Matrix3<f64>, extrinsic: Matrix4<f64>, vehicle_pose: Matrix4<f64>) -> Self {
        Self {
            intrinsics,
            extrinsic,
            vehicle_pose,
        }
    }
}

// ============================================================================
// LANE GEOMETRY
// ============================================================================

/// Raw segment from the line extractor, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }

    /// (slope, intercept) of the segment's supporting line, `None` when vertical.
    pub fn slope_intercept(&self) -> Option<(f64, f64)> {
        if self.is_vertical() {
            return None;
        }
        let slope = f64::from(self.y2 - self.y1) / f64::from(self.x2 - self.x1);
        let intercept = f64::from(self.y1) - slope * f64::from(self.x1);
        Some((slope, intercept))
    }

    pub fn length(&self) -> f64 {
        let dx = f64::from(self.x2 - self.x1);
        let dy = f64::from(self.y2 - self.y1);
        dx.hypot(dy)
    }
}

/// Image-space line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FittedLine {
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImagePoint {
    pub x: i32,
    pub y: i32,
}

impl ImagePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Lane boundary in pixel space: `near` on the bottom row, `far` up the road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageLane {
    pub near: ImagePoint,
    pub far: ImagePoint,
}

impl ImageLane {
    pub fn new(near: ImagePoint, far: ImagePoint) -> Self {
        Self { near, far }
    }
}

/// Lane boundary in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldLane {
    pub near: Point3<f64>,
    pub far: Point3<f64>,
}

impl WorldLane {
    pub fn new(near: Point3<f64>, far: Point3<f64>) -> Self {
        Self { near, far }
    }

    /// Endpoint-wise midpoint of two lanes.
    pub fn midpoint(&self, other: &WorldLane) -> WorldLane {
        WorldLane {
            near: nalgebra::center(&self.near, &other.near),
            far: nalgebra::center(&self.far, &other.far),
        }
    }

    /// Shift this lane by the endpoint-wise displacement `to - from`.
    pub fn translated(&self, from: &WorldLane, to: &WorldLane) -> WorldLane {
        WorldLane {
            near: self.near + (to.near - from.near),
            far: self.far + (to.far - from.far),
        }
    }

    /// Ground-plane (x, z) projection of both endpoints.
    pub fn ground_segment(&self) -> (Point2<f64>, Point2<f64>) {
        (
            Point2::new(self.near.x, self.near.z),
            Point2::new(self.far.x, self.far.z),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which lane line a detected offset jump corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossingDirection {
    /// Offset jumped positive past the threshold
    LeftLane,
    /// Offset jumped negative past the threshold
    RightLane,
}

impl CrossingDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftLane => "LEFT_LANE",
            Self::RightLane => "RIGHT_LANE",
        }
    }
}

/// Fused per-frame result for the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaneEstimate {
    pub lane_center: Option<WorldLane>,
    /// Signed distance to lane center, positive right of center (world units)
    pub lateral_offset: f64,
    /// Detection reliability in [0, 1]
    pub confidence: f64,
}
