// src/analysis/mod.rs
//
// World-frame lane analysis.
//
//   ImageLane (left/right) → projector → WorldLane ─┐
//   previous TrackerState ──────────────────────────┼→ tracker::advance → LaneEstimate
//   vehicle ground position ────────────────────────┘

pub mod geometry;
pub mod projector;
pub mod tracker;

pub use projector::{DepthProjector, LaneProjector, ProjectionError};
pub use tracker::{
    advance, LaneTracker, SideEstimate, TrackerError, TrackerEvent, TrackerInput, TrackerPhase,
    TrackerState, TrackerUpdate,
};
