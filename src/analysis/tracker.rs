// src/analysis/tracker.rs
//
// Ego-lane tracker.
//
// Fuses per-frame left/right image candidates with the previous world-frame
// estimate. The update is a pure function of (state, input) returning the
// next state, so a frame either advances the tracker completely or is
// rejected with the previous state intact.
//
// Per-frame order (changing it changes the fused output):
//   1. confidence reset / single-side penalty
//   2. duplicate suppression
//   3. world projection
//   4. missing-side inference
//   5. lane center
//   6. lateral offset
//   7. crossing hysteresis
//   8. accumulator decay
//   9. store offset

use super::geometry::signed_distance_to_line;
use super::projector::{LaneProjector, ProjectionError};
use crate::types::{CrossingDirection, ImageLane, LaneEstimate, Side, TrackerConfig, WorldLane};
use nalgebra::Point2;
use tracing::{debug, info};

// ============================================================================
// TYPES
// ============================================================================

/// What is known about one lane boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SideEstimate {
    /// Never observed this session; nothing to infer from
    #[default]
    NeverSeen,
    /// No candidate on this side in the current frame
    MissingThisFrame,
    /// World-frame boundary, measured or inferred
    Known(WorldLane),
}

impl SideEstimate {
    pub fn known(&self) -> Option<&WorldLane> {
        match self {
            Self::Known(lane) => Some(lane),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    /// Neither side observed yet
    Uninitialized,
    /// At least one side observed at least once
    Tracking,
}

/// Persistent per-session tracker state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerState {
    pub left: SideEstimate,
    pub right: SideEstimate,
    pub lane_center: Option<WorldLane>,
    /// Signed distance to lane center, positive right of center
    pub lateral_offset: f64,
    /// Decaying crossing history; sign picks the side kept on duplicates
    pub offset_accumulator: f64,
    pub confidence: f64,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            left: SideEstimate::NeverSeen,
            right: SideEstimate::NeverSeen,
            lane_center: None,
            lateral_offset: 0.0,
            offset_accumulator: 0.0,
            confidence: 1.0,
        }
    }
}

impl TrackerState {
    pub fn phase(&self) -> TrackerPhase {
        if self.left.is_known() || self.right.is_known() {
            TrackerPhase::Tracking
        } else {
            TrackerPhase::Uninitialized
        }
    }

    pub fn estimate(&self) -> LaneEstimate {
        LaneEstimate {
            lane_center: self.lane_center,
            lateral_offset: self.lateral_offset,
            confidence: self.confidence,
        }
    }

    fn side(&self, side: Side) -> &SideEstimate {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// One frame's worth of tracker input.
#[derive(Debug, Clone, Copy)]
pub struct TrackerInput {
    pub left: Option<ImageLane>,
    pub right: Option<ImageLane>,
    /// Width of the frame the candidates were extracted from (pixels)
    pub image_width: u32,
    /// Vehicle position on the ground plane, world (x, z)
    pub vehicle_position: Point2<f64>,
}

/// Notable decisions taken during an update.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// Both candidates were the same physical line; one was dropped
    DuplicateSuppressed { kept: Side, near_x_gap: i32 },
    /// Missing side shifted along with the observed side
    SideInferred { side: Side },
    /// Missing side kept at its last value (observed side had no history)
    SideHeld { side: Side },
    LaneCrossed {
        direction: CrossingDirection,
        offset_jump: f64,
        accumulator: f64,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    #[error("no lane candidate on either side")]
    NoDetections,

    #[error("lane projection failed: {0}")]
    Projection(#[from] ProjectionError),
}

#[derive(Debug, Clone)]
pub struct TrackerUpdate {
    pub state: TrackerState,
    pub estimate: LaneEstimate,
    pub events: Vec<TrackerEvent>,
}

// ============================================================================
// UPDATE
// ============================================================================

/// Compute the next tracker state. `state` is never modified.
pub fn advance<P: LaneProjector + ?Sized>(
    state: &TrackerState,
    input: &TrackerInput,
    config: &TrackerConfig,
    projector: &P,
) -> Result<TrackerUpdate, TrackerError> {
    let (mut left, mut right) = (input.left, input.right);
    if left.is_none() && right.is_none() {
        return Err(TrackerError::NoDetections);
    }

    let mut next = *state;
    let mut events = Vec::new();

    // 1. Confidence reset
    if left.is_some() && right.is_some() {
        next.confidence = 1.0;
    } else {
        next.confidence *= config.single_side_penalty;
    }

    // 2. Duplicate suppression
    if let (Some(l), Some(r)) = (left, right) {
        let gap = (l.near.x - r.near.x).abs();
        if f64::from(gap) < f64::from(input.image_width) * config.duplicate_width_ratio {
            // Positive accumulator: vehicle drifted right, so the line is its right boundary
            let kept = if state.offset_accumulator > 0.0 {
                left = None;
                Side::Right
            } else {
                right = None;
                Side::Left
            };
            next.confidence *= config.duplicate_penalty;
            debug!(
                "Duplicate lanes detected (near-row gap {}px), recognized as {} lane",
                gap, kept
            );
            events.push(TrackerEvent::DuplicateSuppressed {
                kept,
                near_x_gap: gap,
            });
        }
    }

    // 3. World projection
    let observe = |candidate: Option<ImageLane>| -> Result<SideEstimate, ProjectionError> {
        Ok(match candidate {
            Some(lane) => SideEstimate::Known(projector.project(&lane)?),
            None => SideEstimate::MissingThisFrame,
        })
    };
    let left_obs = observe(left)?;
    let right_obs = observe(right)?;

    // 4. Missing-side inference
    next.left = resolve_side(Side::Left, &left_obs, state, &right_obs, &mut events);
    next.right = resolve_side(Side::Right, &right_obs, state, &left_obs, &mut events);

    // 5. Lane center
    next.lane_center = match (next.left.known(), next.right.known()) {
        (Some(l), Some(r)) => Some(l.midpoint(r)),
        _ => None,
    };

    // 6. Lateral offset
    let new_offset = next.lane_center.as_ref().and_then(|center| {
        let (a, b) = center.ground_segment();
        signed_distance_to_line(&input.vehicle_position, &a, &b)
    });
    if new_offset.is_none() && next.lane_center.is_some() {
        debug!("Lane center is degenerate, keeping previous offset");
    }

    // 7. Crossing hysteresis
    if let Some(offset) = new_offset {
        let jump = offset - state.lateral_offset;
        let direction = if jump > config.crossing_threshold {
            next.offset_accumulator = 1.0 + next.offset_accumulator * config.accumulator_carry;
            Some(CrossingDirection::LeftLane)
        } else if jump < -config.crossing_threshold {
            next.offset_accumulator = -1.0 + next.offset_accumulator * config.accumulator_carry;
            Some(CrossingDirection::RightLane)
        } else {
            None
        };

        if let Some(direction) = direction {
            next.confidence *= config.crossing_penalty;
            info!(
                "Crossing {}: offset jump {:.2}, accumulator {:.3}",
                direction.as_str(),
                jump,
                next.offset_accumulator
            );
            events.push(TrackerEvent::LaneCrossed {
                direction,
                offset_jump: jump,
                accumulator: next.offset_accumulator,
            });
        }
    }

    // 8. Decay
    next.offset_accumulator *= config.accumulator_decay;

    // 9. Store offset
    if let Some(offset) = new_offset {
        next.lateral_offset = offset;
    }

    Ok(TrackerUpdate {
        estimate: next.estimate(),
        state: next,
        events,
    })
}

/// Final estimate for `side` given this frame's observations.
///
/// A missing side is shifted by the observed side's displacement when both
/// have history (constant lane width), held at its last value when only it
/// has history, and stays unseen otherwise.
fn resolve_side(
    side: Side,
    observed: &SideEstimate,
    prior: &TrackerState,
    other_observed: &SideEstimate,
    events: &mut Vec<TrackerEvent>,
) -> SideEstimate {
    if let SideEstimate::Known(lane) = observed {
        return SideEstimate::Known(*lane);
    }

    let missing_prev = prior.side(side);
    let present_prev = prior.side(side.opposite());
    match (missing_prev, other_observed, present_prev) {
        (
            SideEstimate::Known(missing_prev),
            SideEstimate::Known(present_new),
            SideEstimate::Known(present_prev),
        ) => {
            info!("{} lane not detected, inferring from {} lane", side, side.opposite());
            events.push(TrackerEvent::SideInferred { side });
            SideEstimate::Known(missing_prev.translated(present_prev, present_new))
        }
        (SideEstimate::Known(missing_prev), _, _) => {
            debug!("{} lane not detected, holding last estimate", side);
            events.push(TrackerEvent::SideHeld { side });
            SideEstimate::Known(*missing_prev)
        }
        _ => SideEstimate::NeverSeen,
    }
}

// ============================================================================
// TRACKER
// ============================================================================

/// Owns one session's `TrackerState`. Not thread-safe; callers serialize.
pub struct LaneTracker {
    config: TrackerConfig,
    state: TrackerState,
    frames_fused: u64,
}

impl LaneTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: TrackerState::default(),
            frames_fused: 0,
        }
    }

    /// Fuse one frame. On error the state is left exactly as it was.
    pub fn update<P: LaneProjector + ?Sized>(
        &mut self,
        input: &TrackerInput,
        projector: &P,
    ) -> Result<TrackerUpdate, TrackerError> {
        let update = advance(&self.state, input, &self.config, projector)?;
        self.state = update.state;
        self.frames_fused += 1;
        Ok(update)
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn phase(&self) -> TrackerPhase {
        self.state.phase()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn frames_fused(&self) -> u64 {
        self.frames_fused
    }

    /// Start a new session.
    pub fn reset(&mut self) {
        self.state = TrackerState::default();
        self.frames_fused = 0;
    }
}
