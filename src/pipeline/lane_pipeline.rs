// src/pipeline/lane_pipeline.rs
//
// Per-frame driver:
//   RGB frame → grayscale → edges → left/right regions → segments
//   → fitted line → image lane → world lane → tracker → LaneEstimate
//
// Every soft rejection returns Ok(None) and leaves the tracker untouched.
// Err is reserved for collaborator backend failures.

use super::event_bus::{EventBus, PipelineEvent};
use super::metrics::PipelineMetrics;
use crate::analysis::{DepthProjector, LaneTracker, TrackerEvent, TrackerInput, TrackerState};
use crate::detection::{
    fit_line, to_grayscale, CannyEdgeDetector, EdgeDetector, Extrapolator, HoughSegmentExtractor,
    LineExtractor, RegionSplitter,
};
use crate::types::{
    CameraCalibration, Config, CrossingDirection, DepthFrame, Frame, ImageLane, LaneEstimate,
    ProjectionConfig, Side,
};
use anyhow::{Context, Result};
use image::GrayImage;
use nalgebra::Point2;
use std::time::Instant;
use tracing::{debug, warn};

const MAX_PENDING_EVENTS: usize = 256;

pub struct LanePipeline<E: EdgeDetector, X: LineExtractor> {
    edge_detector: E,
    extractor: X,
    splitter: RegionSplitter,
    tracker: LaneTracker,
    projection: ProjectionConfig,
    metrics: PipelineMetrics,
    events: EventBus,
    frame_id: u64,
}

impl LanePipeline<CannyEdgeDetector, HoughSegmentExtractor> {
    /// Canny + Hough pipeline built from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            CannyEdgeDetector::from_config(&config.edges),
            HoughSegmentExtractor::new(config.hough.clone()),
            config,
        ))
    }
}

impl<E: EdgeDetector, X: LineExtractor> LanePipeline<E, X> {
    pub fn new(edge_detector: E, extractor: X, config: &Config) -> Self {
        Self {
            edge_detector,
            extractor,
            splitter: RegionSplitter::new(),
            tracker: LaneTracker::new(config.tracker.clone()),
            projection: config.projection.clone(),
            metrics: PipelineMetrics::new(),
            events: EventBus::new(MAX_PENDING_EVENTS),
            frame_id: 0,
        }
    }

    /// Full per-frame update from a raw RGB frame.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        depth: &DepthFrame,
        calibration: &CameraCalibration,
        vehicle: Point2<f64>,
    ) -> Result<Option<LaneEstimate>> {
        self.begin_frame();

        if !frame.is_well_formed() {
            self.metrics.inc(&self.metrics.malformed_frames);
            self.reject(format!(
                "malformed frame: {}x{}x{} with {} bytes",
                frame.width,
                frame.height,
                frame.channels,
                frame.data.len()
            ));
            return Ok(None);
        }
        if !depth.is_well_formed() || depth.width != frame.width || depth.height != frame.height {
            self.metrics.inc(&self.metrics.malformed_frames);
            self.reject(format!(
                "depth buffer {}x{} does not match frame {}x{}",
                depth.width, depth.height, frame.width, frame.height
            ));
            return Ok(None);
        }

        let Some(gray) = to_grayscale(frame) else {
            self.metrics.inc(&self.metrics.malformed_frames);
            self.reject("frame could not be converted to grayscale".to_string());
            return Ok(None);
        };
        let edges = self
            .edge_detector
            .detect(&gray)
            .context("Edge detection failed")?;

        self.fuse(&edges, depth, calibration, vehicle)
    }

    /// Per-frame update from an already computed binary edge map.
    pub fn process_edge_map(
        &mut self,
        edges: &GrayImage,
        depth: &DepthFrame,
        calibration: &CameraCalibration,
        vehicle: Point2<f64>,
    ) -> Result<Option<LaneEstimate>> {
        self.begin_frame();
        self.fuse(edges, depth, calibration, vehicle)
    }

    fn begin_frame(&mut self) {
        self.frame_id += 1;
        self.metrics.inc(&self.metrics.total_frames);
    }

    fn fuse(
        &mut self,
        edges: &GrayImage,
        depth: &DepthFrame,
        calibration: &CameraCalibration,
        vehicle: Point2<f64>,
    ) -> Result<Option<LaneEstimate>> {
        let start = Instant::now();
        let (width, height) = edges.dimensions();

        let (left_region, right_region) = self.splitter.split(edges);
        let extrapolator = Extrapolator::new(width, height);
        let left = self.detect_side(&left_region, &extrapolator, Side::Left)?;
        let right = self.detect_side(&right_region, &extrapolator, Side::Right)?;

        if left.is_none() && right.is_none() {
            self.reject("no lane lines detected".to_string());
            return Ok(None);
        }

        let projector = match DepthProjector::new(
            depth,
            calibration,
            self.projection.depth_scale,
            width as usize,
            height as usize,
        ) {
            Ok(projector) => projector,
            Err(e) => {
                self.reject(e.to_string());
                return Ok(None);
            }
        };

        let input = TrackerInput {
            left,
            right,
            image_width: width,
            vehicle_position: vehicle,
        };
        let update = match self.tracker.update(&input, &projector) {
            Ok(update) => update,
            Err(e) => {
                self.reject(e.to_string());
                return Ok(None);
            }
        };

        for event in update.events {
            self.record(event);
        }
        self.metrics.inc(&self.metrics.fused_frames);
        self.metrics
            .set_timing(&self.metrics.last_update_us, start.elapsed().as_micros() as u64);

        debug!(
            "Frame {}: offset={:.3} confidence={:.2} center={}",
            self.frame_id,
            update.estimate.lateral_offset,
            update.estimate.confidence,
            if update.estimate.lane_center.is_some() { "yes" } else { "no" }
        );

        Ok(Some(update.estimate))
    }

    fn detect_side(
        &self,
        region: &GrayImage,
        extrapolator: &Extrapolator,
        side: Side,
    ) -> Result<Option<ImageLane>> {
        let segments = self
            .extractor
            .extract(region)
            .with_context(|| format!("{} line extraction failed", side))?;
        if segments.is_empty() {
            debug!("No {} segments", side);
            return Ok(None);
        }

        let Some(line) = fit_line(&segments) else {
            debug!("{} segments were all vertical", side);
            return Ok(None);
        };
        let lane = extrapolator.extrapolate(&line);
        if lane.is_none() {
            debug!(
                "{} line (slope {:.3}) cannot be extrapolated",
                side, line.slope
            );
        }
        Ok(lane)
    }

    fn record(&mut self, event: TrackerEvent) {
        match &event {
            TrackerEvent::DuplicateSuppressed { .. } => {
                self.metrics.inc(&self.metrics.duplicate_frames)
            }
            TrackerEvent::SideInferred { .. } => self.metrics.inc(&self.metrics.inferred_sides),
            TrackerEvent::SideHeld { .. } => {}
            TrackerEvent::LaneCrossed { direction, .. } => match direction {
                CrossingDirection::LeftLane => self.metrics.inc(&self.metrics.left_crossings),
                CrossingDirection::RightLane => self.metrics.inc(&self.metrics.right_crossings),
            },
        }
        self.events.publish(PipelineEvent::Tracker {
            frame_id: self.frame_id,
            event,
        });
    }

    fn reject(&mut self, reason: String) {
        warn!("Frame {} rejected: {}", self.frame_id, reason);
        self.metrics.inc(&self.metrics.rejected_frames);
        self.events.publish(PipelineEvent::FrameRejected {
            frame_id: self.frame_id,
            reason,
        });
    }

    pub fn tracker_state(&self) -> &TrackerState {
        self.tracker.state()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        self.events.drain()
    }

    /// Start a new session; metrics keep counting.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.events.drain();
    }
}
