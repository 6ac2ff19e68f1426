// src/pipeline/metrics.rs
//
// Per-session counters. Handles are cheap to clone and can be read from
// another thread while the pipeline keeps running.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    /// Frame or depth buffer failed validation
    pub malformed_frames: Arc<AtomicU64>,
    /// Frame produced no estimate (no lines, projection or tracker rejection)
    pub rejected_frames: Arc<AtomicU64>,
    pub fused_frames: Arc<AtomicU64>,
    pub duplicate_frames: Arc<AtomicU64>,
    pub inferred_sides: Arc<AtomicU64>,
    pub left_crossings: Arc<AtomicU64>,
    pub right_crossings: Arc<AtomicU64>,
    pub last_update_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            malformed_frames: Arc::new(AtomicU64::new(0)),
            rejected_frames: Arc::new(AtomicU64::new(0)),
            fused_frames: Arc::new(AtomicU64::new(0)),
            duplicate_frames: Arc::new(AtomicU64::new(0)),
            inferred_sides: Arc::new(AtomicU64::new(0)),
            left_crossings: Arc::new(AtomicU64::new(0)),
            right_crossings: Arc::new(AtomicU64::new(0)),
            last_update_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            fps: self.fps(),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            rejected_frames: self.rejected_frames.load(Ordering::Relaxed),
            fused_frames: self.fused_frames.load(Ordering::Relaxed),
            duplicate_frames: self.duplicate_frames.load(Ordering::Relaxed),
            inferred_sides: self.inferred_sides.load(Ordering::Relaxed),
            left_crossings: self.left_crossings.load(Ordering::Relaxed),
            right_crossings: self.right_crossings.load(Ordering::Relaxed),
            last_update_us: self.last_update_us.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }

    pub fn summary_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.summary()).context("Failed to serialize metrics")
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub malformed_frames: u64,
    pub rejected_frames: u64,
    pub fused_frames: u64,
    pub duplicate_frames: u64,
    pub inferred_sides: u64,
    pub left_crossings: u64,
    pub right_crossings: u64,
    pub last_update_us: u64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = PipelineMetrics::new();
        let reader = metrics.clone();
        metrics.inc(&metrics.total_frames);
        metrics.inc(&metrics.total_frames);
        metrics.inc(&metrics.left_crossings);
        metrics.set_timing(&metrics.last_update_us, 420);

        let summary = reader.summary();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.left_crossings, 1);
        assert_eq!(summary.right_crossings, 0);
        assert_eq!(summary.last_update_us, 420);
    }

    #[test]
    fn test_summary_json() {
        let metrics = PipelineMetrics::new();
        metrics.inc(&metrics.fused_frames);
        let json: serde_json::Value = serde_json::from_str(&metrics.summary_json().unwrap()).unwrap();
        assert_eq!(json["fused_frames"], 1);
        assert_eq!(json["malformed_frames"], 0);
    }
}
