// src/config.rs

use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the tracker's invariants.
    pub fn validate(&self) -> Result<()> {
        let t = &self.tracker;
        for (name, value) in [
            ("tracker.single_side_penalty", t.single_side_penalty),
            ("tracker.duplicate_penalty", t.duplicate_penalty),
            ("tracker.crossing_penalty", t.crossing_penalty),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1], got {}", name, value);
            }
        }
        if !(t.accumulator_decay > 0.0 && t.accumulator_decay < 1.0) {
            bail!(
                "tracker.accumulator_decay must be within (0, 1), got {}",
                t.accumulator_decay
            );
        }
        if !(0.0..=1.0).contains(&t.accumulator_carry) {
            bail!(
                "tracker.accumulator_carry must be within [0, 1], got {}",
                t.accumulator_carry
            );
        }
        if t.crossing_threshold <= 0.0 {
            bail!("tracker.crossing_threshold must be positive");
        }
        if t.duplicate_width_ratio < 0.0 {
            bail!("tracker.duplicate_width_ratio must not be negative");
        }
        if self.projection.depth_scale <= 0.0 {
            bail!("projection.depth_scale must be positive");
        }
        if self.edges.low_threshold < 0.0 || self.edges.high_threshold < self.edges.low_threshold {
            bail!(
                "edges thresholds must satisfy 0 <= low <= high, got {} / {}",
                self.edges.low_threshold,
                self.edges.high_threshold
            );
        }
        if self.hough.min_line_length < 0.0 || self.hough.max_line_gap < 0.0 {
            bail!("hough lengths must not be negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml_str(
            "tracker:\n  crossing_threshold: 1.5\nlogging:\n  level: debug\n",
        )
        .unwrap();
        assert_eq!(config.tracker.crossing_threshold, 1.5);
        assert_eq!(config.tracker.accumulator_decay, 0.9);
        assert_eq!(config.hough.vote_threshold, 20);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_rejects_decay_outside_unit_interval() {
        let err = Config::from_yaml_str("tracker:\n  accumulator_decay: 1.2\n").unwrap_err();
        assert!(format!("{:#}", err).contains("accumulator_decay"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("lane_tracking_cfg_{}.yaml", std::process::id()));
        fs::write(&path, "projection:\n  depth_scale: 500.0\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.projection.depth_scale, 500.0);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Config::load("/nonexistent/lane.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lane.yaml"));
    }
}
