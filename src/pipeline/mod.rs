// src/pipeline/mod.rs

pub mod event_bus;
pub mod lane_pipeline;
pub mod metrics;

pub use event_bus::{EventBus, PipelineEvent};
pub use lane_pipeline::LanePipeline;
pub use metrics::{MetricsSummary, PipelineMetrics};
