//! Core library for frame-wise retinal video diagnostics.
//!
//! This crate decodes a fundus video into frames, normalizes every frame into
//! a classifier tensor, scores it with a pluggable disease classifier and turns
//! each score into an explainable verdict. Verdicts are collected in a
//! canonical prediction store that report renderers consume.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use retiscan_core::classification::{InputLayout, OnnxClassifier, with_calibration_noise};
//! use retiscan_core::config::RunConfigBuilder;
//! use retiscan_core::frames::FfmpegFrameExtractor;
//! use retiscan_core::pipeline::PipelineOrchestrator;
//! use std::path::Path;
//!
//! let config = RunConfigBuilder::new().workspace("/tmp/retiscan").build().unwrap();
//! let model = OnnxClassifier::load(
//!     Path::new("model.onnx"),
//!     config.tensor_shape,
//!     InputLayout::Nhwc,
//! ).unwrap();
//! let classifier = with_calibration_noise(model, &config);
//!
//! let mut orchestrator =
//!     PipelineOrchestrator::new(config, FfmpegFrameExtractor::new(), classifier);
//! let report = orchestrator.run(Path::new("fundus.mp4")).unwrap();
//! println!("{} frames, risk {}", report.summary.total_frames, report.summary.risk);
//! ```

pub mod classification;
pub mod confidence;
pub mod config;
pub mod error;
pub mod external;
pub mod frames;
pub mod pipeline;
pub mod preprocessing;
pub mod rendering;
pub mod reporting;
pub mod store;
pub mod utils;

// Re-exports for public API
pub use classification::Classifier;
pub use confidence::{ConfidenceLevel, DECISION_THRESHOLD, Label, Verdict};
pub use config::{ArtifactLayout, RunConfig, RunConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use frames::{FfmpegFrameExtractor, FrameArtifact, FrameExtractor};
pub use pipeline::{PipelineFailure, PipelineOrchestrator, RunReport, RunState};
pub use reporting::{RiskLevel, RunSummary};
pub use store::{PredictionRow, PredictionStore, load_predictions};
pub use utils::{format_duration, format_percentage};
