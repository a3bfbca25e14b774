// ============================================================================
// retiscan-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for RunConfig
//
// This module implements the builder pattern for the RunConfig structure,
// providing a fluent API with sensible defaults. `build` validates the result
// so an invalid configuration never reaches the orchestrator.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{ArtifactLayout, RunConfig};
use crate::error::CoreResult;
use crate::preprocessing::TensorShape;

/// Builder for creating RunConfig instances.
#[derive(Debug, Clone, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the workspace root under which all artifact locations live.
    pub fn workspace(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.layout = ArtifactLayout::new(root);
        self
    }

    /// Sets the square tensor size (width = height).
    pub fn tensor_size(mut self, size: u32) -> Self {
        self.config.tensor_shape = TensorShape::square(size);
        self
    }

    pub fn tensor_shape(mut self, shape: TensorShape) -> Self {
        self.config.tensor_shape = shape;
        self
    }

    /// Enables the augmented robustness pass.
    pub fn augment(mut self, augment: bool) -> Self {
        self.config.augment = augment;
        self
    }

    /// Sets the calibration noise standard deviation; `None` disables it.
    pub fn calibration_noise(mut self, std_dev: Option<f64>) -> Self {
        self.config.calibration_noise = std_dev;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn save_preprocessed(mut self, save: bool) -> Self {
        self.config.save_preprocessed = save;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> CoreResult<RunConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = RunConfigBuilder::new()
            .workspace("/data/run")
            .tensor_size(128)
            .augment(true)
            .calibration_noise(None)
            .seed(7)
            .batch_size(4)
            .workers(2)
            .save_preprocessed(true)
            .build()
            .unwrap();

        assert_eq!(config.layout.root(), std::path::Path::new("/data/run"));
        assert_eq!(config.tensor_shape, TensorShape::square(128));
        assert!(config.augment);
        assert_eq!(config.calibration_noise, None);
        assert_eq!(config.seed, 7);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.workers, 2);
        assert!(config.save_preprocessed);
    }

    #[test]
    fn build_rejects_invalid_values() {
        assert!(RunConfigBuilder::new().workers(0).build().is_err());
        assert!(RunConfigBuilder::new().tensor_size(0).build().is_err());
    }
}
