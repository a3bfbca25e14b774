//! Configuration structures and constants for the retiscan-core library.
//!
//! A pipeline run is driven by one immutable [`RunConfig`], created by the
//! consumer of the library (e.g., retiscan-cli) and passed to the orchestrator
//! at construction. It names every artifact location, the tensor shape fed to
//! the classifier, and the randomness settings for augmentation and
//! calibration noise.

mod builder;
mod layout;

pub use builder::RunConfigBuilder;
pub use layout::{ArtifactLayout, PREDICTIONS_FILE, SUMMARY_JSON_FILE, SUMMARY_TEXT_FILE};

use crate::error::{CoreError, CoreResult};
use crate::preprocessing::TensorShape;

// Default constants

/// Default square input size of the classifier (EfficientNet-B0 style).
pub const DEFAULT_TENSOR_SIZE: u32 = 224;

/// Default number of tensors handed to the classifier per call.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Standard deviation of the Gaussian calibration noise added to raw scores.
pub const DEFAULT_NOISE_STD_DEV: f64 = 0.05;

/// Default seed for augmentation and calibration noise.
pub const DEFAULT_SEED: u64 = 42;

/// Default upper bound on per-frame worker threads.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

/// Immutable configuration of one pipeline run.
///
/// # Examples
///
/// ```rust
/// use retiscan_core::config::RunConfigBuilder;
///
/// let config = RunConfigBuilder::new()
///     .workspace("/tmp/retiscan")
///     .batch_size(16)
///     .calibration_noise(None)
///     .build()
///     .unwrap();
/// assert_eq!(config.batch_size, 16);
/// ```
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Named artifact locations of this run.
    pub layout: ArtifactLayout,

    /// Shape of the tensors handed to the classifier.
    pub tensor_shape: TensorShape,

    /// Run an additional augmented robustness pass after scoring.
    /// The canonical pass never uses augmentation.
    pub augment: bool,

    /// Standard deviation of the calibration noise applied to raw scores,
    /// or `None` to disable the noise decorator.
    pub calibration_noise: Option<f64>,

    /// Base seed for augmentation and calibration noise.
    pub seed: u64,

    /// Tensors per classifier call.
    pub batch_size: usize,

    /// Upper bound on worker threads for per-frame stages.
    pub workers: usize,

    /// Write the resized RGB frame of every preprocessed frame to the
    /// preprocessed location.
    pub save_preprocessed: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            layout: ArtifactLayout::default(),
            tensor_shape: TensorShape::square(DEFAULT_TENSOR_SIZE),
            augment: false,
            calibration_noise: Some(DEFAULT_NOISE_STD_DEV),
            seed: DEFAULT_SEED,
            batch_size: DEFAULT_BATCH_SIZE,
            workers: default_workers(),
            save_preprocessed: false,
        }
    }
}

impl RunConfig {
    /// Creates a configuration with defaults rooted at `workspace`.
    pub fn new(workspace: impl Into<std::path::PathBuf>) -> Self {
        Self {
            layout: ArtifactLayout::new(workspace),
            ..Self::default()
        }
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tensor_shape.width == 0 || self.tensor_shape.height == 0 {
            return Err(CoreError::Config(format!(
                "Tensor shape must be non-empty, got {}",
                self.tensor_shape
            )));
        }
        if self.tensor_shape.channels != 3 {
            return Err(CoreError::Config(format!(
                "Only RGB tensors are supported, got {} channels",
                self.tensor_shape.channels
            )));
        }
        if self.batch_size == 0 {
            return Err(CoreError::Config("Batch size must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(CoreError::Config("Worker count must be at least 1".to_string()));
        }
        if let Some(std_dev) = self.calibration_noise {
            if !std_dev.is_finite() || std_dev < 0.0 {
                return Err(CoreError::Config(format!(
                    "Calibration noise standard deviation must be a non-negative number, got {std_dev}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RunConfig::new("/tmp/work");
        assert!(config.validate().is_ok());
        assert_eq!(config.tensor_shape, TensorShape::square(224));
        assert_eq!(config.calibration_noise, Some(0.05));
        assert!(!config.augment);
    }

    #[test]
    fn rejects_zero_batch() {
        let config = RunConfig {
            batch_size: 0,
            ..RunConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn rejects_negative_noise() {
        let config = RunConfig {
            calibration_noise: Some(-0.1),
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
