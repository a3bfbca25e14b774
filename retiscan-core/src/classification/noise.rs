//! Gaussian calibration noise around any classifier.
//!
//! Raw scores of an uncalibrated model cluster tightly; the reference
//! behaviour perturbs each score with independent `N(0, sd)` noise and clips
//! the result back into [0, 1]. The RNG is seeded so a run is reproducible.

use super::Classifier;
use crate::error::{CoreError, CoreResult};
use crate::preprocessing::Tensor;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::sync::Mutex;

/// Decorator adding seeded Gaussian noise to the wrapped classifier's scores.
pub struct NoisyClassifier<C> {
    inner: C,
    std_dev: f64,
    rng: Mutex<StdRng>,
}

impl<C: Classifier> NoisyClassifier<C> {
    pub fn new(inner: C, std_dev: f64, seed: u64) -> Self {
        Self {
            inner,
            std_dev,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl<C: Classifier> Classifier for NoisyClassifier<C> {
    fn infer(&self, batch: &[Tensor]) -> CoreResult<Vec<f64>> {
        let scores = self.inner.infer(batch)?;
        let normal = Normal::new(0.0, self.std_dev)
            .map_err(|e| CoreError::Config(format!("invalid noise deviation: {e}")))?;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| CoreError::OperationFailed("noise RNG lock poisoned".into()))?;

        Ok(scores
            .into_iter()
            .map(|score| (score + normal.sample(&mut *rng)).clamp(0.0, 1.0))
            .collect())
    }
}
