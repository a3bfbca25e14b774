// ============================================================================
// retiscan-core/src/classification/mod.rs
// ============================================================================
//
// CLASSIFICATION: Boundary to the Disease-Likelihood Model
//
// The model is an opaque capability: a batch of uniform tensors goes in, one
// raw score in [0, 1] per tensor comes out, in the same order. Everything the
// pipeline needs from it is expressed by the `Classifier` trait, so tests run
// against deterministic stubs and the real backend (tract ONNX) is swapped in
// by the CLI.
//
// KEY COMPONENTS:
// - Classifier: Batch inference trait
// - NoisyClassifier: Seeded Gaussian calibration noise decorator
// - OnnxClassifier: tract-onnx backend
// - classify_batches: Batch driver with per-batch failure isolation

pub mod noise;
pub mod onnx;

pub use noise::NoisyClassifier;
pub use onnx::{InputLayout, OnnxClassifier};

use crate::config::RunConfig;
use crate::error::{CoreError, CoreResult};
use crate::preprocessing::Tensor;

/// A model mapping image tensors to disease-likelihood scores.
pub trait Classifier {
    /// Scores every tensor of `batch`. The returned vector has the same length
    /// and order as the batch.
    fn infer(&self, batch: &[Tensor]) -> CoreResult<Vec<f64>>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn infer(&self, batch: &[Tensor]) -> CoreResult<Vec<f64>> {
        (**self).infer(batch)
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn infer(&self, batch: &[Tensor]) -> CoreResult<Vec<f64>> {
        (**self).infer(batch)
    }
}

/// Wraps `classifier` in the calibration noise decorator when the run config
/// enables it.
pub fn with_calibration_noise<C>(classifier: C, config: &RunConfig) -> Box<dyn Classifier>
where
    C: Classifier + 'static,
{
    match config.calibration_noise {
        Some(std_dev) if std_dev > 0.0 => {
            log::debug!("Calibration noise enabled (sd {std_dev}, seed {})", config.seed);
            Box::new(NoisyClassifier::new(classifier, std_dev, config.seed))
        }
        _ => Box::new(classifier),
    }
}

/// Runs `classifier` over `tensors` in chunks of `batch_size`.
///
/// Returns one entry per tensor. A failing batch (or one returning the wrong
/// number of scores) yields an error for each of its tensors so the caller can
/// exclude those frames and keep going. `on_batch` is called after every batch
/// with the number of tensors scored so far and may abort the loop by
/// returning an error.
pub fn classify_batches<C, F>(
    classifier: &C,
    tensors: &[Tensor],
    batch_size: usize,
    mut on_batch: F,
) -> CoreResult<Vec<CoreResult<f64>>>
where
    C: Classifier + ?Sized,
    F: FnMut(usize) -> CoreResult<()>,
{
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(tensors.len());

    for batch in tensors.chunks(batch_size) {
        match classifier.infer(batch) {
            Ok(scores) if scores.len() == batch.len() => {
                results.extend(scores.into_iter().map(Ok));
            }
            Ok(scores) => {
                let reason = format!(
                    "classifier returned {} scores for a batch of {}",
                    scores.len(),
                    batch.len()
                );
                results.extend(batch.iter().map(|_| Err(CoreError::Classifier(reason.clone()))));
            }
            Err(e) => {
                let reason = e.to_string();
                results.extend(batch.iter().map(|_| Err(CoreError::Classifier(reason.clone()))));
            }
        }
        on_batch(results.len())?;
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::TensorShape;
    use std::cell::Cell;

    /// Scores each tensor by its first value; fails on the configured call.
    struct FirstValue {
        calls: Cell<usize>,
        fail_call: Option<usize>,
    }

    impl Classifier for FirstValue {
        fn infer(&self, batch: &[Tensor]) -> CoreResult<Vec<f64>> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if self.fail_call == Some(call) {
                return Err(CoreError::Classifier("out of memory".into()));
            }
            Ok(batch.iter().map(|t| f64::from(t.as_slice()[0])).collect())
        }
    }

    fn tensors(values: &[f32]) -> Vec<Tensor> {
        let shape = TensorShape { width: 1, height: 1, channels: 3 };
        values
            .iter()
            .map(|&v| Tensor::from_parts(shape, vec![v; 3]))
            .collect()
    }

    #[test]
    fn batches_preserve_order() {
        let classifier = FirstValue { calls: Cell::new(0), fail_call: None };
        let input = tensors(&[0.1, 0.2, 0.3, 0.4, 0.5]);
        let mut progress = Vec::new();

        let out = classify_batches(&classifier, &input, 2, |done| {
            progress.push(done);
            Ok(())
        })
        .unwrap();

        let scores: Vec<f64> = out.into_iter().map(Result::unwrap).collect();
        assert_eq!(scores.len(), 5);
        assert!((scores[3] - 0.4).abs() < 1e-6);
        assert_eq!(progress, vec![2, 4, 5]);
        assert_eq!(classifier.calls.get(), 3);
    }

    #[test]
    fn failing_batch_only_affects_its_frames() {
        let classifier = FirstValue { calls: Cell::new(0), fail_call: Some(1) };
        let input = tensors(&[0.1, 0.2, 0.3, 0.4, 0.5]);

        let out = classify_batches(&classifier, &input, 2, |_| Ok(())).unwrap();
        let failed: Vec<bool> = out.iter().map(Result::is_err).collect();
        assert_eq!(failed, vec![false, false, true, true, false]);
        assert!(out[2].as_ref().unwrap_err().is_frame_local());
    }

    #[test]
    fn callback_error_aborts() {
        let classifier = FirstValue { calls: Cell::new(0), fail_call: None };
        let input = tensors(&[0.1, 0.2, 0.3]);

        let result = classify_batches(&classifier, &input, 1, |_| Err(CoreError::Cancelled));
        assert!(matches!(result, Err(CoreError::Cancelled)));
        assert_eq!(classifier.calls.get(), 1);
    }

    #[test]
    fn noise_is_skipped_when_disabled() {
        let config = crate::config::RunConfigBuilder::new()
            .calibration_noise(None)
            .build()
            .unwrap();
        let classifier = with_calibration_noise(
            FirstValue { calls: Cell::new(0), fail_call: None },
            &config,
        );
        let scores = classifier.infer(&tensors(&[0.25])).unwrap();
        assert!((scores[0] - 0.25).abs() < 1e-6);
    }
}
