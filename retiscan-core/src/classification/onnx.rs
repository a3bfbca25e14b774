// ============================================================================
// retiscan-core/src/classification/onnx.rs
// ============================================================================
//
// ONNX BACKEND: tract-onnx Implementation of the Classifier Trait
//
// Loads a binary fundus classifier exported to ONNX (sigmoid head, one output
// value) and runs it once per tensor with a batch dimension of 1. Models with
// a two-class softmax head are accepted as well; the second class is taken as
// the disease likelihood.

use super::Classifier;
use crate::error::{CoreError, CoreResult};
use crate::preprocessing::{Tensor, TensorShape};

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tract_onnx::prelude::{
    DatumExt, Framework, InferenceModelExt, IntoTValue, TractResult, TypedModel,
    TypedRunnableModel, tvec,
};

/// Memory layout the model expects for its image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputLayout {
    /// `[batch, height, width, channels]` (Keras exports).
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]` (PyTorch exports).
    Nchw,
}

impl InputLayout {
    fn dims(self, shape: TensorShape) -> [usize; 4] {
        let (h, w, c) = (
            shape.height as usize,
            shape.width as usize,
            shape.channels as usize,
        );
        match self {
            InputLayout::Nhwc => [1, h, w, c],
            InputLayout::Nchw => [1, c, h, w],
        }
    }
}

impl fmt::Display for InputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputLayout::Nhwc => write!(f, "nhwc"),
            InputLayout::Nchw => write!(f, "nchw"),
        }
    }
}

impl FromStr for InputLayout {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nhwc" => Ok(InputLayout::Nhwc),
            "nchw" => Ok(InputLayout::Nchw),
            other => Err(CoreError::Config(format!(
                "unknown input layout '{other}' (expected nhwc or nchw)"
            ))),
        }
    }
}

/// Classifier backed by an optimized tract plan.
pub struct OnnxClassifier {
    model: TypedRunnableModel<TypedModel>,
    shape: TensorShape,
    layout: InputLayout,
}

impl OnnxClassifier {
    /// Loads and optimizes the model at `path` for inputs of `shape`.
    pub fn load(path: &Path, shape: TensorShape, layout: InputLayout) -> CoreResult<Self> {
        if !path.is_file() {
            return Err(CoreError::PathError(format!(
                "model file not found: {}",
                path.display()
            )));
        }
        log::info!("Loading ONNX model {} ({} input {})", path.display(), layout, shape);

        let model = build_plan(path, layout.dims(shape)).map_err(|e| {
            CoreError::Classifier(format!("failed to load {}: {e:#}", path.display()))
        })?;

        Ok(Self { model, shape, layout })
    }

    fn score(&self, tensor: &Tensor) -> CoreResult<f64> {
        if tensor.shape() != self.shape {
            return Err(CoreError::Classifier(format!(
                "tensor shape {} does not match model input {}",
                tensor.shape(),
                self.shape
            )));
        }

        let data = match self.layout {
            InputLayout::Nhwc => tensor.as_slice().to_vec(),
            InputLayout::Nchw => tensor.to_chw(),
        };
        let input = tract_onnx::prelude::Tensor::from_shape(&self.layout.dims(self.shape), &data)
            .map_err(|e| CoreError::Classifier(format!("{e:#}")))?;
        let outputs = self
            .model
            .run(tvec!(input.into_tvalue()))
            .map_err(|e| CoreError::Classifier(format!("inference failed: {e:#}")))?;

        let output = outputs
            .first()
            .ok_or_else(|| CoreError::Classifier("model produced no outputs".into()))?;
        let values = output
            .to_array_view::<f32>()
            .map_err(|e| CoreError::Classifier(format!("unexpected output type: {e:#}")))?;
        let values: Vec<f32> = values.iter().copied().collect();

        select_score(&values)
    }
}

fn build_plan(path: &Path, dims: [usize; 4]) -> TractResult<TypedRunnableModel<TypedModel>> {
    let model = tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, f32::fact(dims).into())?
        .into_optimized()?
        .into_runnable()?;
    Ok(model)
}

/// Picks the disease likelihood out of a model's raw output values.
fn select_score(values: &[f32]) -> CoreResult<f64> {
    match values {
        [p] => Ok(f64::from(*p)),
        [_, p] => Ok(f64::from(*p)),
        other => Err(CoreError::Classifier(format!(
            "expected 1 or 2 output values per frame, got {}",
            other.len()
        ))),
    }
}

impl Classifier for OnnxClassifier {
    fn infer(&self, batch: &[Tensor]) -> CoreResult<Vec<f64>> {
        batch.iter().map(|tensor| self.score(tensor)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_dims() {
        let shape = TensorShape { width: 4, height: 2, channels: 3 };
        assert_eq!(InputLayout::Nhwc.dims(shape), [1, 2, 4, 3]);
        assert_eq!(InputLayout::Nchw.dims(shape), [1, 3, 2, 4]);
    }

    #[test]
    fn layout_parses_case_insensitively() {
        assert_eq!("NCHW".parse::<InputLayout>().unwrap(), InputLayout::Nchw);
        assert_eq!("nhwc".parse::<InputLayout>().unwrap(), InputLayout::Nhwc);
        assert!("chw".parse::<InputLayout>().is_err());
    }

    #[test]
    fn sigmoid_and_softmax_heads() {
        assert!((select_score(&[0.25]).unwrap() - 0.25).abs() < 1e-6);
        assert!((select_score(&[0.3, 0.7]).unwrap() - 0.7).abs() < 1e-6);
        assert!(select_score(&[0.1, 0.2, 0.7]).is_err());
        assert!(select_score(&[]).is_err());
    }

    #[test]
    fn missing_model_file_is_reported() {
        let result = OnnxClassifier::load(
            Path::new("/nonexistent/model.onnx"),
            TensorShape::square(224),
            InputLayout::Nhwc,
        );
        assert!(matches!(result, Err(CoreError::PathError(_))));
    }
}
