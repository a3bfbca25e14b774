// retiscan-core/tests/common/mod.rs
//
// Shared fixtures: an extractor that writes synthetic frames instead of
// decoding a video, and a classifier that reads the frame index back out of
// the tensor so scores stay attached to the right frame.

#![allow(dead_code)]

use retiscan_core::classification::Classifier;
use retiscan_core::config::{RunConfig, RunConfigBuilder};
use retiscan_core::error::{CoreError, CoreResult};
use retiscan_core::frames::{FrameArtifact, FrameExtractor, frame_identifier};
use retiscan_core::preprocessing::Tensor;
use std::cell::Cell;
use std::fs;
use std::path::Path;

/// Green channel step encoding the frame index.
const INDEX_STEP: u8 = 10;

/// One synthetic frame.
#[derive(Debug, Clone, Copy)]
pub enum FrameSpec {
    Valid,
    /// Bytes that are not an image.
    Corrupt,
}

/// Writes `specs.len()` frames into the frames location; frame `i` is a solid
/// image whose green channel encodes `i`.
pub struct StubExtractor {
    pub specs: Vec<FrameSpec>,
    /// Report the first frame twice.
    pub duplicate_first: bool,
}

impl StubExtractor {
    pub fn valid(count: usize) -> Self {
        Self {
            specs: vec![FrameSpec::Valid; count],
            duplicate_first: false,
        }
    }

    pub fn with_specs(specs: Vec<FrameSpec>) -> Self {
        Self {
            specs,
            duplicate_first: false,
        }
    }
}

impl FrameExtractor for StubExtractor {
    fn extract(&self, _source: &Path, frames_dir: &Path) -> CoreResult<Vec<FrameArtifact>> {
        fs::create_dir_all(frames_dir)?;
        let mut frames = Vec::new();
        for (index, spec) in self.specs.iter().enumerate() {
            let identifier = frame_identifier(index as u64);
            let path = frames_dir.join(&identifier);
            let raw_dimensions = match spec {
                FrameSpec::Valid => {
                    let green = INDEX_STEP * index as u8;
                    image::RgbImage::from_pixel(16, 12, image::Rgb([200, green, 40])).save(&path)?;
                    (16, 12)
                }
                FrameSpec::Corrupt => {
                    fs::write(&path, b"definitely not a png")?;
                    (0, 0)
                }
            };
            frames.push(FrameArtifact {
                order_index: index as u64,
                identifier,
                raw_dimensions,
                path,
            });
        }
        if self.duplicate_first {
            if let Some(first) = frames.first().cloned() {
                frames.push(first);
            }
        }
        Ok(frames)
    }
}

/// Extractor standing in for an unreadable video.
pub struct FailingExtractor;

impl FrameExtractor for FailingExtractor {
    fn extract(&self, source: &Path, _frames_dir: &Path) -> CoreResult<Vec<FrameArtifact>> {
        Err(CoreError::SourceUnreadable {
            path: source.display().to_string(),
            reason: "moov atom not found".to_string(),
        })
    }
}

/// Returns `scores[i]` for the frame with index `i`.
pub struct IndexedClassifier {
    pub scores: Vec<f64>,
    /// Zero-based call number that fails, if any.
    pub fail_call: Option<usize>,
    calls: Cell<usize>,
}

impl IndexedClassifier {
    pub fn new(scores: &[f64]) -> Self {
        Self {
            scores: scores.to_vec(),
            fail_call: None,
            calls: Cell::new(0),
        }
    }

    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_call = Some(call);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

pub fn frame_index(tensor: &Tensor) -> usize {
    let green = (tensor.get(0, 0, 1) * 255.0).round() as usize;
    green / INDEX_STEP as usize
}

impl Classifier for IndexedClassifier {
    fn infer(&self, batch: &[Tensor]) -> CoreResult<Vec<f64>> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.fail_call == Some(call) {
            return Err(CoreError::Classifier("device lost".to_string()));
        }
        batch
            .iter()
            .map(|tensor| {
                let index = frame_index(tensor);
                self.scores
                    .get(index)
                    .copied()
                    .ok_or_else(|| CoreError::Classifier(format!("no score for frame {index}")))
            })
            .collect()
    }
}

/// Deterministic config rooted at `workspace`: small tensors, no noise.
pub fn test_config(workspace: &Path) -> RunConfig {
    RunConfigBuilder::new()
        .workspace(workspace)
        .tensor_size(8)
        .calibration_noise(None)
        .batch_size(2)
        .workers(2)
        .build()
        .expect("valid test config")
}
