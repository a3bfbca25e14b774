//! Augmented robustness pass.
//!
//! Every scored frame is preprocessed again with a random (but per-frame
//! reproducible) augmentation and classified. The table compares the
//! canonical and augmented probabilities and flags frames whose label flips.
//! It is a diagnostic side artifact: the prediction store is never touched.

use super::stages::worker_pool;
use crate::classification::{Classifier, classify_batches};
use crate::confidence::Label;
use crate::error::{CoreError, CoreResult};
use crate::frames::FrameArtifact;
use crate::preprocessing::{Preprocessor, Tensor};
use crate::store::PredictionStore;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ROBUSTNESS_FILE: &str = "robustness.csv";

#[derive(Debug, Serialize)]
struct RobustnessRow<'a> {
    #[serde(rename = "Frame")]
    frame: &'a str,
    #[serde(rename = "Canonical_Probability")]
    canonical: f64,
    #[serde(rename = "Augmented_Probability")]
    augmented: f64,
    #[serde(rename = "Label_Flipped")]
    flipped: bool,
}

/// Outcome of the robustness pass.
#[derive(Debug, Clone)]
pub struct RobustnessReport {
    pub path: PathBuf,
    /// Frames with both a canonical and an augmented score.
    pub evaluated: usize,
    /// Frames whose label differs between the two passes.
    pub flipped: usize,
}

/// Re-scores the frames of `store` under augmentation and writes the
/// comparison table to `out_dir`.
pub fn robustness_pass<C: Classifier + ?Sized>(
    preprocessor: &Preprocessor,
    classifier: &C,
    frames: &[FrameArtifact],
    store: &PredictionStore,
    batch_size: usize,
    workers: usize,
    out_dir: &Path,
) -> CoreResult<RobustnessReport> {
    let scored: Vec<&FrameArtifact> = frames
        .iter()
        .filter(|frame| store.get(&frame.identifier).is_some())
        .collect();

    let augmented: Vec<(&FrameArtifact, CoreResult<Tensor>)> = worker_pool(workers)?.install(|| {
        scored
            .par_iter()
            .map(|frame| (*frame, preprocessor.preprocess(frame, true)))
            .collect()
    });

    let mut kept = Vec::with_capacity(augmented.len());
    let mut tensors = Vec::with_capacity(augmented.len());
    for (frame, tensor) in augmented {
        match tensor {
            Ok(tensor) => {
                kept.push(frame);
                tensors.push(tensor);
            }
            Err(e) => warn!("Robustness pass skips {}: {}", frame.identifier, e),
        }
    }

    let scores = classify_batches(classifier, &tensors, batch_size, |_| Ok(()))?;

    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(ROBUSTNESS_FILE);
    let mut writer = csv::Writer::from_path(&path)?;
    let mut evaluated = 0;
    let mut flipped = 0;

    for (frame, score) in kept.into_iter().zip(scores) {
        let augmented = match score {
            Ok(p) if (0.0..=1.0).contains(&p) => p,
            Ok(p) => {
                warn!("Robustness pass skips {}: invalid probability {}", frame.identifier, p);
                continue;
            }
            Err(e) => {
                warn!("Robustness pass skips {}: {}", frame.identifier, e);
                continue;
            }
        };
        let canonical = store
            .get(&frame.identifier)
            .ok_or_else(|| CoreError::OperationFailed(format!("{} not in store", frame.identifier)))?;

        let is_flipped = Label::from_probability(augmented) != canonical.label;
        evaluated += 1;
        if is_flipped {
            flipped += 1;
        }
        writer.serialize(RobustnessRow {
            frame: &frame.identifier,
            canonical: canonical.probability,
            augmented,
            flipped: is_flipped,
        })?;
    }
    writer.flush()?;

    info!(
        "Robustness pass: {} of {} frames change label under augmentation",
        flipped, evaluated
    );
    Ok(RobustnessReport {
        path,
        evaluated,
        flipped,
    })
}
