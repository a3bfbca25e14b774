// ============================================================================
// retiscan-core/src/pipeline/stages.rs
// ============================================================================
//
// PIPELINE STAGES: Standalone Stage Functions over Typed Values
//
// Each stage of a run is a plain function: it takes the output of the
// previous stage and returns its own, so a stage can be re-run in isolation
// with identical inputs and a fixed seed. Frame-local errors are returned as
// `FrameFailure` values alongside the surviving frames; structural errors are
// returned as `Err` and end the run.

// ---- Internal crate imports ----
use super::progress::{CancellationToken, ProgressObserver};
use super::state::RunState;
use crate::classification::{Classifier, classify_batches};
use crate::config::ArtifactLayout;
use crate::confidence::Verdict;
use crate::error::{CoreError, CoreResult};
use crate::frames::{FrameArtifact, FrameExtractor};
use crate::preprocessing::{Preprocessor, Tensor, save_preview};
use crate::reporting::write_summary_files;
use crate::store::{PredictionStore, write_rows};

// ---- External crate imports ----
use log::{debug, info, warn};
use rayon::prelude::*;

// ---- Standard library imports ----
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A frame excluded from the run after a recoverable error.
#[derive(Debug)]
pub struct FrameFailure {
    pub frame: String,
    pub stage: RunState,
    pub error: CoreError,
}

/// A frame together with its canonical tensor.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    pub frame: FrameArtifact,
    pub tensor: Tensor,
}

/// A frame together with its raw classifier score.
#[derive(Debug, Clone)]
pub struct ScoredFrame {
    pub frame: FrameArtifact,
    pub probability: f64,
}

/// Surviving outputs of a per-frame stage plus the frames it dropped.
#[derive(Debug)]
pub struct StageOutput<T> {
    pub items: Vec<T>,
    pub failures: Vec<FrameFailure>,
}

/// Locations written when a run is persisted.
#[derive(Debug, Clone)]
pub struct PersistedRun {
    pub store_path: PathBuf,
    pub summary_text: PathBuf,
    pub summary_json: PathBuf,
}

fn record_failure(
    observer: &dyn ProgressObserver,
    stage: RunState,
    frame: &str,
    error: CoreError,
) -> FrameFailure {
    warn!("Skipping {} during {}: {}", frame, stage, error);
    observer.frame_skipped(stage, frame, &error);
    FrameFailure {
        frame: frame.to_string(),
        stage,
        error,
    }
}

/// Thread pool bounding per-frame work to `workers` threads.
pub(crate) fn worker_pool(workers: usize) -> CoreResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| CoreError::OperationFailed(format!("Failed to build worker pool: {e}")))
}

/// Decodes `source` into frame artifacts in the frames location.
pub fn extract_frames<X: FrameExtractor + ?Sized>(
    extractor: &X,
    source: &Path,
    layout: &ArtifactLayout,
) -> CoreResult<Vec<FrameArtifact>> {
    let frames_dir = layout.frames_dir();
    std::fs::create_dir_all(&frames_dir)?;
    let frames = extractor.extract(source, &frames_dir)?;
    info!("Extracted {} frames from {}", frames.len(), source.display());
    Ok(frames)
}

/// Runs the preprocessor over every frame on a pool of at most `workers`
/// threads. Output keeps frame order.
///
/// When `preview_dir` is set, the resized frame is also written there; a
/// preview that cannot be written is logged and does not drop the frame.
pub fn preprocess_frames(
    preprocessor: &Preprocessor,
    frames: &[FrameArtifact],
    workers: usize,
    preview_dir: Option<&Path>,
    cancel: &CancellationToken,
    observer: &dyn ProgressObserver,
) -> CoreResult<StageOutput<PreparedFrame>> {
    let pool = worker_pool(workers)?;

    observer.stage_started(RunState::Preprocessing, frames.len());
    debug!("Preprocessing {} frames on {} workers", frames.len(), workers);

    let results: Vec<CoreResult<Tensor>> = pool.install(|| {
        frames
            .par_iter()
            .map(|frame| {
                if cancel.is_cancelled() {
                    return Err(CoreError::Cancelled);
                }
                let tensor = preprocessor.preprocess(frame, false);
                if let (Ok(tensor), Some(dir)) = (&tensor, preview_dir) {
                    if let Err(e) = save_preview(tensor, dir, &frame.identifier) {
                        warn!("Could not write preview for {}: {}", frame.identifier, e);
                    }
                }
                observer.advance(RunState::Preprocessing, 1);
                tensor
            })
            .collect()
    });

    if cancel.is_cancelled() {
        return Err(CoreError::Cancelled);
    }

    let mut output = StageOutput {
        items: Vec::with_capacity(frames.len()),
        failures: Vec::new(),
    };
    for (frame, result) in frames.iter().zip(results) {
        match result {
            Ok(tensor) => output.items.push(PreparedFrame {
                frame: frame.clone(),
                tensor,
            }),
            Err(e) if e.is_frame_local() => output.failures.push(record_failure(
                observer,
                RunState::Preprocessing,
                &frame.identifier,
                e,
            )),
            Err(e) => return Err(e),
        }
    }

    observer.stage_finished(RunState::Preprocessing);
    Ok(output)
}

/// Scores prepared frames in batches of `batch_size`. A failing batch drops
/// only its own frames.
pub fn classify_frames<C: Classifier + ?Sized>(
    classifier: &C,
    prepared: Vec<PreparedFrame>,
    batch_size: usize,
    cancel: &CancellationToken,
    observer: &dyn ProgressObserver,
) -> CoreResult<StageOutput<ScoredFrame>> {
    observer.stage_started(RunState::Classifying, prepared.len());

    let tensors: Vec<Tensor> = prepared.iter().map(|p| p.tensor.clone()).collect();
    let mut reported = 0;
    let scores = classify_batches(classifier, &tensors, batch_size, |done| {
        observer.advance(RunState::Classifying, done - reported);
        reported = done;
        if cancel.is_cancelled() {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    })?;

    let mut output = StageOutput {
        items: Vec::with_capacity(prepared.len()),
        failures: Vec::new(),
    };
    for (prepared, score) in prepared.into_iter().zip(scores) {
        match score {
            Ok(probability) => output.items.push(ScoredFrame {
                frame: prepared.frame,
                probability,
            }),
            Err(e) => output.failures.push(record_failure(
                observer,
                RunState::Classifying,
                &prepared.frame.identifier,
                e,
            )),
        }
    }

    observer.stage_finished(RunState::Classifying);
    Ok(output)
}

/// Turns raw scores into verdicts. Scores outside [0, 1] drop their frame.
pub fn score_frames(
    scored: &[ScoredFrame],
    observer: &dyn ProgressObserver,
) -> StageOutput<Verdict> {
    let mut output = StageOutput {
        items: Vec::with_capacity(scored.len()),
        failures: Vec::new(),
    };
    for item in scored {
        match Verdict::from_probability(&item.frame.identifier, item.probability) {
            Ok(verdict) => output.items.push(verdict),
            Err(e) => output.failures.push(record_failure(
                observer,
                RunState::Scoring,
                &item.frame.identifier,
                e,
            )),
        }
    }
    output
}

/// Inserts `verdicts` into a fresh store and finalizes it.
///
/// Fails with [`CoreError::DuplicateFrame`] on a repeated identifier and with
/// [`CoreError::EmptyRun`] when `verdicts` is empty.
pub fn build_store(verdicts: Vec<Verdict>, extracted: usize) -> CoreResult<PredictionStore> {
    let mut store = PredictionStore::new();
    for verdict in verdicts {
        store.put(verdict)?;
    }
    match store.finalize() {
        Ok(_) => Ok(store),
        Err(CoreError::EmptyRun { .. }) => Err(CoreError::EmptyRun { extracted }),
        Err(e) => Err(e),
    }
}

/// Writes the finalized store and its summary artifacts.
pub fn persist_run(store: &PredictionStore, layout: &ArtifactLayout) -> CoreResult<PersistedRun> {
    let summary = store.summary().ok_or(CoreError::StoreNotFinalized)?;
    let store_path = layout.predictions_file();
    store.write_csv(&store_path)?;
    let (summary_text, summary_json) = write_summary_files(layout, summary, &store.rows())?;
    Ok(PersistedRun {
        store_path,
        summary_text,
        summary_json,
    })
}

/// Invalidates what an earlier run left in `layout` once a new run has failed.
///
/// An existing prediction table is atomically replaced by a header-only one and
/// the summary files are removed. Frame and output directories are kept.
pub fn invalidate_previous_run(layout: &ArtifactLayout) -> CoreResult<()> {
    let store_path = layout.predictions_file();
    if store_path.exists() {
        write_rows(&store_path, &[])?;
        info!("Cleared stale prediction store {}", store_path.display());
    }
    for path in [layout.summary_text_file(), layout.summary_json_file()] {
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed stale summary {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
