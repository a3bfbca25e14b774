// ============================================================================
// retiscan-core/src/pipeline/orchestrator.rs
// ============================================================================
//
// PIPELINE ORCHESTRATOR: Stage Sequencing and Failure Policy
//
// One orchestrator drives one run:
//
//   Init -> Extracting -> Preprocessing -> Classifying -> Scoring -> Finalized
//
// Any structural error moves the run to Failed and is returned as a
// `PipelineFailure`. The prediction store is only published on the
// orchestrator after it has been finalized and written to disk, so a failed
// run never exposes a partially populated store. Once extraction has started,
// a failure also clears the store and summaries an earlier run left behind.

// ---- Internal crate imports ----
use super::progress::{CancellationToken, NoopObserver, ProgressObserver};
use super::robustness::{RobustnessReport, robustness_pass};
use super::stages::{
    FrameFailure, build_store, classify_frames, extract_frames, invalidate_previous_run,
    persist_run, preprocess_frames, score_frames,
};
use super::state::RunState;
use super::PipelineFailure;
use crate::classification::Classifier;
use crate::config::RunConfig;
use crate::error::{CoreError, CoreResult};
use crate::frames::{FrameArtifact, FrameExtractor};
use crate::preprocessing::Preprocessor;
use crate::reporting::RunSummary;
use crate::store::PredictionStore;

// ---- External crate imports ----
use log::{info, warn};

// ---- Standard library imports ----
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Result of a successful run.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    /// Number of frames the extractor produced.
    pub extracted: usize,
    /// Frames excluded after recoverable errors.
    pub skipped: Vec<FrameFailure>,
    pub store_path: PathBuf,
    pub summary_text: PathBuf,
    pub summary_json: PathBuf,
    /// Present when the augmented robustness pass ran and succeeded.
    pub robustness: Option<RobustnessReport>,
    pub elapsed: Duration,
}

/// Drives one run of the pipeline.
pub struct PipelineOrchestrator<X, C> {
    config: RunConfig,
    extractor: X,
    classifier: C,
    cancel: CancellationToken,
    observer: Box<dyn ProgressObserver>,
    state: RunState,
    store: PredictionStore,
}

impl<X: FrameExtractor, C: Classifier> PipelineOrchestrator<X, C> {
    pub fn new(config: RunConfig, extractor: X, classifier: C) -> Self {
        Self {
            config,
            extractor,
            classifier,
            cancel: CancellationToken::new(),
            observer: Box::new(NoopObserver),
            state: RunState::Init,
            store: PredictionStore::new(),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The prediction store. Empty until the run has been finalized.
    pub fn store(&self) -> &PredictionStore {
        &self.store
    }

    fn transition(&mut self, next: RunState) -> Result<(), PipelineFailure> {
        match self.state.advance(next) {
            Ok(state) => {
                info!("Stage: {}", state);
                self.state = state;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, error: CoreError) -> PipelineFailure {
        let failure = PipelineFailure::new(self.state, error);
        if self.state.is_terminal() {
            return failure;
        }
        if self.state != RunState::Init {
            if let Err(e) = invalidate_previous_run(&self.config.layout) {
                warn!("Failed to clear artifacts of the previous run: {}", e);
            }
        }
        self.state = RunState::Failed;
        failure
    }

    fn check_cancelled(&mut self) -> Result<(), PipelineFailure> {
        if self.cancel.is_cancelled() {
            Err(self.fail(CoreError::Cancelled))
        } else {
            Ok(())
        }
    }

    /// Runs every stage against `source`. An orchestrator runs at most once.
    pub fn run(&mut self, source: &Path) -> Result<RunReport, PipelineFailure> {
        let started = Instant::now();
        if self.state != RunState::Init {
            let error = CoreError::InvalidTransition {
                from: self.state.to_string(),
                to: RunState::Extracting.to_string(),
            };
            return Err(PipelineFailure::new(self.state, error));
        }
        if let Err(e) = self.config.validate().and_then(|()| self.config.layout.bootstrap()) {
            return Err(self.fail(e));
        }

        // ---- Extracting ----
        self.transition(RunState::Extracting)?;
        let frames = match extract_frames(&self.extractor, source, &self.config.layout) {
            Ok(frames) if frames.is_empty() => {
                return Err(self.fail(CoreError::SourceUnreadable {
                    path: source.display().to_string(),
                    reason: "no frames decoded".to_string(),
                }));
            }
            Ok(frames) => frames,
            Err(e) => return Err(self.fail(e)),
        };
        let extracted = frames.len();
        self.check_cancelled()?;

        // ---- Preprocessing ----
        self.transition(RunState::Preprocessing)?;
        let preprocessor = Preprocessor::new(self.config.tensor_shape, self.config.seed);
        let preview_dir = self
            .config
            .save_preprocessed
            .then(|| self.config.layout.preprocessed_dir());
        let prepared = preprocess_frames(
            &preprocessor,
            &frames,
            self.config.workers,
            preview_dir.as_deref(),
            &self.cancel,
            self.observer.as_ref(),
        );
        let prepared = match prepared {
            Ok(output) => output,
            Err(e) => return Err(self.fail(e)),
        };
        let mut skipped = prepared.failures;
        self.check_cancelled()?;

        // ---- Classifying ----
        self.transition(RunState::Classifying)?;
        let classified = classify_frames(
            &self.classifier,
            prepared.items,
            self.config.batch_size,
            &self.cancel,
            self.observer.as_ref(),
        );
        let classified = match classified {
            Ok(output) => output,
            Err(e) => return Err(self.fail(e)),
        };
        skipped.extend(classified.failures);
        self.check_cancelled()?;

        // ---- Scoring ----
        self.transition(RunState::Scoring)?;
        let scored = score_frames(&classified.items, self.observer.as_ref());
        skipped.extend(scored.failures);

        let store = match build_store(scored.items, extracted) {
            Ok(store) => store,
            Err(e) => return Err(self.fail(e)),
        };
        let persisted = match persist_run(&store, &self.config.layout) {
            Ok(persisted) => persisted,
            Err(e) => return Err(self.fail(e)),
        };
        let summary = match store.summary() {
            Some(summary) => summary.clone(),
            None => return Err(self.fail(CoreError::StoreNotFinalized)),
        };
        self.store = store;
        self.transition(RunState::Finalized)?;

        info!(
            "Run finalized: {} of {} frames scored, {} skipped, risk {}",
            summary.total_frames,
            extracted,
            skipped.len(),
            summary.risk
        );

        let robustness = if self.config.augment {
            self.run_robustness(&preprocessor, &frames)
        } else {
            None
        };

        Ok(RunReport {
            summary,
            extracted,
            skipped,
            store_path: persisted.store_path,
            summary_text: persisted.summary_text,
            summary_json: persisted.summary_json,
            robustness,
            elapsed: started.elapsed(),
        })
    }

    fn run_robustness(
        &self,
        preprocessor: &Preprocessor,
        frames: &[FrameArtifact],
    ) -> Option<RobustnessReport> {
        let result: CoreResult<RobustnessReport> = robustness_pass(
            preprocessor,
            &self.classifier,
            frames,
            &self.store,
            self.config.batch_size,
            self.config.workers,
            &self.config.layout.outputs_dir(),
        );
        match result {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Robustness pass failed: {}", e);
                None
            }
        }
    }
}
