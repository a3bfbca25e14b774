//! Frame-wise diagnostic pipeline.
//!
//! The orchestrator sequences the stages of one run, owns the prediction
//! store while it is being filled and applies the failure policy: per-frame
//! errors drop the frame, structural errors end the run in
//! [`RunState::Failed`].

mod orchestrator;
mod progress;
mod robustness;
mod stages;
mod state;

pub use orchestrator::{PipelineOrchestrator, RunReport};
pub use progress::{CancellationToken, NoopObserver, ProgressObserver};
pub use robustness::{ROBUSTNESS_FILE, RobustnessReport, robustness_pass};
pub use stages::{
    FrameFailure, PersistedRun, PreparedFrame, ScoredFrame, StageOutput, build_store,
    classify_frames, extract_frames, invalidate_previous_run, persist_run, preprocess_frames,
    score_frames,
};
pub use state::RunState;

use crate::error::CoreError;

use std::fmt;

/// A fatal pipeline error with the stage it occurred in.
#[derive(Debug)]
pub struct PipelineFailure {
    pub stage: RunState,
    /// Frame the error refers to, when there is one.
    pub frame: Option<String>,
    pub error: CoreError,
}

impl PipelineFailure {
    pub fn new(stage: RunState, error: CoreError) -> Self {
        Self {
            stage,
            frame: error.frame().map(str::to_string),
            error,
        }
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline failed during {}", self.stage)?;
        if let Some(frame) = &self.frame {
            write!(f, " at {frame}")?;
        }
        write!(f, ": {}", self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<PipelineFailure> for CoreError {
    fn from(failure: PipelineFailure) -> Self {
        failure.error
    }
}
