// ============================================================================
// retiscan-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for retiscan-core
//
// This module defines the error taxonomy of the diagnostic pipeline. Errors fall
// into two classes:
//
// - Frame-local errors (decode failures, classifier failures for one batch,
//   invalid probabilities) are recovered by the orchestrator: the frame is
//   logged and excluded from the prediction store.
// - Structural errors (unreadable source, duplicate frames, schema mismatches,
//   empty runs) are fatal and terminate the run in the `Failed` state.
//
// KEY COMPONENTS:
// - CoreError: Main error enum
// - CoreResult: Type alias for Result with CoreError
// - Helper functions for command execution errors

// ---- External crate imports ----
use thiserror::Error;

// ---- Standard library imports ----
use std::io;
use std::process::ExitStatus;

/// Custom error type for the retiscan-core library.
#[derive(Error, Debug)]
pub enum CoreError {
    // ---- Structural (fatal) errors ----
    /// The video source could not be opened or yielded no frames.
    #[error("Video source unreadable: {path}: {reason}")]
    SourceUnreadable { path: String, reason: String },

    /// The same frame identifier was inserted twice within one run.
    #[error("Duplicate frame identifier in prediction store: {0}")]
    DuplicateFrame(String),

    /// A persisted prediction store does not carry the canonical columns.
    #[error("Prediction store schema mismatch: expected columns {expected:?}, found {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// No frame survived to the scoring stage.
    #[error("No frames survived to scoring ({extracted} extracted)")]
    EmptyRun { extracted: usize },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Prediction store is finalized and read-only")]
    StoreFinalized,

    #[error("Prediction store has not been finalized")]
    StoreNotFinalized,

    // ---- Frame-local (recoverable) errors ----
    /// A frame artifact could not be decoded into a tensor.
    #[error("Failed to decode frame {frame}: {reason}")]
    Decode { frame: String, reason: String },

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Invalid probability {value} for frame {frame}")]
    InvalidProbability { frame: String, value: f64 },

    // ---- Plumbing ----
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Required external command not found: {0}")]
    DependencyNotFound(String),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Command '{cmd}' failed with status {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl CoreError {
    /// Returns true when the error concerns a single frame and the run can
    /// continue without it.
    #[must_use]
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            CoreError::Decode { .. } | CoreError::Classifier(_) | CoreError::InvalidProbability { .. }
        )
    }

    /// The frame identifier an error refers to, if any.
    #[must_use]
    pub fn frame(&self) -> Option<&str> {
        match self {
            CoreError::Decode { frame, .. } | CoreError::InvalidProbability { frame, .. } => {
                Some(frame)
            }
            CoreError::DuplicateFrame(frame) => Some(frame),
            _ => None,
        }
    }
}

/// Result type for retiscan-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

// ---- Helper functions for command errors ----

pub fn command_start_error(cmd: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), error)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}

pub fn decode_error(frame: impl Into<String>, reason: impl ToString) -> CoreError {
    CoreError::Decode {
        frame: frame.into(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_local_errors_are_recoverable() {
        assert!(decode_error("frame_000001.png", "truncated").is_frame_local());
        assert!(CoreError::Classifier("batch failed".into()).is_frame_local());
        assert!(!CoreError::DuplicateFrame("frame_000001.png".into()).is_frame_local());
        assert!(!CoreError::EmptyRun { extracted: 3 }.is_frame_local());
    }

    #[test]
    fn schema_mismatch_lists_both_column_sets() {
        let err = CoreError::SchemaMismatch {
            expected: vec!["Frame".into(), "Probability".into(), "Prediction".into()],
            actual: vec!["Frame".into(), "Score".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"Prediction\""));
        assert!(msg.contains("\"Score\""));
    }

    #[test]
    fn frame_accessor_reports_offending_identifier() {
        let err = decode_error("frame_000004.png", "bad header");
        assert_eq!(err.frame(), Some("frame_000004.png"));
        assert_eq!(CoreError::Cancelled.frame(), None);
    }
}
