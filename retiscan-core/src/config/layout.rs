//! Named artifact locations shared by the pipeline and its renderers.
//!
//! Every stage reads from and writes to a stable directory under a single
//! workspace root. Locations are created on first use and never deleted, so
//! renderers can be re-run against the artifacts of an earlier run.

use crate::error::{CoreError, CoreResult};

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the canonical prediction store inside [`ArtifactLayout::predictions_dir`].
pub const PREDICTIONS_FILE: &str = "predictions.csv";

/// File names of the run summary artifacts inside [`ArtifactLayout::outputs_dir`].
pub const SUMMARY_TEXT_FILE: &str = "summary.txt";
pub const SUMMARY_JSON_FILE: &str = "summary.json";

/// Directory layout of one retiscan workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decoded video frames (`frame_000000.png`, ...).
    pub fn frames_dir(&self) -> PathBuf {
        self.root.join("data").join("frames")
    }

    /// Optional previews of the resized frames fed to the classifier.
    pub fn preprocessed_dir(&self) -> PathBuf {
        self.root.join("data").join("preprocessed")
    }

    /// Scored output: the canonical prediction store.
    pub fn predictions_dir(&self) -> PathBuf {
        self.root.join("data").join("predictions")
    }

    /// Frames annotated with their verdict by an overlay renderer.
    pub fn annotated_dir(&self) -> PathBuf {
        self.root.join("data").join("annotated_frames")
    }

    /// Per-frame Grad-CAM heatmaps produced by an external explainer.
    pub fn gradcam_dir(&self) -> PathBuf {
        self.root.join("data").join("gradcam_frames")
    }

    /// Heatmaps with highlighted abnormal regions.
    pub fn highlighted_dir(&self) -> PathBuf {
        self.root.join("data").join("highlighted_frames")
    }

    /// Rendered reports, tables and charts.
    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    pub fn predictions_file(&self) -> PathBuf {
        self.predictions_dir().join(PREDICTIONS_FILE)
    }

    pub fn summary_text_file(&self) -> PathBuf {
        self.outputs_dir().join(SUMMARY_TEXT_FILE)
    }

    pub fn summary_json_file(&self) -> PathBuf {
        self.outputs_dir().join(SUMMARY_JSON_FILE)
    }

    /// All locations owned by this layout, in bootstrap order.
    pub fn all_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.frames_dir(),
            self.preprocessed_dir(),
            self.predictions_dir(),
            self.annotated_dir(),
            self.gradcam_dir(),
            self.highlighted_dir(),
            self.outputs_dir(),
        ]
    }

    /// Creates every location that does not exist yet. Existing locations and
    /// their contents are left untouched.
    pub fn bootstrap(&self) -> CoreResult<()> {
        for dir in self.all_dirs() {
            if !dir.is_dir() {
                debug!("Creating artifact location {}", dir.display());
            }
            fs::create_dir_all(&dir).map_err(|e| {
                CoreError::PathError(format!(
                    "Failed to create artifact location '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new(".")
    }
}
