//! Run-level reporting.
//!
//! The summary is computed once from a finalized prediction table and written
//! next to the store as text and JSON.

pub mod summary;

pub use summary::{RiskLevel, RunSummary};

use crate::config::ArtifactLayout;
use crate::error::CoreResult;
use crate::store::PredictionRow;

use std::fs;
use std::path::PathBuf;

/// Writes `summary.txt` and `summary.json` to the outputs location and
/// returns both paths.
pub fn write_summary_files(
    layout: &ArtifactLayout,
    summary: &RunSummary,
    rows: &[PredictionRow],
) -> CoreResult<(PathBuf, PathBuf)> {
    fs::create_dir_all(layout.outputs_dir())?;

    let text_path = layout.summary_text_file();
    fs::write(&text_path, summary.render_text(rows))?;

    let json_path = layout.summary_json_file();
    fs::write(&json_path, serde_json::to_string_pretty(summary)?)?;

    log::debug!(
        "Wrote run summary to {} and {}",
        text_path.display(),
        json_path.display()
    );
    Ok((text_path, json_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::Label;
    use tempfile::tempdir;

    #[test]
    fn summary_files_are_written() {
        let dir = tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        let rows = vec![PredictionRow::new("frame_000000.png", 0.2, Label::Normal)];
        let summary = RunSummary::from_rows(&rows).unwrap();

        let (text, json) = write_summary_files(&layout, &summary, &rows).unwrap();
        assert!(fs::read_to_string(text).unwrap().contains("LOW RISK"));

        let parsed: RunSummary = serde_json::from_str(&fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(parsed, summary);
    }
}
