// ============================================================================
// retiscan-core/src/rendering/mod.rs
// ============================================================================
//
// RENDERING: Downstream Consumers of the Prediction Store
//
// Renderers read the finalized prediction table from disk and produce report
// artifacts in the outputs location. They never write back into the pipeline.
// A renderer failing (or missing an optional input such as a heatmap) is
// logged and skipped so the remaining renderers still run; only a store that
// cannot be loaded, or that has the wrong schema, stops rendering.
//
// KEY COMPONENTS:
// - Renderer: Trait implemented by every artifact producer
// - RenderContext: Loaded store rows plus artifact locations
// - render_all: Runs a set of renderers and collects a report

mod breakdown;
mod frame_list;
mod heatmap;
mod summary;

pub use breakdown::{BREAKDOWN_FILE, ProbabilityBreakdownRenderer};
pub use frame_list::{FRAME_LIST_FILE, FrameClassificationRenderer};
pub use heatmap::{HEATMAP_INTENSITY_FILE, HeatmapIntensityRenderer, mean_intensity};
pub use summary::SummaryRenderer;

// ---- Internal crate imports ----
use crate::config::ArtifactLayout;
use crate::error::CoreResult;
use crate::store::{PredictionRow, load_predictions};

// ---- External crate imports ----
use log::{debug, warn};

// ---- Standard library imports ----
use std::path::PathBuf;

/// Everything a renderer may read.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub layout: ArtifactLayout,
    /// Store rows in frame order.
    pub rows: Vec<PredictionRow>,
}

impl RenderContext {
    pub fn new(layout: ArtifactLayout, rows: Vec<PredictionRow>) -> Self {
        Self { layout, rows }
    }

    /// Loads the on-disk prediction table of `layout`.
    pub fn load(layout: ArtifactLayout) -> CoreResult<Self> {
        let rows = load_predictions(&layout.predictions_file())?;
        debug!("Loaded {} predictions for rendering", rows.len());
        Ok(Self { layout, rows })
    }
}

/// Produces report artifacts from the prediction table.
pub trait Renderer {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Writes the renderer's artifacts and returns their paths.
    fn render(&self, ctx: &RenderContext) -> CoreResult<Vec<PathBuf>>;
}

/// Outcome of [`render_all`].
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Artifacts written, in renderer order.
    pub written: Vec<PathBuf>,
    /// Renderers that failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl RenderReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The text and table renderers shipped with the crate.
pub fn default_renderers() -> Vec<Box<dyn Renderer>> {
    let mut renderers: Vec<Box<dyn Renderer>> = vec![Box::new(SummaryRenderer)];
    renderers.extend(report_renderers());
    renderers
}

/// The per-frame reports. A finished run has already written its summary,
/// so only these are rendered after it.
pub fn report_renderers() -> Vec<Box<dyn Renderer>> {
    vec![
        Box::new(FrameClassificationRenderer),
        Box::new(ProbabilityBreakdownRenderer),
        Box::new(HeatmapIntensityRenderer),
    ]
}

/// Runs every renderer against `ctx`. Failures are logged and recorded; they
/// do not stop the remaining renderers.
pub fn render_all(ctx: &RenderContext, renderers: &[Box<dyn Renderer>]) -> RenderReport {
    let mut report = RenderReport::default();
    for renderer in renderers {
        match renderer.render(ctx) {
            Ok(paths) => {
                debug!("Renderer '{}' wrote {} artifact(s)", renderer.name(), paths.len());
                report.written.extend(paths);
            }
            Err(e) => {
                warn!("Renderer '{}' failed: {}", renderer.name(), e);
                report.failed.push((renderer.name().to_string(), e.to_string()));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::Label;
    use crate::error::CoreError;
    use std::fs;
    use tempfile::tempdir;

    struct Failing;

    impl Renderer for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn render(&self, _: &RenderContext) -> CoreResult<Vec<PathBuf>> {
            Err(CoreError::OperationFailed("disk full".into()))
        }
    }

    #[test]
    fn failing_renderer_does_not_stop_the_others() {
        let dir = tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        let ctx = RenderContext::new(
            layout,
            vec![PredictionRow::new("frame_000000.png", 0.8, Label::Diseased)],
        );
        let renderers: Vec<Box<dyn Renderer>> =
            vec![Box::new(Failing), Box::new(FrameClassificationRenderer)];

        let report = render_all(&ctx, &renderers);
        assert!(!report.is_complete());
        assert_eq!(report.failed[0].0, "failing");
        assert_eq!(report.written.len(), 1);
        assert!(report.written[0].exists());
    }

    #[test]
    fn per_frame_reports_leave_summary_untouched() {
        let dir = tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        fs::create_dir_all(layout.outputs_dir()).unwrap();
        fs::write(layout.summary_text_file(), "finalized summary").unwrap();
        let ctx = RenderContext::new(
            layout.clone(),
            vec![
                PredictionRow::new("frame_000000.png", 0.2, Label::Normal),
                PredictionRow::new("frame_000001.png", 0.9, Label::Diseased),
            ],
        );

        let renderers = report_renderers();
        assert!(renderers.iter().all(|r| r.name() != "summary"));
        let report = render_all(&ctx, &renderers);
        assert!(report.is_complete());
        assert!(!report.written.contains(&layout.summary_text_file()));
        assert!(!layout.summary_json_file().exists());
        assert_eq!(fs::read_to_string(layout.summary_text_file()).unwrap(), "finalized summary");
        assert_eq!(default_renderers().len(), renderers.len() + 1);
    }

    #[test]
    fn missing_store_fails_to_load() {
        let dir = tempdir().unwrap();
        let result = RenderContext::load(ArtifactLayout::new(dir.path()));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
