// retiscan-core/tests/rendering_tests.rs

use retiscan_core::config::ArtifactLayout;
use retiscan_core::confidence::Label;
use retiscan_core::error::CoreError;
use retiscan_core::rendering::{
    BREAKDOWN_FILE, FRAME_LIST_FILE, HEATMAP_INTENSITY_FILE, RenderContext, default_renderers,
    render_all,
};
use retiscan_core::store::{PredictionRow, write_rows};
use std::fs;
use tempfile::tempdir;

fn sample_rows() -> Vec<PredictionRow> {
    vec![
        PredictionRow::new("frame_000000.png", 0.12, Label::Normal),
        PredictionRow::new("frame_000001.png", 0.64, Label::Diseased),
        PredictionRow::new("frame_000002.png", 0.31, Label::Normal),
    ]
}

#[test]
fn default_renderers_produce_every_report() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = tempdir()?;
    let layout = ArtifactLayout::new(workspace.path());
    layout.bootstrap()?;
    write_rows(&layout.predictions_file(), &sample_rows())?;
    image::GrayImage::from_pixel(4, 4, image::Luma([128]))
        .save(layout.gradcam_dir().join("frame_000001.png"))?;

    let ctx = RenderContext::load(layout.clone())?;
    let report = render_all(&ctx, &default_renderers());
    assert!(report.is_complete(), "{:?}", report.failed);

    let outputs = layout.outputs_dir();
    for name in ["summary.txt", "summary.json", FRAME_LIST_FILE, BREAKDOWN_FILE, HEATMAP_INTENSITY_FILE] {
        assert!(outputs.join(name).is_file(), "missing {name}");
    }

    let summary = fs::read_to_string(layout.summary_text_file())?;
    assert!(summary.contains("Total Frames Analyzed: 3"));
    assert!(summary.contains("Diseased Frames: 1 (33.3%)"));
    assert!(summary.contains("HIGH RISK"));

    let heatmaps = fs::read_to_string(outputs.join(HEATMAP_INTENSITY_FILE))?;
    assert_eq!(heatmaps.lines().count(), 2);
    assert!(heatmaps.contains("frame_000001.png"));
    Ok(())
}

#[test]
fn store_with_wrong_columns_is_rejected() {
    let workspace = tempdir().unwrap();
    let layout = ArtifactLayout::new(workspace.path());
    layout.bootstrap().unwrap();
    fs::write(
        layout.predictions_file(),
        "Frame,Prediction,Probability\nframe_000000.png,Normal,0.1\n",
    )
    .unwrap();

    match RenderContext::load(layout) {
        Err(CoreError::SchemaMismatch { expected, actual }) => {
            assert_eq!(expected, ["Frame", "Probability", "Prediction"]);
            assert_eq!(actual, ["Frame", "Prediction", "Probability"]);
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn renderers_tolerate_missing_heatmaps() {
    let workspace = tempdir().unwrap();
    let layout = ArtifactLayout::new(workspace.path());
    // Only the predictions location exists; no gradcam frames at all.
    write_rows(&layout.predictions_file(), &sample_rows()).unwrap();

    let ctx = RenderContext::load(layout.clone()).unwrap();
    let report = render_all(&ctx, &default_renderers());
    assert!(report.is_complete(), "{:?}", report.failed);
    assert!(layout.outputs_dir().join(HEATMAP_INTENSITY_FILE).is_file());
}
