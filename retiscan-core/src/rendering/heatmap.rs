//! Heatmap intensity table.
//!
//! For every stored frame with a Grad-CAM image in the gradcam location, the
//! mean grayscale intensity normalized to [0, 1] is recorded next to the
//! frame's probability and prediction. Frames without a heatmap are skipped.

use super::{RenderContext, Renderer};
use crate::error::CoreResult;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const HEATMAP_INTENSITY_FILE: &str = "heatmap_intensity.csv";

#[derive(Debug, Serialize)]
struct IntensityRow<'a> {
    #[serde(rename = "Frame")]
    frame: &'a str,
    #[serde(rename = "Probability")]
    probability: f64,
    #[serde(rename = "Prediction")]
    prediction: &'static str,
    #[serde(rename = "Heatmap_Intensity")]
    intensity: f64,
}

/// Mean luma of the image at `path`, scaled to [0, 1].
pub fn mean_intensity(path: &Path) -> CoreResult<f64> {
    let gray = image::open(path)?.to_luma8();
    let count = u64::from(gray.width()) * u64::from(gray.height());
    if count == 0 {
        return Ok(0.0);
    }
    let sum: u64 = gray.as_raw().iter().map(|&v| u64::from(v)).sum();
    Ok(sum as f64 / count as f64 / 255.0)
}

pub struct HeatmapIntensityRenderer;

impl Renderer for HeatmapIntensityRenderer {
    fn name(&self) -> &'static str {
        "heatmap-intensity"
    }

    fn render(&self, ctx: &RenderContext) -> CoreResult<Vec<PathBuf>> {
        let gradcam_dir = ctx.layout.gradcam_dir();
        let out_dir = ctx.layout.outputs_dir();
        fs::create_dir_all(&out_dir)?;
        let path = out_dir.join(HEATMAP_INTENSITY_FILE);

        let mut writer = csv::Writer::from_path(&path)?;
        let mut skipped = 0usize;
        for row in &ctx.rows {
            let heatmap = gradcam_dir.join(&row.frame);
            if !heatmap.is_file() {
                skipped += 1;
                continue;
            }
            let intensity = match mean_intensity(&heatmap) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Skipping unreadable heatmap {}: {}", heatmap.display(), e);
                    skipped += 1;
                    continue;
                }
            };
            writer.serialize(IntensityRow {
                frame: &row.frame,
                probability: row.probability,
                prediction: row.prediction.as_str(),
                intensity,
            })?;
        }
        writer.flush()?;

        if skipped > 0 {
            log::info!(
                "{} of {} frames have no usable heatmap in {}",
                skipped,
                ctx.rows.len(),
                gradcam_dir.display()
            );
        }
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::Label;
    use crate::config::ArtifactLayout;
    use crate::store::PredictionRow;
    use image::{GrayImage, Luma};
    use tempfile::tempdir;

    #[test]
    fn uniform_image_intensity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("h.png");
        GrayImage::from_pixel(4, 4, Luma([51])).save(&path).unwrap();
        assert!((mean_intensity(&path).unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn frames_without_heatmaps_are_skipped() {
        let dir = tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        layout.bootstrap().unwrap();
        GrayImage::from_pixel(2, 2, Luma([255]))
            .save(layout.gradcam_dir().join("frame_000001.png"))
            .unwrap();

        let ctx = RenderContext::new(
            layout,
            vec![
                PredictionRow::new("frame_000000.png", 0.3, Label::Normal),
                PredictionRow::new("frame_000001.png", 0.9, Label::Diseased),
            ],
        );
        let paths = HeatmapIntensityRenderer.render(&ctx).unwrap();

        let mut reader = csv::Reader::from_path(&paths[0]).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][0], "frame_000001.png");
        assert_eq!(&records[0][3], "1.0");
    }
}
