//! Frame-by-frame classification list.

use super::{RenderContext, Renderer};
use crate::confidence::Label;
use crate::error::CoreResult;
use crate::reporting::RiskLevel;
use crate::utils::format_percentage;

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

pub const FRAME_LIST_FILE: &str = "frame_classification.txt";

pub struct FrameClassificationRenderer;

impl FrameClassificationRenderer {
    fn format(ctx: &RenderContext) -> String {
        let total = ctx.rows.len();
        let diseased = ctx
            .rows
            .iter()
            .filter(|row| row.prediction == Label::Diseased)
            .count();
        let heavy = "=".repeat(70);
        let light = "-".repeat(70);

        let mut out = String::new();
        let _ = writeln!(out, "{heavy}");
        let _ = writeln!(out, "FRAME-BY-FRAME CLASSIFICATION REPORT");
        let _ = writeln!(out, "{heavy}");
        let _ = writeln!(out);
        let _ = writeln!(out, "Total Frames Analyzed: {total}");
        let _ = writeln!(out, "Diseased Frames: {diseased} ({})", format_percentage(diseased, total));
        let _ = writeln!(
            out,
            "Normal Frames: {} ({})",
            total - diseased,
            format_percentage(total - diseased, total)
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "{light}");
        let _ = writeln!(out, "{:<20} {:<15} {:<15} Status", "Frame", "Prediction", "Probability");
        let _ = writeln!(out, "{light}");
        for row in &ctx.rows {
            let status = match row.prediction {
                Label::Diseased => "ALERT",
                Label::Normal => "CLEAR",
            };
            let _ = writeln!(
                out,
                "{:<20} {:<15} {:<15.4} {}",
                row.frame,
                row.prediction.as_str(),
                row.probability,
                status
            );
        }
        let _ = writeln!(out, "{light}");
        let _ = writeln!(out);
        let _ = writeln!(out, "RISK ASSESSMENT:");
        let _ = writeln!(out, "{}", RiskLevel::classify(diseased, total).recommendation());
        out
    }
}

impl Renderer for FrameClassificationRenderer {
    fn name(&self) -> &'static str {
        "frame-classification"
    }

    fn render(&self, ctx: &RenderContext) -> CoreResult<Vec<PathBuf>> {
        let dir = ctx.layout.outputs_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join(FRAME_LIST_FILE);
        fs::write(&path, Self::format(ctx))?;
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArtifactLayout;
    use crate::store::PredictionRow;

    #[test]
    fn lists_every_frame_in_order() {
        let ctx = RenderContext::new(
            ArtifactLayout::new("."),
            vec![
                PredictionRow::new("frame_000000.png", 0.25, Label::Normal),
                PredictionRow::new("frame_000001.png", 0.75, Label::Diseased),
            ],
        );
        let text = FrameClassificationRenderer::format(&ctx);

        let first = text.find("frame_000000.png").unwrap();
        let second = text.find("frame_000001.png").unwrap();
        assert!(first < second);
        assert!(text.contains("Diseased Frames: 1 (50.0%)"));
        assert!(text.contains("0.7500"));
        assert!(text.contains("ALERT"));
        assert!(text.contains("HIGH RISK"));
    }
}
