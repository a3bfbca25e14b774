//! Probability calculation breakdown table.
//!
//! One row per frame spelling out how the verdict was reached: raw model
//! output, threshold, comparison, decision, confidence score and level, and
//! the explanation line.

use super::{RenderContext, Renderer};
use crate::confidence::{DECISION_THRESHOLD, Verdict};
use crate::error::CoreResult;

use serde::Serialize;
use std::fs;
use std::path::PathBuf;

pub const BREAKDOWN_FILE: &str = "probability_calculation_breakdown.csv";

#[derive(Debug, Serialize)]
struct BreakdownRow<'a> {
    #[serde(rename = "Frame")]
    frame: &'a str,
    #[serde(rename = "Step_1_Model_Output")]
    model_output: f64,
    #[serde(rename = "Step_2_Threshold")]
    threshold: f64,
    #[serde(rename = "Step_3_Comparison")]
    comparison: String,
    #[serde(rename = "Step_4_Decision")]
    decision: &'static str,
    #[serde(rename = "Confidence_Score")]
    confidence_score: f64,
    #[serde(rename = "Confidence_Level")]
    confidence_level: &'static str,
    #[serde(rename = "Math_Explanation")]
    explanation: String,
}

pub struct ProbabilityBreakdownRenderer;

impl Renderer for ProbabilityBreakdownRenderer {
    fn name(&self) -> &'static str {
        "probability-breakdown"
    }

    fn render(&self, ctx: &RenderContext) -> CoreResult<Vec<PathBuf>> {
        let dir = ctx.layout.outputs_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join(BREAKDOWN_FILE);

        let mut writer = csv::Writer::from_path(&path)?;
        for row in &ctx.rows {
            // Recomputed from the stored probability; the stored label must agree.
            let verdict = Verdict::from_probability(&row.frame, row.probability)?;
            if verdict.label != row.prediction {
                log::warn!(
                    "Stored prediction {} for {} disagrees with probability {:.4}",
                    row.prediction,
                    row.frame,
                    row.probability
                );
            }
            writer.serialize(BreakdownRow {
                frame: &row.frame,
                model_output: row.probability,
                threshold: DECISION_THRESHOLD,
                comparison: verdict.comparison(),
                decision: verdict.label.as_str(),
                confidence_score: verdict.confidence_score,
                confidence_level: verdict.confidence_level.describe(),
                explanation: verdict.explanation(),
            })?;
        }
        writer.flush()?;
        Ok(vec![path])
    }
}
