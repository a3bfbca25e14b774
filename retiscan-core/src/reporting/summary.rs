//! Run summary reporting
//!
//! This module aggregates a finalized prediction table into a `RunSummary`
//! (frame counts, probability statistics, risk bucket) and formats the
//! plain-text summary report.

use std::fmt;
use std::fmt::Write as _;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::confidence::Label;
use crate::error::{CoreError, CoreResult};
use crate::store::PredictionRow;
use crate::utils::format_percentage;

/// Overall risk of a run, derived from the share of diseased frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// `diseased / total > 0.3` is high, any diseased frame is moderate.
    pub fn classify(diseased: usize, total: usize) -> Self {
        // Integer form of diseased / total > 0.3.
        if diseased * 10 > total * 3 {
            RiskLevel::High
        } else if diseased > 0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    /// Two-line recommendation printed at the end of the report.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::High => {
                "HIGH RISK: Multiple diseased frames detected.\n   Immediate consultation with ophthalmologist recommended."
            }
            RiskLevel::Moderate => {
                "MODERATE RISK: Some abnormalities detected.\n   Follow-up examination recommended."
            }
            RiskLevel::Low => {
                "LOW RISK: No significant abnormalities detected.\n   Regular check-ups recommended."
            }
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Moderate => write!(f, "Moderate"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Aggregate statistics of one finalized run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_frames: usize,
    pub diseased_frames: usize,
    pub normal_frames: usize,
    pub mean_probability: f64,
    pub max_probability: f64,
    pub risk: RiskLevel,
    /// Local time the summary was computed, `%Y-%m-%d %H:%M:%S`.
    pub generated_at: String,
}

impl RunSummary {
    /// Aggregates `(probability, label)` pairs.
    ///
    /// Fails with [`CoreError::EmptyRun`] when there is nothing to aggregate.
    pub fn from_records<I>(records: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (f64, Label)>,
    {
        let mut total = 0usize;
        let mut diseased = 0usize;
        let mut sum = 0.0f64;
        let mut max = f64::NEG_INFINITY;

        for (probability, label) in records {
            total += 1;
            if label == Label::Diseased {
                diseased += 1;
            }
            sum += probability;
            max = max.max(probability);
        }

        if total == 0 {
            return Err(CoreError::EmptyRun { extracted: 0 });
        }

        Ok(Self {
            total_frames: total,
            diseased_frames: diseased,
            normal_frames: total - diseased,
            mean_probability: sum / total as f64,
            max_probability: max,
            risk: RiskLevel::classify(diseased, total),
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }

    pub fn from_rows(rows: &[PredictionRow]) -> CoreResult<Self> {
        Self::from_records(rows.iter().map(|row| (row.probability, row.prediction)))
    }

    /// Share of diseased frames in [0, 1].
    pub fn diseased_fraction(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            self.diseased_frames as f64 / self.total_frames as f64
        }
    }

    /// Formats the plain-text summary report with a frame-wise listing of `rows`.
    pub fn render_text(&self, rows: &[PredictionRow]) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "RETINAL DISEASE DETECTION - ANALYSIS SUMMARY");
        let _ = writeln!(out, "Generated: {}", self.generated_at);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);
        let _ = writeln!(out, "OVERVIEW:");
        let _ = writeln!(out, "---------");
        let _ = writeln!(out, "Total Frames Analyzed: {}", self.total_frames);
        let _ = writeln!(
            out,
            "Diseased Frames: {} ({})",
            self.diseased_frames,
            format_percentage(self.diseased_frames, self.total_frames)
        );
        let _ = writeln!(
            out,
            "Normal Frames: {} ({})",
            self.normal_frames,
            format_percentage(self.normal_frames, self.total_frames)
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "STATISTICS:");
        let _ = writeln!(out, "-----------");
        let _ = writeln!(out, "Average Disease Probability: {:.3}", self.mean_probability);
        let _ = writeln!(out, "Maximum Disease Probability: {:.3}", self.max_probability);
        let _ = writeln!(out);
        let _ = writeln!(out, "FRAME-WISE ANALYSIS:");
        let _ = writeln!(out, "-------------------");
        for row in rows {
            let status = match row.prediction {
                Label::Diseased => "DISEASED",
                Label::Normal => "NORMAL",
            };
            let _ = writeln!(out, "{}: {} (Prob: {:.3})", row.frame, status, row.probability);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);
        let _ = writeln!(out, "RECOMMENDATIONS:");
        let _ = writeln!(out, "----------------");
        let _ = writeln!(out, "{}", self.risk.recommendation());
        out
    }
}
