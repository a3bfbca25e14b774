// ============================================================================
// retiscan-core/src/confidence.rs
// ============================================================================
//
// CONFIDENCE ENGINE: Raw Score to Explainable Verdict
//
// A pure mapping from one raw classifier probability to a structured verdict:
// binary label against the fixed 0.5 threshold (ties count as diseased), a
// confidence score measuring the distance from the threshold, a four-level
// confidence bucket and a one-line explanation. The explanation format is
// consumed by downstream report tooling and must not change.

use crate::error::{CoreError, CoreResult};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decision threshold on the raw probability.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Tolerance applied at bucket boundaries so that scores landing a rounding
/// error short of a boundary (0.7 gives 0.3999999999999999) fall into the
/// bucket the boundary opens.
const BUCKET_EPSILON: f64 = 1e-12;

/// Binary classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Normal,
    Diseased,
}

impl Label {
    /// Applies the decision threshold. Ties are diseased.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= DECISION_THRESHOLD {
            Label::Diseased
        } else {
            Label::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Normal => "Normal",
            Label::Diseased => "Diseased",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(Label::Normal),
            "Diseased" => Ok(Label::Diseased),
            other => Err(CoreError::OperationFailed(format!(
                "unknown prediction label '{other}'"
            ))),
        }
    }
}

/// Coarse confidence bucket over half-open intervals of the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    /// Below 0.4.
    Low,
    /// [0.4, 0.6)
    Medium,
    /// [0.6, 0.8)
    High,
    /// 0.8 and above.
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score + BUCKET_EPSILON >= 0.8 {
            ConfidenceLevel::VeryHigh
        } else if score + BUCKET_EPSILON >= 0.6 {
            ConfidenceLevel::High
        } else if score + BUCKET_EPSILON >= 0.4 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::High => "High",
            ConfidenceLevel::VeryHigh => "Very High",
        }
    }

    /// Level name with its score range, as shown in reports.
    pub fn describe(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "Low (<40%)",
            ConfidenceLevel::Medium => "Medium (40-60%)",
            ConfidenceLevel::High => "High (60-80%)",
            ConfidenceLevel::VeryHigh => "Very High (>=80%)",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distance of `probability` from the threshold, rescaled to [0, 1].
pub fn confidence_score(probability: f64) -> f64 {
    (probability - DECISION_THRESHOLD).abs() * 2.0
}

/// The per-frame verdict stored in the prediction store.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub frame_identifier: String,
    pub probability: f64,
    pub label: Label,
    pub confidence_score: f64,
    pub confidence_level: ConfidenceLevel,
}

impl Verdict {
    /// Derives the verdict for one raw score.
    ///
    /// Fails with [`CoreError::InvalidProbability`] when `probability` is not a
    /// finite value in [0, 1].
    pub fn from_probability(frame_identifier: impl Into<String>, probability: f64) -> CoreResult<Self> {
        let frame_identifier = frame_identifier.into();
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(CoreError::InvalidProbability {
                frame: frame_identifier,
                value: probability,
            });
        }

        let confidence_score = confidence_score(probability);
        Ok(Self {
            frame_identifier,
            probability,
            label: Label::from_probability(probability),
            confidence_score,
            confidence_level: ConfidenceLevel::from_score(confidence_score),
        })
    }

    /// `"0.7300 >= 0.5"` or `"0.1000 < 0.5"`.
    pub fn comparison(&self) -> String {
        let op = if self.label == Label::Diseased { ">=" } else { "<" };
        format!("{:.4} {op} {DECISION_THRESHOLD}", self.probability)
    }

    pub fn explanation(&self) -> String {
        format!(
            "Model Output: {:.4} → Compare with {DECISION_THRESHOLD} → {} (Confidence: {:.1}%)",
            self.probability,
            self.label,
            self.confidence_score * 100.0
        )
    }
}
