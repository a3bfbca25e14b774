// ============================================================================
// retiscan-core/src/store.rs
// ============================================================================
//
// PREDICTION STORE: Canonical Per-Frame Verdict Table
//
// The store is the single source of truth shared by the pipeline and every
// renderer. During a run it is owned by the orchestrator and filled one
// verdict at a time; once finalized it is read-only and carries the run
// summary. On disk it is a CSV table with the columns Frame, Probability and
// Prediction, in that order. The file is replaced atomically so a renderer
// never sees a half-written table.
//
// KEY COMPONENTS:
// - PredictionStore: In-memory store with duplicate detection
// - PredictionRow: On-disk row
// - load_predictions: Schema-checked reader used by renderers

// ---- Internal crate imports ----
use crate::confidence::{Label, Verdict};
use crate::error::{CoreError, CoreResult};
use crate::reporting::RunSummary;

// ---- External crate imports ----
use serde::{Deserialize, Serialize, Serializer};
use tempfile::NamedTempFile;

// ---- Standard library imports ----
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;

/// Column names of the on-disk table, in order.
pub const EXPECTED_COLUMNS: [&str; 3] = ["Frame", "Probability", "Prediction"];

/// One row of the on-disk prediction table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    #[serde(rename = "Frame")]
    pub frame: String,
    #[serde(rename = "Probability", serialize_with = "serialize_probability")]
    pub probability: f64,
    #[serde(rename = "Prediction")]
    pub prediction: Label,
}

impl PredictionRow {
    pub fn new(frame: impl Into<String>, probability: f64, prediction: Label) -> Self {
        Self {
            frame: frame.into(),
            probability,
            prediction,
        }
    }
}

impl From<&Verdict> for PredictionRow {
    fn from(verdict: &Verdict) -> Self {
        Self::new(&verdict.frame_identifier, verdict.probability, verdict.label)
    }
}

/// Shortest round-trip representation, padded to at least four decimals.
fn serialize_probability<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let shortest = value.to_string();
    let decimals = shortest.split_once('.').map_or(0, |(_, frac)| frac.len());
    if decimals < 4 {
        serializer.serialize_str(&format!("{value:.4}"))
    } else {
        serializer.serialize_str(&shortest)
    }
}

/// Ordered verdicts of one run, keyed by frame identifier.
#[derive(Debug, Default)]
pub struct PredictionStore {
    verdicts: Vec<Verdict>,
    identifiers: HashSet<String>,
    summary: Option<RunSummary>,
}

impl PredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one verdict.
    ///
    /// Fails with [`CoreError::DuplicateFrame`] when the identifier is already
    /// present and with [`CoreError::StoreFinalized`] after [`finalize`](Self::finalize).
    pub fn put(&mut self, verdict: Verdict) -> CoreResult<()> {
        if self.summary.is_some() {
            return Err(CoreError::StoreFinalized);
        }
        if !self.identifiers.insert(verdict.frame_identifier.clone()) {
            return Err(CoreError::DuplicateFrame(verdict.frame_identifier));
        }
        self.verdicts.push(verdict);
        Ok(())
    }

    /// Freezes the store and computes the run summary.
    ///
    /// Fails with [`CoreError::EmptyRun`] when no verdict was stored; the store
    /// then stays open. Finalizing twice returns the existing summary.
    pub fn finalize(&mut self) -> CoreResult<&RunSummary> {
        if self.summary.is_none() {
            let summary =
                RunSummary::from_records(self.verdicts.iter().map(|v| (v.probability, v.label)))?;
            self.summary = Some(summary);
        }
        self.summary.as_ref().ok_or(CoreError::StoreNotFinalized)
    }

    pub fn is_finalized(&self) -> bool {
        self.summary.is_some()
    }

    /// Verdicts in insertion (frame) order.
    pub fn get_all(&self) -> &[Verdict] {
        &self.verdicts
    }

    pub fn get(&self, frame_identifier: &str) -> Option<&Verdict> {
        self.verdicts
            .iter()
            .find(|v| v.frame_identifier == frame_identifier)
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// The run summary, available once finalized.
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn rows(&self) -> Vec<PredictionRow> {
        self.verdicts.iter().map(PredictionRow::from).collect()
    }

    /// Writes the finalized store to `path`, replacing any earlier table.
    pub fn write_csv(&self, path: &Path) -> CoreResult<()> {
        if !self.is_finalized() {
            return Err(CoreError::StoreNotFinalized);
        }
        write_rows(path, &self.rows())
    }
}

/// Atomically replaces `path` with a table of `rows`.
pub fn write_rows(path: &Path, rows: &[PredictionRow]) -> CoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        // Header is written explicitly so an empty table still carries it.
        writer.write_record(EXPECTED_COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;

    log::debug!("Wrote {} predictions to {}", rows.len(), path.display());
    Ok(())
}

/// Reads a prediction table written by [`PredictionStore::write_csv`].
///
/// Fails with [`CoreError::SchemaMismatch`] when the header is not exactly
/// Frame, Probability, Prediction, and with [`CoreError::DuplicateFrame`]
/// when a frame appears twice.
pub fn load_predictions(path: &Path) -> CoreResult<Vec<PredictionRow>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let actual: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if actual != EXPECTED_COLUMNS {
        return Err(CoreError::SchemaMismatch {
            expected: EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            actual,
        });
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: PredictionRow = record?;
        if !seen.insert(row.frame.clone()) {
            return Err(CoreError::DuplicateFrame(row.frame));
        }
        rows.push(row);
    }
    Ok(rows)
}
