// ============================================================================
// retiscan-cli/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: indicatif bars for pipeline stages
//
// Implements the core `ProgressObserver` with one progress bar per per-frame
// stage. Stages run one after another, so a single slot holds the active bar.
// Bars draw to stderr and are hidden when stderr is not a terminal.

// ---- External crate imports ----
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::debug;
use retiscan_core::CoreError;
use retiscan_core::pipeline::{ProgressObserver, RunState};

// ---- Standard library imports ----
use std::io::IsTerminal;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "    {spinner:.green} {msg:<14} [{bar:40.cyan/blue}] {pos}/{len} frames ({elapsed_precise})";

/// Progress observer drawing indicatif bars.
pub struct CliProgress {
    current: Mutex<Option<ProgressBar>>,
    skipped: AtomicUsize,
    visible: bool,
}

impl CliProgress {
    pub fn new() -> Self {
        Self::with_visibility(std::io::stderr().is_terminal())
    }

    /// A progress observer that never draws; used for tests and pipes.
    pub fn hidden() -> Self {
        Self::with_visibility(false)
    }

    fn with_visibility(visible: bool) -> Self {
        Self {
            current: Mutex::new(None),
            skipped: AtomicUsize::new(0),
            visible,
        }
    }

    /// Frames skipped so far across all stages.
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    fn new_bar(&self, stage: RunState, total: usize) -> ProgressBar {
        let target = if self.visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(total as u64), target);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##.");
        bar.set_style(style);
        bar.set_message(stage.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for CliProgress {
    fn stage_started(&self, stage: RunState, total: usize) {
        debug!("{stage}: {total} frame(s)");
        if let Ok(mut slot) = self.current.lock() {
            if let Some(previous) = slot.take() {
                previous.finish_and_clear();
            }
            *slot = Some(self.new_bar(stage, total));
        }
    }

    fn advance(&self, _stage: RunState, count: usize) {
        if let Ok(slot) = self.current.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.inc(count as u64);
            }
        }
    }

    fn stage_finished(&self, stage: RunState) {
        if let Ok(mut slot) = self.current.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
        debug!("{stage}: finished");
    }

    fn frame_skipped(&self, stage: RunState, frame: &str, error: &CoreError) {
        let total = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(slot) = self.current.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_message(format!("{stage} ({total} skipped)"));
            }
        }
        debug!("{frame} skipped during {stage}: {error}");
    }
}
