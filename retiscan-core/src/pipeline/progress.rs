//! Cancellation and progress hooks.
//!
//! The orchestrator never prints. Front ends observe a run through the
//! `ProgressObserver` trait and stop it through a `CancellationToken`.

use super::RunState;
use crate::error::CoreError;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag checked between frames and between classifier batches.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives run progress. Every method has a no-op default.
///
/// Methods may be called from worker threads during the preprocessing stage.
pub trait ProgressObserver: Sync {
    /// A stage begins working on `total` units (frames or tensors).
    fn stage_started(&self, _stage: RunState, _total: usize) {}

    /// `count` more units of the current stage are done.
    fn advance(&self, _stage: RunState, _count: usize) {}

    fn stage_finished(&self, _stage: RunState) {}

    /// A frame was excluded after a recoverable error.
    fn frame_skipped(&self, _stage: RunState, _frame: &str, _error: &CoreError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}
