//! Run state machine.
//!
//! `Init -> Extracting -> Preprocessing -> Classifying -> Scoring -> Finalized`,
//! with `Failed` reachable from every non-terminal state. Transitions only move
//! forward by one step; a state is never re-entered.

use crate::error::{CoreError, CoreResult};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Init,
    Extracting,
    Preprocessing,
    Classifying,
    Scoring,
    Finalized,
    Failed,
}

impl RunState {
    /// The state following `self` on the success path.
    pub fn successor(self) -> Option<RunState> {
        match self {
            RunState::Init => Some(RunState::Extracting),
            RunState::Extracting => Some(RunState::Preprocessing),
            RunState::Preprocessing => Some(RunState::Classifying),
            RunState::Classifying => Some(RunState::Scoring),
            RunState::Scoring => Some(RunState::Finalized),
            RunState::Finalized | RunState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Finalized | RunState::Failed)
    }

    /// Moves to `next`, rejecting skips, backward moves and re-entry.
    pub fn advance(self, next: RunState) -> CoreResult<RunState> {
        let allowed = if next == RunState::Failed {
            !self.is_terminal()
        } else {
            self.successor() == Some(next)
        };
        if allowed {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "Init",
            RunState::Extracting => "Extracting",
            RunState::Preprocessing => "Preprocessing",
            RunState::Classifying => "Classifying",
            RunState::Scoring => "Scoring",
            RunState::Finalized => "Finalized",
            RunState::Failed => "Failed",
        };
        f.write_str(name)
    }
}
