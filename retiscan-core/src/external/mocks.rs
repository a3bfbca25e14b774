// retiscan-core/src/external/mocks.rs

// --- Mocking Infrastructure (for unit tests) ---

use super::*;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::cell::RefCell;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Mock implementation of FfmpegProcess.
pub struct MockFfmpegProcess {
    events: Vec<FfmpegEvent>,
    exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        for event in self.events.drain(..) {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

type SideEffect = Box<dyn Fn()>;

/// Mock spawner that records every command and runs an optional side effect
/// standing in for the files ffmpeg would have written.
#[derive(Default)]
pub struct MockFfmpegSpawner {
    received_calls: RefCell<Vec<String>>,
    exit_code: i32,
    error_lines: Vec<String>,
    side_effect: Option<SideEffect>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every spawned process exit with `code` and emit `errors`.
    pub fn failing(code: i32, errors: &[&str]) -> Self {
        Self {
            exit_code: code,
            error_lines: errors.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_side_effect(mut self, effect: impl Fn() + 'static) -> Self {
        self.side_effect = Some(Box::new(effect));
        self
    }

    pub fn received_calls(&self) -> Vec<String> {
        self.received_calls.borrow().clone()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        self.received_calls.borrow_mut().push(format!("{cmd:?}"));
        if let Some(effect) = &self.side_effect {
            effect();
        }
        Ok(MockFfmpegProcess {
            events: self
                .error_lines
                .iter()
                .cloned()
                .map(FfmpegEvent::Error)
                .collect(),
            // Raw wait status: exit code lives in the high byte.
            exit_status: ExitStatus::from_raw(self.exit_code << 8),
        })
    }
}
