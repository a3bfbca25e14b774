// ============================================================================
// retiscan-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with External CLI Tools
//
// This module encapsulates interactions with ffmpeg. It provides trait-based
// abstractions so the frame extractor and video assembler can be tested
// without an ffmpeg binary on the machine.
//
// KEY COMPONENTS:
// - Traits for ffmpeg process interactions (FfmpegSpawner, FfmpegProcess)
// - Concrete implementation using ffmpeg-sidecar
// - Dependency checking

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

#[cfg(all(test, unix))]
pub(crate) mod mocks;

pub use ffmpeg_executor::{
    FfmpegOutcome, FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner,
    run_to_completion,
};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs the command with `-version` and only inspects whether it could be
/// started; the exit status is ignored.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}
