// retiscan-cli/src/lib.rs
//
// Library portion of the Retiscan CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod progress;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{AssembleArgs, Cli, Commands, RenderArgs, RunArgs};
pub use commands::{run_assemble, run_pipeline, run_render};
pub use error::{CliErrorContext, CliResult};
