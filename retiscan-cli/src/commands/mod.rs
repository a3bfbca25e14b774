//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Runs the full pipeline over a video, then every renderer.
pub mod run;

/// Re-runs the renderers over an existing prediction store.
pub mod render;

/// Builds a test video from a folder of images.
pub mod assemble;

pub use assemble::run_assemble;
pub use render::run_render;
pub use run::run_pipeline;
