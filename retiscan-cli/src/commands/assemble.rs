//! Implementation of the 'assemble' subcommand.
//!
//! Builds a video from a folder of still images at a fixed frame rate, which
//! is how test inputs for the pipeline are produced.

use crate::cli::AssembleArgs;
use crate::error::{CliErrorContext, CliResult};
use crate::logging;
use crate::terminal;

use log::LevelFilter;
use retiscan_core::CoreError;
use retiscan_core::external::{SidecarSpawner, check_dependency};
use retiscan_core::frames::assemble_video;

/// Runs the `assemble` command.
pub fn run_assemble(args: AssembleArgs, level: LevelFilter) -> CliResult<()> {
    if !args.image_dir.is_dir() {
        return Err(CoreError::PathError(format!(
            "Image folder not found: {}",
            args.image_dir.display()
        )));
    }
    logging::init_logging(level, None)?;
    check_dependency("ffmpeg")?;

    terminal::print_section("Assemble Video");
    terminal::print_status("Images", &args.image_dir.display().to_string(), false);
    terminal::print_status("Output", &args.output.display().to_string(), false);
    terminal::print_status("Frame rate", &format!("{} fps", args.fps), false);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).cli_with_context(|| {
            format!("Failed to create output directory '{}'", parent.display())
        })?;
    }

    terminal::print_processing("Encoding frames");
    let count = assemble_video(&SidecarSpawner, &args.image_dir, &args.output, args.fps)?;
    terminal::print_success(&format!(
        "Assembled {count} image(s) into {}",
        args.output.display()
    ));
    Ok(())
}
