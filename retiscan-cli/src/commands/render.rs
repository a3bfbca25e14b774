//! Implementation of the 'render' subcommand.
//!
//! Loads the prediction store of a workspace and runs every report renderer
//! over it. A store with the wrong columns is fatal; a failing renderer is
//! reported and the others still run.

use crate::cli::RenderArgs;
use crate::error::{CliErrorContext, CliResult};
use crate::logging;
use crate::terminal;

use log::LevelFilter;
use retiscan_core::config::ArtifactLayout;
use retiscan_core::rendering::{
    RenderContext, RenderReport, Renderer, default_renderers, render_all,
};

/// Runs the `render` command.
pub fn run_render(args: RenderArgs, level: LevelFilter) -> CliResult<()> {
    logging::init_logging(level, None)?;

    let layout = ArtifactLayout::new(&args.workspace);
    let store = layout.predictions_file();
    terminal::print_section("Render Reports");
    terminal::print_status("Workspace", &args.workspace.display().to_string(), false);
    terminal::print_status("Prediction store", &store.display().to_string(), false);

    let ctx = RenderContext::load(layout)
        .cli_with_context(|| format!("Cannot render from '{}'", store.display()))?;
    terminal::print_status("Frames", &ctx.rows.len().to_string(), false);

    let report = render_reports(&ctx, &default_renderers());
    if report.is_complete() {
        terminal::print_success("All reports rendered");
    }
    Ok(())
}

/// Runs `renderers` and prints what they wrote and what failed.
pub(crate) fn render_reports(ctx: &RenderContext, renderers: &[Box<dyn Renderer>]) -> RenderReport {
    terminal::print_processing("Rendering reports");
    let report = render_all(ctx, renderers);
    for path in &report.written {
        terminal::print_status("Wrote", &path.display().to_string(), false);
    }
    for (renderer, reason) in &report.failed {
        terminal::print_warning(&format!("Renderer '{renderer}' failed: {reason}"));
    }
    report
}
