// ============================================================================
// retiscan-cli/src/main.rs
// ============================================================================
//
// RETISCAN CLI: Main Entry Point
//
// Parses the command line, dispatches to the selected command and maps any
// error to a message on stderr and exit code 1.

use clap::Parser;
use retiscan_cli::{Cli, Commands, run_assemble, run_pipeline, run_render, terminal};
use std::process;

fn main() {
    let cli = Cli::parse();
    let level = cli.level();

    let result = match cli.command {
        Commands::Run(args) => run_pipeline(args, level),
        Commands::Render(args) => run_render(args, level),
        Commands::Assemble(args) => run_assemble(args, level),
    };

    if let Err(e) = result {
        log::debug!("Command failed: {e:?}");
        terminal::print_error(&e.to_string());
        process::exit(1);
    }
}
