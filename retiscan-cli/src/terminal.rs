// ============================================================================
// retiscan-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: UI Components and Styling
//
// Sectioned, hierarchical terminal output for the CLI. Everything except the
// final error line goes through the `log` facade so the run log file receives
// the same lines as the console (with ANSI codes stripped by the logger).
//
// KEY COMPONENTS:
// - OutputLevel: Indentation levels of the visual hierarchy
// - print_section / print_processing / print_status / print_success
// - print_error: Direct stderr output, usable before logging is set up

// ---- External crate imports ----
use console::style;
use log::{info, warn};
use owo_colors::OwoColorize;

// ---- Standard library imports ----
use std::sync::LazyLock;

/// Visual hierarchy levels of the CLI output.
#[derive(Debug, Clone, Copy)]
pub enum OutputLevel {
    /// Main sections (===== SECTION =====)
    Section,
    /// Processing steps (» Step)
    Subsection,
    /// Key-value status information
    Status,
}

impl OutputLevel {
    fn indent(&self) -> &'static str {
        match self {
            OutputLevel::Section => "",
            OutputLevel::Subsection => "  ",
            OutputLevel::Status => "    ",
        }
    }
}

static USE_COLOR: LazyLock<bool> = LazyLock::new(|| {
    std::env::var_os("NO_COLOR").is_none()
        && supports_color::on(supports_color::Stream::Stdout).is_some()
});

/// Whether console output should be colored. Honors `NO_COLOR` and only
/// enables color on terminals that support it.
pub fn should_use_color() -> bool {
    *USE_COLOR
}

/// Print a section header for a major phase.
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", title.to_uppercase().cyan());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
    info!("");
}

/// Print a processing step.
pub fn print_processing(message: &str) {
    let indent = OutputLevel::Subsection.indent();
    if should_use_color() {
        info!("{indent}» {}", style(message).bold());
    } else {
        info!("{indent}» {message}");
    }
}

/// Print a key-value status line, labels padded to a common width.
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let indent = OutputLevel::Status.indent();
    let label = format!("{label}:");
    if should_use_color() && highlight {
        info!("{indent}{label:<18} {}", style(value).bold().green());
    } else if should_use_color() {
        info!("{indent}{} {value}", style(format!("{label:<18}")).dim());
    } else {
        info!("{indent}{label:<18} {value}");
    }
}

/// Print a success message.
pub fn print_success(message: &str) {
    info!("");
    if should_use_color() {
        info!("  ✓ {}", message.green());
    } else {
        info!("  ✓ {message}");
    }
}

/// Print a non-fatal problem.
pub fn print_warning(message: &str) {
    if should_use_color() {
        warn!("  ! {}", message.yellow());
    } else {
        warn!("  ! {message}");
    }
}

/// Print a fatal error to stderr.
pub fn print_error(message: &str) {
    let color = std::env::var_os("NO_COLOR").is_none()
        && supports_color::on(supports_color::Stream::Stderr).is_some();
    if color {
        eprintln!("{} {message}", "✗ Error:".red().bold());
    } else {
        eprintln!("✗ Error: {message}");
    }
}
