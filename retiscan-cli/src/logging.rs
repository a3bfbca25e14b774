// ============================================================================
// retiscan-cli/src/logging.rs
// ============================================================================
//
// LOGGING: Console and File Log Dispatch
//
// Installs a `fern` dispatch as the global `log` backend. Info lines reach
// the console as-is (terminal.rs already styled them); warnings and errors get
// a colored level tag. When a log file is given, every record is also written
// there with a timestamp and with ANSI escape codes removed.
//
// Library crates only log through the `log` facade; this is the one place a
// backend is chosen.

// ---- Internal crate imports ----
use crate::error::{CliErrorContext, CliResult};
use crate::terminal::should_use_color;

// ---- External crate imports ----
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;

// ---- Standard library imports ----
use std::path::Path;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// Used to name run log files, e.g. `retiscan_run_20240601_123045.log`.
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Sets up console logging and, if `log_file` is set, a plain-text log file.
///
/// Noisy dependency targets are capped at `warn` unless `level` is `trace`.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> CliResult<()> {
    let color = should_use_color();
    let dependency_level = if level == LevelFilter::Trace {
        LevelFilter::Trace
    } else {
        LevelFilter::Warn
    };

    let console = fern::Dispatch::new()
        .format(move |out, message, record| match record.level() {
            Level::Info => out.finish(format_args!("{message}")),
            other => out.finish(format_args!("{} {message}", level_tag(other, color))),
        })
        .chain(std::io::stdout());

    let mut dispatch = fern::Dispatch::new()
        .level(level)
        .level_for("tract_core", dependency_level)
        .level_for("tract_onnx", dependency_level)
        .level_for("tract_hir", dependency_level)
        .chain(console);

    if let Some(path) = log_file {
        let file = fern::log_file(path)
            .cli_with_context(|| format!("Failed to open log file '{}'", path.display()))?;
        let file_dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                let plain = strip_ansi_escapes::strip_str(message.to_string());
                out.finish(format_args!(
                    "{} [{:<5}] {}: {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    plain
                ))
            })
            .chain(file);
        dispatch = dispatch.chain(file_dispatch);
    }

    dispatch
        .apply()
        .map_err(|e| retiscan_core::CoreError::OperationFailed(format!("Failed to install logger: {e}")))?;
    log::debug!("Logger initialized with level: {level}");
    Ok(())
}

fn level_tag(level: Level, color: bool) -> String {
    let tag = match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN ",
        Level::Info => "INFO ",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };
    if !color {
        return tag.to_string();
    }
    match level {
        Level::Error => tag.bright_red().bold().to_string(),
        Level::Warn => tag.yellow().to_string(),
        Level::Info => tag.green().to_string(),
        Level::Debug => tag.blue().to_string(),
        Level::Trace => tag.magenta().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_has_expected_shape() {
        let stamp = get_timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn plain_level_tags_carry_no_escape_codes() {
        assert_eq!(level_tag(Level::Warn, false), "WARN ");
        assert!(!level_tag(Level::Error, false).contains('\u{1b}'));
        assert!(level_tag(Level::Error, true).contains("ERROR"));
    }
}
