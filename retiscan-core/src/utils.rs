//! Utility functions for formatting and file operations.
//!
//! General-purpose helpers shared by the pipeline, the renderers and the CLI:
//! duration and percentage formatting and path manipulation.

use std::path::Path;
use std::time::Duration;

/// Formats a duration as `"{h}h {m}m {s}s"` (e.g., 3661s -> "1h 1m 1s").
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours}h {minutes}m {secs}s")
}

/// Share of `part` in `total` as a percentage. Returns 0 when `total` is 0.
#[must_use]
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Formats `part` of `total` with one decimal (e.g., 4 of 10 -> "40.0%").
#[must_use]
pub fn format_percentage(part: usize, total: usize) -> String {
    format!("{:.1}%", percentage(part, total))
}

/// Safely extracts filename from a path with consistent error handling.
/// Returns the filename as a String, or an error if the path has no filename component.
pub fn get_filename_safe(path: &Path) -> crate::CoreResult<String> {
    Ok(path
        .file_name()
        .ok_or_else(|| {
            crate::CoreError::PathError(format!("Failed to get filename for {}", path.display()))
        })?
        .to_string_lossy()
        .to_string())
}
