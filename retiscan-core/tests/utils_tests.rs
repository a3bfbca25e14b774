// retiscan-core/tests/utils_tests.rs

use retiscan_core::utils::{format_duration, format_percentage, get_filename_safe, percentage};
use std::path::Path;
use std::time::Duration;

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(Duration::from_secs(0)), "0h 0m 0s");
    assert_eq!(format_duration(Duration::from_secs(59)), "0h 0m 59s");
    assert_eq!(format_duration(Duration::from_secs(61)), "0h 1m 1s");
    assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
}

#[test]
fn test_format_percentage() {
    assert_eq!(format_percentage(4, 10), "40.0%");
    assert_eq!(format_percentage(1, 3), "33.3%");
    assert_eq!(format_percentage(0, 0), "0.0%");
    assert!((percentage(1, 4) - 25.0).abs() < 1e-12);
}

#[test]
fn test_get_filename_safe() {
    assert_eq!(
        get_filename_safe(Path::new("/data/frames/frame_000001.png")).unwrap(),
        "frame_000001.png"
    );
    assert!(get_filename_safe(Path::new("/")).is_err());
}
