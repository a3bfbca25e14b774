//! Implementation of the 'run' subcommand.
//!
//! Checks the video source, builds the run configuration from the command
//! line, loads the model, drives the pipeline and finally renders the per-frame
//! reports from the finalized prediction store. The summary written by the
//! pipeline is left as is.

use crate::cli::RunArgs;
use crate::commands::render::render_reports;
use crate::error::{CliErrorContext, CliResult};
use crate::logging;
use crate::progress::CliProgress;
use crate::terminal;

use log::{LevelFilter, error, info};
use retiscan_core::classification::{OnnxClassifier, with_calibration_noise};
use retiscan_core::config::{DEFAULT_NOISE_STD_DEV, RunConfig, RunConfigBuilder};
use retiscan_core::external::check_dependency;
use retiscan_core::frames::FfmpegFrameExtractor;
use retiscan_core::pipeline::{PipelineOrchestrator, RunReport};
use retiscan_core::rendering::{RenderContext, report_renderers};
use retiscan_core::{CoreError, format_duration, format_percentage};

use std::fs;
use std::path::Path;

/// Maps the command-line flags onto a validated run configuration.
pub fn build_config(args: &RunArgs) -> CliResult<RunConfig> {
    let noise = if args.no_noise {
        None
    } else {
        Some(DEFAULT_NOISE_STD_DEV)
    };
    let mut builder = RunConfigBuilder::new()
        .workspace(&args.workspace)
        .tensor_size(args.tensor_size)
        .augment(args.augment)
        .calibration_noise(noise)
        .seed(args.seed)
        .batch_size(args.batch_size)
        .save_preprocessed(args.save_preprocessed);
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }
    builder.build()
}

/// Runs the `run` command.
pub fn run_pipeline(args: RunArgs, level: LevelFilter) -> CliResult<()> {
    // Nothing may run, or be created, for a missing source.
    if !args.video.is_file() {
        return Err(CoreError::PathError(format!(
            "Video source not found: {}",
            args.video.display()
        )));
    }

    let config = build_config(&args)?;
    let log_dir = args
        .log_dir
        .clone()
        .unwrap_or_else(|| config.layout.root().join("logs"));
    fs::create_dir_all(&log_dir)
        .cli_with_context(|| format!("Failed to create log directory '{}'", log_dir.display()))?;
    let log_file = log_dir.join(format!("retiscan_run_{}.log", logging::get_timestamp()));
    logging::init_logging(level, Some(&log_file))?;

    print_run_header(&args, &config, &log_file);

    check_dependency("ffmpeg")?;
    terminal::print_processing("Loading model");
    let model = OnnxClassifier::load(&args.model, config.tensor_shape, args.layout)
        .cli_with_context(|| format!("Failed to load model '{}'", args.model.display()))?;
    let classifier = with_calibration_noise(model, &config);

    terminal::print_processing("Running pipeline");
    let mut orchestrator =
        PipelineOrchestrator::new(config.clone(), FfmpegFrameExtractor::new(), classifier)
            .with_observer(Box::new(CliProgress::new()));
    let report = orchestrator.run(&args.video).map_err(|failure| {
        error!("{failure}");
        CoreError::OperationFailed(failure.to_string())
    })?;

    print_run_summary(&report);

    let ctx = RenderContext::new(config.layout.clone(), orchestrator.store().rows());
    let rendered = render_reports(&ctx, &report_renderers());

    terminal::print_section("Artifacts");
    terminal::print_status("Prediction store", &report.store_path.display().to_string(), true);
    terminal::print_status("Summary", &report.summary_text.display().to_string(), false);
    terminal::print_status("Summary (JSON)", &report.summary_json.display().to_string(), false);
    if let Some(robustness) = &report.robustness {
        terminal::print_status("Robustness", &robustness.path.display().to_string(), false);
    }
    terminal::print_status("Reports", &config.layout.outputs_dir().display().to_string(), false);
    terminal::print_status("Log file", &log_file.display().to_string(), false);

    if rendered.is_complete() {
        terminal::print_success(&format!(
            "Run finished in {}",
            format_duration(report.elapsed)
        ));
    } else {
        terminal::print_warning(&format!(
            "Run finished in {}, {} report(s) failed to render",
            format_duration(report.elapsed),
            rendered.failed.len()
        ));
    }
    Ok(())
}

fn print_run_header(args: &RunArgs, config: &RunConfig, log_file: &Path) {
    terminal::print_section("Retiscan Run");
    terminal::print_status("Video", &args.video.display().to_string(), false);
    terminal::print_status("Model", &args.model.display().to_string(), false);
    terminal::print_status("Workspace", &config.layout.root().display().to_string(), false);
    terminal::print_status("Tensor", &format!("{} ({})", config.tensor_shape, args.layout), false);
    let noise = match config.calibration_noise {
        Some(std_dev) => format!("gaussian sd {std_dev}"),
        None => "off".to_string(),
    };
    terminal::print_status("Calibration", &noise, false);
    terminal::print_status("Augmentation", if config.augment { "on" } else { "off" }, false);
    terminal::print_status("Seed", &config.seed.to_string(), false);
    terminal::print_status("Workers", &config.workers.to_string(), false);
    info!("");
    terminal::print_status("Log file", &log_file.display().to_string(), false);
    info!("");
}

fn print_run_summary(report: &RunReport) {
    let summary = &report.summary;
    terminal::print_section("Results");
    terminal::print_status("Frames extracted", &report.extracted.to_string(), false);
    terminal::print_status("Frames analyzed", &summary.total_frames.to_string(), false);
    terminal::print_status(
        "Diseased",
        &format!(
            "{} ({})",
            summary.diseased_frames,
            format_percentage(summary.diseased_frames, summary.total_frames)
        ),
        false,
    );
    terminal::print_status(
        "Normal",
        &format!(
            "{} ({})",
            summary.normal_frames,
            format_percentage(summary.normal_frames, summary.total_frames)
        ),
        false,
    );
    terminal::print_status("Mean probability", &format!("{:.3}", summary.mean_probability), false);
    terminal::print_status("Max probability", &format!("{:.3}", summary.max_probability), false);
    terminal::print_status("Risk", &summary.risk.to_string(), true);

    if !report.skipped.is_empty() {
        terminal::print_warning(&format!("{} frame(s) skipped", report.skipped.len()));
        for failure in &report.skipped {
            terminal::print_warning(&format!(
                "{} ({}): {}",
                failure.frame, failure.stage, failure.error
            ));
        }
    }
    if let Some(robustness) = &report.robustness {
        terminal::print_status(
            "Augmented flips",
            &format!("{} of {}", robustness.flipped, robustness.evaluated),
            false,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["retiscan", "run", "v.mp4", "--model", "m.onnx", "--workspace", "/tmp/rs"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn flags_map_onto_config() {
        let config = build_config(&run_args(&[
            "--no-noise",
            "--augment",
            "--batch-size",
            "8",
            "--workers",
            "3",
            "--tensor-size",
            "64",
        ]))
        .unwrap();
        assert_eq!(config.calibration_noise, None);
        assert!(config.augment);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.workers, 3);
        assert_eq!(config.tensor_shape.width, 64);
        assert_eq!(config.layout.root(), std::path::Path::new("/tmp/rs"));
    }

    #[test]
    fn noise_is_on_by_default() {
        let config = build_config(&run_args(&[])).unwrap();
        assert_eq!(config.calibration_noise, Some(DEFAULT_NOISE_STD_DEV));
    }

    #[test]
    fn zero_batch_size_is_a_config_error() {
        let err = build_config(&run_args(&["--batch-size", "0"])).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn missing_video_fails_before_anything_is_created() {
        let workspace = tempfile::tempdir().unwrap();
        let mut args = run_args(&[]);
        args.video = workspace.path().join("missing.mp4");
        args.workspace = workspace.path().join("ws");

        let err = run_pipeline(args, LevelFilter::Off).unwrap_err();
        assert!(err.to_string().contains("Video source not found"));
        assert!(!workspace.path().join("ws").exists());
    }
}
