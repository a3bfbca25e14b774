// retiscan-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use retiscan_core::classification::InputLayout;
use retiscan_core::config::{DEFAULT_BATCH_SIZE, DEFAULT_SEED, DEFAULT_TENSOR_SIZE};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Retiscan: frame-wise retinal video diagnostics",
    long_about = "Decodes a fundus video into frames, scores every frame with a disease \
                  classifier and writes an explainable per-frame prediction table and reports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug) output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Explicit log level (error, warn, info, debug, trace); overrides --verbose
    #[arg(long, global = true, value_name = "LEVEL", value_parser = parse_level)]
    pub log_level: Option<LevelFilter>,
}

impl Cli {
    /// Effective log level of this invocation.
    pub fn level(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level,
            (None, true) => LevelFilter::Debug,
            (None, false) => LevelFilter::Info,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the full diagnostic pipeline over a video, then all report renderers
    Run(RunArgs),
    /// Re-runs the report renderers over an existing prediction store
    Render(RenderArgs),
    /// Builds a video from a folder of images (for producing test inputs)
    Assemble(AssembleArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Fundus video to analyze
    #[arg(required = true, value_name = "VIDEO")]
    pub video: PathBuf,

    /// ONNX model producing one disease probability per frame
    #[arg(short, long, value_name = "MODEL", env = "RETISCAN_MODEL")]
    pub model: PathBuf,

    /// Workspace root holding data/ and outputs/
    #[arg(short, long, value_name = "DIR", env = "RETISCAN_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// Disable the Gaussian calibration noise applied to raw model scores
    #[arg(long)]
    pub no_noise: bool,

    /// Seed for calibration noise and augmentation
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Run an additional augmented robustness pass after scoring
    #[arg(long)]
    pub augment: bool,

    /// Tensors per classifier call
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Upper bound on worker threads (defaults to available parallelism)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Square input size of the model in pixels
    #[arg(long, value_name = "PIXELS", default_value_t = DEFAULT_TENSOR_SIZE)]
    pub tensor_size: u32,

    /// Input tensor layout of the model
    #[arg(long, value_name = "LAYOUT", default_value = "nhwc", value_parser = parse_layout)]
    pub layout: InputLayout,

    /// Write the resized RGB frame of every preprocessed frame to data/preprocessed
    #[arg(long)]
    pub save_preprocessed: bool,

    /// Directory for log files (defaults to WORKSPACE/logs)
    #[arg(short, long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Workspace root holding the prediction store
    #[arg(short, long, value_name = "DIR", env = "RETISCAN_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,
}

#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Folder of PNG/JPEG images, used in file-name order
    #[arg(required = true, value_name = "IMAGE_DIR")]
    pub image_dir: PathBuf,

    /// Path of the video to write
    #[arg(required = true, value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Frames per second of the assembled video
    #[arg(long, value_name = "FPS", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub fps: u32,
}

fn parse_level(value: &str) -> Result<LevelFilter, String> {
    value
        .parse()
        .map_err(|_| format!("unknown log level '{value}'"))
}

fn parse_layout(value: &str) -> Result<InputLayout, String> {
    value.parse().map_err(|e: retiscan_core::CoreError| e.to_string())
}
