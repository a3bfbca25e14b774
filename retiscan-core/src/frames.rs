// ============================================================================
// retiscan-core/src/frames.rs
// ============================================================================
//
// FRAME EXTRACTION: Decoding a Video Source into Ordered Frame Artifacts
//
// This module turns a video file into a sequence of still images written to
// the frames location. Frame identifiers are zero-padded sequence numbers, so
// a plain lexical listing of the directory reproduces temporal order. Every
// later stage (and every renderer that lists the directory) relies on that.
//
// KEY COMPONENTS:
// - FrameArtifact: One decoded frame with its order index and dimensions
// - FrameExtractor: Trait implemented by frame sources
// - FfmpegFrameExtractor: ffmpeg-backed extractor
// - collect_frame_artifacts: Lists an existing frames location
// - assemble_video: Builds a video from a folder of images

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegSpawner, SidecarSpawner, run_to_completion};
use crate::utils::get_filename_safe;

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;
use log::{debug, info, warn};

// ---- Standard library imports ----
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name prefix of every frame artifact.
pub const FRAME_PREFIX: &str = "frame_";

/// Width of the zero-padded sequence number.
pub const FRAME_INDEX_DIGITS: usize = 6;

/// Image format of the frame artifacts.
pub const FRAME_EXTENSION: &str = "png";

/// One decoded still image of the source video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameArtifact {
    /// Position in the source video, starting at 0.
    pub order_index: u64,
    /// Stable, sortable identifier; also the file name inside the frames location.
    pub identifier: String,
    /// Width and height of the decoded image.
    pub raw_dimensions: (u32, u32),
    /// Location of the image on disk.
    pub path: PathBuf,
}

/// Identifier of the frame at `order_index`, e.g. `frame_000042.png`.
#[must_use]
pub fn frame_identifier(order_index: u64) -> String {
    format!(
        "{FRAME_PREFIX}{order_index:0width$}.{FRAME_EXTENSION}",
        width = FRAME_INDEX_DIGITS
    )
}

/// Parses a canonical frame identifier back into its order index.
///
/// Only names produced by [`frame_identifier`] are accepted, so two files can
/// never map to the same index.
#[must_use]
pub fn parse_frame_identifier(name: &str) -> Option<u64> {
    let digits = name
        .strip_prefix(FRAME_PREFIX)?
        .strip_suffix(FRAME_EXTENSION)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = digits.parse::<u64>().ok()?;
    (frame_identifier(index) == name).then_some(index)
}

/// A source of ordered frame artifacts.
pub trait FrameExtractor {
    /// Decodes `source` into frame artifacts stored under `frames_dir`.
    ///
    /// Fails with [`CoreError::SourceUnreadable`] when the video cannot be
    /// opened or yields no frames.
    fn extract(&self, source: &Path, frames_dir: &Path) -> CoreResult<Vec<FrameArtifact>>;
}

/// Lists the frame artifacts present in `frames_dir`, ordered by index.
///
/// Files that do not follow the frame naming scheme are ignored. A frame whose
/// header cannot be read is still listed (with zero dimensions) so the
/// preprocessing stage reports it as a per-frame decode error.
pub fn collect_frame_artifacts(frames_dir: &Path) -> CoreResult<Vec<FrameArtifact>> {
    let mut artifacts: Vec<FrameArtifact> = fs::read_dir(frames_dir)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if !path.is_file() {
                return None;
            }
            let identifier = path.file_name()?.to_str()?.to_string();
            let order_index = parse_frame_identifier(&identifier)?;
            let raw_dimensions = match image::image_dimensions(&path) {
                Ok(dims) => dims,
                Err(e) => {
                    warn!("Could not read dimensions of {}: {}", identifier, e);
                    (0, 0)
                }
            };
            Some(FrameArtifact {
                order_index,
                identifier,
                raw_dimensions,
                path,
            })
        })
        .collect();

    artifacts.sort_by_key(|artifact| artifact.order_index);
    Ok(artifacts)
}

/// Deletes frame artifacts left in `frames_dir` by an earlier run.
/// Returns the number of files removed.
pub fn remove_stale_frames(frames_dir: &Path) -> CoreResult<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(frames_dir)? {
        let path = entry?.path();
        let is_frame = parse_frame_identifier(&get_filename_safe(&path)?).is_some();
        if is_frame && path.is_file() {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

// ============================================================================
// FFMPEG EXTRACTOR
// ============================================================================

/// Frame extractor that decodes every video frame with ffmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameExtractor<S: FfmpegSpawner = SidecarSpawner> {
    spawner: S,
}

impl FfmpegFrameExtractor<SidecarSpawner> {
    pub fn new() -> Self {
        Self {
            spawner: SidecarSpawner,
        }
    }
}

impl<S: FfmpegSpawner> FfmpegFrameExtractor<S> {
    pub fn with_spawner(spawner: S) -> Self {
        Self { spawner }
    }

    fn build_command(source: &Path, frames_dir: &Path) -> FfmpegCommand {
        let pattern = frames_dir.join(format!(
            "{FRAME_PREFIX}%0{FRAME_INDEX_DIGITS}d.{FRAME_EXTENSION}"
        ));

        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner();
        cmd.input(source.to_string_lossy().as_ref());
        // First video stream only, one image per decoded frame, numbered from 0.
        cmd.args(["-map", "0:v:0", "-vsync", "passthrough", "-start_number", "0"]);
        cmd.overwrite();
        cmd.output(pattern.to_string_lossy().as_ref());
        cmd
    }
}

impl<S: FfmpegSpawner> FrameExtractor for FfmpegFrameExtractor<S> {
    fn extract(&self, source: &Path, frames_dir: &Path) -> CoreResult<Vec<FrameArtifact>> {
        let unreadable = |reason: String| CoreError::SourceUnreadable {
            path: source.display().to_string(),
            reason,
        };

        if !source.is_file() {
            return Err(unreadable("file does not exist".to_string()));
        }

        fs::create_dir_all(frames_dir)?;
        let stale = remove_stale_frames(frames_dir)?;
        if stale > 0 {
            debug!("Removed {} stale frame(s) from {}", stale, frames_dir.display());
        }

        let outcome = run_to_completion(&self.spawner, Self::build_command(source, frames_dir))?;
        if !outcome.success() {
            return Err(unreadable(format!(
                "ffmpeg exited with {}: {}",
                outcome.status,
                outcome.error_text()
            )));
        }

        let frames = collect_frame_artifacts(frames_dir)?;
        if frames.is_empty() {
            return Err(unreadable("no frames could be decoded".to_string()));
        }

        info!(
            "Extracted {} frame(s) from {} to {}",
            frames.len(),
            source.display(),
            frames_dir.display()
        );
        Ok(frames)
    }
}

// ============================================================================
// VIDEO ASSEMBLY
// ============================================================================

/// Builds a video at `output` from the PNG/JPEG images in `image_dir`, shown
/// in file-name order at `fps` frames per second.
///
/// Returns the number of images used.
pub fn assemble_video<S: FfmpegSpawner>(
    spawner: &S,
    image_dir: &Path,
    output: &Path,
    fps: u32,
) -> CoreResult<usize> {
    if fps == 0 {
        return Err(CoreError::Config("Frame rate must be at least 1".to_string()));
    }

    let mut images: Vec<PathBuf> = fs::read_dir(image_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        ["png", "jpg", "jpeg"].iter().any(|known| ext.eq_ignore_ascii_case(known))
                    })
        })
        .collect();
    images.sort();

    if images.is_empty() {
        return Err(CoreError::OperationFailed(format!(
            "No images found in '{}'",
            image_dir.display()
        )));
    }

    // ffmpeg concat list: every image is held for one frame period. The last
    // entry is repeated because the concat demuxer ignores its duration.
    let mut list = tempfile::Builder::new()
        .prefix("retiscan_concat_")
        .suffix(".txt")
        .tempfile()?;
    let frame_duration = 1.0 / f64::from(fps);
    for image in &images {
        let absolute = image.canonicalize()?;
        let escaped = absolute.to_string_lossy().replace('\'', "'\\''");
        writeln!(list, "file '{escaped}'")?;
        writeln!(list, "duration {frame_duration}")?;
    }
    if let Some(last) = images.last() {
        let escaped = last.canonicalize()?.to_string_lossy().replace('\'', "'\\''");
        writeln!(list, "file '{escaped}'")?;
    }
    list.flush()?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut cmd = FfmpegCommand::new();
    cmd.hide_banner();
    cmd.args(["-f", "concat", "-safe", "0"]);
    cmd.input(list.path().to_string_lossy().as_ref());
    cmd.args([
        "-r".to_string(),
        fps.to_string(),
        "-vf".to_string(),
        "scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
    ]);
    cmd.overwrite();
    cmd.output(output.to_string_lossy().as_ref());

    let outcome = run_to_completion(spawner, cmd)?;
    if !outcome.success() {
        return Err(CoreError::OperationFailed(format!(
            "ffmpeg failed to assemble '{}': {}",
            output.display(),
            outcome.error_text()
        )));
    }

    info!("Assembled {} image(s) into {}", images.len(), output.display());
    Ok(images.len())
}
