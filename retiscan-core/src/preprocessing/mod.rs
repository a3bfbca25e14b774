// ============================================================================
// retiscan-core/src/preprocessing/mod.rs
// ============================================================================
//
// PREPROCESSING: Frame Artifact to Classifier Tensor
//
// This module normalizes a decoded frame into the fixed-shape tensor the
// classifier expects: the image is resized to the target width and height,
// converted to RGB and scaled to [0, 1]. The deterministic tensor is the only
// input of the canonical classification pass. Randomized augmentation (see
// `augment`) is layered on top for robustness checks.
//
// KEY COMPONENTS:
// - TensorShape: Height, width and channel count of a tensor
// - Tensor: Owned HWC f32 buffer
// - Preprocessor: Decodes, resizes and optionally augments one frame

pub mod augment;

pub use augment::{AugmentationParams, RandomTransform};

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult, decode_error};
use crate::frames::FrameArtifact;

// ---- External crate imports ----
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use rand::SeedableRng;
use rand::rngs::StdRng;

// ---- Standard library imports ----
use std::fmt;
use std::path::{Path, PathBuf};

/// Shape of a classifier input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorShape {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl TensorShape {
    /// A square RGB shape of `size` x `size`.
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            channels: 3,
        }
    }

    /// Number of scalar elements.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// Fixed-shape image tensor, row-major height x width x channels, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: TensorShape,
    data: Vec<f32>,
}

impl Tensor {
    /// Wraps an existing HWC buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not match `shape`.
    pub fn from_parts(shape: TensorShape, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            shape.len(),
            "tensor buffer does not match shape {shape}"
        );
        Self { shape, data }
    }

    /// Converts an RGB image into a tensor of the image's own size.
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let shape = TensorShape {
            width: image.width(),
            height: image.height(),
            channels: 3,
        };
        let data = image
            .as_raw()
            .iter()
            .map(|&v| f32::from(v) / 255.0)
            .collect();
        Self { shape, data }
    }

    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Value at row `y`, column `x`, channel `c`.
    pub fn get(&self, y: usize, x: usize, c: usize) -> f32 {
        let width = self.shape.width as usize;
        let channels = self.shape.channels as usize;
        self.data[(y * width + x) * channels + c]
    }

    /// The same values in channel-first (CHW) order.
    pub fn to_chw(&self) -> Vec<f32> {
        let (h, w, c) = (
            self.shape.height as usize,
            self.shape.width as usize,
            self.shape.channels as usize,
        );
        let mut out = vec![0.0f32; self.data.len()];
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    out[ch * h * w + y * w + x] = self.data[(y * w + x) * c + ch];
                }
            }
        }
        out
    }

    /// Quantizes the tensor back to an 8-bit RGB image.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.shape.width, self.shape.height, |x, y| {
            let px = |c| (self.get(y as usize, x as usize, c).clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgb([px(0), px(1), px(2)])
        })
    }
}

/// Turns frame artifacts into classifier tensors.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    shape: TensorShape,
    params: AugmentationParams,
    seed: u64,
}

impl Preprocessor {
    pub fn new(shape: TensorShape, seed: u64) -> Self {
        Self {
            shape,
            params: AugmentationParams::default(),
            seed,
        }
    }

    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    /// Decodes and normalizes one frame. With `augment` set, a random
    /// transform seeded from the run seed and the frame index is applied on
    /// top of the deterministic tensor.
    pub fn preprocess(&self, frame: &FrameArtifact, augment: bool) -> CoreResult<Tensor> {
        let tensor = self.canonical(frame)?;
        if augment {
            self.augment(&tensor, frame.order_index)
        } else {
            Ok(tensor)
        }
    }

    /// The deterministic tensor of `frame`.
    pub fn canonical(&self, frame: &FrameArtifact) -> CoreResult<Tensor> {
        if self.shape.channels != 3 {
            return Err(CoreError::Config(format!(
                "unsupported channel count {} (RGB only)",
                self.shape.channels
            )));
        }
        let decoded = image::open(&frame.path).map_err(|e| decode_error(&frame.identifier, e))?;
        let resized = decoded
            .resize_exact(self.shape.width, self.shape.height, FilterType::Triangle)
            .to_rgb8();
        Ok(Tensor::from_rgb_image(&resized))
    }

    /// Applies a randomized transform. The same frame index always draws the
    /// same transform, regardless of which worker thread runs it.
    pub fn augment(&self, tensor: &Tensor, order_index: u64) -> CoreResult<Tensor> {
        let mut rng = StdRng::seed_from_u64(frame_seed(self.seed, order_index));
        let shape = tensor.shape();
        let transform = self.params.sample(&mut rng, shape.width, shape.height)?;
        Ok(transform.apply(tensor))
    }
}

fn frame_seed(seed: u64, order_index: u64) -> u64 {
    // splitmix64 step keeps neighbouring frames decorrelated.
    let mut z = seed ^ order_index.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Writes `tensor` as a PNG preview named after `identifier` into `dir`.
pub fn save_preview(tensor: &Tensor, dir: &Path, identifier: &str) -> CoreResult<PathBuf> {
    let path = dir.join(identifier).with_extension("png");
    tensor.to_rgb_image().save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_frame(dir: &Path, index: u64, color: [u8; 3], size: (u32, u32)) -> FrameArtifact {
        let identifier = crate::frames::frame_identifier(index);
        let path = dir.join(&identifier);
        RgbImage::from_pixel(size.0, size.1, Rgb(color))
            .save(&path)
            .unwrap();
        FrameArtifact {
            order_index: index,
            identifier,
            raw_dimensions: size,
            path,
        }
    }

    #[test]
    fn canonical_tensor_is_resized_and_scaled() {
        let dir = tempdir().unwrap();
        let frame = write_frame(dir.path(), 0, [255, 0, 51], (40, 30));
        let pre = Preprocessor::new(TensorShape::square(8), 1);

        let tensor = pre.preprocess(&frame, false).unwrap();
        assert_eq!(tensor.shape(), TensorShape::square(8));
        assert_eq!(tensor.as_slice().len(), 8 * 8 * 3);
        assert!((tensor.get(3, 3, 0) - 1.0).abs() < 0.005);
        assert!(tensor.get(3, 3, 1).abs() < 0.005);
        assert!((tensor.get(3, 3, 2) - 0.2).abs() < 0.005);
    }

    #[test]
    fn canonical_pass_is_deterministic() {
        let dir = tempdir().unwrap();
        let frame = write_frame(dir.path(), 2, [10, 200, 30], (16, 16));
        let pre = Preprocessor::new(TensorShape::square(4), 7);
        assert_eq!(pre.canonical(&frame).unwrap(), pre.canonical(&frame).unwrap());
    }

    #[test]
    fn augmentation_is_reproducible_per_frame() {
        let shape = TensorShape::square(6);
        let data = (0..shape.len()).map(|i| i as f32 / shape.len() as f32).collect();
        let tensor = Tensor::from_parts(shape, data);
        let pre = Preprocessor::new(shape, 42);

        let augmented = pre.augment(&tensor, 3).unwrap();
        assert_eq!(augmented, pre.augment(&tensor, 3).unwrap());
        assert!(augmented.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn unreadable_frame_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame_000000.png");
        std::fs::write(&path, b"not a png").unwrap();
        let frame = FrameArtifact {
            order_index: 0,
            identifier: "frame_000000.png".into(),
            raw_dimensions: (0, 0),
            path,
        };

        let err = Preprocessor::new(TensorShape::square(4), 0)
            .preprocess(&frame, false)
            .unwrap_err();
        assert!(err.is_frame_local());
        assert_eq!(err.frame(), Some("frame_000000.png"));
    }

    #[test]
    fn chw_reorders_channels() {
        let shape = TensorShape { width: 2, height: 1, channels: 3 };
        let tensor = Tensor::from_parts(shape, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(tensor.to_chw(), vec![0.1, 0.4, 0.2, 0.5, 0.3, 0.6]);
    }

    #[test]
    fn preview_round_trips_through_rgb() {
        let dir = tempdir().unwrap();
        let frame = write_frame(dir.path(), 1, [0, 128, 255], (5, 5));
        let pre = Preprocessor::new(TensorShape::square(5), 0);
        let tensor = pre.canonical(&frame).unwrap();

        let out = tempdir().unwrap();
        let path = save_preview(&tensor, out.path(), &frame.identifier).unwrap();
        let reloaded = image::open(path).unwrap().to_rgb8();
        let px = reloaded.get_pixel(2, 2);
        assert!(px.0.iter().zip([0u8, 128, 255]).all(|(a, b)| a.abs_diff(b) <= 1));
    }

    #[test]
    fn shape_display_is_height_width_channels() {
        let shape = TensorShape { width: 4, height: 2, channels: 3 };
        assert_eq!(shape.to_string(), "2x4x3");
    }
}
