//! Randomized geometric and photometric augmentation of frame tensors.
//!
//! Augmented tensors are only used for robustness checks. The canonical
//! classification pass always uses the deterministic tensor.

use super::Tensor;
use crate::error::{CoreError, CoreResult};

use rand::Rng;

/// Bounds of the random transform.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentationParams {
    /// Maximum rotation in degrees, drawn from `[-r, r]`.
    pub rotation_degrees: f64,
    /// Maximum horizontal shift as a fraction of the width.
    pub width_shift: f64,
    /// Maximum vertical shift as a fraction of the height.
    pub height_shift: f64,
    /// Zoom factors are drawn per axis from `[1 - z, 1 + z]`.
    pub zoom: f64,
    /// Maximum shear angle in degrees.
    pub shear_degrees: f64,
    /// Mirror horizontally with probability 0.5.
    pub horizontal_flip: bool,
    /// Brightness factor range, inclusive.
    pub brightness: (f64, f64),
}

impl Default for AugmentationParams {
    fn default() -> Self {
        Self {
            rotation_degrees: 20.0,
            width_shift: 0.1,
            height_shift: 0.1,
            zoom: 0.15,
            shear_degrees: 0.1,
            // Fundus images are roughly left/right symmetric.
            horizontal_flip: true,
            brightness: (0.8, 1.2),
        }
    }
}

impl AugmentationParams {
    /// Parameters that leave every tensor unchanged.
    pub fn identity() -> Self {
        Self {
            rotation_degrees: 0.0,
            width_shift: 0.0,
            height_shift: 0.0,
            zoom: 0.0,
            shear_degrees: 0.0,
            horizontal_flip: false,
            brightness: (1.0, 1.0),
        }
    }

    /// Checks that every bound describes a non-empty range.
    pub fn validate(&self) -> CoreResult<()> {
        let bounds = [
            ("rotation_degrees", self.rotation_degrees),
            ("width_shift", self.width_shift),
            ("height_shift", self.height_shift),
            ("zoom", self.zoom),
            ("shear_degrees", self.shear_degrees),
        ];
        for (name, bound) in bounds {
            if !bound.is_finite() || bound < 0.0 {
                return Err(CoreError::Config(format!(
                    "augmentation bound {name} must be a non-negative number, got {bound}"
                )));
            }
        }
        if self.zoom >= 1.0 {
            return Err(CoreError::Config(format!(
                "augmentation zoom must be below 1, got {}",
                self.zoom
            )));
        }
        let (low, high) = self.brightness;
        if !low.is_finite() || !high.is_finite() || low < 0.0 || low > high {
            return Err(CoreError::Config(format!(
                "invalid brightness range ({low}, {high})"
            )));
        }
        Ok(())
    }

    /// Draws one concrete transform for a tensor of `width` x `height`.
    ///
    /// Fails with [`CoreError::Config`] when the parameters do not pass
    /// [`AugmentationParams::validate`].
    pub fn sample<R: Rng>(
        &self,
        rng: &mut R,
        width: u32,
        height: u32,
    ) -> CoreResult<RandomTransform> {
        self.validate()?;
        Ok(RandomTransform {
            rotation: symmetric(rng, self.rotation_degrees).to_radians(),
            shift_x: symmetric(rng, self.width_shift) * f64::from(width),
            shift_y: symmetric(rng, self.height_shift) * f64::from(height),
            zoom_x: 1.0 + symmetric(rng, self.zoom),
            zoom_y: 1.0 + symmetric(rng, self.zoom),
            shear: symmetric(rng, self.shear_degrees).to_radians(),
            flip: self.horizontal_flip && rng.gen_bool(0.5),
            brightness: rng.gen_range(self.brightness.0..=self.brightness.1),
        })
    }
}

fn symmetric<R: Rng>(rng: &mut R, bound: f64) -> f64 {
    rng.gen_range(-bound..=bound)
}

/// One drawn transform. Angles are in radians, shifts in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomTransform {
    pub rotation: f64,
    pub shift_x: f64,
    pub shift_y: f64,
    pub zoom_x: f64,
    pub zoom_y: f64,
    pub shear: f64,
    pub flip: bool,
    pub brightness: f64,
}

impl RandomTransform {
    /// Applies the transform around the tensor center. Output pixels are
    /// sampled from the nearest source pixel; coordinates falling outside the
    /// frame are clamped to the border.
    pub fn apply(&self, tensor: &Tensor) -> Tensor {
        let shape = tensor.shape();
        let (width, height, channels) = (shape.width as usize, shape.height as usize, shape.channels as usize);
        let cx = (width as f64 - 1.0) / 2.0;
        let cy = (height as f64 - 1.0) / 2.0;

        // Output -> source mapping: rotation * shear * zoom.
        let (sin_r, cos_r) = self.rotation.sin_cos();
        let (sin_s, cos_s) = self.shear.sin_cos();
        let a = cos_r * self.zoom_x;
        let b = (-cos_r * sin_s - sin_r * cos_s) * self.zoom_y;
        let c = sin_r * self.zoom_x;
        let d = (-sin_r * sin_s + cos_r * cos_s) * self.zoom_y;

        let source = tensor.as_slice();
        let mut data = vec![0.0f32; source.len()];
        for y in 0..height {
            for x in 0..width {
                let out_x = if self.flip { width - 1 - x } else { x };
                let u = x as f64 - cx;
                let v = y as f64 - cy;
                let sx = (a * u + b * v + cx + self.shift_x).round().clamp(0.0, width as f64 - 1.0) as usize;
                let sy = (c * u + d * v + cy + self.shift_y).round().clamp(0.0, height as f64 - 1.0) as usize;

                let src = (sy * width + sx) * channels;
                let dst = (y * width + out_x) * channels;
                for ch in 0..channels {
                    data[dst + ch] = (f64::from(source[src + ch]) * self.brightness).clamp(0.0, 1.0) as f32;
                }
            }
        }

        Tensor::from_parts(shape, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::TensorShape;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn gradient_tensor(width: u32, height: u32) -> Tensor {
        let shape = TensorShape { width, height, channels: 3 };
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let value = (x + y * width) as f32 / (width * height) as f32;
                data.extend([value, value, value]);
            }
        }
        Tensor::from_parts(shape, data)
    }

    #[test]
    fn identity_params_leave_tensor_unchanged() {
        let tensor = gradient_tensor(5, 4);
        let mut rng = StdRng::seed_from_u64(1);
        let transform = AugmentationParams::identity().sample(&mut rng, 5, 4).unwrap();
        assert_eq!(transform.apply(&tensor), tensor);
    }

    #[test]
    fn flip_mirrors_columns() {
        let tensor = gradient_tensor(4, 2);
        let transform = RandomTransform {
            flip: true,
            ..AugmentationParams::identity().sample(&mut StdRng::seed_from_u64(0), 4, 2).unwrap()
        };
        let flipped = transform.apply(&tensor);
        assert_eq!(flipped.get(0, 0, 0), tensor.get(0, 3, 0));
        assert_eq!(flipped.get(1, 3, 2), tensor.get(1, 0, 2));
    }

    #[test]
    fn brightness_is_clamped_to_unit_range() {
        let tensor = gradient_tensor(3, 3);
        let transform = RandomTransform {
            brightness: 1.2,
            ..AugmentationParams::identity().sample(&mut StdRng::seed_from_u64(0), 3, 3).unwrap()
        };
        let brightened = transform.apply(&tensor);
        assert!(brightened.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn sampled_transforms_stay_within_bounds() {
        let params = AugmentationParams::default();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let t = params.sample(&mut rng, 224, 224).unwrap();
            assert!(t.rotation.abs() <= 20f64.to_radians() + 1e-12);
            assert!(t.shift_x.abs() <= 22.4 + 1e-9);
            assert!(t.shift_y.abs() <= 22.4 + 1e-9);
            assert!((0.85..=1.15).contains(&t.zoom_x));
            assert!((0.85..=1.15).contains(&t.zoom_y));
            assert!((0.8..=1.2).contains(&t.brightness));
        }
    }

    #[test]
    fn same_seed_gives_same_transform() {
        let params = AugmentationParams::default();
        let a = params.sample(&mut StdRng::seed_from_u64(5), 64, 64).unwrap();
        let b = params.sample(&mut StdRng::seed_from_u64(5), 64, 64).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn inverted_or_negative_bounds_are_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let inverted = AugmentationParams {
            brightness: (1.2, 0.8),
            ..AugmentationParams::default()
        };
        assert!(matches!(inverted.sample(&mut rng, 8, 8), Err(CoreError::Config(_))));

        let negative = AugmentationParams {
            rotation_degrees: -5.0,
            ..AugmentationParams::default()
        };
        let err = negative.sample(&mut rng, 8, 8).unwrap_err();
        assert!(err.to_string().contains("rotation_degrees"));

        let not_a_number = AugmentationParams {
            width_shift: f64::NAN,
            ..AugmentationParams::default()
        };
        assert!(not_a_number.validate().is_err());
        assert!(AugmentationParams::default().validate().is_ok());
        assert!(AugmentationParams::identity().validate().is_ok());
    }
}
