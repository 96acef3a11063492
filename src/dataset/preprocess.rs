//! Image preprocessing: resize to the network resolution and normalize.
//!
//! Input is one CIFAR record's pixel block (planar R, G, B planes of 32×32
//! bytes). Output is a CHW `f32` buffer of `3 * size * size` values,
//! normalized per channel with fixed mean/std constants.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::utils::error::{BenchError, Result};

/// Per-channel normalization constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    /// Channel means [R, G, B] in [0, 1] pixel units
    pub mean: [f32; 3],
    /// Channel standard deviations [R, G, B]
    pub std: [f32; 3],
}

impl Normalization {
    /// Statistics of the CIFAR-100 training split
    pub fn cifar100() -> Self {
        Self {
            mean: [0.5071, 0.4865, 0.4409],
            std: [0.2673, 0.2564, 0.2762],
        }
    }

    /// Every std must be strictly positive and finite
    pub fn validate(&self) -> Result<()> {
        if self.std.iter().any(|s| !(*s > 0.0) || !s.is_finite()) {
            return Err(BenchError::Config(format!(
                "normalization std must be positive, got {:?}",
                self.std
            )));
        }
        Ok(())
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Self::cifar100()
    }
}

/// Deterministic resize + normalize pipeline
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Side length of the source images
    source_size: usize,
    /// Side length of the produced tensors
    target_size: usize,
    normalization: Normalization,
}

impl ImagePreprocessor {
    pub fn new(source_size: usize, target_size: usize, normalization: Normalization) -> Self {
        Self {
            source_size,
            target_size,
            normalization,
        }
    }

    /// Number of `f32` values in one preprocessed image
    pub fn output_len(&self) -> usize {
        3 * self.target_size * self.target_size
    }

    /// Preprocess planar RGB bytes into a normalized CHW buffer
    pub fn preprocess(&self, planar: &[u8]) -> Result<Vec<f32>> {
        let plane = self.source_size * self.source_size;
        if planar.len() != 3 * plane {
            return Err(BenchError::InvalidInput(format!(
                "expected {} pixel bytes, got {}",
                3 * plane,
                planar.len()
            )));
        }

        let side = self.source_size as u32;
        let source = RgbImage::from_fn(side, side, |x, y| {
            let i = (y * side + x) as usize;
            Rgb([planar[i], planar[plane + i], planar[2 * plane + i]])
        });

        let resized = if self.target_size == self.source_size {
            source
        } else {
            let target = self.target_size as u32;
            imageops::resize(&source, target, target, FilterType::Triangle)
        };

        Ok(self.normalize(&resized))
    }

    /// Convert to CHW, scale to [0, 1] and apply `(x - mean) / std`
    fn normalize(&self, img: &RgbImage) -> Vec<f32> {
        let (width, height) = (self.target_size, self.target_size);
        let mut tensor = vec![0.0f32; 3 * height * width];

        for (x, y, pixel) in img.enumerate_pixels() {
            let offset = y as usize * width + x as usize;
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                tensor[c * height * width + offset] =
                    (value - self.normalization.mean[c]) / self.normalization.std[c];
            }
        }

        tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_planar(size: usize, rgb: [u8; 3]) -> Vec<u8> {
        let plane = size * size;
        let mut data = vec![0u8; 3 * plane];
        for c in 0..3 {
            data[c * plane..(c + 1) * plane].fill(rgb[c]);
        }
        data
    }

    #[test]
    fn test_output_shape_after_resize() {
        let pre = ImagePreprocessor::new(32, 64, Normalization::cifar100());
        let out = pre.preprocess(&solid_planar(32, [10, 20, 30])).unwrap();
        assert_eq!(out.len(), 3 * 64 * 64);
        assert_eq!(out.len(), pre.output_len());
    }

    #[test]
    fn test_solid_color_normalizes_per_channel() {
        let norm = Normalization {
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.25, 1.0],
        };
        let pre = ImagePreprocessor::new(4, 8, norm);
        let out = pre.preprocess(&solid_planar(4, [255, 0, 255])).unwrap();
        let plane = 8 * 8;

        // R: (1 - 0.5) / 0.5, G: (0 - 0.5) / 0.25, B: (1 - 0.5) / 1.0
        assert!(out[..plane].iter().all(|v| (v - 1.0).abs() < 1e-5));
        assert!(out[plane..2 * plane].iter().all(|v| (v + 2.0).abs() < 1e-5));
        assert!(out[2 * plane..].iter().all(|v| (v - 0.5).abs() < 1e-5));
    }

    #[test]
    fn test_planar_layout_preserved_without_resize() {
        let identity = Normalization {
            mean: [0.0; 3],
            std: [1.0; 3],
        };
        let pre = ImagePreprocessor::new(2, 2, identity);
        // R plane, G plane, B plane for a 2x2 image
        let planar = [0, 51, 102, 153, 255, 255, 255, 255, 0, 0, 0, 0];
        let out = pre.preprocess(&planar).unwrap();

        assert!((out[1] - 0.2).abs() < 1e-6);
        assert!((out[3] - 0.6).abs() < 1e-6);
        assert!((out[4] - 1.0).abs() < 1e-6);
        assert_eq!(out[8], 0.0);
    }

    #[test]
    fn test_deterministic() {
        let pre = ImagePreprocessor::new(32, 48, Normalization::cifar100());
        let planar: Vec<u8> = (0..3 * 32 * 32).map(|i| (i % 251) as u8).collect();
        assert_eq!(pre.preprocess(&planar).unwrap(), pre.preprocess(&planar).unwrap());
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let pre = ImagePreprocessor::new(32, 32, Normalization::cifar100());
        assert!(pre.preprocess(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_normalization_validate() {
        assert!(Normalization::cifar100().validate().is_ok());
        let bad = Normalization {
            mean: [0.0; 3],
            std: [1.0, -1.0, 1.0],
        };
        assert!(bad.validate().is_err());
    }
}
