//! Four level error-diffusion quantizer.

use alloc::{boxed::Box, vec, vec::Vec};
use core::fmt;

use crate::geometry::{HEIGHT, PIXEL_COUNT, WIDTH};

/// Display levels addressed by the quantized indices 0..=3.
pub const LEVELS: [u8; 4] = [0, 85, 170, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The raster does not hold the number of samples its dimensions call for.
    InvalidLength { expected: usize, actual: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::InvalidLength { expected, actual } => {
                write!(f, "raster holds {actual} samples, expected {expected}")
            }
        }
    }
}

impl core::error::Error for FrameError {}

fn check_len(len: usize, expected: usize) -> Result<(), FrameError> {
    if len != expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// 8-bit grayscale source frame, `WIDTH * HEIGHT` samples in row-major order.
///
/// 0 means "no ink": the image source inverts luma before handing frames over.
#[derive(Clone, PartialEq, Eq)]
pub struct GrayscaleFrame {
    pixels: Box<[u8]>,
}

impl GrayscaleFrame {
    pub fn new(pixels: Vec<u8>) -> Result<Self, FrameError> {
        check_len(pixels.len(), PIXEL_COUNT)?;
        Ok(Self {
            pixels: pixels.into_boxed_slice(),
        })
    }

    pub fn from_slice(pixels: &[u8]) -> Result<Self, FrameError> {
        Self::new(pixels.to_vec())
    }

    pub fn filled(value: u8) -> Self {
        Self {
            pixels: vec![value; PIXEL_COUNT].into_boxed_slice(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Frame of level indices (0..=3), same shape as [`GrayscaleFrame`].
#[derive(Clone, PartialEq, Eq)]
pub struct QuantizedFrame {
    indices: Box<[u8]>,
}

impl QuantizedFrame {
    pub fn new(indices: Vec<u8>) -> Result<Self, FrameError> {
        check_len(indices.len(), PIXEL_COUNT)?;
        Ok(Self {
            indices: indices.into_boxed_slice(),
        })
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.indices[y * WIDTH + x]
    }
}

/// Index of the nearest level. Ties go to the lower index.
fn nearest_level(value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = (value - LEVELS[0] as f64).abs();
    for (index, level) in LEVELS.iter().enumerate().skip(1) {
        let distance = (value - *level as f64).abs();
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}

/// Floyd-Steinberg dithers an arbitrary `width * height` raster to level indices.
///
/// Pixels are visited strictly row-major, left to right; every later decision reads the error
/// accumulated by earlier ones.
pub fn dither(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, FrameError> {
    check_len(pixels.len(), width * height)?;
    Ok(diffuse(pixels, width, height))
}

fn diffuse(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut work: Vec<f64> = pixels.iter().map(|&p| p as f64).collect();
    let mut out = vec![0u8; pixels.len()];

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let old = work[i];
            let index = nearest_level(old);
            out[i] = index as u8;
            let err = old - LEVELS[index] as f64;

            if x + 1 < width {
                work[i + 1] += err * 7.0 / 16.0;
            }
            if y + 1 < height {
                if x > 0 {
                    work[i + width - 1] += err * 3.0 / 16.0;
                }
                work[i + width] += err * 5.0 / 16.0;
                if x + 1 < width {
                    work[i + width + 1] += err * 1.0 / 16.0;
                }
            }
        }
    }
    out
}

pub fn quantize(frame: &GrayscaleFrame) -> QuantizedFrame {
    QuantizedFrame {
        indices: diffuse(frame.pixels(), WIDTH, HEIGHT).into_boxed_slice(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        assert_eq!(
            GrayscaleFrame::new(vec![0; PIXEL_COUNT - 1]).err(),
            Some(FrameError::InvalidLength {
                expected: PIXEL_COUNT,
                actual: PIXEL_COUNT - 1
            })
        );
        assert!(GrayscaleFrame::from_slice(&[0; PIXEL_COUNT]).is_ok());
        assert!(QuantizedFrame::new(vec![0; 3]).is_err());
    }

    #[test]
    fn test_dither_rejects_mismatched_raster() {
        assert_eq!(
            dither(&[0; 5], 2, 3),
            Err(FrameError::InvalidLength {
                expected: 6,
                actual: 5
            })
        );
        assert_eq!(dither(&[], 0, 4), Ok(vec![]));
    }

    #[test]
    fn test_solid_extremes() {
        let black = quantize(&GrayscaleFrame::filled(0));
        assert!(black.indices().iter().all(|&i| i == 0));

        let full = quantize(&GrayscaleFrame::filled(255));
        assert!(full.indices().iter().all(|&i| i == 3));
    }

    #[test]
    fn test_exact_levels_have_no_error() {
        for (index, level) in LEVELS.iter().enumerate() {
            let out = dither(&[*level; 16], 4, 4).unwrap();
            assert!(out.iter().all(|&i| i as usize == index));
        }
    }

    #[test]
    fn test_midpoint_ties_resolve_low() {
        // 42.5 is equidistant from 0 and 85; a single pixel has no prior error.
        assert_eq!(nearest_level(42.5), 0);
        assert_eq!(nearest_level(127.5), 1);
        assert_eq!(nearest_level(212.5), 2);
        assert_eq!(nearest_level(42.6), 1);
    }

    #[test]
    fn test_error_propagates_right() {
        // 40 -> level 0 with error 40; the neighbour sees 40 + 17.5 = 57.5 -> level 1.
        assert_eq!(dither(&[40, 40], 2, 1).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_error_propagates_down() {
        // Column raster: 5/16 of the error flows to the pixel below.
        // 60 -> 85 (err -25), next 60 - 7.8125 = 52.1875 -> 85 (err -32.8..), next ~49.7 -> 85.
        assert_eq!(dither(&[60, 60, 60], 1, 3).unwrap(), vec![1, 1, 1]);
        // 30 -> 0 (err 30), next 30 + 9.375 = 39.375 -> 0, next 30 + 12.3 = 42.3 -> 0.
        assert_eq!(dither(&[30, 30, 30], 1, 3).unwrap(), vec![0, 0, 0]);
        // Three taps at once: below-left 3/16, below 5/16, below-right 1/16.
        // Top middle 64 -> 85 (err -21) pushes every neighbour below zero.
        let out = dither(&[0, 64, 0, 0, 0, 0], 3, 2).unwrap();
        assert_eq!(&out[..3], &[0, 1, 0]);
        assert_eq!(&out[3..], &[0, 0, 0]);
    }

    #[test]
    fn test_average_brightness_is_preserved() {
        let out = dither(&[128; 64], 8, 8).unwrap();
        let sum: u32 = out.iter().map(|&i| LEVELS[i as usize] as u32).sum();
        let mean = sum / 64;
        assert!((120..=136).contains(&mean), "mean {mean}");
        assert!(out.iter().all(|&i| i == 1 || i == 2));
    }
}
