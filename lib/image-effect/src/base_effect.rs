use crate::{Effect, NEUTRAL_FACTOR};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgba, RgbaImage};

/// ITU-R 601-2 luma, integer arithmetic.
pub fn luma(pixel: &Rgba<u8>) -> u8 {
    ((pixel[0] as u32 * 299 + pixel[1] as u32 * 587 + pixel[2] as u32 * 114) / 1000) as u8
}

// degenerate + factor * (value - degenerate), clipped to a channel value
fn blend(degenerate: f32, value: u8, factor: f32) -> u8 {
    (degenerate + factor * (value as f32 - degenerate))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Brightness enhancement: blends with black, so 0.0 gives a black image.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct BrightnessConfig {
    #[derivative(Default(value = "NEUTRAL_FACTOR"))]
    factor: f32,
}

impl BrightnessConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for BrightnessConfig {
    fn apply(&self, mut image: RgbaImage) -> RgbaImage {
        for pixel in image.pixels_mut() {
            for i in 0..3 {
                pixel[i] = blend(0.0, pixel[i], self.factor);
            }
        }

        image
    }
}

/// Contrast enhancement: blends with a uniform gray at the image's mean luma.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct ContrastConfig {
    #[derivative(Default(value = "NEUTRAL_FACTOR"))]
    factor: f32,
}

impl ContrastConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean_luma(image: &RgbaImage) -> u8 {
        let count = image.width() as u64 * image.height() as u64;
        if count == 0 {
            return 0;
        }

        let sum = image.pixels().map(|p| luma(p) as u64).sum::<u64>();
        (sum as f64 / count as f64 + 0.5) as u8
    }
}

impl Effect for ContrastConfig {
    fn apply(&self, mut image: RgbaImage) -> RgbaImage {
        let mean = Self::mean_luma(&image) as f32;

        for pixel in image.pixels_mut() {
            for i in 0..3 {
                pixel[i] = blend(mean, pixel[i], self.factor);
            }
        }

        image
    }
}

/// Saturation (color) enhancement: blends each pixel with its own luma, so
/// 0.0 gives a grayscale image.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct SaturationConfig {
    #[derivative(Default(value = "NEUTRAL_FACTOR"))]
    factor: f32,
}

impl SaturationConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for SaturationConfig {
    fn apply(&self, mut image: RgbaImage) -> RgbaImage {
        for pixel in image.pixels_mut() {
            let gray = luma(pixel) as f32;

            for i in 0..3 {
                pixel[i] = blend(gray, pixel[i], self.factor);
            }
        }

        image
    }
}
