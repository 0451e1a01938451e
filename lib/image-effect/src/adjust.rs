//! Direct brightness/contrast/saturation adjustment of a whole image.

use crate::{Effect, ImageEffect, NEUTRAL_FACTOR, restore_color};
use derivative::Derivative;
use derive_setters::Setters;
use image::DynamicImage;

pub const MIN_FACTOR: f32 = 0.0;
pub const MAX_FACTOR: f32 = 3.0;

/// Clamps a factor into `[MIN_FACTOR, MAX_FACTOR]`. NaN is treated as neutral.
pub fn clamp_factor(factor: f32) -> f32 {
    if factor.is_nan() {
        NEUTRAL_FACTOR
    } else {
        factor.clamp(MIN_FACTOR, MAX_FACTOR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
pub struct Adjustments {
    #[derivative(Default(value = "NEUTRAL_FACTOR"))]
    pub brightness: f32,

    #[derivative(Default(value = "NEUTRAL_FACTOR"))]
    pub contrast: f32,

    #[derivative(Default(value = "NEUTRAL_FACTOR"))]
    pub saturation: f32,
}

impl Adjustments {
    pub fn new(brightness: f32, contrast: f32, saturation: f32) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.effects().is_empty()
    }

    /// Effects to run, in brightness -> contrast -> saturation order.
    /// Factors equal to the neutral value are skipped.
    pub fn effects(&self) -> Vec<ImageEffect> {
        let mut effects = vec![];

        let brightness = clamp_factor(self.brightness);
        if brightness != NEUTRAL_FACTOR {
            effects.push(ImageEffect::brightness(brightness));
        }

        let contrast = clamp_factor(self.contrast);
        if contrast != NEUTRAL_FACTOR {
            effects.push(ImageEffect::contrast(contrast));
        }

        let saturation = clamp_factor(self.saturation);
        if saturation != NEUTRAL_FACTOR {
            effects.push(ImageEffect::saturation(saturation));
        }

        effects
    }

    /// Returns an adjusted copy of `image`; the input is left untouched.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let effects = self.effects();
        if effects.is_empty() {
            return image.clone();
        }

        log::debug!("adjust image with {effects:?}");

        let output = effects
            .iter()
            .fold(image.to_rgba8(), |acc, effect| effect.apply(acc));

        restore_color(output, image.color())
    }
}

pub fn adjust(
    image: &DynamicImage,
    brightness: f32,
    contrast: f32,
    saturation: f32,
) -> DynamicImage {
    Adjustments::new(brightness, contrast, saturation).apply(image)
}
