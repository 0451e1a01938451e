pub mod adjust;
pub mod base_effect;

pub use adjust::{Adjustments, MAX_FACTOR, MIN_FACTOR, adjust, clamp_factor};

use image::{ColorType, DynamicImage, RgbaImage};

/// Factor that leaves an image unchanged.
pub const NEUTRAL_FACTOR: f32 = 1.0;

pub trait Effect {
    fn apply(&self, image: RgbaImage) -> RgbaImage;
}

#[derive(Debug, Clone)]
pub enum ImageEffect {
    Brightness(base_effect::BrightnessConfig),
    Contrast(base_effect::ContrastConfig),
    Saturation(base_effect::SaturationConfig),
}

impl ImageEffect {
    pub fn brightness(factor: f32) -> Self {
        Self::Brightness(base_effect::BrightnessConfig::new().with_factor(factor))
    }

    pub fn contrast(factor: f32) -> Self {
        Self::Contrast(base_effect::ContrastConfig::new().with_factor(factor))
    }

    pub fn saturation(factor: f32) -> Self {
        Self::Saturation(base_effect::SaturationConfig::new().with_factor(factor))
    }

    /// Applies the effect to a copy of `image`. See [`restore_color`] for the
    /// output colour type.
    pub fn apply_to(&self, image: &DynamicImage) -> DynamicImage {
        restore_color(self.apply(image.to_rgba8()), image.color())
    }
}

impl Effect for ImageEffect {
    fn apply(&self, image: RgbaImage) -> RgbaImage {
        match self {
            ImageEffect::Brightness(config) => config.apply(image),
            ImageEffect::Contrast(config) => config.apply(image),
            ImageEffect::Saturation(config) => config.apply(image),
        }
    }
}

/// Converts an effect output back to the 8-bit variant of the source colour
/// type: grayscale stays grayscale and alpha is kept only if the source had it.
/// 16-bit and float sources come back as 8 bits per channel.
pub(crate) fn restore_color(image: RgbaImage, source: ColorType) -> DynamicImage {
    let image = DynamicImage::ImageRgba8(image);
    match source {
        ColorType::L8 | ColorType::L16 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::La8 | ColorType::La16 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        source if source.has_alpha() => image,
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}
