//! Applies classified prompt actions to an image.
//!
//! Actions are applied in rank order and compose sequentially: each step
//! receives the image produced by the previous one.

use crate::{error::AdjustmentError, logic::codec};
use image::{DynamicImage, ImageFormat};
use image_effect::ImageEffect;
use prompt_classifier::Action;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    IncreaseBrightness,
    DecreaseBrightness,
    IncreaseContrast,
    DecreaseContrast,
    IncreaseSaturation,
    DecreaseSaturation,
    RemoveBackground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Increase,
    Decrease,
}

impl EditAction {
    pub fn from_label(label: &str) -> Option<Self> {
        let action = match label.trim() {
            "increase brightness" => Self::IncreaseBrightness,
            "decrease brightness" => Self::DecreaseBrightness,
            "increase contrast" => Self::IncreaseContrast,
            "decrease contrast" => Self::DecreaseContrast,
            "increase saturation" => Self::IncreaseSaturation,
            "decrease saturation" => Self::DecreaseSaturation,
            "remove background" => Self::RemoveBackground,
            _ => return None,
        };

        Some(action)
    }

    fn direction(&self) -> Option<Direction> {
        match self {
            Self::IncreaseBrightness | Self::IncreaseContrast | Self::IncreaseSaturation => {
                Some(Direction::Increase)
            }
            Self::DecreaseBrightness | Self::DecreaseContrast | Self::DecreaseSaturation => {
                Some(Direction::Decrease)
            }
            Self::RemoveBackground => None,
        }
    }

    /// Enhancement factor for `confidence`: `1 + c` to increase,
    /// `max(floor, 1 - c)` to decrease. `None` for background removal.
    pub fn magnitude(&self, confidence: f32, floor: f32) -> Option<f32> {
        self.direction().map(|direction| match direction {
            Direction::Increase => 1.0 + confidence,
            Direction::Decrease => (1.0 - confidence).max(floor),
        })
    }

    fn effect(&self, factor: f32) -> Option<ImageEffect> {
        match self {
            Self::IncreaseBrightness | Self::DecreaseBrightness => {
                Some(ImageEffect::brightness(factor))
            }
            Self::IncreaseContrast | Self::DecreaseContrast => Some(ImageEffect::contrast(factor)),
            Self::IncreaseSaturation | Self::DecreaseSaturation => {
                Some(ImageEffect::saturation(factor))
            }
            Self::RemoveBackground => None,
        }
    }
}

/// Effects applied during one request. The last value per effect wins.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct AdjustmentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_removal: Option<bool>,
}

impl AdjustmentRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn record(&mut self, action: EditAction, factor: f32) {
        match action {
            EditAction::IncreaseBrightness | EditAction::DecreaseBrightness => {
                self.brightness = Some(factor)
            }
            EditAction::IncreaseContrast | EditAction::DecreaseContrast => {
                self.contrast = Some(factor)
            }
            EditAction::IncreaseSaturation | EditAction::DecreaseSaturation => {
                self.saturation = Some(factor)
            }
            EditAction::RemoveBackground => self.background_removal = Some(true),
        }
    }
}

/// Removes the background of an encoded image.
///
/// Input is a PNG buffer; output is an encoded buffer with an alpha channel.
pub trait BackgroundRemoval: Send + Sync {
    fn remove_background(&self, png: &[u8]) -> background_remover::Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct MappedImage {
    pub image: DynamicImage,
    pub record: AdjustmentRecord,
    pub background_removed: bool,
}

#[derive(Clone)]
pub struct ActionMapper {
    decrease_floor: f32,
    remover: Arc<dyn BackgroundRemoval>,
}

impl ActionMapper {
    pub fn new(decrease_floor: f32, remover: Arc<dyn BackgroundRemoval>) -> Self {
        Self {
            decrease_floor,
            remover,
        }
    }

    /// Applies `actions` in order. Unknown labels are skipped.
    pub fn apply_actions(
        &self,
        image: DynamicImage,
        actions: &[Action],
    ) -> Result<MappedImage, AdjustmentError> {
        let mut image = image;
        let mut record = AdjustmentRecord::default();
        let mut background_removed = false;

        for action in actions {
            let Some(edit) = EditAction::from_label(&action.label) else {
                log::debug!("skip unmapped action `{}`", action.label);
                continue;
            };

            match edit.magnitude(action.confidence, self.decrease_floor) {
                Some(factor) => {
                    if let Some(effect) = edit.effect(factor) {
                        log::info!("apply {edit:?} x{factor:.3} (confidence {:.3})", action.confidence);
                        image = effect.apply_to(&image);
                        record.record(edit, factor);
                    }
                }
                None => {
                    log::info!("apply {edit:?} (confidence {:.3})", action.confidence);
                    image = self.remove_background(&image)?;
                    record.record(edit, 1.0);
                    background_removed = true;
                }
            }
        }

        Ok(MappedImage {
            image,
            record,
            background_removed,
        })
    }

    fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, AdjustmentError> {
        let png = codec::encode(image, ImageFormat::Png).map_err(background_remover::Error::from)?;
        let output = self.remover.remove_background(&png)?;
        let (image, _) = codec::decode(&output).map_err(background_remover::Error::from)?;
        Ok(image)
    }
}
