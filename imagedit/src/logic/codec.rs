use image::{DynamicImage, ImageFormat, ImageResult};
use std::io::Cursor;

/// Decodes `data`, detecting the format from its content.
pub fn decode(data: &[u8]) -> ImageResult<(DynamicImage, ImageFormat)> {
    let format = image::guess_format(data)?;
    let image = image::load_from_memory_with_format(data, format)?;
    Ok((image, format))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);

    match format {
        ImageFormat::Png => image.write_to(&mut cursor, format)?,
        // jpeg has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, format)?,
        _ if image.color().has_alpha() => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut cursor, format)?
        }
        _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, format)?,
    }

    Ok(buffer)
}

/// Format implied by the extension of `filename`.
pub fn format_for(filename: &str) -> Option<ImageFormat> {
    ImageFormat::from_path(filename).ok()
}

/// Format of the saved output. PNG when the background was removed.
pub fn output_format(input: ImageFormat, background_removed: bool) -> ImageFormat {
    if background_removed {
        ImageFormat::Png
    } else {
        input
    }
}
