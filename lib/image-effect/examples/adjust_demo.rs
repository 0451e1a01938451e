use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use image_effect::Adjustments;
use std::path::Path;

// cargo run -p image-effect --example adjust_demo -- [image]

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let output_dir = Path::new("tmp");
    std::fs::create_dir_all(output_dir)?;

    let img = match std::env::args().nth(1) {
        Some(path) => ImageReader::open(path)?.decode()?,
        None => DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, y| {
            Rgb([x as u8, y as u8, ((x + y) / 2) as u8])
        })),
    };

    let levels = [0.0, 0.5, 1.0, 1.5, 3.0];

    for level in levels {
        for (name, adjustments) in [
            ("brightness", Adjustments::default().with_brightness(level)),
            ("contrast", Adjustments::default().with_contrast(level)),
            ("saturation", Adjustments::default().with_saturation(level)),
        ] {
            let filename = format!("{name}_{level:.1}.png");
            adjustments.apply(&img).save(output_dir.join(&filename))?;
            log::info!("Generated {filename}");
        }
    }

    log::info!("Images saved to: tmp/");

    Ok(())
}
