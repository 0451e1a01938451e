use crate::{Error, Model, Result};
use fast_image_resize::{PixelType, ResizeOptions, Resizer, images::Image as FrImage};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, Rgba, RgbaImage};
use ndarray::{Array, ArrayD, Ix4};
use ort::{session::Session, value::TensorRef};
use std::{io::Cursor, path::Path};

const COMMON_INPUT_NAMES: [&str; 4] = ["input", "input.1", "image", "x"];
const COMMON_OUTPUT_NAMES: [&str; 4] = ["output", "mask", "foreground", "alpha"];

#[derive(Debug)]
#[non_exhaustive]
pub struct BackgroundRemover {
    model: Model,
    session: Session,
    input_name: String,
    output_names: Vec<String>,
}

impl BackgroundRemover {
    pub fn new<P: AsRef<Path>>(model: Model, model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(Error::ModelNotFound(model_path.to_path_buf()));
        }

        log::info!("Loading {model} from: {}", model_path.display());

        let session = Session::builder()?.commit_from_file(model_path)?;
        let input_name = Self::pick_input_name(&session);
        let output_names = session
            .outputs()
            .iter()
            .map(|output| output.name().to_string())
            .collect();

        Ok(Self {
            model,
            session,
            input_name,
            output_names,
        })
    }

    /// Decodes `data`, removes its background and encodes the result as PNG
    /// with the foreground mask in the alpha channel.
    pub fn remove_encoded(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let image = image::load_from_memory(data)?;
        let output = self.remove(&image.to_rgba8())?;

        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(output).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    }

    /// Removes the background, keeping any transparency the input already had.
    pub fn remove(&mut self, image: &RgbaImage) -> Result<RgbaImage> {
        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
        let mask = self.get_mask(&rgb)?;
        Ok(Self::apply_mask(image, &mask))
    }

    // mask is grayscale (0=background, 255=foreground)
    pub fn get_mask(&mut self, image: &RgbImage) -> Result<GrayImage> {
        let (input_width, input_height) = self.model.to_input_size();
        let resized = resize_rgb(image, input_width / 2 * 2, input_height / 2 * 2)?;

        let (mean, std) = self.model.normalization();
        let output = self.run_inference(to_nchw(&resized, mean, std))?;
        let mask = extract_mask(&output, self.model.stretches_output())?;

        resize_mask(&mask, image.width(), image.height())
    }

    /// Multiplies the image's alpha by the mask. Both must have the same size.
    pub fn apply_mask(image: &RgbaImage, mask: &GrayImage) -> RgbaImage {
        RgbaImage::from_fn(image.width(), image.height(), |x, y| {
            let pixel = image.get_pixel(x, y);
            let alpha = pixel[3] as u32 * mask.get_pixel(x, y)[0] as u32 / 255;
            Rgba([pixel[0], pixel[1], pixel[2], alpha as u8])
        })
    }

    fn run_inference(&mut self, input: Array<f32, Ix4>) -> Result<ArrayD<f32>> {
        let input_tensor = TensorRef::from_array_view(input.view())?;
        let outputs = self
            .session
            .run(ort::inputs! { &self.input_name => input_tensor })?;

        let candidates = COMMON_OUTPUT_NAMES
            .iter()
            .map(|name| name.to_string())
            .chain(self.output_names.iter().cloned());

        for name in candidates {
            if !outputs.contains_key(name.as_str()) {
                continue;
            }

            if let Ok(array) = outputs[name.as_str()].try_extract_array::<f32>() {
                return Ok(array.into_dyn().to_owned());
            }
        }

        Err(Error::InvalidOutput(
            "Failed to extract any output from model".to_string(),
        ))
    }

    fn pick_input_name(session: &Session) -> String {
        let model_inputs = session
            .inputs()
            .iter()
            .map(|input| input.name().to_string())
            .collect::<Vec<_>>();

        COMMON_INPUT_NAMES
            .iter()
            .find(|common| model_inputs.iter().any(|name| name == *common))
            .map(|name| name.to_string())
            .or_else(|| model_inputs.first().cloned())
            .unwrap_or_else(|| "input".to_string())
    }
}

fn resize_rgb(image: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }

    let src = FrImage::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x3,
    )?;
    let mut dst = FrImage::new(width, height, PixelType::U8x3);
    Resizer::new().resize(&src, &mut dst, &ResizeOptions::new())?;

    RgbImage::from_raw(width, height, dst.into_vec())
        .ok_or_else(|| Error::ImageProcessing("Failed to create resized image".to_string()))
}

fn resize_mask(mask: &GrayImage, width: u32, height: u32) -> Result<GrayImage> {
    if mask.dimensions() == (width, height) {
        return Ok(mask.clone());
    }

    let src = FrImage::from_vec_u8(
        mask.width(),
        mask.height(),
        mask.as_raw().clone(),
        PixelType::U8,
    )?;
    let mut dst = FrImage::new(width, height, PixelType::U8);
    Resizer::new().resize(&src, &mut dst, &ResizeOptions::new())?;

    GrayImage::from_raw(width, height, dst.into_vec())
        .ok_or_else(|| Error::ImageProcessing("Failed to create resized mask".to_string()))
}

// (1, 3, H, W), each channel as (pixel / 255 - mean) / std
fn to_nchw(image: &RgbImage, mean: [f32; 3], std: [f32; 3]) -> Array<f32, Ix4> {
    let (width, height) = image.dimensions();
    let mut array = Array::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            array[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
        }
    }

    array
}

fn extract_mask(output: &ArrayD<f32>, stretch: bool) -> Result<GrayImage> {
    let shape = output.shape();
    let (width, height) = match shape.len() {
        4 => (shape[3], shape[2]), // (1, C, H, W)
        3 => (shape[2], shape[1]), // (C, H, W)
        2 => (shape[1], shape[0]), // (H, W)
        _ => {
            return Err(Error::InvalidOutput(format!(
                "Unsupported output shape: {shape:?}"
            )));
        }
    };

    // first channel only, in logical order
    let values = output.iter().take(width * height).copied().collect::<Vec<f32>>();

    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let range = if stretch && max > min { Some((min, max - min)) } else { None };

    let mask = values
        .into_iter()
        .map(|value| {
            let value = match range {
                Some((min, span)) => (value - min) / span,
                None => value,
            };
            (value.clamp(0.0, 1.0) * 255.0) as u8
        })
        .collect::<Vec<u8>>();

    GrayImage::from_raw(width as u32, height as u32, mask)
        .ok_or_else(|| Error::ImageProcessing("Failed to create mask image".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use ndarray::IxDyn;

    #[test]
    fn test_apply_mask() {
        let image = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
        let mask = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }]));

        let output = BackgroundRemover::apply_mask(&image, &mask);
        assert_eq!(output.get_pixel(0, 0), &Rgba([10, 20, 30, 0]));
        assert_eq!(output.get_pixel(1, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_apply_mask_keeps_existing_transparency() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 128]));
        let mask = GrayImage::from_pixel(1, 1, Luma([255]));

        let output = BackgroundRemover::apply_mask(&image, &mask);
        assert_eq!(output.get_pixel(0, 0)[3], 128);
    }

    #[test]
    fn test_extract_mask_shapes() {
        let output = ArrayD::from_shape_vec(IxDyn(&[1, 1, 2, 3]), vec![0.0, 0.5, 1.0, 2.0, -1.0, 0.25])
            .unwrap();
        let mask = extract_mask(&output, false).unwrap();

        assert_eq!(mask.dimensions(), (3, 2));
        assert_eq!(mask.as_raw(), &vec![0, 127, 255, 255, 0, 63]);

        let output = ArrayD::from_shape_vec(IxDyn(&[4]), vec![0.0; 4]).unwrap();
        assert!(extract_mask(&output, false).is_err());
    }

    #[test]
    fn test_extract_mask_stretches_prediction() {
        let output = ArrayD::from_shape_vec(IxDyn(&[1, 1, 1, 3]), vec![0.2, 0.4, 0.6]).unwrap();

        let mask = extract_mask(&output, true).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert!((126..=128).contains(&mask.get_pixel(1, 0)[0]));
        assert_eq!(mask.get_pixel(2, 0)[0], 255);

        let mask = extract_mask(&output, false).unwrap();
        assert_eq!(mask.get_pixel(2, 0)[0], 153);

        // a flat prediction has nothing to stretch
        let flat = ArrayD::from_shape_vec(IxDyn(&[1, 2]), vec![0.5, 0.5]).unwrap();
        assert_eq!(extract_mask(&flat, true).unwrap().as_raw(), &vec![127, 127]);
    }

    #[test]
    fn test_to_nchw_normalization() {
        let image = RgbImage::from_pixel(2, 1, image::Rgb([255, 0, 51]));
        let approx = |a: f32, b: f32| (a - b).abs() < 1e-4;

        let (mean, std) = Model::U2NET.normalization();
        let array = to_nchw(&image, mean, std);
        assert_eq!(array.shape(), &[1, 3, 1, 2]);
        assert!(approx(array[[0, 0, 0, 1]], (1.0 - 0.485) / 0.229));
        assert!(approx(array[[0, 1, 0, 1]], -0.456 / 0.224));
        assert!(approx(array[[0, 2, 0, 0]], (0.2 - 0.406) / 0.225));

        let (mean, std) = Model::Rmbg14.normalization();
        let array = to_nchw(&image, mean, std);
        assert!(approx(array[[0, 0, 0, 0]], 0.5));
        assert!(approx(array[[0, 1, 0, 0]], -0.5));
        assert!(approx(array[[0, 2, 0, 0]], -0.3));

        let (mean, std) = Model::Modnet.normalization();
        let array = to_nchw(&image, mean, std);
        assert!(approx(array[[0, 0, 0, 0]], 1.0));
        assert!(approx(array[[0, 1, 0, 0]], -1.0));
        assert!(approx(array[[0, 2, 0, 0]], -0.6));
    }

    #[test]
    fn test_resize_mask() {
        let mask = GrayImage::from_pixel(4, 4, Luma([200]));
        let resized = resize_mask(&mask, 8, 2).unwrap();

        assert_eq!(resized.dimensions(), (8, 2));
        assert!(resized.pixels().all(|p| (199..=201).contains(&p[0])));
    }

    #[test]
    fn test_missing_model_file() {
        let result = BackgroundRemover::new(Model::U2NET, "/nonexistent/u2net.onnx");
        assert!(matches!(result, Err(Error::ModelNotFound(_))));
    }
}
