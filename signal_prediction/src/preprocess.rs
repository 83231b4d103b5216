use image::{imageops::FilterType, DynamicImage, ImageFormat};
use ndarray::{Array, Ix4};
use std::io::Cursor;
use thiserror::Error;

pub const INPUT_HEIGHT: u32 = 224;
pub const INPUT_WIDTH: u32 = 224;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("failed to probe image format: {0}")]
    Probe(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to re-encode image for display: {0}")]
    Encode(image::ImageError),
}

pub fn decode_image(image_data: &[u8]) -> Result<DynamicImage, PreprocessError> {
    let image_reader =
        image::ImageReader::new(Cursor::new(image_data)).with_guessed_format()?;

    Ok(image_reader.decode()?)
}

/// Builds the model input tensor: batch dimension of 1, NHWC layout.
///
/// Non-square inputs are distorted to the target size, and any color mode
/// is normalized to 3-channel RGB first. Channel values stay in the
/// [0, 255] range the model was trained on; there is no rescale to [0, 1].
pub fn preprocess(
    image: &DynamicImage,
    target_height: u32,
    target_width: u32,
) -> Array<f32, Ix4> {
    let resized = image
        .resize_exact(target_width, target_height, FilterType::CatmullRom)
        .to_rgb8();

    let mut input = Array::zeros((1, target_height as usize, target_width as usize, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        input[[0, y as usize, x as usize, 0]] = r as f32;
        input[[0, y as usize, x as usize, 1]] = g as f32;
        input[[0, y as usize, x as usize, 2]] = b as f32;
    }

    input
}

/// PNG re-encoding of the uploaded image, returned so the caller can
/// display what was classified.
pub fn encode_display_png(image: &DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(PreprocessError::Encode)?;

    Ok(buffer)
}
