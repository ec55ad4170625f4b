//! Image preprocessing
//!
//! Decode → resize to 224×224 (aspect ratio not preserved) → RGB →
//! scale to [0, 1] → add batch dimension.

use super::{PipelineError, CHANNELS, INPUT_SIZE};
use image::imageops::FilterType;
use ndarray::Array4;
use tracing::debug;

/// Turn encoded image bytes into the `(1, 224, 224, 3)` model input
///
/// The format is guessed from the bytes themselves. Grayscale and alpha
/// images are converted to RGB so the channel count is always 3.
pub fn preprocess(image_bytes: &[u8]) -> Result<Array4<f32>, PipelineError> {
    let decoded = image::load_from_memory(image_bytes)?;
    debug!(
        "Decoded {}x{} image ({:?})",
        decoded.width(),
        decoded.height(),
        decoded.color()
    );

    let size = INPUT_SIZE as u32;
    let rgb = decoded
        .resize_exact(size, size, FilterType::CatmullRom)
        .to_rgb8();

    let tensor = Array4::from_shape_fn((1, INPUT_SIZE, INPUT_SIZE, CHANNELS), |(_, y, x, c)| {
        f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0
    });

    Ok(tensor)
}
