use image::imageops::FilterType;

use crate::error::MediaError;
use crate::transcode::{EncodedImage, decode, encode_webp};

/// Largest side of a cropped avatar.
pub const DEFAULT_MAX_OUTPUT_SIZE: u32 = 1000;

const CROP_QUALITY: f32 = 0.9;

/// A square selection made on an on-screen preview of the image.
///
/// The preview is the image scaled to `displayed_width` x `displayed_height`
/// and centered inside a `container_width` x `container_height` box. `x`,
/// `y` and `size` are in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSelection {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub displayed_width: f64,
    pub displayed_height: f64,
    pub container_width: f64,
    pub container_height: f64,
}

impl CropSelection {
    /// A selection made directly on the natural-size image.
    pub fn natural(x: u32, y: u32, size: u32, width: u32, height: u32) -> Self {
        Self {
            x: x as f64,
            y: y as f64,
            size: size as f64,
            displayed_width: width as f64,
            displayed_height: height as f64,
            container_width: width as f64,
            container_height: height as f64,
        }
    }
}

/// Source-pixel square `(x, y, side)` for a selection on an image of
/// `natural_width` x `natural_height`.
pub fn source_region(
    selection: &CropSelection,
    natural_width: u32,
    natural_height: u32,
) -> Result<(u32, u32, u32), MediaError> {
    if selection.displayed_width <= 0.0 || selection.displayed_height <= 0.0 {
        return Err(MediaError::InvalidOptions(
            "displayed size must be positive".to_string(),
        ));
    }
    if selection.size <= 0.0 {
        return Err(MediaError::InvalidOptions(
            "selection size must be positive".to_string(),
        ));
    }
    if natural_width == 0 || natural_height == 0 {
        return Err(MediaError::InvalidOptions("image has no pixels".to_string()));
    }

    let offset_x = (selection.container_width - selection.displayed_width) / 2.0;
    let offset_y = (selection.container_height - selection.displayed_height) / 2.0;
    let scale_x = natural_width as f64 / selection.displayed_width;
    let scale_y = natural_height as f64 / selection.displayed_height;

    let max_side = natural_width.min(natural_height);
    let side = ((selection.size * scale_x).round() as u32).clamp(1, max_side);

    let x = ((selection.x - offset_x) * scale_x).round().max(0.0) as u32;
    let y = ((selection.y - offset_y) * scale_y).round().max(0.0) as u32;
    let x = x.min(natural_width - side);
    let y = y.min(natural_height - side);

    Ok((x, y, side))
}

/// Crop a square avatar out of `source` and encode it as WebP.
///
/// The output side is the selected side in source pixels, downsampled to
/// `max_output_size` when larger.
pub fn crop_to_square(
    source: &[u8],
    selection: CropSelection,
    max_output_size: u32,
) -> Result<EncodedImage, MediaError> {
    if max_output_size == 0 {
        return Err(MediaError::InvalidOptions(
            "max output size must be positive".to_string(),
        ));
    }
    let image = decode(source)?;
    let (x, y, side) = source_region(&selection, image.width(), image.height())?;

    let mut cropped = image.crop_imm(x, y, side, side);
    if side > max_output_size {
        cropped = cropped.resize_exact(max_output_size, max_output_size, FilterType::Lanczos3);
    }

    encode_webp(&cropped.to_rgba8(), CROP_QUALITY)
}
