use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::error::MediaError;

/// Bounds and quality for web image encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebImageOptions {
    /// Lossy quality in `(0, 1]`.
    pub quality: f32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for WebImageOptions {
    fn default() -> Self {
        Self {
            quality: 0.8,
            max_width: 800,
            max_height: 600,
        }
    }
}

/// An encoded image ready for upload.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
}

/// Largest size with the same aspect ratio that fits in the bounds.
/// Never upscales and never returns a zero side.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_height.max(1));
    (w, h)
}

/// Decode, downsize and re-encode an image as lossy WebP.
pub fn transcode_to_web_format(
    source: &[u8],
    options: WebImageOptions,
) -> Result<EncodedImage, MediaError> {
    if options.max_width == 0 || options.max_height == 0 {
        return Err(MediaError::InvalidOptions(
            "bounds must be positive".to_string(),
        ));
    }
    let image = decode(source)?;
    let (width, height) = fit_within(
        image.width(),
        image.height(),
        options.max_width,
        options.max_height,
    );
    let resized = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    };

    tracing::debug!(width, height, quality = options.quality, "Transcoding image to WebP");
    encode_webp(&resized.to_rgba8(), options.quality)
}

/// Encode RGBA pixels as lossy WebP at `quality` in `(0, 1]`.
pub fn encode_webp(pixels: &RgbaImage, quality: f32) -> Result<EncodedImage, MediaError> {
    if !(quality > 0.0 && quality <= 1.0) {
        return Err(MediaError::InvalidOptions(format!(
            "quality must be in (0, 1], got {quality}"
        )));
    }
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(MediaError::Encode("image has no pixels".to_string()));
    }

    let encoded = webp::Encoder::from_rgba(pixels.as_raw(), pixels.width(), pixels.height())
        .encode(quality * 100.0);
    if encoded.is_empty() {
        return Err(MediaError::Encode("WebP encoder produced no output".to_string()));
    }

    Ok(EncodedImage {
        bytes: encoded.to_vec(),
        width: pixels.width(),
        height: pixels.height(),
        content_type: "image/webp",
    })
}

/// Pixel dimensions of an encoded image, read from its header.
pub fn dimensions(source: &[u8]) -> Result<(u32, u32), MediaError> {
    let reader = image::ImageReader::new(std::io::Cursor::new(source))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    Ok(reader.into_dimensions()?)
}

pub(crate) fn decode(source: &[u8]) -> Result<DynamicImage, MediaError> {
    Ok(image::load_from_memory(source)?)
}
