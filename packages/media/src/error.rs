use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to render document: {0}")]
    Render(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}
