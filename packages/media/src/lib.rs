pub mod crop;
pub mod error;
pub mod raster;
pub mod transcode;

pub use crop::{CropSelection, crop_to_square};
pub use error::MediaError;
pub use raster::{PageRasterizer, PdfiumRasterizer, RasterPage, render_pages_to_png};
pub use transcode::{EncodedImage, WebImageOptions, transcode_to_web_format};
