use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat, RgbaImage};
use pdfium_render::prelude::*;

use crate::error::MediaError;

/// Fixed render scale for document pages.
pub const RENDER_SCALE: f32 = 2.0;

/// One rendered document page.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// 1-based page number.
    pub number: usize,
    pub image: RgbaImage,
}

impl RasterPage {
    /// Upload name of the page, `page-<n>.png`.
    pub fn file_name(&self) -> String {
        format!("page-{}.png", self.number)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, MediaError> {
        encode_png(&self.image)
    }
}

/// Renders every page of a document to RGBA, in page order.
pub trait PageRasterizer {
    fn rasterize(&self, document: &[u8]) -> Result<Vec<RasterPage>, MediaError>;
}

/// [`PageRasterizer`] backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// Bind to the system pdfium, or to the library inside `library_dir`.
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium, MediaError> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| MediaError::Render(format!("cannot load pdfium: {e}")))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, document: &[u8]) -> Result<Vec<RasterPage>, MediaError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(document, None)
            .map_err(|e| MediaError::Render(e.to_string()))?;

        let config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);
        let mut pages = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let number = index + 1;
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| MediaError::Render(format!("page {number}: {e}")))?;
            let width = bitmap.width() as u32;
            let height = bitmap.height() as u32;
            let image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(
                || MediaError::Render(format!("page {number}: bitmap size mismatch")),
            )?;
            tracing::debug!(page = number, width, height, "Rendered page");
            pages.push(RasterPage { number, image });
        }
        Ok(pages)
    }
}

/// Encode RGBA pixels as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, MediaError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| MediaError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Render a document and encode each page as `(page-<n>.png, bytes)`.
///
/// All-or-nothing: the first failing page fails the whole document.
pub fn render_pages_to_png(
    rasterizer: &dyn PageRasterizer,
    document: &[u8],
) -> Result<Vec<(String, Vec<u8>)>, MediaError> {
    let pages = rasterizer.rasterize(document)?;
    if pages.is_empty() {
        return Err(MediaError::Render("document has no pages".to_string()));
    }
    pages
        .iter()
        .map(|page| Ok((page.file_name(), page.encode_png()?)))
        .collect()
}
