//! PDF rasterisation: render pages to RGBA bitmaps via pdfium.
//!
//! The pipeline only needs two things from a rasteriser: the page count and a
//! bitmap for page N at a given scale. [`PageSource`] captures exactly that,
//! so the conversion core can be driven by pdfium in production and by a
//! synthetic source in tests.
//!
//! pdfium keeps thread-local state and is not async-safe; every function here
//! is blocking and is called from `tokio::task::spawn_blocking`.

use crate::error::DarkModeError;
use crate::output::DocumentMetadata;
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming an existing pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// A document that can be rasterised page by page.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Render page `page_num` (1-indexed) at `scale` × its native size.
    fn render_page(&mut self, page_num: usize, scale: f32) -> Result<RgbaImage, DarkModeError>;
}

/// Bind to a pdfium library.
///
/// Resolution order: `PDFIUM_LIB_PATH`, then a library in the working
/// directory, then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, DarkModeError> {
    if let Ok(path) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !path.is_empty() {
            debug!("Binding pdfium from {}={}", PDFIUM_LIB_PATH_ENV, path);
            let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
                DarkModeError::LibraryUnavailable(format!("{path}: {e:?}"))
            })?;
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| DarkModeError::LibraryUnavailable(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Check that the rendering library can be loaded.
///
/// Called once at startup so a missing pdfium is reported before any input
/// is read.
pub fn check_libraries() -> Result<(), DarkModeError> {
    bind_pdfium().map(|_| ())
}

/// Open a PDF with pdfium, mapping password failures to dedicated errors.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, DarkModeError> {
    pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(format!("{:?}", e), pdf_path, password.is_some()))
}

fn load_error(detail: String, pdf_path: &Path, password_given: bool) -> DarkModeError {
    let path = pdf_path.to_path_buf();
    if detail.contains("Password") || detail.contains("password") {
        if password_given {
            DarkModeError::WrongPassword { path }
        } else {
            DarkModeError::PasswordRequired { path }
        }
    } else {
        DarkModeError::CorruptPdf { path, detail }
    }
}

/// [`PageSource`] backed by an open pdfium document.
pub struct PdfiumPageSource<'a> {
    document: PdfDocument<'a>,
    page_count: usize,
}

impl<'a> PdfiumPageSource<'a> {
    pub fn new(document: PdfDocument<'a>) -> Self {
        let page_count = document.pages().len() as usize;
        info!("PDF loaded: {} pages", page_count);
        Self {
            document,
            page_count,
        }
    }
}

impl PageSource for PdfiumPageSource<'_> {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render_page(&mut self, page_num: usize, scale: f32) -> Result<RgbaImage, DarkModeError> {
        if page_num == 0 || page_num > self.page_count {
            return Err(DarkModeError::RenderFailed {
                page: page_num,
                detail: format!("page out of range (document has {})", self.page_count),
            });
        }

        let page = self
            .document
            .pages()
            .get((page_num - 1) as u16)
            .map_err(|e| DarkModeError::RenderFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| DarkModeError::RenderFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image().into_rgba8();
        debug!(
            "Rendered page {} ({:.0}x{:.0} pt) → {}x{} px",
            page_num,
            page.width().value,
            page.height().value,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// Extract document metadata from a PDF without rendering pages.
pub fn extract_metadata(
    pdfium: &Pdfium,
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, DarkModeError> {
    let document = open_document(pdfium, pdf_path, password)?;
    Ok(document_metadata(&document))
}

/// Read the info dictionary and page count of an open document.
pub fn document_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}
