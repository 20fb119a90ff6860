//! Conversion entry points.
//!
//! [`convert_document`] is the synchronous core: it walks a [`PageSource`]
//! page by page (render → remap → encode → append) and finalises the output
//! PDF. The async functions around it resolve and validate the input, then run
//! the core on a blocking thread with pdfium as the page source.
//!
//! Every entry point is all-or-nothing: the first failing page aborts the run
//! and no partial document is returned.

use crate::config::{ConversionConfig, PageSizing};
use crate::error::DarkModeError;
use crate::output::{
    output_file_name, ConversionOutput, ConversionStats, DocumentMetadata, PageSummary,
};
use crate::pipeline::assemble::{Orientation, OutputDocument, PageSize, Placement};
use crate::pipeline::input::{self, ResolvedInput, PDF_MEDIA_TYPE};
use crate::pipeline::render::{self, PageSource, PdfiumPageSource};
use crate::pipeline::{encode, transform};
use crate::progress::{page_percent, page_status};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Convert a PDF file or URL to dark mode.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` - Local file path or HTTP/HTTPS URL to a PDF
/// * `config` - Conversion configuration
///
/// # Errors
/// Rejections (not a PDF, too large, too many pages) are returned before any
/// page is rendered. Any render, encode or assembly failure aborts the whole
/// conversion.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DarkModeError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let result = async {
        let resolved = input::resolve_input(input_str, config).await?;
        resolved.validate(config)?;
        convert_resolved(&resolved, config).await
    }
    .await;

    report_failure(&result, config);
    result
}

/// Convert PDF bytes in memory to dark mode.
///
/// The bytes are validated like a file upload, then written to a managed
/// temp directory for pdfium; it is removed on return.
///
/// # Example
/// ```rust,no_run
/// use pdf_darkmode::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("document.pdf")?;
/// let output = convert_from_bytes(&bytes, "document.pdf", &ConversionConfig::default()).await?;
/// std::fs::write(&output.file_name, &output.pdf)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DarkModeError> {
    let result = async {
        let resolved = input::resolve_bytes(bytes, file_name, config)?;
        resolved.validate(config)?;
        convert_resolved(&resolved, config).await
    }
    .await;

    report_failure(&result, config);
    result
}

/// Convert a PDF and write the result directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, DarkModeError> {
    let output = convert(input_str, config).await?;
    write_atomic(output_path.as_ref(), &output.pdf).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DarkModeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DarkModeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Extract PDF metadata without converting content.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, DarkModeError> {
    let config = ConversionConfig::default();
    let resolved = input::resolve_input(input_str.as_ref(), &config).await?;
    if resolved.media_type() != PDF_MEDIA_TYPE {
        return Err(DarkModeError::InvalidMediaType {
            name: resolved.file_name().to_string(),
            media_type: resolved.media_type().to_string(),
        });
    }

    let path = resolved.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        let pdfium = render::bind_pdfium()?;
        render::extract_metadata(&pdfium, &path, None)
    })
    .await
    .map_err(|e| DarkModeError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Run the page pipeline over an already validated input.
pub(crate) async fn convert_resolved(
    resolved: &ResolvedInput,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DarkModeError> {
    let path = resolved.path().to_path_buf();
    let name = resolved.file_name().to_string();
    let input_bytes = resolved.size_bytes();
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = render::bind_pdfium()?;
        let document = render::open_document(&pdfium, &path, config.password.as_deref())?;
        let metadata = render::document_metadata(&document);
        let mut source = PdfiumPageSource::new(document);

        let mut output = convert_document(&mut source, &name, &config)?;
        output.metadata = metadata;
        output.stats.input_bytes = input_bytes;
        Ok(output)
    })
    .await
    .map_err(|e| DarkModeError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Convert every page of `source` into a dark-mode PDF.
///
/// Pages are processed strictly in order, one bitmap at a time. The page
/// count is checked against `config.max_pages` before anything is rendered.
/// Progress events go to `config.progress_callback`; failures are returned
/// to the caller without notifying it.
pub fn convert_document<S: PageSource + ?Sized>(
    source: &mut S,
    source_name: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DarkModeError> {
    let total_start = Instant::now();
    let total_pages = source.page_count();
    check_page_count(total_pages, source_name, config)?;

    let cb = config.progress_callback.as_deref();
    if let Some(cb) = cb {
        cb.on_conversion_start(total_pages);
        cb.on_progress(0.0, "Loading PDF...");
    }

    let mut stats = ConversionStats {
        total_pages,
        ..Default::default()
    };
    let mut pages = Vec::with_capacity(total_pages);
    let mut document: Option<OutputDocument> = None;

    for page_num in 1..=total_pages {
        if let Some(cb) = cb {
            cb.on_progress(
                page_percent(page_num, total_pages),
                &page_status(page_num, total_pages),
            );
        }

        let start = Instant::now();
        let mut bitmap = source.render_page(page_num, config.render_scale)?;
        stats.render_duration_ms += elapsed_ms(start);

        let start = Instant::now();
        transform::apply_to_image(&mut bitmap);
        stats.transform_duration_ms += elapsed_ms(start);

        let start = Instant::now();
        let encoded = encode::encode_page(&bitmap, config.jpeg_quality).map_err(|e| {
            DarkModeError::EncodeFailed {
                page: page_num,
                detail: e.to_string(),
            }
        })?;
        drop(bitmap);
        stats.encode_duration_ms += elapsed_ms(start);

        let own_size = PageSize::from_pixels(encoded.width_px, encoded.height_px, config.px_per_mm);
        let (doc, page_size, orientation, placement) = match document {
            None => {
                let orientation =
                    Orientation::for_dimensions(encoded.width_px as f32, encoded.height_px as f32);
                let doc = document.insert(OutputDocument::new(orientation, own_size));
                let format = doc.format();
                (doc, format, orientation, Placement::fill(format))
            }
            Some(ref mut doc) => match config.page_sizing {
                PageSizing::PerPage => {
                    doc.add_page(own_size)?;
                    let orientation =
                        Orientation::for_dimensions(own_size.width_mm, own_size.height_mm);
                    (doc, own_size, orientation, Placement::fill(own_size))
                }
                PageSizing::MatchFirst => {
                    let (format, orientation) = (doc.format(), doc.orientation());
                    doc.add_page(format)?;
                    let fit = Placement::fit(format, encoded.width_px, encoded.height_px);
                    (doc, format, orientation, fit)
                }
            },
        };
        doc.add_image(&encoded, placement)?;

        debug!(
            "Page {}/{}: {}x{} px → {:.1}x{:.1} mm",
            page_num,
            total_pages,
            encoded.width_px,
            encoded.height_px,
            page_size.width_mm,
            page_size.height_mm
        );
        pages.push(PageSummary {
            page_num,
            width_px: encoded.width_px,
            height_px: encoded.height_px,
            page_size,
            orientation,
            jpeg_bytes: encoded.jpeg.len(),
        });

        if let Some(cb) = cb {
            cb.on_page_complete(page_num, total_pages, encoded.jpeg.len());
        }
    }

    if let Some(cb) = cb {
        cb.on_progress(100.0, "Finalizing PDF...");
    }

    let document = document.ok_or_else(|| DarkModeError::EmptyDocument {
        name: source_name.to_string(),
    })?;
    let pdf = document.finish()?;

    stats.output_bytes = pdf.len() as u64;
    stats.total_duration_ms = elapsed_ms(total_start);
    info!(
        "Conversion complete: {} pages, {} bytes, {}ms total",
        total_pages, stats.output_bytes, stats.total_duration_ms
    );

    if let Some(cb) = cb {
        cb.on_conversion_complete(total_pages, pdf.len());
    }

    Ok(ConversionOutput {
        pdf,
        file_name: output_file_name(source_name),
        pages,
        metadata: DocumentMetadata {
            page_count: total_pages,
            ..Default::default()
        },
        stats,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Enforce the page-count policy.
fn check_page_count(
    total_pages: usize,
    source_name: &str,
    config: &ConversionConfig,
) -> Result<(), DarkModeError> {
    if total_pages == 0 {
        return Err(DarkModeError::EmptyDocument {
            name: source_name.to_string(),
        });
    }
    if total_pages > config.max_pages {
        return Err(DarkModeError::TooManyPages {
            pages: total_pages,
            limit: config.max_pages,
        });
    }
    Ok(())
}

/// Log a failed conversion and tell the progress callback.
fn report_failure<T>(result: &Result<T, DarkModeError>, config: &ConversionConfig) {
    if let Err(e) = result {
        error!("Conversion failed: {}", e);
        if let Some(ref cb) = config.progress_callback {
            cb.on_conversion_failed(&e.to_string());
        }
    }
}

/// Write `bytes` to `path` via a sibling temp file and rename.
///
/// Missing parent directories are created. An existing file at `path` is
/// replaced only once the new content is fully on disk.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DarkModeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DarkModeError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| DarkModeError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| DarkModeError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
