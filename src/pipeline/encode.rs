//! Image encoding: transformed page bitmap → JPEG bytes for the output PDF.
//!
//! JPEG keeps the output file a manageable size for image-only pages; at
//! quality 95 compression artefacts on text edges are not visible at the
//! default 2× render scale. The bytes are embedded verbatim as a `DCTDecode`
//! image stream, so no re-encoding happens during assembly.

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};
use tracing::debug;

/// A page image ready for the output document.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    /// Baseline JPEG, 8-bit RGB.
    pub jpeg: Vec<u8>,
    /// Pixel width of the encoded image.
    pub width_px: u32,
    /// Pixel height of the encoded image.
    pub height_px: u32,
}

/// Encode a transformed page as JPEG at the given quality (1–100).
///
/// JPEG has no alpha channel; it is dropped. Rendered pages are opaque.
pub fn encode_page(img: &RgbaImage, quality: u8) -> Result<EncodedPage, image::ImageError> {
    let (width_px, height_px) = img.dimensions();
    let rgb: RgbImage = img.convert();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100)).encode_image(&rgb)?;
    debug!("Encoded {}x{} page → {} bytes JPEG", width_px, height_px, jpeg.len());

    Ok(EncodedPage {
        jpeg,
        width_px,
        height_px,
    })
}
