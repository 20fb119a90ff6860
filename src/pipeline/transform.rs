//! Dark-mode colour remap applied to each rendered page bitmap.
//!
//! Plain inversion turns a white background pure black and black text pure
//! white, which glares. Pixels are classified by perceptual luminance instead:
//!
//! | Luminance | Typical content | Result |
//! |-----------|-----------------|--------|
//! | `> 240`   | page background | `#1a1a1a` (26, 26, 26) |
//! | `< 15`    | body text       | `#e8e8e8` (232, 232, 232) |
//! | otherwise | images, colour  | `255 - channel` |
//!
//! The bounds are strict: a luminance of exactly 240 or 15 is inverted.
//! Alpha is never touched. Each pixel depends only on itself.

use image::RgbaImage;

/// Luminance above which a pixel is treated as background.
pub const BACKGROUND_THRESHOLD: f64 = 240.0;

/// Luminance below which a pixel is treated as text.
pub const TEXT_THRESHOLD: f64 = 15.0;

/// Replacement tone for background pixels.
pub const DARK_BACKGROUND: u8 = 26;

/// Replacement tone for text pixels.
pub const LIGHT_TEXT: u8 = 232;

/// Perceptual luminance (ITU-R BT.601 weights).
///
/// Computed in `f64`: in `f32` a gray of 240 lands just above 240.0 and would
/// be misclassified as background.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

/// Map one RGB triple to its dark-mode colour.
#[inline]
pub fn remap_pixel(r: u8, g: u8, b: u8) -> [u8; 3] {
    let l = luminance(r, g, b);
    if l > BACKGROUND_THRESHOLD {
        [DARK_BACKGROUND; 3]
    } else if l < TEXT_THRESHOLD {
        [LIGHT_TEXT; 3]
    } else {
        [255 - r, 255 - g, 255 - b]
    }
}

/// Rewrite an RGBA buffer of `width × height` pixels in place.
///
/// `data` is the flat channel sequence `r, g, b, a, r, g, b, a, …`. Trailing
/// bytes beyond `width × height × 4` (row padding) are left alone.
pub fn apply_dark_mode_filter(data: &mut [u8], width: u32, height: u32) {
    let len = (width as usize * height as usize * 4).min(data.len());
    for px in data[..len].chunks_exact_mut(4) {
        let [r, g, b] = remap_pixel(px[0], px[1], px[2]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
}

/// Apply [`apply_dark_mode_filter`] to a whole bitmap.
pub fn apply_to_image(img: &mut RgbaImage) {
    let (w, h) = img.dimensions();
    apply_dark_mode_filter(img, w, h);
}
