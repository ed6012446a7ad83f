//! Text rasterization for plot labels
//!
//! Glyph outlines come from a system TrueType font via ab_glyph and are
//! rasterized into small premultiplied pixmaps that the plot renderer then
//! composites (optionally rotated) onto the canvas.

use std::fs;
use std::path::Path;

use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};
use tracing::debug;

/// Fonts tried in order when the renderer starts
const FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
];

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("No usable system font found (tried {tried} locations)")]
    NoFontFound { tried: usize },

    #[error("Font file {path} could not be parsed")]
    InvalidFont { path: String },
}

/// Loads the first readable and parseable font from the candidate list
pub fn load_system_font() -> Result<FontVec, TextError> {
    for candidate in FONT_CANDIDATES {
        match load_font_file(Path::new(candidate)) {
            Ok(font) => {
                debug!(path = candidate, "loaded plot font");
                return Ok(font);
            }
            Err(err) => debug!(path = candidate, %err, "font candidate skipped"),
        }
    }
    Err(TextError::NoFontFound {
        tried: FONT_CANDIDATES.len(),
    })
}

fn load_font_file(path: &Path) -> Result<FontVec, TextError> {
    let invalid = || TextError::InvalidFont {
        path: path.display().to_string(),
    };
    let data = fs::read(path).map_err(|_| invalid())?;
    FontVec::try_from_vec(data).map_err(|_| invalid())
}

/// Measured extent of a line of text, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Rasterizes single lines of text with one font
pub struct TextRasterizer {
    font: FontVec,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer").finish_non_exhaustive()
    }
}

impl TextRasterizer {
    pub fn new(font: FontVec) -> Self {
        Self { font }
    }

    /// Builds a rasterizer from the first loadable system font
    pub fn from_system() -> Result<Self, TextError> {
        load_system_font().map(Self::new)
    }

    pub fn measure(&self, text: &str, size: f32) -> TextExtent {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        TextExtent {
            width,
            height: scaled.ascent() - scaled.descent(),
        }
    }

    /// Renders `text` into a tightly sized transparent pixmap
    ///
    /// Returns `None` for empty text or when the pixmap cannot be allocated.
    pub fn rasterize(&self, text: &str, size: f32, color: Color) -> Option<Pixmap> {
        if text.is_empty() {
            return None;
        }

        let extent = self.measure(text, size);
        let width = extent.width.ceil() as u32 + 2;
        let height = extent.height.ceil() as u32 + 2;
        let mut coverage = vec![0.0f32; (width * height) as usize];

        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut caret = 1.0;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(size, point(caret, 1.0 + scaled.ascent()));
            caret += scaled.h_advance(id);
            previous = Some(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, c| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    let slot = &mut coverage[(y as u32 * width + x as u32) as usize];
                    *slot = (*slot + c).min(1.0);
                }
            });
        }

        let mut pixmap = Pixmap::new(width, height)?;
        for (pixel, cov) in pixmap.pixels_mut().iter_mut().zip(&coverage) {
            if *cov <= 0.0 {
                continue;
            }
            if let Some(premultiplied) = premultiply(color, *cov) {
                *pixel = premultiplied;
            }
        }
        Some(pixmap)
    }
}

fn premultiply(color: Color, coverage: f32) -> Option<PremultipliedColorU8> {
    let alpha = (color.alpha() * coverage).clamp(0.0, 1.0) * 255.0;
    let channel = |value: f32| (value * alpha).round() as u8;
    PremultipliedColorU8::from_rgba(
        channel(color.red()),
        channel(color.green()),
        channel(color.blue()),
        alpha.round() as u8,
    )
}
