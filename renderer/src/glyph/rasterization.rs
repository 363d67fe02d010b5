//! The rasterization capability: font file + pixel size in, coverage bitmaps
//! and metrics out. Shipped backend is swash; the trait keeps the atlas
//! builder independent of it.

use std::{fs, path::Path};

use swash::{
    FontRef,
    scale::{Render, ScaleContext, Source},
    zeno::Format,
};

use crate::error::TextError;

/// One rasterized glyph: a tightly packed coverage bitmap plus the metrics
/// layout needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterizedGlyph {
    /// `width * rows` coverage bytes, row-major, no row padding.
    pub data: Vec<u8>,
    pub width: u32,
    pub rows: u32,
    /// Bitmap origin relative to the pen position, pixels right of it.
    pub left: i32,
    /// Bitmap origin relative to the baseline, pixels above it.
    pub top: i32,
    /// Horizontal advance in 1/64th pixel fixed point.
    pub advance: i64,
}

pub trait Rasterizer {
    type Face;

    /// Open a font resource. Reports the failing path in the error.
    fn open_font(&mut self, path: &Path) -> Result<Self::Face, TextError>;

    /// Square pixels, no DPI scaling.
    fn set_pixel_size(&mut self, face: &mut Self::Face, pixel_size: u32);

    /// Render one codepoint. Missing or blank glyphs yield an empty bitmap
    /// with whatever advance the font reports, never an error.
    fn render_glyph(&mut self, face: &Self::Face, codepoint: u32) -> RasterizedGlyph;
}

/// Swash-backed rasterizer rendering alpha coverage from scalable outlines.
pub struct SwashRasterizer {
    context: ScaleContext,
}

pub struct SwashFace {
    data: Vec<u8>,
    pixel_size: u32,
}

impl SwashRasterizer {
    pub fn init() -> Result<Self, TextError> {
        Ok(Self {
            context: ScaleContext::new(),
        })
    }
}

impl Rasterizer for SwashRasterizer {
    type Face = SwashFace;

    fn open_font(&mut self, path: &Path) -> Result<SwashFace, TextError> {
        let data = fs::read(path).map_err(|e| TextError::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if FontRef::from_index(&data, 0).is_none() {
            return Err(TextError::FontLoad {
                path: path.to_path_buf(),
                reason: "not a parseable font".into(),
            });
        }
        Ok(SwashFace {
            data,
            pixel_size: 0,
        })
    }

    fn set_pixel_size(&mut self, face: &mut SwashFace, pixel_size: u32) {
        face.pixel_size = pixel_size;
    }

    fn render_glyph(&mut self, face: &SwashFace, codepoint: u32) -> RasterizedGlyph {
        let Some(font) = FontRef::from_index(&face.data, 0) else {
            // open_font validated the bytes, so this only fires on corruption.
            log::warn!("font data no longer parseable, emitting blank glyph {codepoint:#x}");
            return RasterizedGlyph::default();
        };

        let size = face.pixel_size as f32;
        let ch = char::from_u32(codepoint).unwrap_or('\u{0}');
        let glyph_id = font.charmap().map(ch);

        // Advance widths come back in font units.
        let units_per_em = font.metrics(&[]).units_per_em as f32;
        let scale = if units_per_em > 0.0 {
            size / units_per_em
        } else {
            0.0
        };
        let advance = font.glyph_metrics(&[]).advance_width(glyph_id) * scale;
        let advance = (advance * 64.0).round() as i64;

        let mut scaler = self.context.builder(font).size(size).hint(true).build();
        let image = Render::new(&[Source::Outline])
            .format(Format::Alpha)
            .render(&mut scaler, glyph_id);

        match image {
            Some(image) => RasterizedGlyph {
                width: image.placement.width,
                rows: image.placement.height,
                left: image.placement.left,
                top: image.placement.top,
                advance,
                data: image.data,
            },
            None => RasterizedGlyph {
                advance,
                ..RasterizedGlyph::default()
            },
        }
    }
}
