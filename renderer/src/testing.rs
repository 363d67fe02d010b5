//! Shared test support.

use std::path::Path;

use crate::{
    error::TextError,
    glyph::rasterization::{RasterizedGlyph, Rasterizer},
};

/// A synthetic monospace face: every glyph is an 8x12 box with a fixed
/// advance; space is blank but still advances.
pub(crate) struct FixedRasterizer {
    pub advance_px: i64,
    pub fail_open: bool,
}

impl Default for FixedRasterizer {
    fn default() -> Self {
        Self {
            advance_px: 10,
            fail_open: false,
        }
    }
}

pub(crate) struct FixedFace {
    pixel_size: u32,
}

impl Rasterizer for FixedRasterizer {
    type Face = FixedFace;

    fn open_font(&mut self, path: &Path) -> Result<FixedFace, TextError> {
        if self.fail_open {
            return Err(TextError::FontLoad {
                path: path.to_path_buf(),
                reason: "unreadable test font".into(),
            });
        }
        Ok(FixedFace { pixel_size: 0 })
    }

    fn set_pixel_size(&mut self, face: &mut FixedFace, pixel_size: u32) {
        face.pixel_size = pixel_size;
    }

    fn render_glyph(&mut self, face: &FixedFace, codepoint: u32) -> RasterizedGlyph {
        let advance = self.advance_px << 6;
        if codepoint == b' ' as u32 {
            return RasterizedGlyph {
                advance,
                ..RasterizedGlyph::default()
            };
        }
        let (width, rows) = (8u32, 12u32);
        RasterizedGlyph {
            data: vec![0xff; (width * rows) as usize],
            width,
            rows,
            left: 0,
            top: face.pixel_size as i32 - 4,
            advance,
        }
    }
}
