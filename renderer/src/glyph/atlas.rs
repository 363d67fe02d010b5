//! Atlas construction and teardown.
//!
//! One atlas is one font at one pixel size: a fixed table of glyph records,
//! each backed by its own context-owned texture, rasterized in bulk up front
//! so that drawing never touches the rasterizer again. Construction is the
//! expensive operation (`glyph_range` texture uploads); it either completes
//! fully or releases everything it created and fails.

use std::path::Path;

use quill_geometry::{Color, Matrix4, SizePx, matrix};

use crate::{
    context::{RenderContext, TextureId, TextureSpec},
    error::TextError,
    glyph::rasterization::Rasterizer,
    pipeline::{self, PipelineMode, PipelineState},
};

/// Default glyph table size.
pub const GLYPH_RANGE: usize = 512;

/// Table size of the original engine; leaves byte 255 out of range.
pub const GLYPH_RANGE_LEGACY: usize = 255;

/// Tab stops are multiples of this table entry's bitmap width times the tab
/// size.
pub const TAB_REFERENCE_GLYPH: usize = 31;

const DEFAULT_TAB_SIZE: u32 = 4;
// Effectively unbounded depth range.
const DEFAULT_CANVAS_DEPTH: f32 = 1_000_000.0;

/// One table entry: the texture and metrics of a single rasterized codepoint.
///
/// A whitespace codepoint legitimately rasterizes to a 0x0 bitmap; its record
/// still exists and still advances the pen.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphRecord {
    pub texture: TextureId,
    /// Bitmap origin, pixels right of the pen position.
    pub left: i32,
    /// Bitmap origin, pixels above the baseline.
    pub top: i32,
    pub width: u32,
    pub rows: u32,
    /// Horizontal advance in 1/64th pixel fixed point; consumed as `>> 6`.
    pub advance: i64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AtlasOptions {
    /// Number of codepoints to rasterize, starting at 0.
    pub glyph_range: usize,
    pub pipeline: PipelineMode,
    /// Projection extents; `None` adopts the context's viewport.
    pub canvas: Option<SizePx>,
}

impl Default for AtlasOptions {
    fn default() -> Self {
        Self {
            glyph_range: GLYPH_RANGE,
            pipeline: PipelineMode::default(),
            canvas: None,
        }
    }
}

impl AtlasOptions {
    pub fn with_glyph_range(mut self, glyph_range: usize) -> Self {
        self.glyph_range = glyph_range;
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineMode) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_canvas(mut self, width: u32, height: u32) -> Self {
        self.canvas = Some(SizePx::new(width, height));
        self
    }
}

/// A font rasterized into per-glyph textures, plus the style and matrix state
/// the layout engine draws with.
#[derive(Debug)]
pub struct FontAtlas {
    pub(crate) records: Vec<GlyphRecord>,
    pub(crate) pixel_size: u32,
    pub(crate) tab_size: u32,
    pub(crate) scale: (f32, f32),
    pub(crate) color: Color,
    pub(crate) depth: f32,
    pub(crate) canvas: SizePx,
    pub(crate) canvas_depth: f32,
    pub(crate) projection: Matrix4,
    pub(crate) transform: Matrix4,
    pub(crate) free_transform: bool,
    pub(crate) pipeline: PipelineState,
}

impl FontAtlas {
    /// Rasterize `options.glyph_range` codepoints of the font at `path` into
    /// context-owned textures.
    ///
    /// Any failure is terminal: resources created so far are released and no
    /// atlas is returned.
    pub fn build<R: Rasterizer>(
        context: &mut (impl RenderContext + ?Sized),
        rasterizer: &mut R,
        path: impl AsRef<Path>,
        pixel_size: u32,
        options: AtlasOptions,
    ) -> Result<Self, TextError> {
        let path = path.as_ref();

        // The table is indexed by raw byte values and by the tab reference
        // glyph; a smaller table would read out of bounds.
        if options.glyph_range < GLYPH_RANGE_LEGACY {
            return Err(TextError::GlyphTableTooSmall {
                range: options.glyph_range,
                minimum: GLYPH_RANGE_LEGACY,
            });
        }

        let mut face = rasterizer.open_font(path)?;
        rasterizer.set_pixel_size(&mut face, pixel_size);

        log::info!(
            "Rasterizing {} glyphs of {} at {pixel_size}px",
            options.glyph_range,
            path.display()
        );

        // Coverage rows are tightly packed, not padded to 4 bytes.
        context.set_row_alignment(1);
        let records =
            Self::rasterize_range(context, rasterizer, &face, options.glyph_range, pixel_size);
        context.set_row_alignment(4);
        let records = records?;

        let pipeline = match pipeline::build(context, options.pipeline) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                release_glyph_textures(context, &records);
                return Err(e);
            }
        };

        let canvas = options.canvas.unwrap_or_else(|| context.viewport());
        let canvas_depth = DEFAULT_CANVAS_DEPTH;

        Ok(Self {
            records,
            pixel_size,
            tab_size: DEFAULT_TAB_SIZE,
            scale: (1.0, 1.0),
            color: Color::WHITE,
            depth: 0.0,
            canvas,
            canvas_depth,
            projection: canvas_projection(canvas, canvas_depth),
            transform: matrix::identity(),
            free_transform: false,
            pipeline,
        })
    }

    fn rasterize_range<R: Rasterizer>(
        context: &mut (impl RenderContext + ?Sized),
        rasterizer: &mut R,
        face: &R::Face,
        glyph_range: usize,
        pixel_size: u32,
    ) -> Result<Vec<GlyphRecord>, TextError> {
        let mut records = Vec::with_capacity(glyph_range);
        for codepoint in 0..glyph_range {
            let glyph = rasterizer.render_glyph(face, codepoint as u32);
            debug_assert_eq!(glyph.data.len(), (glyph.width * glyph.rows) as usize);

            let spec = TextureSpec::glyph(glyph.width, glyph.rows);
            match context.create_texture(&spec, &glyph.data) {
                Ok(texture) => records.push(GlyphRecord {
                    texture,
                    left: glyph.left,
                    top: glyph.top,
                    width: glyph.width,
                    rows: glyph.rows,
                    advance: glyph.advance,
                }),
                Err(e) => {
                    log::warn!(
                        "Atlas build failed at glyph {codepoint:#x} of {glyph_range} ({pixel_size}px); releasing {} textures",
                        records.len()
                    );
                    release_glyph_textures(context, &records);
                    return Err(e.into());
                }
            }
        }
        Ok(records)
    }

    /// Release every glyph texture and pipeline resource. The atlas is gone
    /// afterwards; context failures during teardown are logged, not returned.
    pub fn destroy(mut self, context: &mut (impl RenderContext + ?Sized)) {
        log::debug!("Destroying atlas ({} glyphs)", self.records.len());
        release_glyph_textures(context, &self.records);
        self.records.clear();
        pipeline::release(context, self.pipeline);
    }

    /// Bounds-checked glyph lookup by byte value.
    pub fn glyph(&self, byte: u8) -> Result<&GlyphRecord, TextError> {
        self.records
            .get(byte as usize)
            .ok_or(TextError::GlyphOutOfRange {
                byte,
                range: self.records.len(),
            })
    }

    pub fn glyph_range(&self) -> usize {
        self.records.len()
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub fn tab_size(&self) -> u32 {
        self.tab_size
    }

    pub fn set_tab_size(&mut self, tab_size: u32) {
        self.tab_size = tab_size;
    }

    pub fn scale(&self) -> (f32, f32) {
        self.scale
    }

    pub fn set_scale(&mut self, scale_x: f32, scale_y: f32) {
        self.scale = (scale_x, scale_y);
    }

    /// Scale so that a line renders `pixels` high instead of `pixel_size`.
    pub fn set_scale_in_pixels(&mut self, pixels: f32) {
        let factor = pixels / self.pixel_size as f32;
        self.scale = (factor, factor);
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth;
    }

    pub fn canvas_size(&self) -> SizePx {
        self.canvas
    }

    /// Set the projection extents. Rebuilding the projection is a side effect
    /// of this setter, never of draw.
    pub fn set_canvas_size(&mut self, width: u32, height: u32, depth: f32) {
        self.canvas = SizePx::new(width, height);
        self.canvas_depth = depth;
        self.projection = canvas_projection(self.canvas, depth);
    }

    pub fn projection(&self) -> Matrix4 {
        self.projection
    }

    pub fn transform(&self) -> Matrix4 {
        self.transform
    }

    /// Supply the model transform directly. Only meaningful with
    /// [`FontAtlas::set_free_transform`]; otherwise draw rebuilds it.
    pub fn set_transform(&mut self, transform: Matrix4) {
        self.transform = transform;
    }

    pub fn free_transform(&self) -> bool {
        self.free_transform
    }

    /// When set, draw never touches the transform matrix; the caller owns it.
    pub fn set_free_transform(&mut self, free: bool) {
        self.free_transform = free;
    }
}

impl Drop for FontAtlas {
    fn drop(&mut self) {
        if !self.records.is_empty() {
            log::warn!(
                "FontAtlas dropped without destroy(); {} glyph textures leaked",
                self.records.len()
            );
        }
    }
}

fn canvas_projection(canvas: SizePx, depth: f32) -> Matrix4 {
    matrix::orthographic(
        0.0,
        canvas.width as f32,
        canvas.height as f32,
        0.0,
        0.0,
        depth,
    )
}

pub(crate) fn release_glyph_textures(
    context: &mut (impl RenderContext + ?Sized),
    records: &[GlyphRecord],
) {
    for record in records {
        if let Err(e) = context.delete_texture(record.texture) {
            log::warn!("leaked glyph texture {}: {e:#}", record.texture);
        }
    }
}
