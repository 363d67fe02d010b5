//! A glyph-atlas text renderer.
//!
//! [`FontAtlas::build`] rasterizes a byte range of codepoints once into
//! context-owned textures; [`FontAtlas::draw`] and [`FontAtlas::measure`] then
//! lay out arbitrary byte strings against the cached glyphs. The graphics API
//! and the rasterizer stay behind the [`RenderContext`] and [`Rasterizer`]
//! capabilities.

mod context;
mod error;
mod glyph;
mod headless;
mod layout;
mod pipeline;
mod pods;

#[cfg(test)]
mod testing;

pub use context::*;
pub use error::TextError;
pub use glyph::atlas::{
    AtlasOptions, FontAtlas, GLYPH_RANGE, GLYPH_RANGE_LEGACY, GlyphRecord, TAB_REFERENCE_GLYPH,
};
pub use glyph::rasterization::{RasterizedGlyph, Rasterizer, SwashFace, SwashRasterizer};
pub use headless::{Call, HeadlessContext, ProgramFailure};
pub use pipeline::PipelineMode;
pub use pods::{GlyphVertex, quad};
