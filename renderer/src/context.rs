//! The render-context capability the text engine draws through.
//!
//! The graphics API is not modeled here; [`RenderContext`] is the contract an
//! embedding renderer implements. It is deliberately register-shaped: besides
//! resource management and draw-call issuance it exposes the ambient state the
//! engine must leave untouched (texturing, blending, depth, color, program
//! binding, matrices). [`StateGuard`] snapshots those registers on entry and
//! restores them on every exit path, which is the engine's whole correctness
//! contract towards a rendering pipeline it does not own.
//!
//! A context is single-owner: every entry point takes it by unique reference,
//! so save/restore never interleaves with another draw.

use std::{
    ops::{Deref, DerefMut},
    result,
};

use anyhow::Result;
use thiserror::Error;

use quill_geometry::{Color, Matrix4, SizePx, matrix};

use crate::pods::GlyphVertex;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::From)]
pub struct TextureId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::From)]
pub struct ProgramId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::From)]
pub struct BufferId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WrapMode {
    ClampToEdge,
    Repeat,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Creation parameters for a single-channel (coverage) 2D texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureSpec {
    pub size: SizePx,
    pub wrap: (WrapMode, WrapMode),
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mipmaps: bool,
}

impl TextureSpec {
    /// Glyph textures: clamped on both axes, linear both ways, no mipmaps.
    pub fn glyph(width: u32, height: u32) -> Self {
        Self {
            size: SizePx::new(width, height),
            wrap: (WrapMode::ClampToEdge, WrapMode::ClampToEdge),
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mipmaps: false,
        }
    }
}

/// Why a shader program could not be built.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("compile: {log}")]
    Compile { log: String },
    #[error("link: {log}")]
    Link { log: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Snapshot of the ambient state registers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderState {
    pub texturing: bool,
    pub blend: bool,
    pub blend_func: (BlendFactor, BlendFactor),
    pub depth_test: bool,
    pub depth_func: DepthFunc,
    pub color: Color,
    pub program: Option<ProgramId>,
    pub projection: Matrix4,
    pub transform: Matrix4,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            texturing: false,
            blend: false,
            blend_func: (BlendFactor::One, BlendFactor::Zero),
            depth_test: false,
            depth_func: DepthFunc::Less,
            color: Color::WHITE,
            program: None,
            projection: matrix::identity(),
            transform: matrix::identity(),
        }
    }
}

pub trait RenderContext {
    //
    // Resources
    //

    /// Upload a tightly row-aligned coverage bitmap (one byte per texel; rows
    /// padded to the current row alignment). A zero-area texture is valid and
    /// samples to nothing.
    fn create_texture(&mut self, spec: &TextureSpec, data: &[u8]) -> Result<TextureId>;
    fn delete_texture(&mut self, texture: TextureId) -> Result<()>;

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> result::Result<ProgramId, ProgramError>;
    fn delete_program(&mut self, program: ProgramId) -> Result<()>;

    fn create_vertex_buffer(&mut self) -> Result<BufferId>;
    fn upload_vertices(&mut self, buffer: BufferId, vertices: &[GlyphVertex]) -> Result<()>;
    fn delete_buffer(&mut self, buffer: BufferId) -> Result<()>;

    /// Row byte alignment for subsequent texture uploads. Coverage bitmaps are
    /// not padded to 4-byte rows, so glyph uploads run at alignment 1.
    fn set_row_alignment(&mut self, alignment: u32);

    //
    // Draw calls
    //

    /// Draw one textured quad through the current projection and transform.
    fn draw_quad(&mut self, texture: TextureId, corners: &[GlyphVertex; 4]) -> Result<()>;

    /// Draw the quad formed by four consecutive vertices of `buffer`, starting
    /// at `first_vertex`, with the currently bound program.
    fn draw_buffer_quad(
        &mut self,
        texture: TextureId,
        buffer: BufferId,
        first_vertex: u32,
    ) -> Result<()>;

    //
    // Ambient state registers
    //

    fn viewport(&self) -> SizePx;
    fn state(&self) -> RenderState;
    fn set_texturing(&mut self, enabled: bool);
    fn set_blend(&mut self, enabled: bool);
    fn set_blend_func(&mut self, source: BlendFactor, destination: BlendFactor);
    fn set_depth_test(&mut self, enabled: bool);
    fn set_depth_func(&mut self, func: DepthFunc);
    fn set_color(&mut self, color: Color);
    fn set_program(&mut self, program: Option<ProgramId>);
    fn set_projection(&mut self, matrix: Matrix4);
    fn set_transform(&mut self, matrix: Matrix4);

    fn restore(&mut self, state: &RenderState) {
        self.set_texturing(state.texturing);
        self.set_blend(state.blend);
        self.set_blend_func(state.blend_func.0, state.blend_func.1);
        self.set_depth_test(state.depth_test);
        self.set_depth_func(state.depth_func);
        self.set_color(state.color);
        self.set_program(state.program);
        self.set_projection(state.projection);
        self.set_transform(state.transform);
    }
}

/// Scoped snapshot of a context's state registers.
///
/// Snapshots on construction and restores on drop, so the registers revert on
/// every exit path of the draw routine, early error returns included.
pub struct StateGuard<'a, C: RenderContext + ?Sized> {
    context: &'a mut C,
    saved: RenderState,
}

impl<'a, C: RenderContext + ?Sized> StateGuard<'a, C> {
    pub fn new(context: &'a mut C) -> Self {
        let saved = context.state();
        Self { context, saved }
    }

    pub fn saved(&self) -> &RenderState {
        &self.saved
    }
}

impl<C: RenderContext + ?Sized> Deref for StateGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.context
    }
}

impl<C: RenderContext + ?Sized> DerefMut for StateGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.context
    }
}

impl<C: RenderContext + ?Sized> Drop for StateGuard<'_, C> {
    fn drop(&mut self) {
        let saved = self.saved;
        self.context.restore(&saved);
    }
}
