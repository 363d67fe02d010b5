//! A render context that records instead of drawing.
//!
//! Backs the test suite and headless embeddings (measurement-only use, call
//! tracing). It keeps the full register set and validates the engine's
//! resource discipline: drawing against a deleted texture, uploading
//! mis-aligned bitmap rows, or issuing a buffer draw without a bound program
//! all fail the call.

use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail, ensure};

use quill_geometry::{Color, Matrix4, SizePx};

use crate::{
    context::{
        BlendFactor, BufferId, DepthFunc, ProgramError, ProgramId, RenderContext, RenderState,
        TextureId, TextureSpec,
    },
    pods::GlyphVertex,
};

/// Everything a [`HeadlessContext`] was asked to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTexture {
        texture: TextureId,
        spec: TextureSpec,
        byte_len: usize,
    },
    DeleteTexture(TextureId),
    RowAlignment(u32),
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateBuffer(BufferId),
    UploadVertices {
        buffer: BufferId,
        vertex_count: usize,
    },
    DeleteBuffer(BufferId),
    DrawQuad {
        texture: TextureId,
        corners: [GlyphVertex; 4],
        color: Color,
    },
    DrawBufferQuad {
        texture: TextureId,
        buffer: BufferId,
        first_vertex: u32,
        color: Color,
    },
    SetTexturing(bool),
    SetBlend(bool),
    SetBlendFunc(BlendFactor, BlendFactor),
    SetDepthTest(bool),
    SetDepthFunc(DepthFunc),
    SetColor(Color),
    SetProgram(Option<ProgramId>),
    SetProjection(Matrix4),
    SetTransform(Matrix4),
}

impl Call {
    /// Is this one of the two glyph draw calls?
    pub fn is_draw(&self) -> bool {
        matches!(self, Call::DrawQuad { .. } | Call::DrawBufferQuad { .. })
    }
}

/// What [`HeadlessContext::create_program`] should pretend to fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramFailure {
    Compile,
    Link,
}

pub struct HeadlessContext {
    state: RenderState,
    row_alignment: u32,
    viewport: SizePx,
    next_id: u64,
    textures: HashSet<TextureId>,
    programs: HashSet<ProgramId>,
    buffers: HashMap<BufferId, Vec<GlyphVertex>>,
    calls: Vec<Call>,
    texture_creates: usize,
    /// Fail the nth (0-based) texture creation. Test knob.
    pub fail_texture_create: Option<usize>,
    /// Fail program creation. Test knob.
    pub program_failure: Option<ProgramFailure>,
}

impl HeadlessContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: RenderState::default(),
            row_alignment: 4,
            viewport: SizePx::new(width, height),
            next_id: 1,
            textures: HashSet::new(),
            programs: HashSet::new(),
            buffers: HashMap::new(),
            calls: Vec::new(),
            texture_creates: 0,
            fail_texture_create: None,
            program_failure: None,
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn draw_calls(&self) -> usize {
        self.calls.iter().filter(|c| c.is_draw()).count()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn row_alignment(&self) -> u32 {
        self.row_alignment
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl RenderContext for HeadlessContext {
    fn create_texture(&mut self, spec: &TextureSpec, data: &[u8]) -> Result<TextureId> {
        let index = self.texture_creates;
        self.texture_creates += 1;
        if self.fail_texture_create == Some(index) {
            bail!("texture creation failed (injected)");
        }

        let width = spec.size.width as usize;
        let height = spec.size.height as usize;
        let align = self.row_alignment as usize;
        let row_bytes = width.div_ceil(align) * align;
        ensure!(
            data.len() == row_bytes * height,
            "texture data is {} bytes, expected {} ({}x{} at row alignment {})",
            data.len(),
            row_bytes * height,
            width,
            height,
            align
        );

        let texture = TextureId(self.fresh_id());
        self.textures.insert(texture);
        self.calls.push(Call::CreateTexture {
            texture,
            spec: *spec,
            byte_len: data.len(),
        });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureId) -> Result<()> {
        ensure!(self.textures.remove(&texture), "unknown texture {texture}");
        self.calls.push(Call::DeleteTexture(texture));
        Ok(())
    }

    fn create_program(
        &mut self,
        _vertex_source: &str,
        _fragment_source: &str,
    ) -> std::result::Result<ProgramId, ProgramError> {
        match self.program_failure {
            Some(ProgramFailure::Compile) => Err(ProgramError::Compile {
                log: "injected compile failure".into(),
            }),
            Some(ProgramFailure::Link) => Err(ProgramError::Link {
                log: "injected link failure".into(),
            }),
            None => {
                let program = ProgramId(self.fresh_id());
                self.programs.insert(program);
                self.calls.push(Call::CreateProgram(program));
                Ok(program)
            }
        }
    }

    fn delete_program(&mut self, program: ProgramId) -> Result<()> {
        ensure!(self.programs.remove(&program), "unknown program {program}");
        self.calls.push(Call::DeleteProgram(program));
        Ok(())
    }

    fn create_vertex_buffer(&mut self) -> Result<BufferId> {
        let buffer = BufferId(self.fresh_id());
        self.buffers.insert(buffer, Vec::new());
        self.calls.push(Call::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn upload_vertices(&mut self, buffer: BufferId, vertices: &[GlyphVertex]) -> Result<()> {
        let Some(contents) = self.buffers.get_mut(&buffer) else {
            bail!("unknown buffer {buffer}");
        };
        *contents = vertices.to_vec();
        self.calls.push(Call::UploadVertices {
            buffer,
            vertex_count: vertices.len(),
        });
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) -> Result<()> {
        ensure!(
            self.buffers.remove(&buffer).is_some(),
            "unknown buffer {buffer}"
        );
        self.calls.push(Call::DeleteBuffer(buffer));
        Ok(())
    }

    fn set_row_alignment(&mut self, alignment: u32) {
        self.row_alignment = alignment;
        self.calls.push(Call::RowAlignment(alignment));
    }

    fn draw_quad(&mut self, texture: TextureId, corners: &[GlyphVertex; 4]) -> Result<()> {
        ensure!(self.textures.contains(&texture), "unknown texture {texture}");
        ensure!(self.state.texturing, "texturing is disabled");
        self.calls.push(Call::DrawQuad {
            texture,
            corners: *corners,
            color: self.state.color,
        });
        Ok(())
    }

    fn draw_buffer_quad(
        &mut self,
        texture: TextureId,
        buffer: BufferId,
        first_vertex: u32,
    ) -> Result<()> {
        ensure!(self.textures.contains(&texture), "unknown texture {texture}");
        ensure!(self.state.texturing, "texturing is disabled");
        ensure!(self.state.program.is_some(), "no program bound");
        let Some(contents) = self.buffers.get(&buffer) else {
            bail!("unknown buffer {buffer}");
        };
        ensure!(
            first_vertex as usize + 4 <= contents.len(),
            "quad at vertex {first_vertex} exceeds the {} uploaded vertices",
            contents.len()
        );
        self.calls.push(Call::DrawBufferQuad {
            texture,
            buffer,
            first_vertex,
            color: self.state.color,
        });
        Ok(())
    }

    fn viewport(&self) -> SizePx {
        self.viewport
    }

    fn state(&self) -> RenderState {
        self.state
    }

    fn set_texturing(&mut self, enabled: bool) {
        self.state.texturing = enabled;
        self.calls.push(Call::SetTexturing(enabled));
    }

    fn set_blend(&mut self, enabled: bool) {
        self.state.blend = enabled;
        self.calls.push(Call::SetBlend(enabled));
    }

    fn set_blend_func(&mut self, source: BlendFactor, destination: BlendFactor) {
        self.state.blend_func = (source, destination);
        self.calls.push(Call::SetBlendFunc(source, destination));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
        self.calls.push(Call::SetDepthTest(enabled));
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.state.depth_func = func;
        self.calls.push(Call::SetDepthFunc(func));
    }

    fn set_color(&mut self, color: Color) {
        self.state.color = color;
        self.calls.push(Call::SetColor(color));
    }

    fn set_program(&mut self, program: Option<ProgramId>) {
        self.state.program = program;
        self.calls.push(Call::SetProgram(program));
    }

    fn set_projection(&mut self, matrix: Matrix4) {
        self.state.projection = matrix;
        self.calls.push(Call::SetProjection(matrix));
    }

    fn set_transform(&mut self, matrix: Matrix4) {
        self.state.transform = matrix;
        self.calls.push(Call::SetTransform(matrix));
    }
}
