//! Glyph emission strategies.
//!
//! Two interchangeable strategies behind one draw contract, selected at atlas
//! construction: `Immediate` pushes each quad through
//! [`RenderContext::draw_quad`] against the context's current matrices,
//! `Batched` uploads the whole scan's vertices once and issues one ranged
//! draw per glyph with the glyph program bound.
//!
//! The context feeds its projection, transform and color registers into the
//! program's `projection`/`transform`/`tint` uniforms.

use crate::{
    context::{ProgramError, RenderContext},
    error::TextError,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PipelineMode {
    /// Per-quad emission against the context's current matrices.
    Immediate,
    /// Shader-driven emission from a vertex buffer.
    #[default]
    Batched,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PipelineState {
    Immediate,
    Batched {
        program: crate::context::ProgramId,
        buffer: crate::context::BufferId,
    },
}

pub(crate) const GLYPH_VERTEX_SHADER: &str = r#"
#version 330 core

layout(location = 0) in vec3 position;
layout(location = 1) in vec2 tex_coords;

uniform mat4 projection;
uniform mat4 transform;

out vec2 v_tex_coords;

void main() {
    gl_Position = projection * transform * vec4(position, 1.0);
    v_tex_coords = tex_coords;
}
"#;

pub(crate) const GLYPH_FRAGMENT_SHADER: &str = r#"
#version 330 core

in vec2 v_tex_coords;

uniform sampler2D coverage;
uniform vec4 tint;

out vec4 fragment_color;

void main() {
    fragment_color = vec4(tint.rgb, tint.a * texture(coverage, v_tex_coords).r);
}
"#;

pub(crate) fn build(
    context: &mut (impl RenderContext + ?Sized),
    mode: PipelineMode,
) -> Result<PipelineState, TextError> {
    match mode {
        PipelineMode::Immediate => Ok(PipelineState::Immediate),
        PipelineMode::Batched => {
            let program = context
                .create_program(GLYPH_VERTEX_SHADER, GLYPH_FRAGMENT_SHADER)
                .map_err(|e| match e {
                    ProgramError::Compile { log } => TextError::ShaderCompile { log },
                    ProgramError::Link { log } => TextError::ShaderLink { log },
                    ProgramError::Other(source) => TextError::Renderer(source),
                })?;
            let buffer = match context.create_vertex_buffer() {
                Ok(buffer) => buffer,
                Err(e) => {
                    if let Err(e) = context.delete_program(program) {
                        log::warn!("leaked glyph program {program}: {e:#}");
                    }
                    return Err(e.into());
                }
            };
            Ok(PipelineState::Batched { program, buffer })
        }
    }
}

pub(crate) fn release(context: &mut (impl RenderContext + ?Sized), state: PipelineState) {
    if let PipelineState::Batched { program, buffer } = state {
        if let Err(e) = context.delete_buffer(buffer) {
            log::warn!("leaked glyph vertex buffer {buffer}: {e:#}");
        }
        if let Err(e) = context.delete_program(program) {
            log::warn!("leaked glyph program {program}: {e:#}");
        }
    }
}
