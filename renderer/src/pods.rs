use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

const_assert_eq!(size_of::<GlyphVertex>(), 20);

impl GlyphVertex {
    pub fn new(x: f32, y: f32, z: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y, z],
            tex_coords: [u, v],
        }
    }
}

/// One glyph quad, wound like the texture: top-left, bottom-left,
/// bottom-right, top-right.
pub fn quad(x: f32, y: f32, z: f32, width: f32, rows: f32) -> [GlyphVertex; 4] {
    [
        GlyphVertex::new(x, y, z, 0.0, 0.0),
        GlyphVertex::new(x, y + rows, z, 0.0, 1.0),
        GlyphVertex::new(x + width, y + rows, z, 1.0, 1.0),
        GlyphVertex::new(x + width, y, z, 1.0, 0.0),
    ]
}
