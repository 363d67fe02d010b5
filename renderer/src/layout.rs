//! Pen-based layout and drawing.
//!
//! Measurement and drawing run the same byte-by-byte scan; only the visitor
//! differs. There is no decoding: each byte indexes the glyph table directly,
//! single-byte encodings only.

use quill_geometry::matrix;

use crate::{
    context::{BlendFactor, DepthFunc, RenderContext, StateGuard},
    error::TextError,
    glyph::atlas::{FontAtlas, GlyphRecord, TAB_REFERENCE_GLYPH},
    pipeline::PipelineState,
    pods::{self, GlyphVertex},
};

impl FontAtlas {
    /// Draw `text` with its origin at `(x, y)`; the first baseline sits one
    /// pixel size below the origin.
    ///
    /// The context's ambient state (texturing, blending, depth, color,
    /// program, matrices) is restored before returning, on the error path
    /// too. Pixels are the only side effect.
    pub fn draw(
        &mut self,
        context: &mut (impl RenderContext + ?Sized),
        text: impl AsRef<[u8]>,
        x: i32,
        y: i32,
    ) -> Result<(), TextError> {
        let text = text.as_ref();

        if !self.free_transform {
            // Scale pivots around the draw origin, not the world origin.
            self.transform = matrix::pivot_scale((x as f32, y as f32), self.scale.0, self.scale.1);
        }

        let mut context = StateGuard::new(context);
        context.set_texturing(true);
        context.set_blend(true);
        context.set_blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        context.set_depth_test(true);
        // LessOrEqual keeps text at the same depth as earlier geometry visible.
        context.set_depth_func(DepthFunc::LessOrEqual);
        context.set_color(self.color);
        context.set_projection(self.projection);
        context.set_transform(self.transform);

        let depth = self.depth;
        match self.pipeline {
            PipelineState::Immediate => {
                self.scan(text, (x, y), |glyph, pen_x, pen_y| {
                    let corners = pods::quad(
                        pen_x as f32,
                        pen_y as f32,
                        depth,
                        glyph.width as f32,
                        glyph.rows as f32,
                    );
                    context.draw_quad(glyph.texture, &corners)?;
                    Ok(())
                })?;
            }
            PipelineState::Batched { program, buffer } => {
                let mut vertices: Vec<GlyphVertex> = Vec::with_capacity(text.len() * 4);
                let mut textures = Vec::with_capacity(text.len());
                self.scan(text, (x, y), |glyph, pen_x, pen_y| {
                    vertices.extend_from_slice(&pods::quad(
                        pen_x as f32,
                        pen_y as f32,
                        depth,
                        glyph.width as f32,
                        glyph.rows as f32,
                    ));
                    textures.push(glyph.texture);
                    Ok(())
                })?;

                context.set_program(Some(program));
                context.upload_vertices(buffer, &vertices)?;
                for (index, texture) in textures.into_iter().enumerate() {
                    context.draw_buffer_quad(texture, buffer, (index * 4) as u32)?;
                }
            }
        }

        Ok(())
    }

    /// Width of `text` in pixels, scaled by the horizontal scale factor. For
    /// multi-line text this is the widest line.
    pub fn measure(&self, text: impl AsRef<[u8]>) -> Result<i32, TextError> {
        let width = self.scan(text.as_ref(), (0, 0), |_, _, _| Ok(()))?;
        Ok((width as f32 * self.scale.0).round() as i32)
    }

    /// Adjusted x so the text's right edge lands on `x`.
    pub fn align_right(&self, text: impl AsRef<[u8]>, x: i32) -> Result<i32, TextError> {
        Ok(x - self.measure(text)?)
    }

    /// Adjusted x so the text's midpoint lands on `x`.
    pub fn align_center(&self, text: impl AsRef<[u8]>, x: i32) -> Result<i32, TextError> {
        Ok(x - self.measure(text)? / 2)
    }

    /// Baseline-to-baseline distance in pixels, scaled.
    pub fn line_height(&self) -> i32 {
        (self.pixel_size as f32 * self.scale.1).round() as i32
    }

    /// The shared scan. Calls `visit` with each glyph and its unscaled pen
    /// position; returns the widest line relative to the origin.
    ///
    /// Tabs advance by the reference glyph's width times the tab size, in
    /// both measurement and drawing.
    fn scan(
        &self,
        text: &[u8],
        origin: (i32, i32),
        mut visit: impl FnMut(&GlyphRecord, i32, i32) -> Result<(), TextError>,
    ) -> Result<i32, TextError> {
        let (origin_x, origin_y) = origin;
        let line_advance = self.pixel_size as i32;
        // build() guarantees the table covers the reference glyph.
        let tab_advance = self.records[TAB_REFERENCE_GLYPH].width as i32 * self.tab_size as i32;

        let mut x = origin_x;
        let mut baseline = line_advance;
        let mut widest = 0;

        for &byte in text {
            match byte {
                b'\n' => {
                    widest = widest.max(x - origin_x);
                    baseline += line_advance;
                    x = origin_x;
                }
                b'\t' => x += tab_advance,
                _ => {
                    let glyph = self.glyph(byte)?;
                    visit(glyph, x, baseline + origin_y - glyph.top)?;
                    x += (glyph.advance >> 6) as i32;
                }
            }
        }

        Ok(widest.max(x - origin_x))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use quill_geometry::{Color, Vector4, matrix};

    use crate::{
        context::{BlendFactor, DepthFunc, RenderContext},
        error::TextError,
        glyph::atlas::{AtlasOptions, FontAtlas, GLYPH_RANGE_LEGACY},
        headless::{Call, HeadlessContext},
        pipeline::PipelineMode,
        testing::FixedRasterizer,
    };

    // FixedRasterizer at 16px: advance 10, bitmaps 8x12 with top 12, so the
    // first line draws at y + 16 - 12 = y + 4.
    const PX: u32 = 16;
    const ADV: i32 = 10;

    fn atlas(context: &mut HeadlessContext, options: AtlasOptions) -> FontAtlas {
        let mut rasterizer = FixedRasterizer::default();
        FontAtlas::build(context, &mut rasterizer, "fixed.ttf", PX, options).unwrap()
    }

    fn immediate(context: &mut HeadlessContext) -> FontAtlas {
        atlas(
            context,
            AtlasOptions::default().with_pipeline(PipelineMode::Immediate),
        )
    }

    fn quad_positions(context: &HeadlessContext) -> Vec<[f32; 3]> {
        context
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::DrawQuad { corners, .. } => Some(corners[0].position),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn single_line_measure_sums_advances() {
        let mut context = HeadlessContext::new(800, 600);
        let atlas = immediate(&mut context);

        assert_eq!(atlas.measure("AB").unwrap(), 2 * ADV);
        assert_eq!(atlas.measure("Hello, World!").unwrap(), 13 * ADV);
        assert_eq!(atlas.measure("").unwrap(), 0);

        atlas.destroy(&mut context);
    }

    #[test]
    fn multi_line_measure_takes_the_widest_line() {
        let mut context = HeadlessContext::new(800, 600);
        let atlas = immediate(&mut context);

        assert_eq!(
            atlas.measure("AB\nABC").unwrap(),
            atlas.measure("ABC").unwrap()
        );
        // A trailing newline does not shrink the result.
        assert_eq!(atlas.measure("ABC\n").unwrap(), 3 * ADV);

        atlas.destroy(&mut context);
    }

    #[test]
    fn tabs_advance_measure_and_draw_identically() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        // Tab unit: reference glyph width 8 times tab size 4.
        assert_eq!(atlas.measure("\tA").unwrap(), 32 + ADV);
        atlas.set_tab_size(2);
        assert_eq!(atlas.measure("\tA").unwrap(), 16 + ADV);

        context.clear_calls();
        atlas.draw(&mut context, "\tA", 5, 0).unwrap();
        assert_eq!(quad_positions(&context), [[5.0 + 16.0, 4.0, 0.0]]);

        atlas.destroy(&mut context);
    }

    #[test]
    fn measure_scales_with_the_horizontal_factor() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        atlas.set_scale(2.0, 1.0);
        assert_eq!(atlas.measure("AB").unwrap(), 4 * ADV);

        atlas.destroy(&mut context);
    }

    #[test]
    fn alignment_is_idempotent_within_a_pixel() {
        let mut context = HeadlessContext::new(800, 600);
        let atlas = immediate(&mut context);

        for text in ["Hello, World!", "ab", "x"] {
            let width = atlas.measure(text).unwrap();
            let centered = atlas.align_center(text, 100).unwrap();
            assert!((centered + width / 2 - 100).abs() <= 1);
            assert_eq!(atlas.align_right(text, 100).unwrap() + width, 100);
        }

        atlas.destroy(&mut context);
    }

    #[test]
    fn line_height_scales_vertically() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        assert_eq!(atlas.line_height(), PX as i32);
        atlas.set_scale(1.0, 1.5);
        assert_eq!(atlas.line_height(), 24);

        atlas.destroy(&mut context);
    }

    #[test]
    fn monospace_round_trip() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        assert_eq!(atlas.measure("Hello, World!").unwrap(), 130);

        context.clear_calls();
        atlas.draw(&mut context, "Hello, World!", 0, 0).unwrap();
        // One quad per byte; the zero-area space is emitted, not skipped.
        assert_eq!(context.draw_calls(), 13);

        atlas.destroy(&mut context);
    }

    #[test]
    fn newline_resets_the_pen_and_drops_a_line() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        context.clear_calls();
        atlas.draw(&mut context, "AB\nC", 5, 7).unwrap();

        let positions = quad_positions(&context);
        // First line at 7 + 16 - 12 = 11, second one pixel size lower.
        assert_eq!(
            positions,
            [
                [5.0, 11.0, 0.0],
                [5.0 + ADV as f32, 11.0, 0.0],
                [5.0, 27.0, 0.0],
            ]
        );

        atlas.destroy(&mut context);
    }

    #[test]
    fn ambient_state_is_restored_from_disabled_defaults() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        let before = context.state();
        assert!(!before.texturing && !before.blend && !before.depth_test);
        atlas.draw(&mut context, "Hi", 0, 0).unwrap();
        assert_eq!(context.state(), before);

        atlas.destroy(&mut context);
    }

    #[test]
    fn ambient_state_is_restored_from_enabled_registers() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        context.set_texturing(true);
        context.set_blend(true);
        context.set_blend_func(BlendFactor::DstAlpha, BlendFactor::One);
        context.set_depth_test(true);
        context.set_depth_func(DepthFunc::Always);
        context.set_color(Color::rgb(0.2, 0.4, 0.6));
        context.set_projection(matrix::translation(1.0, 2.0, 3.0));
        context.set_transform(matrix::scaling(9.0, 9.0, 1.0));

        let before = context.state();
        atlas.draw(&mut context, "Hi", 0, 0).unwrap();
        assert_eq!(context.state(), before);

        atlas.destroy(&mut context);
    }

    #[test]
    fn state_is_restored_when_draw_fails() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = atlas(
            &mut context,
            AtlasOptions::default()
                .with_pipeline(PipelineMode::Immediate)
                .with_glyph_range(GLYPH_RANGE_LEGACY),
        );

        let before = context.state();
        let result = atlas.draw(&mut context, [b'A', 255], 0, 0);

        assert!(matches!(
            result,
            Err(TextError::GlyphOutOfRange { byte: 255, .. })
        ));
        assert_eq!(context.state(), before);

        atlas.destroy(&mut context);
    }

    #[test]
    fn scale_pivots_at_the_draw_origin() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        atlas.set_scale(2.0, 1.0);
        atlas.draw(&mut context, "A", 10, 20).unwrap();

        let transform = atlas.transform();
        // The origin maps to itself...
        let p = transform * Vector4::new(10.0, 20.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 10.0);
        assert_relative_eq!(p.y, 20.0);
        // ...while a pen position 100px right of it doubles its offset.
        let p = transform * Vector4::new(110.0, 20.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 210.0);

        // The scan itself stays unscaled; the transform was applied as a
        // register during the draw.
        assert!(
            context
                .calls()
                .iter()
                .any(|c| *c == Call::SetTransform(transform))
        );

        atlas.destroy(&mut context);
    }

    #[test]
    fn free_transform_is_never_overwritten() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        let custom = matrix::translation(3.0, 4.0, 0.0);
        atlas.set_free_transform(true);
        atlas.set_transform(custom);
        atlas.set_scale(5.0, 5.0);

        context.clear_calls();
        atlas.draw(&mut context, "A", 50, 60).unwrap();

        assert_eq!(atlas.transform(), custom);
        assert!(
            context
                .calls()
                .iter()
                .any(|c| *c == Call::SetTransform(custom))
        );

        atlas.destroy(&mut context);
    }

    #[test]
    fn draw_forces_blending_depth_and_tint() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = immediate(&mut context);

        let red = Color::rgb(1.0, 0.0, 0.0);
        atlas.set_color(red);
        atlas.set_depth(5.0);

        context.clear_calls();
        atlas.draw(&mut context, "A", 0, 0).unwrap();

        let calls = context.calls();
        assert!(
            calls
                .iter()
                .any(|c| *c == Call::SetBlendFunc(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha))
        );
        assert!(calls.iter().any(|c| *c == Call::SetDepthFunc(DepthFunc::LessOrEqual)));
        match calls.iter().find(|c| c.is_draw()) {
            Some(Call::DrawQuad { corners, color, .. }) => {
                assert_eq!(*color, red);
                assert_relative_eq!(corners[0].position[2], 5.0);
            }
            other => panic!("expected a DrawQuad, got {other:?}"),
        }

        atlas.destroy(&mut context);
    }

    #[test]
    fn batched_draw_uploads_once_and_draws_per_glyph() {
        let mut context = HeadlessContext::new(800, 600);
        let mut atlas = atlas(
            &mut context,
            AtlasOptions::default().with_pipeline(PipelineMode::Batched),
        );

        context.clear_calls();
        atlas.draw(&mut context, "A B", 0, 0).unwrap();

        let uploads: Vec<_> = context
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::UploadVertices { vertex_count, .. } => Some(*vertex_count),
                _ => None,
            })
            .collect();
        // One upload covering all three quads, the blank space included.
        assert_eq!(uploads, [12]);

        let first_vertices: Vec<_> = context
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::DrawBufferQuad { first_vertex, .. } => Some(*first_vertex),
                _ => None,
            })
            .collect();
        assert_eq!(first_vertices, [0, 4, 8]);

        // The glyph program was bound for the batch and unbound afterwards.
        assert!(
            context
                .calls()
                .iter()
                .any(|c| matches!(c, Call::SetProgram(Some(_))))
        );
        assert_eq!(context.state().program, None);

        atlas.destroy(&mut context);
    }
}
