//! Headless demo: rasterize a font's byte range and measure a string without
//! a GPU.
//!
//! ```sh
//! cargo run --example measure -- /usr/share/fonts/truetype/dejavu/DejaVuSans.ttf "Hello, World!"
//! ```

use anyhow::{Context, Result};

use quill_renderer::{AtlasOptions, FontAtlas, HeadlessContext, SwashRasterizer};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().context("usage: measure <font.ttf> [text]")?;
    let text = args.next().unwrap_or_else(|| "Hello, World!".to_string());

    let mut context = HeadlessContext::new(800, 600);
    let mut rasterizer = SwashRasterizer::init()?;
    let mut atlas = FontAtlas::build(&mut context, &mut rasterizer, &path, 24, AtlasOptions::default())?;

    println!(
        "{text:?}: {}px wide, line height {}px",
        atlas.measure(&text)?,
        atlas.line_height()
    );
    println!(
        "centered on 400: draw at x = {}",
        atlas.align_center(&text, 400)?
    );

    atlas.draw(&mut context, &text, 0, 0)?;
    println!("emitted {} glyph draw calls", context.draw_calls());

    atlas.destroy(&mut context);
    Ok(())
}
