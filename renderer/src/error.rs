use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy of the text renderer.
///
/// Atlas construction failures are terminal: the failed build releases every
/// resource it created, and no partially-built atlas is ever handed back.
#[derive(Debug, Error)]
pub enum TextError {
    /// The rasterization backend could not initialize.
    #[error("rasterizer initialization failed: {0}")]
    RasterizerInit(String),

    /// The font file could not be opened or parsed.
    #[error("failed to load font {}: {reason}", path.display())]
    FontLoad { path: PathBuf, reason: String },

    /// The glyph shader did not compile (batched pipeline only).
    #[error("glyph shader failed to compile: {log}")]
    ShaderCompile { log: String },

    /// The glyph shader program did not link (batched pipeline only).
    #[error("glyph shader failed to link: {log}")]
    ShaderLink { log: String },

    /// A text byte landed outside the configured glyph table.
    #[error("byte {byte:#04x} is outside the glyph table (size {range})")]
    GlyphOutOfRange { byte: u8, range: usize },

    /// The glyph table cannot cover the byte range it will be indexed with.
    #[error("glyph table size {range} is below the supported minimum of {minimum}")]
    GlyphTableTooSmall { range: usize, minimum: usize },

    /// A render-context capability failed.
    #[error(transparent)]
    Renderer(#[from] anyhow::Error),
}
