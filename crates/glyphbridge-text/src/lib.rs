//! glyphbridge-text: the seam between a platform font subsystem and HarfBuzz.
//!
//! - `handle`: wraps a platform face, point size and device scale into a
//!   shareable handle with a destroy hook
//! - `funcs`: compiles five glyph resolvers into an immutable HarfBuzz
//!   function table
//! - `shaping`: binds handle + table into an engine font, shapes a UTF-16
//!   window and streams glyph blocks to caller storage
//! - `font`: a swash-backed face and resolver for shaping real font files

pub mod error;
pub mod font;
pub mod funcs;
pub mod handle;
pub mod shaping;

pub use error::{Result, ShapeError};
pub use font::{FontError, FontFace, FontFaceResolver, FontMetrics, ScaledFontMetrics};
pub use funcs::{GlyphFunctionTable, GlyphId, GlyphResolver};
pub use handle::{FontHandle, PlatformFace, Tag, tag};
pub use shaping::{
    GlyphResult, GlyphStorage, LayoutFlags, PenPosition, Script, ShapeRequest, ShapeStatus,
    ShapedGlyph, Shaper, ShapingFont,
};
