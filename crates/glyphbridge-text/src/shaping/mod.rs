mod buffer;
pub mod font;
mod printable;
pub mod request;
pub mod result;
pub mod script;
pub mod shaper;

pub use font::ShapingFont;
pub use request::{LayoutFlags, PenPosition, ShapeRequest};
pub use result::{GlyphResult, GlyphStorage, ShapedGlyph};
pub use script::Script;
pub use shaper::{ShapeStatus, Shaper};
