pub mod face;
pub mod loader;
pub mod metrics;
pub mod resolver;

pub use face::FontFace;
pub use loader::{load_font, load_system_font};
pub use metrics::{FontMetrics, ScaledFontMetrics};
pub use resolver::FontFaceResolver;

use thiserror::Error;

/// Errors that can occur while loading fonts.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("font I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid font data")]
    InvalidFont,

    #[error("no suitable system font found")]
    NoSystemFont,
}

/// Convenient result alias for font-related operations.
pub type Result<T> = std::result::Result<T, FontError>;
