//! Error types for handle creation and shaping.

use thiserror::Error;

/// Result type for shaping operations.
pub type Result<T> = std::result::Result<T, ShapeError>;

/// Errors surfaced by the shaping seam.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The engine could not allocate one of its objects.
    #[error("allocation failed: {0}")]
    Allocation(&'static str),

    /// A caller-supplied argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The shaping engine rejected the run.
    #[error("shaping engine failure: {0}")]
    Engine(&'static str),

    /// The storage callback asked to stop by returning a negative value.
    #[error("storage callback stopped delivery with status {0}")]
    StorageStopped(i32),
}

impl ShapeError {
    /// Negative status code used across the C boundary.
    ///
    /// A storage stop reports the callback's own value unchanged.
    pub fn status(&self) -> i32 {
        match self {
            ShapeError::InvalidArgument(_) => -1,
            ShapeError::Allocation(_) => -2,
            ShapeError::Engine(_) => -3,
            ShapeError::StorageStopped(code) => *code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_negative() {
        assert_eq!(ShapeError::InvalidArgument("x".into()).status(), -1);
        assert_eq!(ShapeError::Allocation("buffer").status(), -2);
        assert_eq!(ShapeError::Engine("shape").status(), -3);
        assert_eq!(ShapeError::StorageStopped(-42).status(), -42);
    }
}
