use bitflags::bitflags;
use glyphbridge_config::ShapingConfig;

use crate::handle::FontHandle;

use super::Script;

bitflags! {
    /// Layout flags passed down from the text subsystem.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayoutFlags: u32 {
        /// Apply kerning; when clear the `kern` feature is switched off.
        const KERNING = 0x0000_0001;
        /// Apply standard and contextual ligatures.
        const LIGATURES = 0x0000_0002;
        /// The run is right-to-left.
        const RTL = 0x8000_0000;
    }
}

impl LayoutFlags {
    /// Default flags for a shaping configuration.
    pub fn from_config(config: &ShapingConfig) -> Self {
        let mut flags = LayoutFlags::empty();
        flags.set(LayoutFlags::KERNING, config.kerning);
        flags.set(LayoutFlags::LIGATURES, config.ligatures);
        flags
    }
}

/// Pen position in user space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PenPosition {
    pub x: f32,
    pub y: f32,
}

impl PenPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One shaping call: a UTF-16 window plus its positioning context.
#[derive(Debug)]
pub struct ShapeRequest<'a, F> {
    /// Point size of the run.
    pub point_size: f32,
    /// Glyph transform `[xx, xy, yx, yy]`, point size included.
    pub matrix: [f32; 4],
    pub font: &'a FontHandle<F>,
    /// The whole paragraph; only `offset..limit` is shaped, the rest is context.
    pub chars: &'a [u16],
    pub offset: usize,
    pub limit: usize,
    /// `None` lets the engine guess from the text.
    pub script: Option<Script>,
    pub flags: LayoutFlags,
    /// Font slot within a composite font, echoed back to storage.
    pub slot: i32,
    /// Index of `chars[0]` in the caller's own text, echoed back to storage.
    pub base_index: i32,
    pub start: PenPosition,
}

impl<'a, F> ShapeRequest<'a, F> {
    /// Request shaping all of `chars` with `font` at its own size and scale.
    pub fn new(font: &'a FontHandle<F>, chars: &'a [u16]) -> Self {
        let point_size = font.point_size();
        let extent = point_size * font.device_scale();
        Self {
            point_size,
            matrix: [extent, 0.0, 0.0, extent],
            font,
            chars,
            offset: 0,
            limit: chars.len(),
            script: None,
            flags: LayoutFlags::empty(),
            slot: 0,
            base_index: 0,
            start: PenPosition::default(),
        }
    }

    pub fn window(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn point_size(mut self, point_size: f32) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn matrix(mut self, matrix: [f32; 4]) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    pub fn flags(mut self, flags: LayoutFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn slot(mut self, slot: i32) -> Self {
        self.slot = slot;
        self
    }

    pub fn base_index(mut self, base_index: i32) -> Self {
        self.base_index = base_index;
        self
    }

    pub fn start(mut self, x: f32, y: f32) -> Self {
        self.start = PenPosition::new(x, y);
        self
    }

    /// Number of code units in the window.
    pub fn char_count(&self) -> usize {
        self.limit.saturating_sub(self.offset)
    }
}
