use harfbuzz_sys::{hb_glyph_info_t, hb_glyph_position_t};

use crate::funcs::{GlyphId, from_fixed};

use super::PenPosition;

/// One contiguous block of shaped output.
///
/// The buffers borrow engine memory and are only valid for the duration of
/// the storage call; copy out anything that must outlive it.
pub struct GlyphResult<'a> {
    pub slot: i32,
    pub base_index: i32,
    /// Offset of the block's first code unit within the request's `chars`.
    pub offset: usize,
    /// Pen position at the start of the block.
    pub start: PenPosition,
    pub device_scale: f32,
    /// Code units consumed by the block.
    pub char_count: usize,
    pub(crate) infos: &'a [hb_glyph_info_t],
    pub(crate) positions: &'a [hb_glyph_position_t],
}

/// A glyph with its metrics converted back to user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    pub glyph_id: GlyphId,
    /// Index of the source code unit within the request's `chars`.
    pub cluster: u32,
    pub x_advance: f32,
    pub y_advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

impl<'a> GlyphResult<'a> {
    pub fn glyph_count(&self) -> usize {
        self.infos.len()
    }

    /// Raw engine glyph records (glyph id in `codepoint`, source index in `cluster`).
    pub fn glyph_infos(&self) -> &'a [hb_glyph_info_t] {
        self.infos
    }

    /// Raw engine positions in 16.16 fixed device units.
    pub fn glyph_positions(&self) -> &'a [hb_glyph_position_t] {
        self.positions
    }

    /// Glyphs in engine order with user-space metrics.
    pub fn glyphs(&self) -> impl Iterator<Item = ShapedGlyph> + '_ {
        let to_user = |v| from_fixed(v) / self.device_scale;
        self.infos
            .iter()
            .zip(self.positions)
            .map(move |(info, pos)| ShapedGlyph {
                glyph_id: info.codepoint,
                cluster: info.cluster,
                x_advance: to_user(pos.x_advance),
                y_advance: to_user(pos.y_advance),
                x_offset: to_user(pos.x_offset),
                y_offset: to_user(pos.y_offset),
            })
    }

    /// Total advance of the block in user space.
    pub fn advance(&self) -> (f32, f32) {
        self.glyphs()
            .fold((0.0, 0.0), |(x, y), g| (x + g.x_advance, y + g.y_advance))
    }

    /// Pen position after the block.
    pub fn end_pen(&self) -> PenPosition {
        let (dx, dy) = self.advance();
        PenPosition::new(self.start.x + dx, self.start.y + dy)
    }
}

/// Receives shaped blocks, one call per block.
///
/// A negative return stops delivery and becomes the shape call's status.
pub trait GlyphStorage {
    fn store(&mut self, result: &GlyphResult<'_>) -> i32;
}

impl<T> GlyphStorage for T
where
    T: FnMut(&GlyphResult<'_>) -> i32,
{
    fn store(&mut self, result: &GlyphResult<'_>) -> i32 {
        self(result)
    }
}
