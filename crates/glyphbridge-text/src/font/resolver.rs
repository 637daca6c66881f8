use crate::font::FontFace;
use crate::funcs::{GlyphId, GlyphResolver};
use crate::handle::FontHandle;

/// Resolves glyph queries straight from a [`FontFace`]'s own tables.
///
/// Variation sequences are not consulted; HarfBuzz falls back to the nominal
/// glyph for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontFaceResolver;

impl GlyphResolver for FontFaceResolver {
    type Face = FontFace;

    fn nominal_glyph(&self, font: &FontHandle<FontFace>, unicode: u32) -> Option<GlyphId> {
        font.face().glyph_for_char(unicode)
    }

    fn variation_glyph(
        &self,
        _font: &FontHandle<FontFace>,
        _unicode: u32,
        _selector: u32,
    ) -> Option<GlyphId> {
        None
    }

    fn h_advance(&self, font: &FontHandle<FontFace>, glyph: GlyphId) -> f32 {
        font.face().advance_width(glyph, font.point_size())
    }

    fn v_advance(&self, font: &FontHandle<FontFace>, glyph: GlyphId) -> f32 {
        -font.face().advance_height(glyph, font.point_size())
    }

    fn contour_point(
        &self,
        font: &FontHandle<FontFace>,
        glyph: GlyphId,
        point_index: u32,
    ) -> Option<(f32, f32)> {
        font.face()
            .contour_point(glyph, point_index, font.point_size())
    }
}
