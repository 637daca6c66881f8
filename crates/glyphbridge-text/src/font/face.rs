use std::path::Path;
use std::sync::Arc;

use swash::scale::ScaleContext;
use swash::scale::outline::Outline;
use swash::{FontRef, Metrics};

use crate::font::{FontError, FontMetrics, Result, ScaledFontMetrics};
use crate::funcs::GlyphId;
use crate::handle::{PlatformFace, Tag};

/// Loaded font face backed by a font file (TTF/OTF).
///
/// Owns the font data and serves both sides of the bridge: raw OpenType
/// tables for the engine through [`PlatformFace`], and glyph lookups for
/// [`FontFaceResolver`](crate::FontFaceResolver).
#[derive(Debug, Clone)]
pub struct FontFace {
    data: Arc<[u8]>,
    /// Offset to the table directory for this font.
    offset: u32,
    key: swash::CacheKey,
    metrics: FontMetrics,
}

impl FontFace {
    /// Create a font face from raw bytes and a font index within the file.
    pub fn from_bytes(data: Arc<[u8]>, index: usize) -> Result<Self> {
        let font = FontRef::from_index(&data, index).ok_or(FontError::InvalidFont)?;
        let Metrics {
            units_per_em,
            ascent,
            descent,
            leading,
            ..
        } = font.metrics(&[]);
        let metrics = FontMetrics {
            ascent,
            descent,
            line_gap: leading,
            units_per_em,
        };
        let (offset, key) = (font.offset, font.key);
        Ok(Self {
            data,
            offset,
            key,
            metrics,
        })
    }

    pub fn from_vec(data: Vec<u8>, index: usize) -> Result<Self> {
        Self::from_bytes(Arc::from(data), index)
    }

    pub fn from_path(path: impl AsRef<Path>, index: usize) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_vec(data, index)
    }

    fn as_swash_ref(&self) -> FontRef<'_> {
        FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        }
    }

    /// Metrics in font units.
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Metrics in points at `point_size`.
    pub fn metrics_at(&self, point_size: f32) -> ScaledFontMetrics {
        self.metrics.at_size(point_size)
    }

    /// Nominal glyph for `ch`; the notdef glyph counts as missing.
    pub fn glyph_for_char(&self, ch: u32) -> Option<GlyphId> {
        match self.as_swash_ref().charmap().map(ch) {
            0 => None,
            id => Some(GlyphId::from(id)),
        }
    }

    /// Horizontal advance of `glyph` in points at `point_size`.
    pub fn advance_width(&self, glyph: GlyphId, point_size: f32) -> f32 {
        let Ok(id) = u16::try_from(glyph) else {
            return 0.0;
        };
        self.as_swash_ref()
            .glyph_metrics(&[])
            .scale(point_size)
            .advance_width(id)
    }

    /// Vertical advance of `glyph` in points at `point_size`, positive downward.
    pub fn advance_height(&self, glyph: GlyphId, point_size: f32) -> f32 {
        let Ok(id) = u16::try_from(glyph) else {
            return 0.0;
        };
        self.as_swash_ref()
            .glyph_metrics(&[])
            .scale(point_size)
            .advance_height(id)
    }

    /// Scaled outline of `glyph` at `point_size`.
    pub fn glyph_outline(&self, glyph: GlyphId, point_size: f32) -> Option<Outline> {
        let id = u16::try_from(glyph).ok()?;
        let mut context = ScaleContext::new();
        let mut scaler = context
            .builder(self.as_swash_ref())
            .size(point_size)
            .build();
        scaler.scale_outline(id)
    }

    /// Point `index` of the glyph outline, in points, y-up.
    pub fn contour_point(&self, glyph: GlyphId, index: u32, point_size: f32) -> Option<(f32, f32)> {
        let outline = self.glyph_outline(glyph, point_size)?;
        let point = outline.points().get(usize::try_from(index).ok()?)?;
        Some((point.x, point.y))
    }
}

impl PlatformFace for FontFace {
    fn table(&self, tag: Tag) -> Option<&[u8]> {
        self.as_swash_ref().table(tag)
    }
}
