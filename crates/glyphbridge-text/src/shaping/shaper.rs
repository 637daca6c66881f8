use std::ffi::{c_int, c_uint};
use std::ptr;

use glyphbridge_config::ShapingConfig;
use harfbuzz_sys::{HB_DIRECTION_LTR, HB_DIRECTION_RTL, hb_feature_t, hb_shape_full};

use crate::error::{Result, ShapeError};
use crate::funcs::{GlyphFunctionTable, GlyphResolver};
use crate::handle::{ensure_positive, tag};

use super::buffer::UnicodeBuffer;
use super::printable::has_printable;
use super::{GlyphResult, GlyphStorage, LayoutFlags, ShapeRequest, ShapingFont};

/// Outcome of a successful shape call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShapeStatus {
    /// Blocks handed to storage.
    pub blocks: usize,
    /// Glyphs handed to storage, across all blocks.
    pub glyphs: usize,
}

/// Drives HarfBuzz for one request at a time.
///
/// Holds no mutable state; one `Shaper` may serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Shaper {
    derive_scale_from_matrix: bool,
}

impl Shaper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ShapingConfig) -> Self {
        Self {
            derive_scale_from_matrix: config.derive_scale_from_matrix,
        }
    }

    /// Take the device scale from the request's transform rather than the handle.
    pub fn derive_scale_from_matrix(mut self, enabled: bool) -> Self {
        self.derive_scale_from_matrix = enabled;
        self
    }

    /// Device scale the request will be shaped at.
    pub fn device_scale_for<F>(&self, request: &ShapeRequest<'_, F>) -> Result<f32> {
        ensure_positive("point size", request.point_size)?;
        if request.matrix.iter().any(|v| !v.is_finite()) {
            return Err(ShapeError::InvalidArgument(format!(
                "transform must be finite, got {:?}",
                request.matrix
            )));
        }
        if !self.derive_scale_from_matrix {
            return Ok(request.font.device_scale());
        }
        let [xx, xy, ..] = request.matrix;
        let scale = xx.hypot(xy) / request.point_size;
        ensure_positive("device scale", scale)?;
        Ok(scale)
    }

    /// Shape `request` with a font bound for this call only.
    ///
    /// Storage receives one call per block of output. A window with no
    /// printable characters (empty, or only controls and default ignorables)
    /// or an empty result calls it zero times. A negative storage return
    /// aborts with [`ShapeError::StorageStopped`].
    pub fn shape<R, S>(
        &self,
        request: &ShapeRequest<'_, R::Face>,
        table: &GlyphFunctionTable<R>,
        storage: S,
    ) -> Result<ShapeStatus>
    where
        R: GlyphResolver,
        S: GlyphStorage,
    {
        validate_window(request)?;
        if !has_printable(&request.chars[request.offset..request.limit]) {
            log::debug!(
                "nothing printable in {}..{}, skipping",
                request.offset,
                request.limit
            );
            return Ok(ShapeStatus::default());
        }
        let device_scale = self.device_scale_for(request)?;
        let font = ShapingFont::bind_scaled(request.font, table, request.point_size, device_scale)?;
        self.shape_with_font(request, &font, storage)
    }

    /// Shape `request` with a previously bound font.
    ///
    /// The font's point size and scale are used as-is; the request's point
    /// size and transform are not consulted. The request must name the handle
    /// the font was bound to, else [`ShapeError::InvalidArgument`].
    pub fn shape_with_font<R, S>(
        &self,
        request: &ShapeRequest<'_, R::Face>,
        font: &ShapingFont<R>,
        mut storage: S,
    ) -> Result<ShapeStatus>
    where
        R: GlyphResolver,
        S: GlyphStorage,
    {
        validate_window(request)?;
        if !request.font.ptr_eq(font.handle()) {
            return Err(ShapeError::InvalidArgument(format!(
                "request for {:?} cannot use a font bound to {:?}",
                request.font,
                font.handle()
            )));
        }
        let char_count = request.char_count();
        if !has_printable(&request.chars[request.offset..request.limit]) {
            return Ok(ShapeStatus::default());
        }

        let mut buffer = UnicodeBuffer::new()?;
        buffer.add_utf16(request.chars, request.offset, char_count);
        let direction = if request.flags.contains(LayoutFlags::RTL) {
            HB_DIRECTION_RTL
        } else {
            HB_DIRECTION_LTR
        };
        buffer.set_segment(direction, request.script);

        let features = features_for(request.flags);
        // SAFETY: font and buffer are live; `features` outlives the call and a
        // null shaper list selects the default shapers.
        let shaped = unsafe {
            hb_shape_full(
                font.as_ptr(),
                buffer.as_ptr(),
                features.as_ptr(),
                features.len() as c_uint,
                ptr::null(),
            )
        };
        if shaped == 0 {
            log::warn!("engine rejected run of {char_count} code units at {}", request.offset);
            return Err(ShapeError::Engine("hb_shape_full failed"));
        }
        if !buffer.allocation_successful() {
            return Err(ShapeError::Allocation("shaped glyph buffer"));
        }

        let (infos, positions) = buffer.glyphs();
        if infos.is_empty() {
            return Ok(ShapeStatus::default());
        }

        let result = GlyphResult {
            slot: request.slot,
            base_index: request.base_index,
            offset: request.offset,
            start: request.start,
            device_scale: font.device_scale(),
            char_count,
            infos,
            positions,
        };
        let code = storage.store(&result);
        if code < 0 {
            log::debug!("storage stopped delivery with {code}");
            return Err(ShapeError::StorageStopped(code));
        }

        log::trace!(
            "shaped {char_count} code units into {} glyphs (slot {})",
            infos.len(),
            request.slot
        );
        Ok(ShapeStatus {
            blocks: 1,
            glyphs: infos.len(),
        })
    }
}

fn validate_window<F>(request: &ShapeRequest<'_, F>) -> Result<()> {
    let len = request.chars.len();
    if request.offset > request.limit || request.limit > len {
        return Err(ShapeError::InvalidArgument(format!(
            "text window {}..{} outside 0..{len}",
            request.offset, request.limit
        )));
    }
    if c_int::try_from(len).is_err() {
        return Err(ShapeError::InvalidArgument(format!(
            "text of {len} code units exceeds engine limit"
        )));
    }
    Ok(())
}

/// Switch off the features the flags leave unset.
fn features_for(flags: LayoutFlags) -> Vec<hb_feature_t> {
    let off = |bytes: &[u8; 4]| hb_feature_t {
        tag: tag(bytes),
        value: 0,
        start: 0,
        end: c_uint::MAX,
    };
    let mut features = Vec::with_capacity(3);
    if !flags.contains(LayoutFlags::KERNING) {
        features.push(off(b"kern"));
    }
    if !flags.contains(LayoutFlags::LIGATURES) {
        features.push(off(b"liga"));
        features.push(off(b"clig"));
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{FontHandle, PlatformFace};
    use std::sync::Arc;

    struct Face;
    impl PlatformFace for Face {}

    fn handle(pt: f32, scale: f32) -> FontHandle<Face> {
        FontHandle::new(Arc::new(Face), pt, scale).unwrap()
    }

    #[test]
    fn features_follow_flags() {
        let all = features_for(LayoutFlags::KERNING | LayoutFlags::LIGATURES);
        assert!(all.is_empty());

        let none = features_for(LayoutFlags::empty());
        let tags: Vec<u32> = none.iter().map(|f| f.tag).collect();
        assert_eq!(tags, vec![tag(b"kern"), tag(b"liga"), tag(b"clig")]);
        assert!(none.iter().all(|f| f.value == 0 && f.end == c_uint::MAX));
    }

    #[test]
    fn flags_from_config() {
        let mut config = ShapingConfig::default();
        assert_eq!(
            LayoutFlags::from_config(&config),
            LayoutFlags::KERNING | LayoutFlags::LIGATURES
        );
        config.kerning = false;
        assert_eq!(LayoutFlags::from_config(&config), LayoutFlags::LIGATURES);
    }

    #[test]
    fn window_bounds_are_checked() {
        let font = handle(12.0, 1.0);
        let chars = [0x61u16, 0x62, 0x63];
        assert!(validate_window(&ShapeRequest::new(&font, &chars)).is_ok());
        assert!(validate_window(&ShapeRequest::new(&font, &chars).window(3, 3)).is_ok());
        assert!(validate_window(&ShapeRequest::new(&font, &chars).window(2, 1)).is_err());
        assert!(validate_window(&ShapeRequest::new(&font, &chars).window(0, 4)).is_err());
    }

    #[test]
    fn device_scale_comes_from_handle_by_default() {
        let font = handle(10.0, 2.0);
        let chars = [0x61u16];
        let request = ShapeRequest::new(&font, &chars).matrix([30.0, 0.0, 0.0, 30.0]);
        assert_eq!(Shaper::new().device_scale_for(&request).unwrap(), 2.0);
    }

    #[test]
    fn device_scale_can_come_from_matrix() {
        let font = handle(10.0, 2.0);
        let chars = [0x61u16];
        let request = ShapeRequest::new(&font, &chars).matrix([18.0, 24.0, -24.0, 18.0]);
        let shaper = Shaper::new().derive_scale_from_matrix(true);
        assert_eq!(shaper.device_scale_for(&request).unwrap(), 3.0);

        let degenerate = ShapeRequest::new(&font, &chars).matrix([0.0, 0.0, 0.0, 0.0]);
        assert!(shaper.device_scale_for(&degenerate).is_err());
    }

    #[test]
    fn non_finite_requests_are_rejected() {
        let font = handle(10.0, 1.0);
        let chars = [0x61u16];
        let request = ShapeRequest::new(&font, &chars).point_size(0.0);
        assert!(matches!(
            Shaper::new().device_scale_for(&request),
            Err(ShapeError::InvalidArgument(_))
        ));
        let request = ShapeRequest::new(&font, &chars).matrix([f32::NAN, 0.0, 0.0, 10.0]);
        assert!(Shaper::new().device_scale_for(&request).is_err());
    }
}
