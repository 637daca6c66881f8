use std::ffi::{c_int, c_uint};
use std::ptr::NonNull;
use std::slice;

use harfbuzz_sys::{
    HB_BUFFER_CLUSTER_LEVEL_MONOTONE_CHARACTERS, hb_buffer_add_utf16,
    hb_buffer_allocation_successful, hb_buffer_create, hb_buffer_destroy, hb_buffer_get_empty,
    hb_buffer_get_glyph_infos, hb_buffer_get_glyph_positions, hb_buffer_guess_segment_properties,
    hb_buffer_set_cluster_level, hb_buffer_set_direction, hb_buffer_set_script, hb_buffer_t,
    hb_direction_t, hb_glyph_info_t, hb_glyph_position_t, hb_script_from_iso15924_tag,
};

use crate::error::{Result, ShapeError};

use super::Script;

/// Owned HarfBuzz buffer, destroyed on drop.
pub(crate) struct UnicodeBuffer {
    raw: NonNull<hb_buffer_t>,
}

impl UnicodeBuffer {
    pub(crate) fn new() -> Result<Self> {
        // SAFETY: plain constructor; the empty singleton signals allocation failure.
        let raw = unsafe { hb_buffer_create() };
        if raw.is_null() || raw == unsafe { hb_buffer_get_empty() } {
            return Err(ShapeError::Allocation("glyph buffer"));
        }
        Ok(Self {
            // SAFETY: checked non-null above.
            raw: unsafe { NonNull::new_unchecked(raw) },
        })
    }

    /// Add `chars[offset..offset + count]`, keeping the rest as context.
    ///
    /// The caller has checked that the window lies inside `chars` and that
    /// both lengths fit in a C `int`.
    pub(crate) fn add_utf16(&mut self, chars: &[u16], offset: usize, count: usize) {
        // SAFETY: `chars` outlives the call and HarfBuzz copies what it needs.
        unsafe {
            hb_buffer_add_utf16(
                self.raw.as_ptr(),
                chars.as_ptr(),
                chars.len() as c_int,
                offset as c_uint,
                count as c_int,
            );
        }
    }

    /// Set direction and script, keep cluster values monotone in character
    /// order, and let the engine guess whatever is still unset.
    pub(crate) fn set_segment(&mut self, direction: hb_direction_t, script: Option<Script>) {
        // SAFETY: `raw` is a live, exclusively owned buffer.
        unsafe {
            hb_buffer_set_direction(self.raw.as_ptr(), direction);
            if let Some(script) = script {
                hb_buffer_set_script(self.raw.as_ptr(), hb_script_from_iso15924_tag(script.tag()));
            }
            hb_buffer_set_cluster_level(
                self.raw.as_ptr(),
                HB_BUFFER_CLUSTER_LEVEL_MONOTONE_CHARACTERS,
            );
            hb_buffer_guess_segment_properties(self.raw.as_ptr());
        }
    }

    pub(crate) fn allocation_successful(&self) -> bool {
        // SAFETY: `raw` is live.
        unsafe { hb_buffer_allocation_successful(self.raw.as_ptr()) != 0 }
    }

    /// Shaped glyph records and positions, equal in length.
    pub(crate) fn glyphs(&self) -> (&[hb_glyph_info_t], &[hb_glyph_position_t]) {
        let mut info_len: c_uint = 0;
        let mut pos_len: c_uint = 0;
        // SAFETY: the returned arrays live inside the buffer and stay valid
        // until it is modified or destroyed, which the borrow on `self` rules out.
        unsafe {
            let infos = hb_buffer_get_glyph_infos(self.raw.as_ptr(), &mut info_len);
            let positions = hb_buffer_get_glyph_positions(self.raw.as_ptr(), &mut pos_len);
            let len = info_len.min(pos_len) as usize;
            if infos.is_null() || positions.is_null() || len == 0 {
                return (&[], &[]);
            }
            (
                slice::from_raw_parts(infos, len),
                slice::from_raw_parts(positions, len),
            )
        }
    }

    pub(crate) fn as_ptr(&self) -> *mut hb_buffer_t {
        self.raw.as_ptr()
    }
}

impl Drop for UnicodeBuffer {
    fn drop(&mut self) {
        // SAFETY: sole owner of the reference from `hb_buffer_create`.
        unsafe { hb_buffer_destroy(self.raw.as_ptr()) }
    }
}
