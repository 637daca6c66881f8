//! Binding of a font handle and a function table into an engine font.

use std::ffi::{c_char, c_uint, c_void};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::Arc;

use harfbuzz_sys::{
    HB_MEMORY_MODE_READONLY, hb_blob_create, hb_blob_get_empty, hb_blob_t,
    hb_face_create_for_tables, hb_face_destroy, hb_face_get_empty, hb_face_t, hb_font_create,
    hb_font_destroy, hb_font_get_empty, hb_font_make_immutable, hb_font_set_funcs,
    hb_font_set_scale, hb_font_t, hb_tag_t,
};

use crate::error::{Result, ShapeError};
use crate::funcs::{BoundFont, GlyphFunctionTable, GlyphResolver, to_fixed};
use crate::handle::{FontHandle, PlatformFace, ensure_positive};

/// An engine font bound to one (handle, table, scale) combination.
///
/// The engine keeps its own clone of the handle, so the handle's destroy hook
/// cannot run before this font is dropped. Reuse a `ShapingFont` across calls
/// with [`Shaper::shape_with_font`](crate::Shaper::shape_with_font); never
/// reuse it for a different point size or transform.
pub struct ShapingFont<R: GlyphResolver> {
    raw: NonNull<hb_font_t>,
    handle: FontHandle<R::Face>,
    point_size: f32,
    device_scale: f32,
    _resolver: PhantomData<fn() -> R>,
}

// SAFETY: the engine font is immutable after `bind_scaled`, HarfBuzz reference
// counts it atomically, and everything it reaches (face, handle, resolver) is
// Send + Sync.
unsafe impl<R: GlyphResolver> Send for ShapingFont<R> {}
unsafe impl<R: GlyphResolver> Sync for ShapingFont<R> {}

impl<R: GlyphResolver> ShapingFont<R> {
    /// Bind at the handle's own point size and device scale.
    pub fn bind(handle: &FontHandle<R::Face>, table: &GlyphFunctionTable<R>) -> Result<Self> {
        Self::bind_scaled(handle, table, handle.point_size(), handle.device_scale())
    }

    /// Bind with an explicit point size and device scale.
    pub fn bind_scaled(
        handle: &FontHandle<R::Face>,
        table: &GlyphFunctionTable<R>,
        point_size: f32,
        device_scale: f32,
    ) -> Result<Self> {
        ensure_positive("point size", point_size)?;
        ensure_positive("device scale", device_scale)?;

        let face = create_face(handle.face())?;
        // SAFETY: `face` is a live face we own one reference to; the font takes
        // its own. The bound font box is handed to HarfBuzz, which frees it via
        // `release_bound` when the font dies.
        unsafe {
            let raw = hb_font_create(face);
            hb_face_destroy(face);
            if raw.is_null() || raw == hb_font_get_empty() {
                return Err(ShapeError::Allocation("engine font"));
            }

            let bound = Box::new(BoundFont {
                handle: handle.clone(),
                to_device: device_scale * point_size / handle.point_size(),
            });
            hb_font_set_funcs(
                raw,
                table.as_ptr(),
                Box::into_raw(bound) as *mut c_void,
                Some(release_bound::<R::Face>),
            );

            let scale = to_fixed(point_size * device_scale);
            hb_font_set_scale(raw, scale, scale);
            hb_font_make_immutable(raw);

            log::debug!(
                "bound engine font {raw:p}: pt={point_size} scale={device_scale} handle={handle:?}"
            );
            Ok(Self {
                raw: NonNull::new_unchecked(raw),
                handle: handle.clone(),
                point_size,
                device_scale,
                _resolver: PhantomData,
            })
        }
    }

    /// The handle this font was bound to.
    pub fn handle(&self) -> &FontHandle<R::Face> {
        &self.handle
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn device_scale(&self) -> f32 {
        self.device_scale
    }

    pub(crate) fn as_ptr(&self) -> *mut hb_font_t {
        self.raw.as_ptr()
    }
}

impl<R: GlyphResolver> Drop for ShapingFont<R> {
    fn drop(&mut self) {
        // SAFETY: releases the reference from `hb_font_create`; HarfBuzz then
        // drops the bound handle clone through `release_bound`.
        unsafe { hb_font_destroy(self.raw.as_ptr()) }
    }
}

impl<R: GlyphResolver> fmt::Debug for ShapingFont<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapingFont")
            .field("raw", &self.raw)
            .field("handle", &self.handle)
            .field("point_size", &self.point_size)
            .field("device_scale", &self.device_scale)
            .finish()
    }
}

unsafe extern "C" fn release_bound<F>(font_data: *mut c_void) {
    // SAFETY: `font_data` is the box leaked in `bind_scaled`, released once.
    drop(unsafe { Box::from_raw(font_data as *mut BoundFont<F>) });
}

/// Engine face that pulls tables from the platform face on demand.
fn create_face<F: PlatformFace>(face: &Arc<F>) -> Result<*mut hb_face_t> {
    let user_data = Arc::into_raw(Arc::clone(face)) as *mut c_void;
    // SAFETY: HarfBuzz owns `user_data` from here and releases it through
    // `release_face`, also on the failure path.
    unsafe {
        let raw = hb_face_create_for_tables(
            Some(reference_table::<F>),
            user_data,
            Some(release_face::<F>),
        );
        if raw.is_null() || raw == hb_face_get_empty() {
            return Err(ShapeError::Allocation("engine face"));
        }
        Ok(raw)
    }
}

unsafe extern "C" fn reference_table<F: PlatformFace>(
    _face: *mut hb_face_t,
    tag: hb_tag_t,
    user_data: *mut c_void,
) -> *mut hb_blob_t {
    let face_ptr = user_data as *const F;
    // SAFETY: `user_data` holds a strong count on the face for the life of
    // the engine face.
    let face = unsafe { &*face_ptr };
    match face.table(tag) {
        Some(bytes) if !bytes.is_empty() && bytes.len() <= c_uint::MAX as usize => {
            // SAFETY: the blob keeps the face alive through its own strong
            // count, so `bytes` stays valid until `release_face` runs.
            unsafe {
                Arc::increment_strong_count(face_ptr);
                hb_blob_create(
                    bytes.as_ptr() as *const c_char,
                    bytes.len() as c_uint,
                    HB_MEMORY_MODE_READONLY,
                    face_ptr as *mut c_void,
                    Some(release_face::<F>),
                )
            }
        }
        // SAFETY: the empty blob is an inert singleton.
        _ => unsafe { hb_blob_get_empty() },
    }
}

unsafe extern "C" fn release_face<F>(user_data: *mut c_void) {
    // SAFETY: each registration above owns exactly one strong count.
    drop(unsafe { Arc::from_raw(user_data as *const F) });
}
