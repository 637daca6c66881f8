//! Glyph resolver callbacks and the immutable HarfBuzz table built from them.
//!
//! HarfBuzz asks the font for glyph identity and metrics through a
//! `hb_font_funcs_t`. A [`GlyphFunctionTable`] compiles a [`GlyphResolver`]
//! into one such table once; the table is then shared, read-only, by every
//! font bound to it.

use std::ffi::{c_uint, c_void};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use harfbuzz_sys::{
    hb_bool_t, hb_codepoint_t, hb_font_funcs_create, hb_font_funcs_destroy,
    hb_font_funcs_get_empty, hb_font_funcs_is_immutable, hb_font_funcs_make_immutable,
    hb_font_funcs_reference, hb_font_funcs_set_glyph_contour_point_func,
    hb_font_funcs_set_glyph_h_advance_func, hb_font_funcs_set_glyph_v_advance_func,
    hb_font_funcs_set_nominal_glyph_func, hb_font_funcs_set_variation_glyph_func,
    hb_font_funcs_t, hb_font_t, hb_position_t,
};

use crate::error::{Result, ShapeError};
use crate::handle::{FontHandle, PlatformFace};

/// Glyph index within a font.
pub type GlyphId = u32;

/// Resolves glyph queries against a platform face.
///
/// Metrics are in points at the handle's point size; the table converts them
/// to device units for the engine. A resolver signals "not found" with `None`.
pub trait GlyphResolver: Send + Sync + 'static {
    type Face: PlatformFace;

    /// Map a code point to its nominal glyph.
    fn nominal_glyph(&self, font: &FontHandle<Self::Face>, unicode: u32) -> Option<GlyphId>;

    /// Map a code point followed by a variation selector to a variant glyph.
    fn variation_glyph(
        &self,
        font: &FontHandle<Self::Face>,
        unicode: u32,
        selector: u32,
    ) -> Option<GlyphId>;

    /// Horizontal advance of `glyph`.
    fn h_advance(&self, font: &FontHandle<Self::Face>, glyph: GlyphId) -> f32;

    /// Vertical advance of `glyph`, y-up (negative for top-to-bottom text).
    fn v_advance(&self, font: &FontHandle<Self::Face>, glyph: GlyphId) -> f32;

    /// Coordinates of outline point `point_index` of `glyph`.
    fn contour_point(
        &self,
        font: &FontHandle<Self::Face>,
        glyph: GlyphId,
        point_index: u32,
    ) -> Option<(f32, f32)>;
}

/// Immutable HarfBuzz function table bound to one resolver.
///
/// Cloning shares the same engine table.
pub struct GlyphFunctionTable<R: GlyphResolver> {
    raw: NonNull<hb_font_funcs_t>,
    resolver: Arc<R>,
}

// SAFETY: the table is made immutable before it escapes `from_arc`, HarfBuzz
// reference counts it atomically, and the resolver it points at is Send + Sync.
unsafe impl<R: GlyphResolver> Send for GlyphFunctionTable<R> {}
unsafe impl<R: GlyphResolver> Sync for GlyphFunctionTable<R> {}

impl<R: GlyphResolver> GlyphFunctionTable<R> {
    /// Build a table around `resolver`.
    pub fn build(resolver: R) -> Result<Self> {
        Self::from_arc(Arc::new(resolver))
    }

    /// Build a table around a resolver that is already shared.
    pub fn from_arc(resolver: Arc<R>) -> Result<Self> {
        // SAFETY: `raw` is a fresh, still-mutable table owned by us. Each setter
        // receives its own strong count on the resolver, released by HarfBuzz
        // through `release_resolver` when the table dies.
        unsafe {
            let raw = hb_font_funcs_create();
            if raw.is_null() || raw == hb_font_funcs_get_empty() {
                return Err(ShapeError::Allocation("font funcs"));
            }

            hb_font_funcs_set_nominal_glyph_func(
                raw,
                Some(nominal_glyph_func::<R>),
                resolver_ref(&resolver),
                Some(release_resolver::<R>),
            );
            hb_font_funcs_set_variation_glyph_func(
                raw,
                Some(variation_glyph_func::<R>),
                resolver_ref(&resolver),
                Some(release_resolver::<R>),
            );
            hb_font_funcs_set_glyph_h_advance_func(
                raw,
                Some(h_advance_func::<R>),
                resolver_ref(&resolver),
                Some(release_resolver::<R>),
            );
            hb_font_funcs_set_glyph_v_advance_func(
                raw,
                Some(v_advance_func::<R>),
                resolver_ref(&resolver),
                Some(release_resolver::<R>),
            );
            hb_font_funcs_set_glyph_contour_point_func(
                raw,
                Some(contour_point_func::<R>),
                resolver_ref(&resolver),
                Some(release_resolver::<R>),
            );
            hb_font_funcs_make_immutable(raw);

            log::debug!("built glyph function table {raw:p}");
            Ok(Self {
                raw: NonNull::new_unchecked(raw),
                resolver,
            })
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn is_immutable(&self) -> bool {
        // SAFETY: `raw` is a live table.
        unsafe { hb_font_funcs_is_immutable(self.raw.as_ptr()) != 0 }
    }

    /// Whether both values share one engine table.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }

    pub(crate) fn as_ptr(&self) -> *mut hb_font_funcs_t {
        self.raw.as_ptr()
    }
}

impl<R: GlyphResolver> Clone for GlyphFunctionTable<R> {
    fn clone(&self) -> Self {
        // SAFETY: `raw` is live; the new reference is released in `drop`.
        let raw = unsafe { hb_font_funcs_reference(self.raw.as_ptr()) };
        Self {
            raw: NonNull::new(raw).unwrap_or(self.raw),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<R: GlyphResolver> Drop for GlyphFunctionTable<R> {
    fn drop(&mut self) {
        // SAFETY: releases the reference taken in `from_arc` or `clone`.
        unsafe { hb_font_funcs_destroy(self.raw.as_ptr()) }
    }
}

impl<R: GlyphResolver> fmt::Debug for GlyphFunctionTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphFunctionTable")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

/// Per-font user data HarfBuzz hands back to every callback.
pub(crate) struct BoundFont<F> {
    pub(crate) handle: FontHandle<F>,
    /// Resolver points to device units: the device scale, times the ratio of
    /// the bound point size to the handle's own.
    pub(crate) to_device: f32,
}

/// Points to 16.16 fixed device units.
pub(crate) fn to_fixed(value: f32) -> hb_position_t {
    (value * 65536.0).round() as hb_position_t
}

/// 16.16 fixed device units to points.
pub(crate) fn from_fixed(value: hb_position_t) -> f32 {
    value as f32 / 65536.0
}

fn resolver_ref<R>(resolver: &Arc<R>) -> *mut c_void {
    Arc::into_raw(Arc::clone(resolver)) as *mut c_void
}

unsafe extern "C" fn release_resolver<R>(user_data: *mut c_void) {
    // SAFETY: `user_data` came from `resolver_ref` and is released once.
    drop(unsafe { Arc::from_raw(user_data as *const R) });
}

/// Recover the resolver and bound font from callback arguments.
///
/// # Safety
/// `user_data` must come from `resolver_ref::<R>` and `font_data` from
/// `ShapingFont::bind_scaled` with the same resolver type.
unsafe fn callback_args<'a, R: GlyphResolver>(
    font_data: *mut c_void,
    user_data: *mut c_void,
) -> (&'a R, &'a BoundFont<R::Face>) {
    unsafe {
        (
            &*(user_data as *const R),
            &*(font_data as *const BoundFont<R::Face>),
        )
    }
}

unsafe extern "C" fn nominal_glyph_func<R: GlyphResolver>(
    _font: *mut hb_font_t,
    font_data: *mut c_void,
    unicode: hb_codepoint_t,
    glyph: *mut hb_codepoint_t,
    user_data: *mut c_void,
) -> hb_bool_t {
    // SAFETY: HarfBuzz passes back the pointers registered at bind time.
    let (resolver, bound) = unsafe { callback_args::<R>(font_data, user_data) };
    match resolver.nominal_glyph(&bound.handle, unicode) {
        Some(id) => {
            // SAFETY: HarfBuzz passes a writable out-parameter.
            unsafe { *glyph = id };
            1
        }
        None => 0,
    }
}

unsafe extern "C" fn variation_glyph_func<R: GlyphResolver>(
    _font: *mut hb_font_t,
    font_data: *mut c_void,
    unicode: hb_codepoint_t,
    selector: hb_codepoint_t,
    glyph: *mut hb_codepoint_t,
    user_data: *mut c_void,
) -> hb_bool_t {
    // SAFETY: as above.
    let (resolver, bound) = unsafe { callback_args::<R>(font_data, user_data) };
    match resolver.variation_glyph(&bound.handle, unicode, selector) {
        Some(id) => {
            // SAFETY: HarfBuzz passes a writable out-parameter.
            unsafe { *glyph = id };
            1
        }
        None => 0,
    }
}

unsafe extern "C" fn h_advance_func<R: GlyphResolver>(
    _font: *mut hb_font_t,
    font_data: *mut c_void,
    glyph: hb_codepoint_t,
    user_data: *mut c_void,
) -> hb_position_t {
    // SAFETY: as above.
    let (resolver, bound) = unsafe { callback_args::<R>(font_data, user_data) };
    to_fixed(resolver.h_advance(&bound.handle, glyph) * bound.to_device)
}

unsafe extern "C" fn v_advance_func<R: GlyphResolver>(
    _font: *mut hb_font_t,
    font_data: *mut c_void,
    glyph: hb_codepoint_t,
    user_data: *mut c_void,
) -> hb_position_t {
    // SAFETY: as above.
    let (resolver, bound) = unsafe { callback_args::<R>(font_data, user_data) };
    to_fixed(resolver.v_advance(&bound.handle, glyph) * bound.to_device)
}

unsafe extern "C" fn contour_point_func<R: GlyphResolver>(
    _font: *mut hb_font_t,
    font_data: *mut c_void,
    glyph: hb_codepoint_t,
    point_index: c_uint,
    x: *mut hb_position_t,
    y: *mut hb_position_t,
    user_data: *mut c_void,
) -> hb_bool_t {
    // SAFETY: as above.
    let (resolver, bound) = unsafe { callback_args::<R>(font_data, user_data) };
    match resolver.contour_point(&bound.handle, glyph, point_index) {
        Some((px, py)) => {
            // SAFETY: HarfBuzz passes writable out-parameters.
            unsafe {
                *x = to_fixed(px * bound.to_device);
                *y = to_fixed(py * bound.to_device);
            }
            1
        }
        None => 0,
    }
}
