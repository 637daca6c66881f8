//! Exported C symbols.
//!
//! Failures are reported as negative status codes: `-1` invalid argument,
//! `-2` allocation, `-3` engine. A store callback that stops delivery has
//! its own negative value passed through.

use std::ffi::{c_int, c_void};
use std::ptr;
use std::slice;
use std::sync::Arc;

use glyphbridge_abi as abi;
use glyphbridge_text::{
    FontHandle, GlyphResult, LayoutFlags, Script, ShapeError, ShapeRequest, ShapeStatus,
    ShapingFont,
};

use crate::{
    AdvanceFn, ContourPointFn, DestroyFn, ForeignFace, ForeignResolver, GbFont, GbFontFuncs,
    NominalGlyphFn, StoreLayoutFn, VariationGlyphFn, font_funcs, init_logging, shaper,
};

#[unsafe(no_mangle)]
pub extern "C" fn gb_sizeof_short() -> c_int {
    abi::sizeof_short() as c_int
}

#[unsafe(no_mangle)]
pub extern "C" fn gb_sizeof_int() -> c_int {
    abi::sizeof_int() as c_int
}

#[unsafe(no_mangle)]
pub extern "C" fn gb_sizeof_long() -> c_int {
    abi::sizeof_long() as c_int
}

#[unsafe(no_mangle)]
pub extern "C" fn gb_sizeof_wchar() -> c_int {
    abi::sizeof_wchar() as c_int
}

/// `true` when `wchar_t` is unsigned.
#[unsafe(no_mangle)]
pub extern "C" fn gb_signof_wchar() -> bool {
    abi::signof_wchar()
}

/// `true` when plain `char` is unsigned.
#[unsafe(no_mangle)]
pub extern "C" fn gb_signof_char() -> bool {
    abi::signof_char()
}

#[unsafe(no_mangle)]
pub extern "C" fn gb_alignof_long_long() -> c_int {
    abi::alignof_long_long() as c_int
}

#[unsafe(no_mangle)]
pub extern "C" fn gb_alignof_double() -> c_int {
    abi::alignof_double() as c_int
}

/// Install the `env_logger` backend. Safe to call more than once.
#[unsafe(no_mangle)]
pub extern "C" fn gb_init_logging() {
    init_logging();
}

/// Get the shared function table for a set of glyph callbacks.
///
/// The same callbacks always yield the same table, which lives until the
/// process exits. Returns null if the engine cannot allocate the table.
#[unsafe(no_mangle)]
pub extern "C" fn gb_get_font_funcs(
    nominal: NominalGlyphFn,
    variation: VariationGlyphFn,
    h_advance: AdvanceFn,
    v_advance: AdvanceFn,
    contour_point: ContourPointFn,
) -> *const GbFontFuncs {
    let resolver = ForeignResolver::new(nominal, variation, h_advance, v_advance, contour_point);
    match font_funcs(resolver) {
        Ok(table) => ptr::from_ref(table),
        Err(err) => {
            log::error!("gb_get_font_funcs: {err}");
            ptr::null()
        }
    }
}

/// Bind a host face into an engine font.
///
/// `destroy`, when given, is called with `face` exactly once, after the font
/// is destroyed. Returns null on failure; `destroy` is not called then and the
/// host still owns `face`.
///
/// # Safety
/// `funcs` must come from [`gb_get_font_funcs`]. `face` must stay valid until
/// `destroy` runs, or until [`gb_font_destroy`] returns when there is none.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gb_font_create(
    face: *mut c_void,
    pt_size: f32,
    dev_scale: f32,
    destroy: Option<DestroyFn>,
    funcs: *const GbFontFuncs,
) -> *mut GbFont {
    // SAFETY: per contract `funcs` is null or a process-lifetime table.
    let Some(table) = (unsafe { funcs.as_ref() }) else {
        log::error!("gb_font_create: null font funcs");
        return ptr::null_mut();
    };

    let foreign = ForeignFace::new(face);
    let handle = match destroy {
        // SAFETY: the host's destroy callback accepts the face it was given.
        Some(destroy) => FontHandle::create(Arc::new(foreign), pt_size, dev_scale, move || unsafe {
            destroy(foreign.as_ptr())
        }),
        None => FontHandle::new(Arc::new(foreign), pt_size, dev_scale),
    };
    let handle = match handle {
        Ok(handle) => handle,
        Err(err) => {
            log::error!("gb_font_create: {err}");
            return ptr::null_mut();
        }
    };

    match ShapingFont::bind(&handle, table) {
        Ok(font) => Box::into_raw(Box::new(font)),
        Err(err) => {
            handle.disarm();
            log::error!("gb_font_create: {err}");
            ptr::null_mut()
        }
    }
}

/// Release a font from [`gb_font_create`]. Null is ignored.
///
/// # Safety
/// `font` must be null or a pointer from [`gb_font_create`] not yet destroyed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gb_font_destroy(font: *mut GbFont) {
    if !font.is_null() {
        // SAFETY: ownership returns from C exactly once.
        drop(unsafe { Box::from_raw(font) });
    }
}

/// Text arguments common to the shaping exports, checked for sign and null.
struct TextWindow<'a> {
    chars: &'a [u16],
    offset: usize,
    limit: usize,
}

impl<'a> TextWindow<'a> {
    /// # Safety
    /// `chars` must point at `len` code units that stay valid for `'a`; it
    /// may be null when `len` is 0.
    unsafe fn new(
        chars: *const u16,
        len: c_int,
        offset: c_int,
        limit: c_int,
    ) -> Result<Self, &'static str> {
        let (Ok(len), Ok(offset), Ok(limit)) = (
            usize::try_from(len),
            usize::try_from(offset),
            usize::try_from(limit),
        ) else {
            return Err("negative length or window");
        };
        let chars: &[u16] = if len == 0 {
            &[]
        } else if chars.is_null() {
            return Err("null text");
        } else {
            // SAFETY: the caller guarantees `len` readable code units.
            unsafe { slice::from_raw_parts(chars, len) }
        };
        Ok(Self {
            chars,
            offset,
            limit,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn request<'h>(
        &self,
        handle: &'h FontHandle<ForeignFace>,
        script: c_int,
        base_index: c_int,
        start_x: f32,
        start_y: f32,
        flags: c_int,
        slot: c_int,
    ) -> ShapeRequest<'h, ForeignFace>
    where
        'a: 'h,
    {
        let request = ShapeRequest::new(handle, self.chars)
            .window(self.offset, self.limit)
            .point_size(handle.point_size())
            .flags(LayoutFlags::from_bits_truncate(flags as u32))
            .slot(slot)
            .base_index(base_index)
            .start(start_x, start_y);
        match Script::from_icu_code(script) {
            Some(script) => request.script(script),
            None => request,
        }
    }
}

fn invalid(export: &str, what: &str) -> c_int {
    log::warn!("{export}: {what}");
    ShapeError::InvalidArgument(what.to_owned()).status()
}

/// Forward each shaped block to the host's store callback.
fn deliver(store: StoreLayoutFn) -> impl FnMut(&GlyphResult<'_>) -> i32 {
    move |result: &GlyphResult<'_>| {
        // SAFETY: the buffers stay valid for the duration of the callback and
        // every count fits a C int because the text length does.
        unsafe {
            store(
                result.slot,
                result.base_index,
                result.offset as c_int,
                result.start.x,
                result.start.y,
                result.device_scale,
                result.char_count as c_int,
                result.glyph_count() as c_int,
                result.glyph_infos().as_ptr().cast_mut(),
                result.glyph_positions().as_ptr().cast_mut(),
            )
        }
    }
}

fn report(export: &str, status: glyphbridge_text::Result<ShapeStatus>) -> c_int {
    match status {
        Ok(status) => c_int::try_from(status.glyphs).unwrap_or(c_int::MAX),
        Err(err) => {
            log::debug!("{export}: {err}");
            err.status()
        }
    }
}

/// Shape `chars[offset..limit]` and hand the output to `store`.
///
/// The rest of `chars` is context for the engine. `script` is an ICU script
/// code; unknown codes let the engine guess. Returns the number of glyphs
/// delivered, or a negative status.
///
/// # Safety
/// `matrix` must point at four floats and `chars` at `len` code units (it may
/// be null when `len` is 0). `funcs` must come from [`gb_get_font_funcs`] and
/// `face` must be valid for its callbacks for the duration of the call.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gb_shape(
    pt_size: f32,
    matrix: *const f32,
    face: *mut c_void,
    chars: *const u16,
    len: c_int,
    script: c_int,
    offset: c_int,
    limit: c_int,
    base_index: c_int,
    start_x: f32,
    start_y: f32,
    flags: c_int,
    slot: c_int,
    funcs: *const GbFontFuncs,
    store: Option<StoreLayoutFn>,
) -> c_int {
    const EXPORT: &str = "gb_shape";

    // SAFETY: per contract `funcs` is null or a process-lifetime table.
    let Some(table) = (unsafe { funcs.as_ref() }) else {
        return invalid(EXPORT, "null font funcs");
    };
    let Some(store) = store else {
        return invalid(EXPORT, "null store callback");
    };
    if matrix.is_null() {
        return invalid(EXPORT, "null matrix");
    }
    // SAFETY: forwarded from this function's contract.
    let text = match unsafe { TextWindow::new(chars, len, offset, limit) } {
        Ok(text) => text,
        Err(what) => return invalid(EXPORT, what),
    };
    // SAFETY: checked non-null; the caller guarantees four floats.
    let matrix = unsafe { [*matrix, *matrix.add(1), *matrix.add(2), *matrix.add(3)] };

    let handle = match FontHandle::new(Arc::new(ForeignFace::new(face)), pt_size, 1.0) {
        Ok(handle) => handle,
        Err(err) => return err.status(),
    };
    let request = text
        .request(&handle, script, base_index, start_x, start_y, flags, slot)
        .matrix(matrix);

    report(EXPORT, shaper().shape(&request, table, deliver(store)))
}

/// Shape `chars[offset..limit]` with a font from [`gb_font_create`].
///
/// The font's point size and device scale apply; otherwise this behaves like
/// [`gb_shape`]. Fonts may be shared across threads.
///
/// # Safety
/// `font` must be null or a live pointer from [`gb_font_create`]. `chars` must
/// point at `len` code units (it may be null when `len` is 0).
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gb_shape_with_font(
    font: *const GbFont,
    chars: *const u16,
    len: c_int,
    script: c_int,
    offset: c_int,
    limit: c_int,
    base_index: c_int,
    start_x: f32,
    start_y: f32,
    flags: c_int,
    slot: c_int,
    store: Option<StoreLayoutFn>,
) -> c_int {
    const EXPORT: &str = "gb_shape_with_font";

    // SAFETY: per contract `font` is null or live until `gb_font_destroy`.
    let Some(font) = (unsafe { font.as_ref() }) else {
        return invalid(EXPORT, "null font");
    };
    let Some(store) = store else {
        return invalid(EXPORT, "null store callback");
    };
    // SAFETY: forwarded from this function's contract.
    let text = match unsafe { TextWindow::new(chars, len, offset, limit) } {
        Ok(text) => text,
        Err(what) => return invalid(EXPORT, what),
    };

    let request = text.request(font.handle(), script, base_index, start_x, start_y, flags, slot);
    report(EXPORT, shaper().shape_with_font(&request, font, deliver(store)))
}
