//! C exports for embedding glyphbridge in a native font subsystem.
//!
//! The host keeps its own font objects. It hands over an opaque face pointer
//! and five glyph callbacks, and receives shaped output through a store
//! callback, one call per block. The exported symbols live in [`ffi`].

pub mod ffi;

use std::ffi::{c_int, c_void};
use std::fmt;

use glyphbridge_config::BridgeConfig;
use glyphbridge_text::{
    FontHandle, GlyphFunctionTable, GlyphId, GlyphResolver, PlatformFace, Shaper, ShapingFont,
};
use harfbuzz_sys::{hb_glyph_info_t, hb_glyph_position_t};
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Nominal glyph lookup. Writes the glyph and returns non-zero when found.
pub type NominalGlyphFn =
    unsafe extern "C" fn(face: *mut c_void, unicode: u32, glyph: *mut u32) -> c_int;

/// Variation-sequence glyph lookup. Writes the glyph and returns non-zero when found.
pub type VariationGlyphFn = unsafe extern "C" fn(
    face: *mut c_void,
    unicode: u32,
    selector: u32,
    glyph: *mut u32,
) -> c_int;

/// Advance of a glyph in points when set at `pt_size`.
pub type AdvanceFn = unsafe extern "C" fn(face: *mut c_void, pt_size: f32, glyph: u32) -> f32;

/// Outline point lookup in points at `pt_size`. Returns non-zero when the
/// point exists.
pub type ContourPointFn = unsafe extern "C" fn(
    face: *mut c_void,
    pt_size: f32,
    glyph: u32,
    point_index: u32,
    x: *mut f32,
    y: *mut f32,
) -> c_int;

/// Called once when a font created by `gb_font_create` releases its face.
pub type DestroyFn = unsafe extern "C" fn(face: *mut c_void);

/// Receives one block of shaped output. A negative return stops delivery.
pub type StoreLayoutFn = unsafe extern "C" fn(
    slot: c_int,
    base_index: c_int,
    offset: c_int,
    start_x: f32,
    start_y: f32,
    dev_scale: f32,
    char_count: c_int,
    glyph_count: c_int,
    glyph_info: *mut hb_glyph_info_t,
    glyph_pos: *mut hb_glyph_position_t,
) -> c_int;

/// Face pointer owned by the host.
#[derive(Debug, Clone, Copy)]
pub struct ForeignFace(*mut c_void);

// SAFETY: the host promises its face stays valid until the destroy callback
// and may be queried from whichever thread shapes with it.
unsafe impl Send for ForeignFace {}
unsafe impl Sync for ForeignFace {}

impl ForeignFace {
    pub fn new(face: *mut c_void) -> Self {
        Self(face)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

impl PlatformFace for ForeignFace {}

/// Glyph resolver backed by host callbacks.
#[derive(Clone, Copy)]
pub struct ForeignResolver {
    nominal: NominalGlyphFn,
    variation: VariationGlyphFn,
    h_advance: AdvanceFn,
    v_advance: AdvanceFn,
    contour_point: ContourPointFn,
}

impl ForeignResolver {
    pub fn new(
        nominal: NominalGlyphFn,
        variation: VariationGlyphFn,
        h_advance: AdvanceFn,
        v_advance: AdvanceFn,
        contour_point: ContourPointFn,
    ) -> Self {
        Self {
            nominal,
            variation,
            h_advance,
            v_advance,
            contour_point,
        }
    }

    fn key(&self) -> [usize; 5] {
        [
            self.nominal as usize,
            self.variation as usize,
            self.h_advance as usize,
            self.v_advance as usize,
            self.contour_point as usize,
        ]
    }
}

impl fmt::Debug for ForeignResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ForeignResolver").field(&self.key()).finish()
    }
}

// Metrics callbacks get the handle's point size. The engine rescales them when
// a request asks for another size.
impl GlyphResolver for ForeignResolver {
    type Face = ForeignFace;

    fn nominal_glyph(&self, font: &FontHandle<ForeignFace>, unicode: u32) -> Option<GlyphId> {
        let mut glyph = 0;
        // SAFETY: the host vouched for its face when creating the handle and
        // `glyph` outlives the call.
        let found = unsafe { (self.nominal)(font.face().as_ptr(), unicode, &mut glyph) };
        (found != 0).then_some(glyph)
    }

    fn variation_glyph(
        &self,
        font: &FontHandle<ForeignFace>,
        unicode: u32,
        selector: u32,
    ) -> Option<GlyphId> {
        let mut glyph = 0;
        // SAFETY: as for `nominal_glyph`.
        let found =
            unsafe { (self.variation)(font.face().as_ptr(), unicode, selector, &mut glyph) };
        (found != 0).then_some(glyph)
    }

    fn h_advance(&self, font: &FontHandle<ForeignFace>, glyph: GlyphId) -> f32 {
        // SAFETY: the face is valid for the handle's lifetime.
        unsafe { (self.h_advance)(font.face().as_ptr(), font.point_size(), glyph) }
    }

    fn v_advance(&self, font: &FontHandle<ForeignFace>, glyph: GlyphId) -> f32 {
        // SAFETY: the face is valid for the handle's lifetime.
        unsafe { (self.v_advance)(font.face().as_ptr(), font.point_size(), glyph) }
    }

    fn contour_point(
        &self,
        font: &FontHandle<ForeignFace>,
        glyph: GlyphId,
        point_index: u32,
    ) -> Option<(f32, f32)> {
        let (mut x, mut y) = (0.0, 0.0);
        let face = font.face().as_ptr();
        // SAFETY: the face is valid for the handle's lifetime and both
        // out-parameters outlive the call.
        let found = unsafe {
            (self.contour_point)(face, font.point_size(), glyph, point_index, &mut x, &mut y)
        };
        (found != 0).then_some((x, y))
    }
}

/// Function table handed to C as an opaque pointer.
pub type GbFontFuncs = GlyphFunctionTable<ForeignResolver>;

/// Bound engine font handed to C as an opaque pointer.
pub type GbFont = ShapingFont<ForeignResolver>;

static CONFIG: Lazy<BridgeConfig> = Lazy::new(BridgeConfig::load);

static SHAPER: Lazy<Shaper> = Lazy::new(|| Shaper::from_config(&CONFIG.shaping));

static LOGGING: Lazy<()> = Lazy::new(|| {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(filter) = &CONFIG.logging.filter {
        builder.parse_filters(filter);
    }
    if builder.try_init().is_ok() {
        log::debug!("glyphbridge logging initialized");
    }
});

/// Tables live for the rest of the process, one per distinct callback set.
static TABLES: Lazy<Mutex<HashMap<[usize; 5], &'static GbFontFuncs>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Install the logger once; later calls are no-ops.
pub fn init_logging() {
    Lazy::force(&LOGGING);
}

/// Shaper configured from `glyphbridge.toml` and the environment.
pub fn shaper() -> &'static Shaper {
    &SHAPER
}

/// The process-lifetime table for `resolver`'s callbacks, built on first use.
pub fn font_funcs(resolver: ForeignResolver) -> glyphbridge_text::Result<&'static GbFontFuncs> {
    init_logging();
    let key = resolver.key();
    let mut tables = TABLES.lock();
    if let Some(table) = tables.get(&key) {
        return Ok(*table);
    }
    let table: &'static GbFontFuncs = Box::leak(Box::new(GlyphFunctionTable::build(resolver)?));
    log::debug!("registered font funcs #{} for {resolver:?}", tables.len() + 1);
    tables.insert(key, table);
    Ok(table)
}
