use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use glyphbridge_text::{
    FontHandle, GlyphFunctionTable, GlyphId, GlyphResolver, GlyphResult, LayoutFlags,
    PlatformFace, ShapeError, ShapeRequest, ShapeStatus, ShapedGlyph, Shaper, ShapingFont,
};

/// Face without tables; everything comes from the resolver.
struct Bare;
impl PlatformFace for Bare {}

/// Maps `a..=z` to glyphs `1..=26`, every glyph ten points wide.
struct Letters;

impl GlyphResolver for Letters {
    type Face = Bare;

    fn nominal_glyph(&self, _: &FontHandle<Bare>, unicode: u32) -> Option<GlyphId> {
        (0x61..=0x7a).contains(&unicode).then(|| unicode - 0x60)
    }

    fn variation_glyph(&self, _: &FontHandle<Bare>, _: u32, _: u32) -> Option<GlyphId> {
        None
    }

    fn h_advance(&self, _: &FontHandle<Bare>, _: GlyphId) -> f32 {
        10.0
    }

    fn v_advance(&self, _: &FontHandle<Bare>, _: GlyphId) -> f32 {
        -12.0
    }

    fn contour_point(&self, _: &FontHandle<Bare>, _: GlyphId, _: u32) -> Option<(f32, f32)> {
        None
    }
}

fn utf16(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

#[derive(Default)]
struct Collected {
    calls: usize,
    glyphs: Vec<ShapedGlyph>,
    char_count: usize,
    offset: usize,
    advance: (f32, f32),
}

impl Collected {
    fn storage(&mut self) -> impl FnMut(&GlyphResult<'_>) -> i32 + '_ {
        move |result: &GlyphResult<'_>| {
            self.calls += 1;
            self.glyphs.extend(result.glyphs());
            self.char_count += result.char_count;
            self.offset = result.offset;
            self.advance = result.advance();
            0
        }
    }

    fn ids(&self) -> Vec<GlyphId> {
        self.glyphs.iter().map(|g| g.glyph_id).collect()
    }

    fn clusters(&self) -> Vec<u32> {
        self.glyphs.iter().map(|g| g.cluster).collect()
    }
}

#[test]
fn shapes_latin_run_into_one_block() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let chars = utf16("abc");
    let request = ShapeRequest::new(&font, &chars);

    let mut out = Collected::default();
    let status = Shaper::new().shape(&request, &table, out.storage())?;

    assert_eq!(status, ShapeStatus { blocks: 1, glyphs: 3 });
    assert_eq!(out.calls, 1);
    assert_eq!(out.char_count, 3);
    assert_eq!(out.ids(), vec![1, 2, 3]);
    assert_eq!(out.clusters(), vec![0, 1, 2]);
    assert_eq!(out.advance, (30.0, 0.0));
    Ok(())
}

#[test]
fn window_keeps_paragraph_indices() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let chars = utf16("abcd");
    let request = ShapeRequest::new(&font, &chars).window(1, 3).start(5.0, 7.0);

    let mut pen = None;
    let mut out = Collected::default();
    {
        let mut inner = out.storage();
        Shaper::new().shape(&request, &table, |result: &GlyphResult<'_>| {
            pen = Some(result.end_pen());
            inner(result)
        })?;
    }

    assert_eq!(out.offset, 1);
    assert_eq!(out.char_count, 2);
    assert_eq!(out.ids(), vec![2, 3]);
    assert_eq!(out.clusters(), vec![1, 2]);
    let pen = pen.expect("storage was called");
    assert_eq!((pen.x, pen.y), (25.0, 7.0));
    Ok(())
}

#[test]
fn right_to_left_runs_come_back_in_visual_order() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let chars = utf16("abc");
    let request = ShapeRequest::new(&font, &chars).flags(LayoutFlags::RTL);

    let mut out = Collected::default();
    Shaper::new().shape(&request, &table, out.storage())?;

    assert_eq!(out.ids(), vec![3, 2, 1]);
    assert_eq!(out.clusters(), vec![2, 1, 0]);
    Ok(())
}

#[test]
fn device_scale_is_removed_from_user_metrics() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 12.0, 2.0)?;
    let chars = utf16("ab");
    let request = ShapeRequest::new(&font, &chars);

    let mut raw_advances = Vec::new();
    let mut user_advance = (0.0, 0.0);
    Shaper::new().shape(&request, &table, |result: &GlyphResult<'_>| {
        raw_advances.extend(result.glyph_positions().iter().map(|p| p.x_advance));
        user_advance = result.advance();
        0
    })?;

    assert_eq!(raw_advances, vec![20 << 16, 20 << 16]);
    assert_eq!(user_advance, (20.0, 0.0));
    Ok(())
}

#[test]
fn request_point_size_scales_resolver_metrics() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 10.0, 1.0)?;
    let chars = utf16("a");
    let request = ShapeRequest::new(&font, &chars).point_size(20.0);

    let mut out = Collected::default();
    Shaper::new().shape(&request, &table, out.storage())?;

    assert_eq!(out.advance, (20.0, 0.0));
    Ok(())
}

#[test]
fn invalid_window_never_reaches_storage() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let chars = utf16("abc");

    for (offset, limit) in [(2, 1), (0, 4), (4, 4)] {
        let request = ShapeRequest::new(&font, &chars).window(offset, limit);
        let mut out = Collected::default();
        let err = Shaper::new()
            .shape(&request, &table, out.storage())
            .unwrap_err();
        assert!(matches!(err, ShapeError::InvalidArgument(_)), "{offset}..{limit}");
        assert!(err.status() < 0);
        assert_eq!(out.calls, 0);
    }
    Ok(())
}

#[test]
fn empty_window_succeeds_without_storage_calls() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let chars = utf16("abc");
    let request = ShapeRequest::new(&font, &chars).window(1, 1);

    let mut out = Collected::default();
    let status = Shaper::new().shape(&request, &table, out.storage())?;

    assert_eq!(status, ShapeStatus::default());
    assert_eq!(out.calls, 0);
    Ok(())
}

#[test]
fn invisible_window_succeeds_without_storage_calls() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let chars = [0x200B, 0x200B, 0x0009];
    let request = ShapeRequest::new(&font, &chars);
    let shaper = Shaper::new();

    let mut out = Collected::default();
    let status = shaper.shape(&request, &table, out.storage())?;
    assert_eq!(status, ShapeStatus::default());
    assert_eq!(out.calls, 0);

    let bound = ShapingFont::bind(&font, &table)?;
    let status = shaper.shape_with_font(&request, &bound, out.storage())?;
    assert_eq!(status, ShapeStatus::default());
    assert_eq!(out.calls, 0);
    Ok(())
}

#[test]
fn one_printable_character_is_enough_to_shape() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let chars = [0x200B, 0x61, 0x0009];
    let request = ShapeRequest::new(&font, &chars);

    let mut out = Collected::default();
    let status = Shaper::new().shape(&request, &table, out.storage())?;

    assert_eq!(status.blocks, 1);
    assert_eq!(out.calls, 1);
    assert!(out.ids().contains(&1));
    Ok(())
}

#[test]
fn negative_storage_status_stops_the_call() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let font = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let chars = utf16("abc");
    let request = ShapeRequest::new(&font, &chars);

    let err = Shaper::new()
        .shape(&request, &table, |_: &GlyphResult<'_>| -7)
        .unwrap_err();

    assert_eq!(err, ShapeError::StorageStopped(-7));
    assert_eq!(err.status(), -7);
    Ok(())
}

#[test]
fn destroy_hook_waits_for_bound_font() -> Result<()> {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let hook = {
        let destroyed = destroyed.clone();
        move || {
            destroyed.fetch_add(1, Ordering::SeqCst);
        }
    };

    let table = GlyphFunctionTable::build(Letters)?;
    let handle = FontHandle::create(Arc::new(Bare), 12.0, 1.0, hook)?;
    let font = ShapingFont::bind(&handle, &table)?;
    drop(handle);
    assert_eq!(destroyed.load(Ordering::SeqCst), 0);

    drop(font);
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn bound_font_is_reusable() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let handle = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let font = ShapingFont::bind(&handle, &table)?;
    let shaper = Shaper::new();

    for text in ["ab", "xyz", "q"] {
        let chars = utf16(text);
        let request = ShapeRequest::new(&handle, &chars);
        let mut out = Collected::default();
        let status = shaper.shape_with_font(&request, &font, out.storage())?;
        assert_eq!(status.glyphs, text.len());
        assert_eq!(out.calls, 1);
    }
    Ok(())
}

#[test]
fn bound_font_rejects_requests_for_another_handle() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let bound_to = FontHandle::new(Arc::new(Bare), 12.0, 1.0)?;
    let other = FontHandle::new(Arc::new(Bare), 24.0, 3.0)?;
    let font = ShapingFont::bind(&bound_to, &table)?;
    let chars = utf16("abc");
    let request = ShapeRequest::new(&other, &chars);

    let mut out = Collected::default();
    let err = Shaper::new()
        .shape_with_font(&request, &font, out.storage())
        .unwrap_err();

    assert!(matches!(err, ShapeError::InvalidArgument(_)));
    assert_eq!(err.status(), -1);
    assert_eq!(out.calls, 0);

    let clone = bound_to.clone();
    let request = ShapeRequest::new(&clone, &chars);
    assert_eq!(Shaper::new().shape_with_font(&request, &font, out.storage())?.glyphs, 3);
    Ok(())
}

#[test]
fn one_table_serves_many_threads() -> Result<()> {
    let table = GlyphFunctionTable::build(Letters)?;
    let shaper = Shaper::new();

    std::thread::scope(|scope| {
        let workers: Vec<_> = (1..=4)
            .map(|n| {
                let table = &table;
                let shaper = &shaper;
                scope.spawn(move || -> Result<usize> {
                    let font = FontHandle::new(Arc::new(Bare), 12.0 * n as f32, 1.0)?;
                    let chars = utf16(&"abcdef"[..n]);
                    let mut total = 0;
                    for _ in 0..25 {
                        let request = ShapeRequest::new(&font, &chars);
                        let status = shaper.shape(&request, table, |_: &GlyphResult<'_>| 0)?;
                        total += status.glyphs;
                    }
                    Ok(total)
                })
            })
            .collect();

        for (n, worker) in (1..=4).zip(workers) {
            let total = worker.join().expect("worker panicked")?;
            assert_eq!(total, 25 * n);
        }
        Ok(())
    })
}
