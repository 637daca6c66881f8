use std::sync::Arc;

use anyhow::{Context, Result, bail};
use glyphbridge_config::BridgeConfig;
use glyphbridge_text::font::{load_font, load_system_font};
use glyphbridge_text::{
    FontFace, FontFaceResolver, FontHandle, GlyphFunctionTable, GlyphResult, LayoutFlags,
    ShapeRequest, Shaper,
};

const USAGE: &str = "usage: glyphbridge [layout | shape <text>]";

fn main() -> Result<()> {
    let config = BridgeConfig::load();
    init_logging(&config);

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("layout") => {
            print_layout();
            Ok(())
        }
        Some("shape") => {
            let text = args.collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                bail!(USAGE);
            }
            shape(&config, &text)
        }
        Some("-h" | "--help") => {
            println!("{USAGE}");
            Ok(())
        }
        Some(other) => bail!("unknown command `{other}`\n{USAGE}"),
    }
}

fn init_logging(config: &BridgeConfig) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(filter) = &config.logging.filter {
        builder.parse_filters(filter);
    }
    builder.init();
}

fn print_layout() {
    println!("{:<10} {:>4} {:>5}  sign", "type", "size", "align");
    for fact in glyphbridge_abi::facts() {
        let sign = if fact.unsigned { "unsigned" } else { "signed" };
        println!("{:<10} {:>4} {:>5}  {sign}", fact.name, fact.size, fact.align);
    }
}

fn load_face(config: &BridgeConfig) -> Result<FontFace> {
    match &config.text.font {
        Some(path) => {
            load_font(path, 0).with_context(|| format!("failed to load font {}", path.display()))
        }
        None => load_system_font().context("failed to load a system font"),
    }
}

fn shape(config: &BridgeConfig, text: &str) -> Result<()> {
    let face = load_face(config)?;
    let point_size = config.text.point_size;
    let metrics = face.metrics_at(point_size);
    let handle = FontHandle::new(Arc::new(face), point_size, config.text.device_scale)
        .context("invalid text size configuration")?;
    let table = GlyphFunctionTable::build(FontFaceResolver)?;

    let chars: Vec<u16> = text.encode_utf16().collect();
    let request =
        ShapeRequest::new(&handle, &chars).flags(LayoutFlags::from_config(&config.shaping));
    let shaper = Shaper::from_config(&config.shaping);

    println!(
        "{point_size}pt x{}: ascent {:.2} descent {:.2} line height {:.2}",
        handle.device_scale(),
        metrics.ascent,
        metrics.descent,
        metrics.line_height()
    );
    let status = shaper.shape(&request, &table, |result: &GlyphResult<'_>| {
        println!(
            "block: slot {} offset {} chars {} glyphs {}",
            result.slot,
            result.offset,
            result.char_count,
            result.glyph_count()
        );
        for glyph in result.glyphs() {
            println!(
                "  gid {:>5}  cluster {:>3}  advance ({:.2}, {:.2})  offset ({:.2}, {:.2})",
                glyph.glyph_id,
                glyph.cluster,
                glyph.x_advance,
                glyph.y_advance,
                glyph.x_offset,
                glyph.y_offset
            );
        }
        let pen = result.end_pen();
        println!("  pen ends at ({:.2}, {:.2})", pen.x, pen.y);
        0
    })?;

    log::info!(
        "shaped {} code units into {} glyphs ({} block)",
        chars.len(),
        status.glyphs,
        status.blocks
    );
    Ok(())
}
