use std::path::Path;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};

use crate::font::{FontError, FontFace, Result};

/// Load a font face from disk.
pub fn load_font(path: impl AsRef<Path>, index: usize) -> Result<FontFace> {
    let path = path.as_ref();
    log::debug!("loading font {} (index {index})", path.display());
    FontFace::from_path(path, index)
}

/// Load a regular sans-serif face from the system font directories.
pub fn load_system_font() -> Result<FontFace> {
    let mut db = Database::new();
    db.load_system_fonts();

    let id = db
        .query(&Query {
            families: &[
                Family::SansSerif,
                Family::Name("DejaVu Sans"),
                Family::Name("Segoe UI"),
                Family::Name("Arial"),
            ],
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
            ..Query::default()
        })
        .ok_or(FontError::NoSystemFont)?;

    log::debug!("system font query matched {id:?} of {} faces", db.len());
    db.with_face_data(id, |data, index| FontFace::from_vec(data.to_vec(), index as usize))
        .ok_or(FontError::NoSystemFont)?
}
