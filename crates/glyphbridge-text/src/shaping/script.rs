use std::fmt;

use crate::handle::{Tag, tag};

/// ISO 15924 script of a run.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Script(Tag);

/// ISO 15924 tags indexed by the runtime's ICU script code.
const ICU_SCRIPTS: [&[u8; 4]; 46] = [
    b"Zyyy", b"Zinh", b"Arab", b"Armn", b"Beng", b"Bopo", b"Cher", b"Copt", b"Cyrl", b"Dsrt",
    b"Deva", b"Ethi", b"Geor", b"Goth", b"Grek", b"Gujr", b"Guru", b"Hani", b"Hang", b"Hebr",
    b"Hira", b"Knda", b"Kana", b"Khmr", b"Laoo", b"Latn", b"Mlym", b"Mong", b"Mymr", b"Ogam",
    b"Ital", b"Orya", b"Runr", b"Sinh", b"Syrc", b"Taml", b"Telu", b"Thaa", b"Thai", b"Tibt",
    b"Cans", b"Yiii", b"Tglg", b"Hano", b"Buhd", b"Tagb",
];

impl Script {
    pub const COMMON: Script = Script::from_bytes(b"Zyyy");
    pub const LATIN: Script = Script::from_bytes(b"Latn");
    pub const GREEK: Script = Script::from_bytes(b"Grek");
    pub const CYRILLIC: Script = Script::from_bytes(b"Cyrl");
    pub const ARABIC: Script = Script::from_bytes(b"Arab");
    pub const HEBREW: Script = Script::from_bytes(b"Hebr");
    pub const DEVANAGARI: Script = Script::from_bytes(b"Deva");
    pub const HAN: Script = Script::from_bytes(b"Hani");

    pub const fn from_bytes(bytes: &[u8; 4]) -> Self {
        Script(tag(bytes))
    }

    pub const fn from_tag(tag: Tag) -> Self {
        Script(tag)
    }

    /// Map an ICU `UScriptCode` to its ISO 15924 script.
    ///
    /// Codes outside the known range return `None`, leaving the engine to
    /// guess the script from the text.
    pub fn from_icu_code(code: i32) -> Option<Self> {
        let index = usize::try_from(code).ok()?;
        ICU_SCRIPTS.get(index).map(|bytes| Script::from_bytes(bytes))
    }

    pub const fn tag(self) -> Tag {
        self.0
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({self})")
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.to_be_bytes() {
            let ch = if byte.is_ascii_graphic() { byte as char } else { '?' };
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}
