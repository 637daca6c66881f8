//! Detection of runs with nothing to draw.

/// Default_Ignorable_Code_Point ranges (Unicode 15.1, DerivedCoreProperties).
const DEFAULT_IGNORABLE: &[(u32, u32)] = &[
    (0x00AD, 0x00AD),
    (0x034F, 0x034F),
    (0x061C, 0x061C),
    (0x115F, 0x1160),
    (0x17B4, 0x17B5),
    (0x180B, 0x180F),
    (0x200B, 0x200F),
    (0x202A, 0x202E),
    (0x2060, 0x206F),
    (0x3164, 0x3164),
    (0xFE00, 0xFE0F),
    (0xFEFF, 0xFEFF),
    (0xFFA0, 0xFFA0),
    (0xFFF0, 0xFFF8),
    (0x1BCA0, 0x1BCA3),
    (0x1D173, 0x1D17A),
    (0xE0000, 0xE0FFF),
];

fn is_default_ignorable(ch: char) -> bool {
    let cp = u32::from(ch);
    DEFAULT_IGNORABLE
        .binary_search_by(|&(lo, hi)| {
            if hi < cp {
                std::cmp::Ordering::Less
            } else if lo > cp {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

/// Whether `chars` holds anything besides control characters and default
/// ignorables. Unpaired surrogates count as printable; the engine renders
/// them as notdef.
pub(crate) fn has_printable(chars: &[u16]) -> bool {
    char::decode_utf16(chars.iter().copied()).any(|ch| match ch {
        Ok(ch) => !ch.is_control() && !is_default_ignorable(ch),
        Err(_) => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    #[test]
    fn controls_and_ignorables_are_not_printable() {
        assert!(!has_printable(&[]));
        assert!(!has_printable(&utf16("\u{200B}\u{200B}\t")));
        assert!(!has_printable(&utf16("\r\n\u{FEFF}\u{2066}\u{E0041}")));
    }

    #[test]
    fn anything_visible_is_printable() {
        assert!(has_printable(&utf16(" ")));
        assert!(has_printable(&utf16("\u{200B}a")));
        assert!(has_printable(&utf16("\u{1F600}")));
        assert!(has_printable(&[0xD800]));
    }

    #[test]
    fn ranges_are_sorted_for_binary_search() {
        assert!(DEFAULT_IGNORABLE.windows(2).all(|w| w[0].1 < w[1].0));
        assert!(DEFAULT_IGNORABLE.iter().all(|(lo, hi)| lo <= hi));
    }
}
