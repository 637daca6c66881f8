//! glyphbridge-abi: layout facts about the host C ABI.
//!
//! The foreign-function binding layer needs a handful of facts it cannot
//! derive from the managed side alone: how wide `short`, `int`, `long` and
//! `wchar_t` are, whether plain `char` and `wchar_t` are signed, and how
//! `long long` and `double` are aligned. All of them are constants of the
//! build target, so every query here is a `const fn` and never fails.

use core::ffi::{c_char, c_double, c_int, c_long, c_longlong, c_short};
use core::fmt;
use core::mem::{align_of, size_of};

use libc::wchar_t;

/// Primitive C types the binding layer asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Short,
    Int,
    Long,
    WideChar,
    Char,
    LongLong,
    Double,
}

impl NativeType {
    /// Every tracked type, in declaration order.
    pub const ALL: [NativeType; 7] = [
        NativeType::Short,
        NativeType::Int,
        NativeType::Long,
        NativeType::WideChar,
        NativeType::Char,
        NativeType::LongLong,
        NativeType::Double,
    ];

    /// C spelling of the type.
    pub const fn c_name(self) -> &'static str {
        match self {
            NativeType::Short => "short",
            NativeType::Int => "int",
            NativeType::Long => "long",
            NativeType::WideChar => "wchar_t",
            NativeType::Char => "char",
            NativeType::LongLong => "long long",
            NativeType::Double => "double",
        }
    }

    /// Size in bytes on the build target.
    pub const fn size(self) -> usize {
        match self {
            NativeType::Short => size_of::<c_short>(),
            NativeType::Int => size_of::<c_int>(),
            NativeType::Long => size_of::<c_long>(),
            NativeType::WideChar => size_of::<wchar_t>(),
            NativeType::Char => size_of::<c_char>(),
            NativeType::LongLong => size_of::<c_longlong>(),
            NativeType::Double => size_of::<c_double>(),
        }
    }

    /// Alignment in bytes on the build target.
    pub const fn align(self) -> usize {
        match self {
            NativeType::Short => align_of::<c_short>(),
            NativeType::Int => align_of::<c_int>(),
            NativeType::Long => align_of::<c_long>(),
            NativeType::WideChar => align_of::<wchar_t>(),
            NativeType::Char => align_of::<c_char>(),
            NativeType::LongLong => align_of::<c_longlong>(),
            NativeType::Double => align_of::<c_double>(),
        }
    }

    /// Whether the type is an unsigned integer on the build target.
    ///
    /// Only `char` and `wchar_t` vary between targets; the others are fixed
    /// by the C standard (`double` is reported as signed).
    pub const fn is_unsigned(self) -> bool {
        match self {
            NativeType::WideChar => wchar_t::MIN == 0,
            NativeType::Char => c_char::MIN == 0,
            NativeType::Short
            | NativeType::Int
            | NativeType::Long
            | NativeType::LongLong
            | NativeType::Double => false,
        }
    }

    /// Full layout fact for this type.
    pub const fn fact(self) -> NativeTypeFact {
        NativeTypeFact {
            name: self.c_name(),
            size: self.size(),
            align: self.align(),
            unsigned: self.is_unsigned(),
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

/// Size, alignment and signedness of one primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeTypeFact {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
    pub unsigned: bool,
}

/// Facts for every tracked type.
pub fn facts() -> [NativeTypeFact; 7] {
    NativeType::ALL.map(NativeType::fact)
}

/// Size in bytes of `ty`.
pub const fn size_of_type(ty: NativeType) -> usize {
    ty.size()
}

/// Alignment in bytes of `ty`.
pub const fn align_of_type(ty: NativeType) -> usize {
    ty.align()
}

/// Whether `ty` is unsigned.
pub const fn is_unsigned(ty: NativeType) -> bool {
    ty.is_unsigned()
}

// The fixed query set consumed by the binding layer.

pub const fn sizeof_short() -> usize {
    NativeType::Short.size()
}

pub const fn sizeof_int() -> usize {
    NativeType::Int.size()
}

pub const fn sizeof_long() -> usize {
    NativeType::Long.size()
}

pub const fn sizeof_wchar() -> usize {
    NativeType::WideChar.size()
}

pub const fn signof_wchar() -> bool {
    NativeType::WideChar.is_unsigned()
}

pub const fn signof_char() -> bool {
    NativeType::Char.is_unsigned()
}

pub const fn alignof_long_long() -> usize {
    NativeType::LongLong.align()
}

pub const fn alignof_double() -> usize {
    NativeType::Double.align()
}

/// Snapshot of the fixed query set, as the binding layer caches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeTypeInfo {
    pub sizeof_short: usize,
    pub sizeof_int: usize,
    pub sizeof_long: usize,
    pub sizeof_wchar: usize,
    /// `true` when `wchar_t` is unsigned.
    pub signof_wchar: bool,
    /// `true` when plain `char` is unsigned.
    pub signof_char: bool,
    pub alignof_long_long: usize,
    pub alignof_double: usize,
}

impl NativeTypeInfo {
    pub const HOST: NativeTypeInfo = NativeTypeInfo {
        sizeof_short: sizeof_short(),
        sizeof_int: sizeof_int(),
        sizeof_long: sizeof_long(),
        sizeof_wchar: sizeof_wchar(),
        signof_wchar: signof_wchar(),
        signof_char: signof_char(),
        alignof_long_long: alignof_long_long(),
        alignof_double: alignof_double(),
    };

    pub const fn host() -> Self {
        Self::HOST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_and_alignments_are_powers_of_two() {
        for fact in facts() {
            assert!(fact.size.is_power_of_two(), "{} size {}", fact.name, fact.size);
            assert!(fact.align.is_power_of_two(), "{} align {}", fact.name, fact.align);
            assert!(fact.align <= fact.size, "{} over-aligned", fact.name);
        }
    }

    #[test]
    fn c_standard_minimums_hold() {
        assert_eq!(NativeType::Char.size(), 1);
        assert!(sizeof_short() >= 2);
        assert!(sizeof_int() >= sizeof_short());
        assert!(sizeof_long() >= sizeof_int());
        assert!(NativeType::LongLong.size() >= 8);
        assert!(sizeof_wchar() == 2 || sizeof_wchar() == 4);
    }

    #[test]
    fn double_alignment_is_four_or_eight() {
        assert!(matches!(alignof_double(), 4 | 8));
        assert!(matches!(alignof_long_long(), 4 | 8));
    }

    #[test]
    fn signedness_is_stable() {
        let first = (signof_wchar(), signof_char());
        for _ in 0..16 {
            assert_eq!((signof_wchar(), signof_char()), first);
        }
        assert!(!is_unsigned(NativeType::Int));
    }

    #[test]
    fn snapshot_matches_queries() {
        let info = NativeTypeInfo::host();
        assert_eq!(info.sizeof_long, size_of_type(NativeType::Long));
        assert_eq!(info.alignof_double, align_of_type(NativeType::Double));
        assert_eq!(info.signof_char, NativeType::Char.fact().unsigned);
        assert_eq!(NativeType::WideChar.to_string(), "wchar_t");
    }

    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    #[test]
    fn linux_x86_64_lp64_layout() {
        assert_eq!(sizeof_long(), 8);
        assert_eq!(sizeof_wchar(), 4);
        assert!(!signof_wchar());
        assert!(!signof_char());
    }
}
