//! Resolution, range and formatting flags, plus range padding policies.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::field::TimeUnit;

/// Orthogonal bit flags steering resolution, range arithmetic and output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);

    /// Pick the occurrence at or before the reference.
    pub const RESOLVE_TO_PAST: Flags = Flags(1 << 0);
    /// Pick the occurrence at or after the reference.
    pub const RESOLVE_TO_FUTURE: Flags = Flags(1 << 1);
    /// Pick whichever occurrence is nearest the reference.
    pub const RESOLVE_TO_CLOSEST: Flags = Flags(1 << 2);
    /// Pick the occurrence containing the reference.
    pub const RESOLVE_TO_THIS: Flags = Flags(1 << 3);

    /// Anchor a bare duration so that it ends at the reference.
    pub const DUR_RESOLVE_TO_AS_REF: Flags = Flags(1 << 4);
    /// Anchor a bare duration so that it starts at the reference.
    pub const DUR_RESOLVE_FROM_AS_REF: Flags = Flags(1 << 5);

    /// Ground range endpoints that are the reference sentinel.
    pub const RANGE_RESOLVE_TIME_REF: Flags = Flags(1 << 6);
    pub const RANGE_OFFSET_BEGIN: Flags = Flags(1 << 7);
    pub const RANGE_OFFSET_END: Flags = Flags(1 << 8);
    pub const RANGE_EXPAND_FIX_BEGIN: Flags = Flags(1 << 9);
    pub const RANGE_EXPAND_FIX_END: Flags = Flags(1 << 10);

    pub const FORMAT_ISO: Flags = Flags(1 << 11);
    pub const FORMAT_TIMEX3_VALUE: Flags = Flags(1 << 12);
    pub const FORMAT_FULL: Flags = Flags(1 << 13);
    pub const FORMAT_PAD_UNKNOWN: Flags = Flags(1 << 14);

    /// The four `RESOLVE_TO_*` bits.
    pub const RESOLVE_TO_MASK: Flags = Flags(0b1111);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Flags {
        Flags(bits)
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    pub const fn without(self, other: Flags) -> Flags {
        Flags(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        self.union(rhs)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Flags, &str); 15] = [
            (Flags::RESOLVE_TO_PAST, "RESOLVE_TO_PAST"),
            (Flags::RESOLVE_TO_FUTURE, "RESOLVE_TO_FUTURE"),
            (Flags::RESOLVE_TO_CLOSEST, "RESOLVE_TO_CLOSEST"),
            (Flags::RESOLVE_TO_THIS, "RESOLVE_TO_THIS"),
            (Flags::DUR_RESOLVE_TO_AS_REF, "DUR_RESOLVE_TO_AS_REF"),
            (Flags::DUR_RESOLVE_FROM_AS_REF, "DUR_RESOLVE_FROM_AS_REF"),
            (Flags::RANGE_RESOLVE_TIME_REF, "RANGE_RESOLVE_TIME_REF"),
            (Flags::RANGE_OFFSET_BEGIN, "RANGE_OFFSET_BEGIN"),
            (Flags::RANGE_OFFSET_END, "RANGE_OFFSET_END"),
            (Flags::RANGE_EXPAND_FIX_BEGIN, "RANGE_EXPAND_FIX_BEGIN"),
            (Flags::RANGE_EXPAND_FIX_END, "RANGE_EXPAND_FIX_END"),
            (Flags::FORMAT_ISO, "FORMAT_ISO"),
            (Flags::FORMAT_TIMEX3_VALUE, "FORMAT_TIMEX3_VALUE"),
            (Flags::FORMAT_FULL, "FORMAT_FULL"),
            (Flags::FORMAT_PAD_UNKNOWN, "FORMAT_PAD_UNKNOWN"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// How far a time is padded when turned into a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RangePadding {
    /// The instant only.
    None,
    /// Milliseconds if any time-of-day field is set, days otherwise.
    #[default]
    Auto,
    /// Always milliseconds.
    Finest,
    /// A caller-chosen unit.
    Specified(TimeUnit),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_orthogonal() {
        let f = Flags::RESOLVE_TO_PAST | Flags::RANGE_RESOLVE_TIME_REF;
        assert!(f.contains(Flags::RESOLVE_TO_PAST));
        assert!(!f.contains(Flags::RESOLVE_TO_FUTURE));
        assert!(f.intersects(Flags::RESOLVE_TO_MASK));
        assert!(!f.without(Flags::RESOLVE_TO_MASK).intersects(Flags::RESOLVE_TO_MASK));
    }

    #[test]
    fn test_display_lists_names() {
        let f = Flags::RESOLVE_TO_FUTURE | Flags::FORMAT_PAD_UNKNOWN;
        assert_eq!(f.to_string(), "RESOLVE_TO_FUTURE|FORMAT_PAD_UNKNOWN");
        assert_eq!(Flags::NONE.to_string(), "NONE");
    }
}
