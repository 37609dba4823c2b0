use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A bit set of keyboard modifiers, occupying the high bits of a packed
/// chord so that `key | modifiers` is the packed representation.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(pub u32);

impl Modifiers {
    /// No modifiers.
    pub const NONE: Modifiers = Modifiers(0);
    /// Shift.
    pub const SHIFT: Modifiers = Modifiers(0x0200_0000);
    /// Control.
    pub const CONTROL: Modifiers = Modifiers(0x0400_0000);
    /// Alt.
    pub const ALT: Modifiers = Modifiers(0x0800_0000);
    /// Meta (Super/Windows).
    pub const META: Modifiers = Modifiers(0x1000_0000);
    /// Mask covering every modifier bit.
    pub const ALL: Modifiers = Modifiers(0x1e00_0000);

    /// Raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Keeps only valid modifier bits of `bits`.
    pub fn from_bits_truncate(bits: u32) -> Modifiers {
        Modifiers(bits & Self::ALL.0)
    }

    /// True when no modifier bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`.
    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of the two sets.
    pub fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// `self` without the bits of `other`.
    pub fn difference(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 & !other.0)
    }

    /// Parses a single modifier name, case-insensitive.
    pub fn from_spec(s: &str) -> Result<Modifiers> {
        match s.to_ascii_lowercase().as_str() {
            "shift" => Ok(Self::SHIFT),
            "ctrl" | "control" => Ok(Self::CONTROL),
            "alt" => Ok(Self::ALT),
            "meta" | "super" | "win" => Ok(Self::META),
            _ => Err(Error::UnknownModifier(s.to_string())),
        }
    }

    /// Canonical names in canonical order (Meta, Ctrl, Alt, Shift).
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        [
            (Self::META, "Meta"),
            (Self::CONTROL, "Ctrl"),
            (Self::ALT, "Alt"),
            (Self::SHIFT, "Shift"),
        ]
        .into_iter()
        .filter(move |(m, _)| self.contains(*m))
        .map(|(_, n)| n)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for name in self.names() {
            if !first {
                write!(f, "+")?;
            }
            write!(f, "{}", name)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers({})", self)
    }
}
