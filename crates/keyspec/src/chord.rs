use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Key, Modifiers, Result, key::KEY_MASK};

/// A key chord: a modifier bit set plus a single key symbol.
///
/// Chords convert losslessly to and from a packed `u32` (`key | modifiers`),
/// which is the representation handed to the capture backend and used as the
/// grab-refcount table key.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Chord {
    /// The non-modifier key symbol, [`Key::NONE`] for modifier-only chords.
    pub key: Key,
    /// Modifiers held for this chord.
    pub mods: Modifiers,
}

impl Chord {
    /// A chord with no key and no modifiers.
    pub const EMPTY: Chord = Chord {
        key: Key::NONE,
        mods: Modifiers::NONE,
    };

    /// Creates a chord from a key and modifiers.
    pub fn new(key: Key, mods: Modifiers) -> Chord {
        Chord { key, mods }
    }

    /// A modifier-only chord.
    pub fn modifier_only(mods: Modifiers) -> Chord {
        Chord {
            key: Key::NONE,
            mods,
        }
    }

    /// The packed `u32` representation.
    pub fn packed(self) -> u32 {
        self.key.0 | self.mods.bits()
    }

    /// Reconstructs a chord from its packed representation.
    pub fn from_packed(packed: u32) -> Chord {
        Chord {
            key: Key(packed & KEY_MASK),
            mods: Modifiers::from_bits_truncate(packed),
        }
    }

    /// True for the all-zero chord.
    pub fn is_empty(self) -> bool {
        self.key == Key::NONE && self.mods.is_empty()
    }

    /// Parses a chord token of the form `Ctrl+Alt+M`.
    ///
    /// Components are separated by `+`; the last component is the key spec,
    /// every earlier component a modifier. Case-insensitive throughout.
    pub fn parse(s: &str) -> Result<Chord> {
        let mut parts: Vec<&str> = s.split('+').collect();
        // Two trailing separators mean the key itself is '+'.
        if parts.len() >= 2 && parts.last() == Some(&"") {
            parts.pop();
            match parts.last_mut() {
                Some(last) if last.is_empty() => *last = "+",
                _ => return Err(Error::EmptyChord),
            }
        }
        let key_raw = parts.pop().ok_or(Error::EmptyChord)?;
        let key = Key::from_spec(key_raw.trim())?;
        let mut mods = Modifiers::NONE;
        for part in parts {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                return Err(Error::EmptyChord);
            }
            mods = mods.union(Modifiers::from_spec(trimmed)?);
        }
        Ok(Chord { key, mods })
    }
}

impl fmt::Display for Chord {
    /// Canonical form: modifiers in canonical order, then the key name.
    /// Modifier-only chords print just the modifier names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key == Key::NONE {
            return write!(f, "{}", self.mods);
        }
        for name in self.mods.names() {
            write!(f, "{}+", name)?;
        }
        write!(f, "{}", self.key.name())
    }
}

impl fmt::Debug for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chord({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_chord() {
        let c = Chord::parse("Ctrl+Alt+M").unwrap();
        assert!(c.mods.contains(Modifiers::CONTROL));
        assert!(c.mods.contains(Modifiers::ALT));
        assert_eq!(c.key, Key('M' as u32));
        assert_eq!(c.to_string(), "Ctrl+Alt+M");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            Chord::parse("ctrl+p").unwrap(),
            Chord::parse("Ctrl+P").unwrap()
        );
    }

    #[test]
    fn plus_as_key() {
        let c = Chord::parse("Ctrl++").unwrap();
        assert_eq!(c.key, Key('+' as u32));
        assert_eq!(c.to_string(), "Ctrl++");
        assert_eq!(Chord::parse("+").unwrap().key, Key('+' as u32));
        // A dangling separator is not a chord.
        assert!(Chord::parse("Ctrl+").is_err());
        assert!(Chord::parse("a+").is_err());
    }

    #[test]
    fn packed_roundtrip() {
        for spec in ["Ctrl+P", "Meta+Shift+F10", "Tab", "Alt+Print"] {
            let c = Chord::parse(spec).unwrap();
            assert_eq!(Chord::from_packed(c.packed()), c, "{}", spec);
        }
    }

    #[test]
    fn display_reparse_roundtrip() {
        for spec in ["shift+alt+k", "CTRL+SPACE", "meta+1", "super+l"] {
            let c = Chord::parse(spec).unwrap();
            let printed = c.to_string();
            assert_eq!(Chord::parse(&printed).unwrap(), c, "{} => {}", spec, printed);
        }
    }

    #[test]
    fn modifier_only_display() {
        let c = Chord::modifier_only(Modifiers::CONTROL.union(Modifiers::SHIFT));
        assert_eq!(c.to_string(), "Ctrl+Shift");
    }
}
