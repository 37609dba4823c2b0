use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A key symbol, confined to the low 25 bits of a packed chord.
///
/// Printable ASCII keys use their uppercase scalar value; named keys live in
/// a reserved block above `0x0100_0000`, below the modifier bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(pub u32);

/// Bit mask covering the key-symbol portion of a packed chord.
pub const KEY_MASK: u32 = 0x01ff_ffff;

const NAMED: u32 = 0x0100_0000;

impl Key {
    /// The null key. A chord whose key is `NONE` carries only modifiers.
    pub const NONE: Key = Key(0);

    /// Escape.
    pub const ESCAPE: Key = Key(NAMED);
    /// Tab.
    pub const TAB: Key = Key(NAMED | 0x01);
    /// Shift+Tab as reported by some platforms; normalization folds it to Tab.
    pub const BACKTAB: Key = Key(NAMED | 0x02);
    /// Backspace.
    pub const BACKSPACE: Key = Key(NAMED | 0x03);
    /// Return.
    pub const RETURN: Key = Key(NAMED | 0x04);
    /// Keypad Enter.
    pub const ENTER: Key = Key(NAMED | 0x05);
    /// Insert.
    pub const INSERT: Key = Key(NAMED | 0x06);
    /// Delete.
    pub const DELETE: Key = Key(NAMED | 0x07);
    /// Pause.
    pub const PAUSE: Key = Key(NAMED | 0x08);
    /// Print Screen.
    pub const PRINT: Key = Key(NAMED | 0x09);
    /// SysReq; folded to Alt+Print by event correction.
    pub const SYSREQ: Key = Key(NAMED | 0x0a);
    /// Home.
    pub const HOME: Key = Key(NAMED | 0x10);
    /// End.
    pub const END: Key = Key(NAMED | 0x11);
    /// Left arrow.
    pub const LEFT: Key = Key(NAMED | 0x12);
    /// Up arrow.
    pub const UP: Key = Key(NAMED | 0x13);
    /// Right arrow.
    pub const RIGHT: Key = Key(NAMED | 0x14);
    /// Down arrow.
    pub const DOWN: Key = Key(NAMED | 0x15);
    /// Page Up.
    pub const PAGE_UP: Key = Key(NAMED | 0x16);
    /// Page Down.
    pub const PAGE_DOWN: Key = Key(NAMED | 0x17);

    /// Shift pressed as a key of its own.
    pub const SHIFT_KEY: Key = Key(NAMED | 0x20);
    /// Control pressed as a key of its own.
    pub const CONTROL_KEY: Key = Key(NAMED | 0x21);
    /// Meta pressed as a key of its own.
    pub const META_KEY: Key = Key(NAMED | 0x22);
    /// Alt pressed as a key of its own.
    pub const ALT_KEY: Key = Key(NAMED | 0x23);
    /// Caps Lock.
    pub const CAPS_LOCK: Key = Key(NAMED | 0x24);
    /// Num Lock.
    pub const NUM_LOCK: Key = Key(NAMED | 0x25);
    /// Scroll Lock.
    pub const SCROLL_LOCK: Key = Key(NAMED | 0x26);

    /// F1. F2..F35 follow contiguously.
    pub const F1: Key = Key(NAMED | 0x30);
    /// Left Super/Windows key; event correction folds it to Meta.
    pub const SUPER_L: Key = Key(NAMED | 0x53);
    /// Right Super/Windows key; event correction folds it to Meta.
    pub const SUPER_R: Key = Key(NAMED | 0x54);
    /// Menu.
    pub const MENU: Key = Key(NAMED | 0x55);
    /// Space.
    pub const SPACE: Key = Key(0x20);

    /// The function key `F<n>` for `n` in `1..=35`.
    pub fn function(n: u32) -> Option<Key> {
        if (1..=35).contains(&n) {
            Some(Key(Self::F1.0 + n - 1))
        } else {
            None
        }
    }

    /// True when this key is one of the modifier keys pressed as a symbol
    /// (Shift, Control, Alt, Meta, Super_L, Super_R).
    pub fn is_modifier_key(self) -> bool {
        matches!(
            self,
            Key::SHIFT_KEY
                | Key::CONTROL_KEY
                | Key::META_KEY
                | Key::ALT_KEY
                | Key::SUPER_L
                | Key::SUPER_R
        )
    }

    /// Parses a key spec: a named key (case-insensitive), `F<n>`, or a single
    /// printable character.
    pub fn from_spec(s: &str) -> Result<Key> {
        if s.is_empty() {
            return Err(Error::EmptyChord);
        }
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c == ' ' || c.is_ascii_graphic() {
                return Ok(Key(c.to_ascii_uppercase() as u32));
            }
        }
        let lower = s.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix('f') {
            if let Ok(n) = rest.parse::<u32>() {
                if let Some(k) = Key::function(n) {
                    return Ok(k);
                }
            }
        }
        for (key, name) in NAMES {
            if lower == name.to_ascii_lowercase() {
                return Ok(*key);
            }
        }
        for (key, alias) in ALIASES {
            if lower == *alias {
                return Ok(*key);
            }
        }
        Err(Error::UnknownKey(s.to_string()))
    }

    /// The canonical spec name for this key, used by chord formatting.
    pub fn name(self) -> String {
        if self.0 >= Self::F1.0 && self.0 < Self::F1.0 + 35 {
            return format!("F{}", self.0 - Self::F1.0 + 1);
        }
        for (key, name) in NAMES {
            if *key == self {
                return (*name).to_string();
            }
        }
        match char::from_u32(self.0) {
            Some(c) if c == ' ' => "Space".to_string(),
            Some(c) if c.is_ascii_graphic() => c.to_string(),
            _ => format!("0x{:x}", self.0),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Canonical names, first match wins when formatting.
const NAMES: &[(Key, &str)] = &[
    (Key::ESCAPE, "Esc"),
    (Key::TAB, "Tab"),
    (Key::BACKTAB, "Backtab"),
    (Key::BACKSPACE, "Backspace"),
    (Key::RETURN, "Return"),
    (Key::ENTER, "Enter"),
    (Key::INSERT, "Ins"),
    (Key::DELETE, "Del"),
    (Key::PAUSE, "Pause"),
    (Key::PRINT, "Print"),
    (Key::SYSREQ, "SysReq"),
    (Key::HOME, "Home"),
    (Key::END, "End"),
    (Key::LEFT, "Left"),
    (Key::UP, "Up"),
    (Key::RIGHT, "Right"),
    (Key::DOWN, "Down"),
    (Key::PAGE_UP, "PgUp"),
    (Key::PAGE_DOWN, "PgDown"),
    (Key::SHIFT_KEY, "Shift"),
    (Key::CONTROL_KEY, "Ctrl"),
    (Key::META_KEY, "Meta"),
    (Key::ALT_KEY, "Alt"),
    (Key::CAPS_LOCK, "CapsLock"),
    (Key::NUM_LOCK, "NumLock"),
    (Key::SCROLL_LOCK, "ScrollLock"),
    (Key::SUPER_L, "Super_L"),
    (Key::SUPER_R, "Super_R"),
    (Key::MENU, "Menu"),
    (Key::SPACE, "Space"),
];

/// Accepted aliases (lowercase) in addition to canonical names.
const ALIASES: &[(Key, &str)] = &[
    (Key::ESCAPE, "escape"),
    (Key::INSERT, "insert"),
    (Key::DELETE, "delete"),
    (Key::PAGE_UP, "pageup"),
    (Key::PAGE_DOWN, "pagedown"),
    (Key::CONTROL_KEY, "control"),
    (Key::META_KEY, "super"),
    (Key::META_KEY, "win"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_keys_uppercase() {
        assert_eq!(Key::from_spec("a").unwrap(), Key('A' as u32));
        assert_eq!(Key::from_spec("A").unwrap(), Key('A' as u32));
        assert_eq!(Key::from_spec("7").unwrap(), Key('7' as u32));
        assert_eq!(Key::from_spec(",").unwrap(), Key(',' as u32));
    }

    #[test]
    fn named_keys_case_insensitive() {
        assert_eq!(Key::from_spec("tab").unwrap(), Key::TAB);
        assert_eq!(Key::from_spec("PgUp").unwrap(), Key::PAGE_UP);
        assert_eq!(Key::from_spec("pageup").unwrap(), Key::PAGE_UP);
        assert_eq!(Key::from_spec("super_l").unwrap(), Key::SUPER_L);
    }

    #[test]
    fn function_keys() {
        assert_eq!(Key::from_spec("F1").unwrap(), Key::F1);
        assert_eq!(Key::from_spec("f12").unwrap().name(), "F12");
        assert!(Key::from_spec("F36").is_err());
        assert!(Key::function(0).is_none());
    }

    #[test]
    fn name_roundtrip() {
        for spec in ["Tab", "SysReq", "Print", "F5", "Space", "Meta", "K"] {
            let k = Key::from_spec(spec).unwrap();
            assert_eq!(Key::from_spec(&k.name()).unwrap(), k, "{}", spec);
        }
    }
}
