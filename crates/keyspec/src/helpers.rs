//! Sequence helpers backing the recognizer and the availability policy.

use crate::{Chord, Key, KeySequence, Modifiers};

/// A new sequence with the chord order reversed.
pub fn reverse(seq: &KeySequence) -> KeySequence {
    seq.chords().iter().rev().copied().collect()
}

/// Drops the first `count` chords; empty when `count >= len`.
/// `count == 0` returns the sequence unchanged.
pub fn crop(seq: &KeySequence, count: usize) -> KeySequence {
    if count == 0 {
        return seq.clone();
    }
    if seq.len() < count {
        return KeySequence::empty();
    }
    seq.chords()[count..].iter().copied().collect()
}

/// True when `a` is a proper prefix of `b`.
fn is_proper_prefix(a: &KeySequence, b: &KeySequence) -> bool {
    a.len() < b.len() && a.chords() == &b.chords()[..a.len()]
}

/// True when `key` occurs as a contiguous, strictly shorter sub-sequence of
/// `other`, checked in both forward and reverse chord order so sequences
/// that shadow from either end are detected.
pub fn contains(key: &KeySequence, other: &KeySequence) -> bool {
    let min_len = key.len().min(other.len());
    if min_len == 0 {
        // There's an empty sequence, assume it matches nothing.
        return false;
    }
    for i in 0..=(other.len() - min_len) {
        let cropped = crop(other, i);
        if is_proper_prefix(key, &cropped)
            || is_proper_prefix(&reverse(key), &reverse(&cropped))
        {
            return true;
        }
    }
    false
}

/// The modifier a modifier key contributes when pressed as a symbol.
/// Super_L/Super_R are treated as Meta.
pub fn key_to_modifier(key: Key) -> Modifiers {
    match key {
        Key::SHIFT_KEY => Modifiers::SHIFT,
        Key::CONTROL_KEY => Modifiers::CONTROL,
        Key::ALT_KEY => Modifiers::ALT,
        Key::META_KEY | Key::SUPER_L | Key::SUPER_R => Modifiers::META,
        _ => Modifiers::NONE,
    }
}

/// Normalizes one chord:
/// - a modifier key pressed as the key symbol collapses to the corresponding
///   modifier bit only;
/// - Shift+Backtab rewrites to Shift+Tab.
pub fn normalize_chord(chord: Chord) -> Chord {
    if chord.mods.contains(Modifiers::SHIFT)
        && (chord.key == Key::BACKTAB || chord.key == Key::TAB)
    {
        return Chord::new(Key::TAB, chord.mods);
    }
    let as_modifier = key_to_modifier(chord.key);
    if !as_modifier.is_empty() {
        return Chord::modifier_only(chord.mods.union(as_modifier));
    }
    chord
}

/// Normalizes every chord of a sequence. Idempotent.
pub fn normalize(seq: &KeySequence) -> KeySequence {
    seq.chords().iter().map(|c| normalize_chord(*c)).collect()
}

/// True when `key` exactly equals, contains, or is contained by any
/// non-empty sequence in `list`. This is the sole predicate the
/// availability check is built on.
///
/// With `Alt+B,Alt+F,Alt+G` assigned, all of these are denied: the exact
/// sequence, a shadowing prefix (`Alt+B,Alt+F`), a shadowed extension
/// (`Alt+B,Alt+F,Alt+G,<any>`), a suffix (`Alt+F,Alt+G`), and a shadowed
/// prefix-extension (`<any>,Alt+B,Alt+F,Alt+G`).
pub fn match_any(key: &KeySequence, list: &[KeySequence]) -> bool {
    list.iter().any(|other| {
        !other.is_empty() && (key == other || contains(key, other) || contains(other, key))
    })
}
