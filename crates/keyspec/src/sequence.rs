use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Chord, Error, Result};

/// Maximum number of chords in a sequence.
pub const MAX_SEQUENCE_LEN: usize = 4;

/// An ordered sequence of 1 to [`MAX_SEQUENCE_LEN`] chords.
///
/// The empty sequence is a distinct value meaning "unbound".
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySequence(Vec<Chord>);

impl KeySequence {
    /// The empty ("unbound") sequence.
    pub fn empty() -> KeySequence {
        KeySequence(Vec::new())
    }

    /// Builds a sequence from chords, rejecting over-long inputs.
    pub fn from_chords(chords: Vec<Chord>) -> Result<KeySequence> {
        if chords.len() > MAX_SEQUENCE_LEN {
            return Err(Error::SequenceTooLong(chords.len()));
        }
        Ok(KeySequence(chords))
    }

    /// A single-chord sequence.
    pub fn single(chord: Chord) -> KeySequence {
        KeySequence(vec![chord])
    }

    /// Number of chords.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the unbound sequence.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The chords in order.
    pub fn chords(&self) -> &[Chord] {
        &self.0
    }

    /// Appends a chord, rotating out the oldest when the buffer is full.
    /// This is the rolling-buffer primitive the input recognizer uses.
    pub fn push_rotating(&mut self, chord: Chord) {
        if self.0.len() == MAX_SEQUENCE_LEN {
            self.0.remove(0);
        }
        self.0.push(chord);
    }

    /// The tail of the last `len` chords; `None` when shorter than `len`.
    pub fn tail(&self, len: usize) -> Option<KeySequence> {
        if len == 0 || len > self.0.len() {
            return None;
        }
        Some(KeySequence(self.0[self.0.len() - len..].to_vec()))
    }

    /// Clears the sequence back to unbound.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Parses a sequence token: chords joined by `,`, e.g. `Ctrl+K,Ctrl+L`.
    /// The empty string and the literal `none` parse to the empty sequence.
    pub fn parse(s: &str) -> Result<KeySequence> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(KeySequence::empty());
        }
        let mut chords = Vec::new();
        for token in trimmed.split(',') {
            chords.push(Chord::parse(token.trim())?);
        }
        KeySequence::from_chords(chords)
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for chord in &self.0 {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", chord)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "KeySequence(none)")
        } else {
            write!(f, "KeySequence({})", self)
        }
    }
}

impl FromIterator<Chord> for KeySequence {
    /// Collects at most [`MAX_SEQUENCE_LEN`] chords; the rest are dropped.
    fn from_iter<T: IntoIterator<Item = Chord>>(iter: T) -> Self {
        KeySequence(iter.into_iter().take(MAX_SEQUENCE_LEN).collect())
    }
}

/// Formats a list of sequences for persistence: sequences joined by `;`,
/// the empty list (or a list of only-empty sequences) as the literal `none`.
pub fn format_list(list: &[KeySequence]) -> String {
    let parts: Vec<String> = list
        .iter()
        .filter(|seq| !seq.is_empty())
        .map(|seq| seq.to_string())
        .collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(";")
    }
}

/// Parses a persisted sequence list. The literal `none` (or an empty string)
/// is the empty list; malformed tokens produce an error.
pub fn parse_list(s: &str) -> Result<Vec<KeySequence>> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }
    trimmed
        .split(';')
        .filter(|token| !token.trim().is_empty())
        .map(KeySequence::parse)
        .collect()
}
