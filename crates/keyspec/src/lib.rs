//! Key chords and multi-stroke key sequences.
//!
//! A [`Chord`] is one simultaneous key-plus-modifiers event, packed into a
//! single `u32` so it can cross the capture-backend boundary as a plain
//! integer. A [`KeySequence`] is an ordered list of up to
//! [`MAX_SEQUENCE_LEN`] chords and is the unit of binding and dispatch.
//!
//! The crate also provides the sequence helpers the registry builds its
//! availability policy on: [`reverse`], [`crop`], [`contains`],
//! [`normalize`] and [`match_any`].
#![warn(missing_docs)]

mod chord;
mod error;
mod helpers;
mod key;
mod modifiers;
mod sequence;

pub use chord::Chord;
pub use error::{Error, Result};
pub use helpers::{contains, crop, key_to_modifier, match_any, normalize, normalize_chord, reverse};
pub use key::Key;
pub use modifiers::Modifiers;
pub use sequence::{KeySequence, MAX_SEQUENCE_LEN, format_list, parse_list};
