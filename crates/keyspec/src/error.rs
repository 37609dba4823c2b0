//! Error types and result alias for the keyspec crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced when parsing key tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A chord token was empty or consisted only of separators.
    #[error("empty chord token")]
    EmptyChord,
    /// The key part of a chord did not name a known key.
    #[error("unknown key: {0:?}")]
    UnknownKey(String),
    /// A modifier part of a chord did not name a known modifier.
    #[error("unknown modifier: {0:?}")]
    UnknownModifier(String),
    /// A sequence had more chords than [`crate::MAX_SEQUENCE_LEN`].
    #[error("sequence has {0} chords, maximum is {max}", max = crate::MAX_SEQUENCE_LEN)]
    SequenceTooLong(usize),
}
