//! Error types and result alias for the registry crate.
use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the shortcut registry.
#[derive(Debug, Error)]
pub enum Error {
    /// No capture backend matched the platform; the registry latches this
    /// state and keeps serving configuration and IPC without grabbing.
    #[error(transparent)]
    Capture(#[from] capture::Error),

    /// The backend refused a specific chord, typically because another
    /// process already grabbed it. Recovered locally by rolling back.
    #[error("backend rejected grab of {chord}")]
    GrabRejected {
        /// Human-readable chord token.
        chord: String,
    },

    /// A component with the same unique name already exists.
    #[error("component {0:?} is already registered")]
    DuplicateRegistration(String),

    /// The sequence is already active elsewhere. The admission check returns
    /// this as plain unavailability; the variant exists for IPC reporting.
    #[error("shortcut {sequence} conflicts with an existing binding")]
    ConflictingShortcut {
        /// The denied sequence in token form.
        sequence: String,
    },

    /// An unparseable configuration entry. Load skips the entry and warns.
    #[error("malformed config entry {entry:?}: {message}")]
    MalformedConfig {
        /// The entry key.
        entry: String,
        /// What failed to parse.
        message: String,
    },

    /// A service component refers to a desktop entry that cannot be located.
    #[error("desktop entry {0:?} not found")]
    MissingDesktopEntry(String),

    /// A component or action referenced over IPC does not exist.
    #[error("unknown component or action: {0}")]
    UnknownAction(String),

    /// Key token parse failure.
    #[error(transparent)]
    Keys(#[from] keyspec::Error),

    /// Configuration store failure.
    #[error(transparent)]
    Config(#[from] cfgtree::Error),

    /// I/O failure while scanning desktop entries or writing migrations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A desktop entry could not be launched.
    #[error("launch failed: {0}")]
    Launch(String),
}
