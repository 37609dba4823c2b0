//! Error types and result alias for the daemon shell.
use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced by the daemon shell.
#[derive(Debug, Error)]
pub enum Error {
    /// Another daemon instance already owns the control socket.
    #[error("another hotkeyd instance is already running")]
    AlreadyRunning,

    /// Control-bus failure (bind, listen, transport).
    #[error("IPC error: {0}")]
    Ipc(String),

    /// Registry failure during startup or shutdown.
    #[error(transparent)]
    Registry(#[from] hotkeyd_registry::Error),

    /// Configuration store failure.
    #[error(transparent)]
    Config(#[from] cfgtree::Error),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
