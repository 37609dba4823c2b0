//! Error types and result alias for the capture crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// No capture backend matched the requested platform name.
    #[error("no capture backend available for platform {0:?}")]
    BackendUnavailable(String),
}
