//! Platform key-capture contract.
//!
//! The registry talks to the windowing system exclusively through
//! [`CaptureBackend`]: requesting or releasing a system-wide grab of a single
//! packed chord, pausing all grabs, and flushing the windowing system after a
//! dispatch. Raw input travels the other way: the platform event loop feeds
//! press/release/pointer/axis events straight into the registry's callbacks.
//!
//! Grab discipline: the registry refcounts chords, so a backend sees at most
//! one `grab(chord, true)` and one matching `grab(chord, false)` across a
//! chord's grabbed lifetime.
#![warn(missing_docs)]

mod backend;
mod error;
mod test_backend;

pub use backend::{CaptureBackend, load_backend};
pub use error::{Error, Result};
pub use test_backend::{GrabCall, TestBackend};
