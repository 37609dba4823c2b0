use tracing::debug;

use crate::{Error, Result, test_backend::TestBackend};

/// Contract between the registry and a platform capture implementation.
///
/// Implementations translate their native key codes to packed chords
/// (including adding Shift to grabs of symbols that only exist shifted) and
/// re-register every grabbed chord through the registry when the keyboard
/// layout changes. Mapping-change notifications arrive in bursts; backends
/// coalesce them with a short single-shot timer (~20 ms) before running the
/// regrab pass.
pub trait CaptureBackend: Send {
    /// Establishes (`grab = true`) or releases an exclusive system-wide grab
    /// of a single packed chord. Returns `false` when the platform refuses
    /// the grab, e.g. because another process holds it.
    fn grab(&mut self, chord: u32, grab: bool) -> bool;

    /// Pauses or resumes event delivery. The registry releases every grab
    /// before asking for `enabled = false`.
    fn set_enabled(&mut self, enabled: bool);

    /// Best-effort flush-and-wait hook invoked after press dispatch so
    /// downstream focus grabs by the receiving client do not race.
    fn sync_windowing_system(&mut self) {}

    /// Short platform name, for logging.
    fn name(&self) -> &'static str;
}

/// Selects a capture backend for `platform`.
///
/// The daemon passes the `HOTKEYD_PLATFORM` override or the running session's
/// platform name. Only the in-process test backend is linked into this crate;
/// real windowing backends register under their platform name when compiled
/// in. An unmatched name yields [`Error::BackendUnavailable`], which the
/// registry latches: it keeps serving configuration and IPC but never grabs.
pub fn load_backend(platform: &str) -> Result<Box<dyn CaptureBackend>> {
    match platform.to_ascii_lowercase().as_str() {
        "test" => {
            debug!("loaded test capture backend");
            Ok(Box::new(TestBackend::new()))
        }
        other => Err(Error::BackendUnavailable(other.to_string())),
    }
}
