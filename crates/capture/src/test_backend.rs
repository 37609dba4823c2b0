use std::{
    collections::HashSet,
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::trace;

use crate::backend::CaptureBackend;

/// One observed `grab` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabCall {
    /// The packed chord.
    pub chord: u32,
    /// `true` for grab, `false` for release.
    pub grab: bool,
}

#[derive(Default)]
struct State {
    grabbed: HashSet<u32>,
    history: Vec<GrabCall>,
    fail_chords: HashSet<u32>,
    enabled: bool,
    sync_calls: usize,
}

/// Recording capture backend for tests.
///
/// Clones share state, so a test can keep a handle while the registry owns
/// the boxed backend. Grab failures are injected per chord with
/// [`TestBackend::fail_chord`].
#[derive(Clone, Default)]
pub struct TestBackend {
    state: Arc<Mutex<State>>,
}

impl TestBackend {
    /// Creates a fresh backend with no grabs and no injected failures.
    pub fn new() -> TestBackend {
        TestBackend::default()
    }

    /// Makes every future grab of `chord` fail.
    pub fn fail_chord(&self, chord: u32) {
        self.state.lock().fail_chords.insert(chord);
    }

    /// The set of currently grabbed chords.
    pub fn grabbed(&self) -> HashSet<u32> {
        self.state.lock().grabbed.clone()
    }

    /// Every grab/release call observed, in order.
    pub fn history(&self) -> Vec<GrabCall> {
        self.state.lock().history.clone()
    }

    /// Whether delivery is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Number of `sync_windowing_system` calls observed.
    pub fn sync_calls(&self) -> usize {
        self.state.lock().sync_calls
    }

    /// True when every grab saw a matching release, in a valid order.
    pub fn grabs_balanced(&self) -> bool {
        let state = self.state.lock();
        let mut held: HashSet<u32> = HashSet::new();
        for call in &state.history {
            if call.grab {
                if !held.insert(call.chord) {
                    return false;
                }
            } else if !held.remove(&call.chord) {
                return false;
            }
        }
        held.is_empty()
    }
}

impl CaptureBackend for TestBackend {
    fn grab(&mut self, chord: u32, grab: bool) -> bool {
        let mut state = self.state.lock();
        if grab && state.fail_chords.contains(&chord) {
            trace!(chord = format_args!("{:#x}", chord), "injected grab failure");
            return false;
        }
        state.history.push(GrabCall { chord, grab });
        if grab {
            state.grabbed.insert(chord);
        } else {
            state.grabbed.remove(&chord);
        }
        true
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    fn sync_windowing_system(&mut self) {
        self.state.lock().sync_calls += 1;
    }

    fn name(&self) -> &'static str {
        "test"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_grab_history() {
        let backend = TestBackend::new();
        let mut boxed: Box<dyn CaptureBackend> = Box::new(backend.clone());
        assert!(boxed.grab(0x41, true));
        assert!(boxed.grab(0x41, false));
        assert!(backend.grabs_balanced());
        assert!(backend.grabbed().is_empty());
        assert_eq!(backend.history().len(), 2);
    }

    #[test]
    fn injected_failure_leaves_no_trace() {
        let backend = TestBackend::new();
        backend.fail_chord(0x42);
        let mut boxed: Box<dyn CaptureBackend> = Box::new(backend.clone());
        assert!(!boxed.grab(0x42, true));
        assert!(backend.history().is_empty());
    }

    #[test]
    fn unbalanced_release_is_detected() {
        let backend = TestBackend::new();
        let mut boxed: Box<dyn CaptureBackend> = Box::new(backend.clone());
        assert!(boxed.grab(0x41, false));
        assert!(!backend.grabs_balanced());
    }
}
