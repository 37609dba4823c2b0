use keyspec::KeySequence;

/// One (action, current keys, default keys) record owned by a context.
///
/// Key mutations go through the registry so grab refcounts and the dispatch
/// index stay consistent; this type only holds state.
#[derive(Debug, Clone)]
pub struct Shortcut {
    unique_name: String,
    friendly_name: String,
    keys: Vec<KeySequence>,
    default_keys: Vec<KeySequence>,
    is_present: bool,
    is_fresh: bool,
    is_session: bool,
}

impl Shortcut {
    /// Creates a fresh, unbound, absent shortcut.
    pub fn new(unique_name: impl Into<String>, friendly_name: impl Into<String>) -> Shortcut {
        Shortcut {
            unique_name: unique_name.into(),
            friendly_name: friendly_name.into(),
            keys: Vec::new(),
            default_keys: Vec::new(),
            is_present: false,
            is_fresh: true,
            is_session: false,
        }
    }

    /// Stable identifier, unique within the owning context.
    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// Presentation name.
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Updates the presentation name.
    pub fn set_friendly_name(&mut self, name: impl Into<String>) {
        self.friendly_name = name.into();
    }

    /// Current bindings; may be empty meaning "bound to nothing".
    pub fn keys(&self) -> &[KeySequence] {
        &self.keys
    }

    /// Factory default bindings.
    pub fn default_keys(&self) -> &[KeySequence] {
        &self.default_keys
    }

    /// Replaces the defaults. Does not touch current keys.
    pub fn set_default_keys(&mut self, keys: Vec<KeySequence>) {
        self.default_keys = keys;
    }

    /// Whether the owning client is currently connected (or, for a service
    /// component, the backing desktop entry exists).
    pub fn is_present(&self) -> bool {
        self.is_present
    }

    /// True until the first time the keys are explicitly set. Fresh
    /// shortcuts are never persisted.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh
    }

    /// Session shortcuts are never persisted.
    pub fn is_session_shortcut(&self) -> bool {
        self.is_session
    }

    /// Marks this shortcut session-only.
    pub fn set_session_shortcut(&mut self, session: bool) {
        self.is_session = session;
    }

    /// Active shortcuts participate in grabs and dispatch.
    pub fn is_active(&self) -> bool {
        self.is_present && self.keys.iter().any(|seq| !seq.is_empty())
    }

    /// The non-empty current sequences.
    pub fn active_sequences(&self) -> impl Iterator<Item = &KeySequence> {
        self.keys.iter().filter(|seq| !seq.is_empty())
    }

    pub(crate) fn set_present_flag(&mut self, present: bool) {
        self.is_present = present;
    }

    pub(crate) fn commit_keys(&mut self, keys: Vec<KeySequence>) {
        self.keys = keys;
        self.is_fresh = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_shortcut_is_inactive() {
        let s = Shortcut::new("save", "Save");
        assert!(s.is_fresh());
        assert!(!s.is_present());
        assert!(!s.is_active());
        assert!(s.keys().is_empty());
    }

    #[test]
    fn active_needs_presence_and_keys() {
        let mut s = Shortcut::new("save", "Save");
        s.set_present_flag(true);
        assert!(!s.is_active(), "no keys yet");
        s.commit_keys(vec![KeySequence::parse("Ctrl+S").unwrap()]);
        assert!(s.is_active());
        assert!(!s.is_fresh());
        s.commit_keys(vec![KeySequence::empty()]);
        assert!(!s.is_active(), "only empty sequences");
    }
}
