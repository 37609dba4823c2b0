use keyspec::{KeySequence, contains, match_any};

use crate::{shortcut::Shortcut, slab::Slab};

/// Lookup policy for key-based shortcut queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Exact sequence match against a shortcut's current keys.
    Equal,
    /// The queried sequence contains a shortcut's sequence.
    Shadowed,
    /// A shortcut's sequence contains the queried sequence.
    Shadows,
}

/// A named bucket of shortcuts inside a component.
///
/// Every component has a mandatory `default` context; extra contexts are
/// optional sub-namespaces with mutually exclusive bindings.
#[derive(Debug, Clone)]
pub struct Context {
    unique_name: String,
    friendly_name: String,
    shortcuts: Slab<Shortcut>,
}

/// Name of the context every component starts with.
pub const DEFAULT_CONTEXT: &str = "default";

impl Context {
    /// Creates an empty context.
    pub fn new(unique_name: impl Into<String>, friendly_name: impl Into<String>) -> Context {
        Context {
            unique_name: unique_name.into(),
            friendly_name: friendly_name.into(),
            shortcuts: Slab::new(),
        }
    }

    /// The context name, unique within its component.
    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// Presentation name, may be empty.
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Updates the presentation name.
    pub fn set_friendly_name(&mut self, name: impl Into<String>) {
        self.friendly_name = name.into();
    }

    /// Index of the shortcut with the given action name.
    pub fn shortcut_id(&self, unique_name: &str) -> Option<usize> {
        self.shortcuts
            .iter()
            .find(|(_, s)| s.unique_name() == unique_name)
            .map(|(id, _)| id)
    }

    /// Borrow a shortcut by index.
    pub fn shortcut(&self, id: usize) -> Option<&Shortcut> {
        self.shortcuts.get(id)
    }

    /// Mutable borrow of a shortcut by index.
    pub fn shortcut_mut(&mut self, id: usize) -> Option<&mut Shortcut> {
        self.shortcuts.get_mut(id)
    }

    /// Adds a shortcut; the caller has checked name uniqueness.
    pub fn add_shortcut(&mut self, shortcut: Shortcut) -> usize {
        debug_assert!(self.shortcut_id(shortcut.unique_name()).is_none());
        self.shortcuts.insert(shortcut)
    }

    /// Removes a shortcut, returning it.
    pub fn remove_shortcut(&mut self, id: usize) -> Option<Shortcut> {
        self.shortcuts.remove(id)
    }

    /// Shortcuts in insertion order.
    pub fn shortcuts(&self) -> impl Iterator<Item = (usize, &Shortcut)> {
        self.shortcuts.iter()
    }

    /// True when the context owns no shortcuts.
    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }

    /// First shortcut whose current keys relate to `seq` under `policy`.
    pub fn shortcut_by_key(&self, seq: &KeySequence, policy: MatchType) -> Option<usize> {
        self.shortcuts
            .iter()
            .find(|(_, shortcut)| {
                shortcut.keys().iter().any(|key| match policy {
                    MatchType::Equal => key == seq,
                    MatchType::Shadowed => contains(key, seq),
                    MatchType::Shadows => contains(seq, key),
                })
            })
            .map(|(id, _)| id)
    }

    /// Every shortcut matching `seq` under `policy`, in insertion order.
    pub fn shortcuts_by_key(&self, seq: &KeySequence, policy: MatchType) -> Vec<usize> {
        self.shortcuts
            .iter()
            .filter(|(_, shortcut)| {
                shortcut.keys().iter().any(|key| match policy {
                    MatchType::Equal => key == seq,
                    MatchType::Shadowed => contains(key, seq),
                    MatchType::Shadows => contains(seq, key),
                })
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// True unless some shortcut in this context overlaps `seq`.
    pub fn is_shortcut_available(&self, seq: &KeySequence) -> bool {
        !self
            .shortcuts
            .iter()
            .any(|(_, shortcut)| match_any(seq, shortcut.keys()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(s: &str) -> KeySequence {
        KeySequence::parse(s).unwrap()
    }

    fn context_with(bindings: &[(&str, &str)]) -> Context {
        let mut ctx = Context::new(DEFAULT_CONTEXT, "");
        for (name, keys) in bindings {
            let mut s = Shortcut::new(*name, *name);
            s.commit_keys(vec![seq(keys)]);
            ctx.add_shortcut(s);
        }
        ctx
    }

    #[test]
    fn equal_match_finds_exact_binding() {
        let ctx = context_with(&[("one", "Ctrl+X"), ("two", "Ctrl+K,Ctrl+L")]);
        let id = ctx.shortcut_by_key(&seq("Ctrl+K,Ctrl+L"), MatchType::Equal).unwrap();
        assert_eq!(ctx.shortcut(id).unwrap().unique_name(), "two");
        assert!(ctx.shortcut_by_key(&seq("Ctrl+K"), MatchType::Equal).is_none());
    }

    #[test]
    fn shadow_matches() {
        let ctx = context_with(&[("two", "Ctrl+K,Ctrl+L")]);
        // The argument Ctrl+K is contained by the stored sequence.
        assert!(ctx.shortcut_by_key(&seq("Ctrl+K"), MatchType::Shadows).is_some());
        // A longer argument contains the stored sequence.
        assert!(
            ctx.shortcut_by_key(&seq("Ctrl+K,Ctrl+L,Ctrl+M"), MatchType::Shadowed)
                .is_some()
        );
    }

    #[test]
    fn availability_uses_overlap() {
        let ctx = context_with(&[("two", "Ctrl+K,Ctrl+L")]);
        assert!(!ctx.is_shortcut_available(&seq("Ctrl+K")));
        assert!(!ctx.is_shortcut_available(&seq("Ctrl+K,Ctrl+L")));
        assert!(ctx.is_shortcut_available(&seq("Alt+Z")));
    }

    #[test]
    fn names_are_unique_per_context() {
        let ctx = context_with(&[("one", "Ctrl+X")]);
        assert!(ctx.shortcut_id("one").is_some());
        assert!(ctx.shortcut_id("absent").is_none());
    }
}
