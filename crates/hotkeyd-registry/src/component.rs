use keyspec::KeySequence;

use crate::{
    context::{Context, DEFAULT_CONTEXT, MatchType},
    desktop::DesktopEntry,
    slab::Slab,
};

/// What kind of client backs a component.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    /// A live IPC client; activations go out as bus signals.
    Client,
    /// A desktop-entry file; activations launch the target application.
    ServiceAction(DesktopEntry),
}

/// One client identity registered with the daemon.
///
/// A component owns its contexts (and through them its shortcuts) and knows
/// how to notify its client. Components whose unique name ends in
/// `.desktop` are service-action components: their presence is inferred from
/// the backing desktop entry, not from a live client.
#[derive(Debug, Clone)]
pub struct Component {
    unique_name: String,
    friendly_name: String,
    contexts: Slab<Context>,
    active_context: usize,
    kind: ComponentKind,
}

impl Component {
    /// Creates a client-backed component with its mandatory default context.
    pub fn new_client(
        unique_name: impl Into<String>,
        friendly_name: impl Into<String>,
    ) -> Component {
        Self::with_kind(unique_name, friendly_name, ComponentKind::Client)
    }

    /// Creates a service-action component for a desktop entry. The unique
    /// name is the entry's storage id.
    pub fn new_service(entry: DesktopEntry) -> Component {
        Self::with_kind(
            entry.id.clone(),
            entry.name.clone(),
            ComponentKind::ServiceAction(entry),
        )
    }

    fn with_kind(
        unique_name: impl Into<String>,
        friendly_name: impl Into<String>,
        kind: ComponentKind,
    ) -> Component {
        let mut contexts = Slab::new();
        let active_context = contexts.insert(Context::new(DEFAULT_CONTEXT, ""));
        Component {
            unique_name: unique_name.into(),
            friendly_name: friendly_name.into(),
            contexts,
            active_context,
            kind,
        }
    }

    /// Process-wide unique name.
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

    /// Client kind accessor.
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// True for desktop-entry backed components.
    pub fn is_service(&self) -> bool {
        matches!(self.kind, ComponentKind::ServiceAction(_))
    }

    /// Bus object path derived from the unique name: non-alphanumeric bytes
    /// become underscores under a fixed prefix.
    pub fn object_path(&self) -> String {
        let sanitized: String = self
            .unique_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("/component/{}", sanitized)
    }

    /// Index of the mandatory default context.
    pub fn default_context_id(&self) -> usize {
        self.context_id(DEFAULT_CONTEXT)
            .expect("default context always exists")
    }

    /// Index of the currently active context.
    pub fn active_context_id(&self) -> usize {
        self.active_context
    }

    /// Looks up a context by name.
    pub fn context_id(&self, name: &str) -> Option<usize> {
        self.contexts
            .iter()
            .find(|(_, ctx)| ctx.unique_name() == name)
            .map(|(id, _)| id)
    }

    /// Borrow a context by index.
    pub fn context(&self, id: usize) -> Option<&Context> {
        self.contexts.get(id)
    }

    /// Mutable borrow of a context by index.
    pub fn context_mut(&mut self, id: usize) -> Option<&mut Context> {
        self.contexts.get_mut(id)
    }

    /// Creates a context when absent; returns its index either way.
    pub fn create_context(
        &mut self,
        name: &str,
        friendly_name: impl Into<String>,
    ) -> usize {
        if let Some(id) = self.context_id(name) {
            return id;
        }
        self.contexts.insert(Context::new(name, friendly_name))
    }

    /// Makes `name` the active context. Newly registered shortcuts land in
    /// the active context. Returns false for unknown names.
    pub fn activate_context(&mut self, name: &str) -> bool {
        match self.context_id(name) {
            Some(id) => {
                self.active_context = id;
                true
            }
            None => false,
        }
    }

    /// Contexts in insertion order.
    pub fn contexts(&self) -> impl Iterator<Item = (usize, &Context)> {
        self.contexts.iter()
    }

    /// Mutable variant of [`Component::contexts`].
    pub fn contexts_mut(&mut self) -> impl Iterator<Item = (usize, &mut Context)> {
        self.contexts.iter_mut()
    }

    /// True when no context owns any shortcut.
    pub fn has_no_shortcuts(&self) -> bool {
        self.contexts.iter().all(|(_, ctx)| ctx.is_empty())
    }

    /// Context scan order for key lookups: default first, then the active
    /// context, then the rest in insertion order.
    fn scan_order(&self) -> Vec<usize> {
        let default = self.default_context_id();
        let mut order = vec![default];
        if self.active_context != default {
            order.push(self.active_context);
        }
        for (id, _) in self.contexts.iter() {
            if !order.contains(&id) {
                order.push(id);
            }
        }
        order
    }

    /// First `(context, shortcut)` whose keys relate to `seq` under
    /// `policy`, honoring the scan order.
    pub fn shortcut_by_key(&self, seq: &KeySequence, policy: MatchType) -> Option<(usize, usize)> {
        for ctx_id in self.scan_order() {
            let ctx = self.contexts.get(ctx_id)?;
            if let Some(shortcut_id) = ctx.shortcut_by_key(seq, policy) {
                return Some((ctx_id, shortcut_id));
            }
        }
        None
    }

    /// All hits of the first context that has any, honoring the scan order.
    pub fn shortcuts_by_key(&self, seq: &KeySequence, policy: MatchType) -> Vec<(usize, usize)> {
        for ctx_id in self.scan_order() {
            let Some(ctx) = self.contexts.get(ctx_id) else {
                continue;
            };
            let hits = ctx.shortcuts_by_key(seq, policy);
            if !hits.is_empty() {
                return hits.into_iter().map(|s| (ctx_id, s)).collect();
            }
        }
        Vec::new()
    }

    /// True unless any shortcut in this component overlaps `seq`, excepting
    /// the context named by `(requesting_component, requesting_context)`
    /// when this component is the requester. The exception lets a client
    /// replace its own binding.
    pub fn is_shortcut_available(
        &self,
        seq: &KeySequence,
        requesting_component: &str,
        requesting_context: &str,
    ) -> bool {
        self.contexts.iter().all(|(_, ctx)| {
            if self.unique_name == requesting_component
                && ctx.unique_name() == requesting_context
            {
                return true;
            }
            ctx.is_shortcut_available(seq)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcut::Shortcut;

    fn seq(s: &str) -> KeySequence {
        KeySequence::parse(s).unwrap()
    }

    fn add(component: &mut Component, ctx: usize, name: &str, keys: &str) {
        let mut s = Shortcut::new(name, name);
        s.commit_keys(vec![seq(keys)]);
        component.context_mut(ctx).unwrap().add_shortcut(s);
    }

    #[test]
    fn default_context_exists_and_is_active() {
        let c = Component::new_client("org.example.editor", "Editor");
        assert_eq!(c.default_context_id(), c.active_context_id());
        assert!(c.context_id(DEFAULT_CONTEXT).is_some());
        assert!(c.has_no_shortcuts());
    }

    #[test]
    fn object_path_is_sanitized() {
        let c = Component::new_client("org.example.editor.desktop", "Editor");
        assert_eq!(c.object_path(), "/component/org_example_editor_desktop");
    }

    #[test]
    fn scan_prefers_default_then_active() {
        let mut c = Component::new_client("comp", "Comp");
        let extra = c.create_context("extra", "");
        let other = c.create_context("other", "");
        add(&mut c, extra, "in-extra", "Ctrl+X");
        add(&mut c, other, "in-other", "Ctrl+X");
        c.activate_context("other");

        let (ctx, shortcut) = c.shortcut_by_key(&seq("Ctrl+X"), MatchType::Equal).unwrap();
        assert_eq!(ctx, other, "active context beats later insertion order");
        assert_eq!(
            c.context(ctx).unwrap().shortcut(shortcut).unwrap().unique_name(),
            "in-other"
        );

        let default_ctx = c.default_context_id();
        add(&mut c, default_ctx, "in-default", "Ctrl+X");
        let (ctx, _) = c.shortcut_by_key(&seq("Ctrl+X"), MatchType::Equal).unwrap();
        assert_eq!(ctx, c.default_context_id(), "default context wins");
    }

    #[test]
    fn self_exception_in_availability() {
        let mut c = Component::new_client("comp", "Comp");
        let default_ctx = c.default_context_id();
        add(&mut c, default_ctx, "bound", "Ctrl+K,Ctrl+L");

        assert!(!c.is_shortcut_available(&seq("Ctrl+K"), "other", DEFAULT_CONTEXT));
        assert!(c.is_shortcut_available(&seq("Ctrl+K"), "comp", DEFAULT_CONTEXT));
        // The exception is per context.
        assert!(!c.is_shortcut_available(&seq("Ctrl+K"), "comp", "elsewhere"));
    }

    #[test]
    fn activate_unknown_context_is_refused() {
        let mut c = Component::new_client("comp", "Comp");
        assert!(!c.activate_context("missing"));
        assert_eq!(c.active_context_id(), c.default_context_id());
    }
}
