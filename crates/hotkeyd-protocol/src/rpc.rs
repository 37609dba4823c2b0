//! Stable RPC method and notification names for the control bus.

/// RPC request methods supported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Register a component/action pair, creating either on first use.
    DoRegister,
    /// Register an action whose keys are never grabbed or persisted.
    RegisterWithoutGrab,
    /// Read the current key sequences of an action.
    GetShortcut,
    /// Bind an action owned by the calling client.
    SetShortcut,
    /// Bind an action owned by another client.
    SetForeignShortcut,
    /// Remove an action registration.
    Unregister,
    /// Enumerate registered components.
    ListComponents,
    /// Enumerate actions of one component.
    ListActions,
    /// Check whether a sequence could be admitted.
    IsGloballyAvailable,
}

impl Method {
    /// Stable string name of the method on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::DoRegister => "do_register",
            Method::RegisterWithoutGrab => "register_without_grab",
            Method::GetShortcut => "get_shortcut",
            Method::SetShortcut => "set_shortcut",
            Method::SetForeignShortcut => "set_foreign_shortcut",
            Method::Unregister => "unregister",
            Method::ListComponents => "list_components",
            Method::ListActions => "list_actions",
            Method::IsGloballyAvailable => "is_globally_available",
        }
    }

    /// Parses a method name received over the wire.
    pub fn try_from_str(s: &str) -> Option<Method> {
        match s {
            "do_register" => Some(Method::DoRegister),
            "register_without_grab" => Some(Method::RegisterWithoutGrab),
            "get_shortcut" => Some(Method::GetShortcut),
            "set_shortcut" => Some(Method::SetShortcut),
            "set_foreign_shortcut" => Some(Method::SetForeignShortcut),
            "unregister" => Some(Method::Unregister),
            "list_components" => Some(Method::ListComponents),
            "list_actions" => Some(Method::ListActions),
            "is_globally_available" => Some(Method::IsGloballyAvailable),
            _ => None,
        }
    }
}

/// One-way daemon→client notification channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A shortcut fired or was released ([`crate::ShortcutEvent`] payload).
    ShortcutEvent,
    /// A foreign client changed a binding ([`crate::ShortcutEvent`]-shaped
    /// payload with the new owner's action).
    ShortcutChanged,
}

impl Notification {
    /// Stable string name of the notification channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Notification::ShortcutEvent => "shortcut_event",
            Notification::ShortcutChanged => "shortcut_changed",
        }
    }
}
