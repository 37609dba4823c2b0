//! Wire types for the hotkeyd control bus.
//!
//! This crate defines the serializable message types the daemon and its
//! clients exchange, the stable RPC method names, and the msgpack codec used
//! to move them over the socket.
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

pub mod codec;
pub mod rpc;

/// Delivery state of a shortcut activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    /// The bound sequence completed; the action fired.
    Pressed,
    /// The platform reported an auto-repeat of the completed sequence.
    /// Carried for backends that detect repeats; the recognizer itself only
    /// emits `Pressed`/`Released`.
    Repeated,
    /// The activation ended.
    Released,
}

/// One shortcut activation notification, emitted per owning component.
///
/// Release events for an activation are queued after its press on the same
/// mailbox, so they cannot overtake it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutEvent {
    /// Unique name of the owning component.
    pub component: String,
    /// Bus object path of the owning component.
    pub object_path: String,
    /// Action (shortcut) unique name.
    pub action: String,
    /// Press or release.
    pub state: KeyState,
}

/// Identity of one registered component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    /// Process-wide unique name.
    pub unique_name: String,
    /// Presentation name.
    pub friendly_name: String,
    /// Bus object path derived from the unique name.
    pub object_path: String,
}

/// Request payload for `do_register` and `register_without_grab`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterReq {
    /// Component unique name.
    pub component: String,
    /// Action unique name.
    pub action: String,
    /// Component friendly name (used when the component is created).
    pub component_friendly: String,
    /// Action friendly name.
    pub action_friendly: String,
    /// Target context; empty selects the component's active context.
    #[serde(default)]
    pub context: String,
}

/// Request payload for `get_shortcut`, `unregister` and `list_actions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRef {
    /// Component unique name.
    pub component: String,
    /// Action unique name; ignored by `list_actions`.
    #[serde(default)]
    pub action: String,
}

/// Request payload for `set_shortcut` and `set_foreign_shortcut`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetShortcutReq {
    /// Component unique name.
    pub component: String,
    /// Action unique name.
    pub action: String,
    /// Key sequences in their human-readable token form (`Ctrl+K,Ctrl+L`);
    /// an empty list unbinds the action.
    pub keys: Vec<String>,
}

/// Request payload for `is_globally_available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReq {
    /// Candidate sequence in token form.
    pub sequence: String,
    /// Component allowed to keep its own colliding binding.
    pub component: String,
    /// Context of the exception pair; empty means `default`.
    #[serde(default)]
    pub context: String,
}
