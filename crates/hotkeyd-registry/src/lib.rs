//! Shortcut registry and input state machine for the hotkeyd daemon.
//!
//! The registry is the in-memory object graph behind the daemon: components
//! own contexts, contexts own shortcuts, and the registry aggregates the
//! components together with the reference-counted grab table, the
//! multi-stroke and modifier-only key recognizer, the persistent
//! configuration, and the availability policy used to admit new bindings.
//!
//! Ownership is arena-shaped: each layer owns a slab of the next, and every
//! cross-reference (the dispatch index, the last dispatched shortcut) is an
//! index triple rather than a pointer, so removals cannot dangle.
//!
//! Data flow: raw input → capture backend → [`Registry::key_pressed`] /
//! [`Registry::key_released`] → matched shortcut → owning component →
//! client notification (bus event for client components, an application
//! launch for service-action components).
#![warn(missing_docs)]

mod component;
mod context;
mod desktop;
mod error;
mod input;
mod migrations;
mod persist;
mod registry;
mod shortcut;
mod slab;

pub use component::{Component, ComponentKind};
pub use context::{Context, DEFAULT_CONTEXT, MatchType};
pub use desktop::{
    CommandLauncher, DesktopAction, DesktopEntry, LAUNCH_ACTION, Launcher, RecordingLauncher,
    SHORTCUT_TYPE_KEY, SHORTCUTS_KEY,
};
pub use error::{Error, Result};
pub use input::KeyboardState;
pub use migrations::{migrate_hotkeys, migrate_service_groups};
pub use registry::{Registry, ShortcutHandle};
pub use shortcut::Shortcut;
