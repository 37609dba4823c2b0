use std::{collections::HashMap, path::PathBuf};

use capture::CaptureBackend;
use cfgtree::ConfigFile;
use hotkeyd_protocol::{ComponentInfo, KeyState, ShortcutEvent};
use keyspec::{KeySequence, Modifiers, normalize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, trace, warn};

use crate::{
    Error, Result,
    component::{Component, ComponentKind},
    context::MatchType,
    desktop::{LAUNCH_ACTION, Launcher},
    input::KeyboardState,
    shortcut::Shortcut,
    slab::Slab,
};

/// Stable reference to one shortcut: indices into the component, context and
/// shortcut arenas. Handles survive unrelated removals, which keeps the
/// dispatch index free of dangling references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShortcutHandle {
    /// Component arena index.
    pub component: usize,
    /// Context arena index within the component.
    pub context: usize,
    /// Shortcut arena index within the context.
    pub shortcut: usize,
}

/// The grab bookkeeping: backend, per-chord retain counts, and the inverse
/// dispatch index from full sequences to their owning shortcut.
///
/// The refcount discipline guarantees the backend sees at most one
/// `grab(chord, true)` and one matching `grab(chord, false)` per grabbed
/// lifetime, however many sequences share the chord.
pub(crate) struct GrabTable {
    backend: Option<Box<dyn CaptureBackend>>,
    refcounts: HashMap<u32, u32>,
    active_keys: HashMap<KeySequence, ShortcutHandle>,
}

impl GrabTable {
    fn new(backend: Option<Box<dyn CaptureBackend>>) -> GrabTable {
        let mut table = GrabTable {
            backend,
            refcounts: HashMap::new(),
            active_keys: HashMap::new(),
        };
        if let Some(backend) = &mut table.backend {
            backend.set_enabled(true);
        }
        table
    }

    pub(crate) fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub(crate) fn active_keys(&self) -> &HashMap<KeySequence, ShortcutHandle> {
        &self.active_keys
    }

    /// Grabs every chord of `seq` for `owner`. On a backend refusal the
    /// chords grabbed so far in this call are rolled back and the sequence
    /// stays unregistered.
    pub(crate) fn register_key(&mut self, seq: &KeySequence, owner: ShortcutHandle) -> bool {
        if seq.is_empty() {
            debug!("attempt to register an empty key");
            return false;
        }
        if let Some(existing) = self.active_keys.get(seq) {
            if *existing == owner {
                return true;
            }
            debug!(key = %seq, "key already taken");
            return false;
        }
        let Some(backend) = &mut self.backend else {
            return false;
        };

        debug!(key = %seq, "registering key");
        let chords = seq.chords();
        let mut failed_at = None;
        for (i, chord) in chords.iter().enumerate() {
            let packed = chord.packed();
            let count = self.refcounts.get(&packed).copied().unwrap_or(0);
            if count == 0 && !backend.grab(packed, true) {
                failed_at = Some(i);
                break;
            }
            self.refcounts.insert(packed, count + 1);
        }

        if let Some(end) = failed_at {
            debug!(key = %seq, chord = %chords[end], "grab rejected, rolling back");
            for chord in &chords[..end] {
                let packed = chord.packed();
                match self.refcounts.get(&packed).copied().unwrap_or(0) {
                    0 => {}
                    1 => {
                        backend.grab(packed, false);
                        self.refcounts.remove(&packed);
                    }
                    count => {
                        self.refcounts.insert(packed, count - 1);
                    }
                }
            }
            return false;
        }

        self.active_keys.insert(seq.clone(), owner);
        true
    }

    /// Releases `seq` if `owner` holds it. Chords are released from the
    /// backend only when their retain count reaches zero.
    pub(crate) fn unregister_key(&mut self, seq: &KeySequence, owner: ShortcutHandle) -> bool {
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };
        if self.active_keys.get(seq) != Some(&owner) {
            // The shortcut doesn't own the key or the key isn't grabbed.
            return false;
        }
        for chord in seq.chords() {
            let packed = chord.packed();
            match self.refcounts.get(&packed).copied().unwrap_or(0) {
                0 => continue,
                1 => {
                    debug!(chord = %chord, "releasing grab");
                    backend.grab(packed, false);
                    self.refcounts.remove(&packed);
                }
                count => {
                    trace!(chord = %chord, "grab retained by another shortcut");
                    self.refcounts.insert(packed, count - 1);
                }
            }
        }
        self.active_keys.remove(seq);
        true
    }

    /// Releases every held grab without consulting component state. Used on
    /// teardown, when the components may already be gone.
    pub(crate) fn release_all(&mut self) {
        if let Some(backend) = &mut self.backend {
            for (packed, count) in self.refcounts.drain() {
                if count > 0 {
                    backend.grab(packed, false);
                }
            }
            backend.set_enabled(false);
        }
        self.refcounts.clear();
        self.active_keys.clear();
    }

    pub(crate) fn sync(&mut self) {
        if let Some(backend) = &mut self.backend {
            backend.sync_windowing_system();
        }
    }
}

/// The singleton aggregating all components, the grab table and the input
/// state machine.
///
/// There is exactly one registry per daemon; it is created in `main` and
/// threaded by reference into the IPC layer. Tests construct their own
/// against the capture test stub.
pub struct Registry {
    pub(crate) components: Slab<Component>,
    pub(crate) grabs: GrabTable,
    pub(crate) config: ConfigFile,
    pub(crate) service_dirs: Vec<PathBuf>,
    pub(crate) application_dirs: Vec<PathBuf>,
    pub(crate) launcher: Box<dyn Launcher>,
    pub(crate) events: UnboundedSender<ShortcutEvent>,

    // Input recognizer state.
    pub(crate) active_sequence: KeySequence,
    pub(crate) last_shortcut: Option<ShortcutHandle>,
    pub(crate) state: KeyboardState,
    pub(crate) current_modifiers: Modifiers,
}

impl Registry {
    /// Creates a registry over a capture backend (or none, when the platform
    /// has no backend: the registry then accepts registrations but never
    /// grabs) and the given configuration store. Returns the registry and
    /// the outbound shortcut-event mailbox.
    pub fn new(
        backend: Option<Box<dyn CaptureBackend>>,
        config: ConfigFile,
        launcher: Box<dyn Launcher>,
    ) -> (Registry, UnboundedReceiver<ShortcutEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let registry = Registry {
            components: Slab::new(),
            grabs: GrabTable::new(backend),
            config,
            service_dirs: Vec::new(),
            application_dirs: Vec::new(),
            launcher,
            events,
            active_sequence: KeySequence::empty(),
            last_shortcut: None,
            state: KeyboardState::Normal,
            current_modifiers: Modifiers::NONE,
        };
        (registry, events_rx)
    }

    /// Directories scanned for service-action desktop entries.
    pub fn set_service_dirs(&mut self, dirs: Vec<PathBuf>) {
        self.service_dirs = dirs;
    }

    /// Application directories scanned for entries declaring shortcuts.
    pub fn set_application_dirs(&mut self, dirs: Vec<PathBuf>) {
        self.application_dirs = dirs;
    }

    /// Whether a capture backend was loaded.
    pub fn has_backend(&self) -> bool {
        self.grabs.has_backend()
    }

    /// The configuration store.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    // ------------------------------------------------------------------
    // Components

    /// Adds a component. A unique-name collision is a programming error on
    /// the caller's side and is reported loudly.
    pub fn add_component(&mut self, component: Component) -> Result<usize> {
        if self.component_id(component.unique_name()).is_some() {
            error!(name = component.unique_name(), "component already registered");
            debug_assert!(false, "component already registered");
            return Err(Error::DuplicateRegistration(
                component.unique_name().to_string(),
            ));
        }
        Ok(self.components.insert(component))
    }

    /// Index of the component with the given unique name.
    pub fn component_id(&self, unique_name: &str) -> Option<usize> {
        self.components
            .iter()
            .find(|(_, c)| c.unique_name() == unique_name)
            .map(|(id, _)| id)
    }

    /// Borrow a component by index.
    pub fn component(&self, id: usize) -> Option<&Component> {
        self.components.get(id)
    }

    /// Components in insertion order.
    pub fn components(&self) -> impl Iterator<Item = (usize, &Component)> {
        self.components.iter()
    }

    /// Identity of every registered component, in insertion order.
    pub fn list_components(&self) -> Vec<ComponentInfo> {
        self.components
            .iter()
            .map(|(_, c)| ComponentInfo {
                unique_name: c.unique_name().to_string(),
                friendly_name: c.friendly_name().to_string(),
                object_path: c.object_path(),
            })
            .collect()
    }

    /// Action names of one component across its contexts, scan order.
    pub fn list_actions(&self, component: &str) -> Result<Vec<String>> {
        let id = self
            .component_id(component)
            .ok_or_else(|| Error::UnknownAction(component.to_string()))?;
        let comp = self.components.get(id).expect("live component");
        let mut names = Vec::new();
        for (_, ctx) in comp.contexts() {
            for (_, shortcut) in ctx.shortcuts() {
                if !names.iter().any(|n| n == shortcut.unique_name()) {
                    names.push(shortcut.unique_name().to_string());
                }
            }
        }
        Ok(names)
    }

    // ------------------------------------------------------------------
    // Shortcuts

    /// Borrow a shortcut through its handle.
    pub fn shortcut(&self, handle: ShortcutHandle) -> Option<&Shortcut> {
        self.components
            .get(handle.component)?
            .context(handle.context)?
            .shortcut(handle.shortcut)
    }

    pub(crate) fn shortcut_mut(&mut self, handle: ShortcutHandle) -> Option<&mut Shortcut> {
        self.components
            .get_mut(handle.component)?
            .context_mut(handle.context)?
            .shortcut_mut(handle.shortcut)
    }

    fn handle_identity(&self, handle: ShortcutHandle) -> Option<(String, String, String)> {
        let comp = self.components.get(handle.component)?;
        let ctx = comp.context(handle.context)?;
        let shortcut = ctx.shortcut(handle.shortcut)?;
        Some((
            comp.unique_name().to_string(),
            ctx.unique_name().to_string(),
            shortcut.unique_name().to_string(),
        ))
    }

    /// Locates an action within a component, honoring the context scan
    /// order (default, active, rest).
    pub fn find_action(&self, component: &str, action: &str) -> Option<ShortcutHandle> {
        let comp_id = self.component_id(component)?;
        let comp = self.components.get(comp_id)?;
        let mut order = vec![comp.default_context_id()];
        if comp.active_context_id() != comp.default_context_id() {
            order.push(comp.active_context_id());
        }
        for (ctx_id, _) in comp.contexts() {
            if !order.contains(&ctx_id) {
                order.push(ctx_id);
            }
        }
        for ctx_id in order {
            if let Some(ctx) = comp.context(ctx_id) {
                if let Some(shortcut_id) = ctx.shortcut_id(action) {
                    return Some(ShortcutHandle {
                        component: comp_id,
                        context: ctx_id,
                        shortcut: shortcut_id,
                    });
                }
            }
        }
        None
    }

    /// Client-facing registration (`do_register`): ensures the component,
    /// the context, and a fresh shortcut, and marks the action present.
    pub fn client_register(
        &mut self,
        component: &str,
        component_friendly: &str,
        action: &str,
        action_friendly: &str,
        context: &str,
        session: bool,
    ) -> Result<ShortcutHandle> {
        let comp_id = match self.component_id(component) {
            Some(id) => id,
            None => self.add_component(Component::new_client(component, component_friendly))?,
        };
        let comp = self.components.get_mut(comp_id).expect("live component");
        if !component_friendly.is_empty() {
            comp.set_friendly_name(component_friendly);
        }
        let ctx_id = if context.is_empty() {
            comp.active_context_id()
        } else {
            comp.create_context(context, "")
        };
        let ctx = comp.context_mut(ctx_id).expect("live context");
        let shortcut_id = match ctx.shortcut_id(action) {
            Some(id) => id,
            None => ctx.add_shortcut(Shortcut::new(action, action_friendly)),
        };
        let shortcut = ctx.shortcut_mut(shortcut_id).expect("live shortcut");
        if !action_friendly.is_empty() {
            shortcut.set_friendly_name(action_friendly);
        }
        if session {
            shortcut.set_session_shortcut(true);
        }
        let handle = ShortcutHandle {
            component: comp_id,
            context: ctx_id,
            shortcut: shortcut_id,
        };
        self.set_shortcut_present(handle, true);
        Ok(handle)
    }

    /// Configuration/service-driven registration: creates or updates the
    /// action in the component's active context. Keys apply only while the
    /// shortcut is fresh; a stored binding that now conflicts is left
    /// unbound.
    pub fn register_shortcut(
        &mut self,
        component: usize,
        action: &str,
        friendly: &str,
        keys: Vec<KeySequence>,
        default_keys: Vec<KeySequence>,
    ) -> Result<ShortcutHandle> {
        let comp = self
            .components
            .get_mut(component)
            .ok_or_else(|| Error::UnknownAction(format!("component #{}", component)))?;
        let ctx_id = comp.active_context_id();
        let ctx = comp.context_mut(ctx_id).expect("live context");
        let shortcut_id = match ctx.shortcut_id(action) {
            Some(id) => {
                ctx.shortcut_mut(id)
                    .expect("live shortcut")
                    .set_friendly_name(friendly);
                id
            }
            None => ctx.add_shortcut(Shortcut::new(action, friendly)),
        };
        let handle = ShortcutHandle {
            component,
            context: ctx_id,
            shortcut: shortcut_id,
        };

        let defaults: Vec<KeySequence> = default_keys.iter().map(normalize).collect();
        let fresh = {
            let shortcut = self.shortcut_mut(handle).expect("live shortcut");
            shortcut.set_default_keys(defaults);
            shortcut.is_fresh()
        };
        if fresh && !self.set_shortcut_keys(handle, keys)? {
            warn!(action, "stored keys conflict with an active binding; leaving unbound");
            if let Some(shortcut) = self.shortcut_mut(handle) {
                shortcut.commit_keys(Vec::new());
            }
        }
        Ok(handle)
    }

    /// Replaces an action's current keys with availability admission.
    ///
    /// The change is transactional: removed sequences are unregistered,
    /// added ones registered; when any grab is refused the partial grabs are
    /// rolled back, the removals restored, and `false` returned.
    pub fn set_shortcut_keys(
        &mut self,
        handle: ShortcutHandle,
        keys: Vec<KeySequence>,
    ) -> Result<bool> {
        self.set_keys_internal(handle, keys, true)
    }

    /// Key replacement on behalf of another client (`set_foreign_shortcut`):
    /// same transactional grab discipline, no availability admission. The
    /// IPC layer notifies the owning client of the change.
    pub fn set_foreign_shortcut_keys(
        &mut self,
        handle: ShortcutHandle,
        keys: Vec<KeySequence>,
    ) -> Result<bool> {
        self.set_keys_internal(handle, keys, false)
    }

    fn set_keys_internal(
        &mut self,
        handle: ShortcutHandle,
        keys: Vec<KeySequence>,
        enforce_availability: bool,
    ) -> Result<bool> {
        let keys: Vec<KeySequence> = keys.iter().map(normalize).collect();
        let Some((component_name, context_name, _)) = self.handle_identity(handle) else {
            return Err(Error::UnknownAction(format!("{:?}", handle)));
        };
        let (old_keys, grab_eligible) = {
            let shortcut = self.shortcut(handle).expect("live shortcut");
            (
                shortcut.keys().to_vec(),
                shortcut.is_present()
                    && !shortcut.is_session_shortcut()
                    && self.grabs.has_backend(),
            )
        };

        if keys == old_keys {
            self.shortcut_mut(handle)
                .expect("live shortcut")
                .commit_keys(keys);
            return Ok(true);
        }

        if enforce_availability {
            for seq in &keys {
                if seq.is_empty() || old_keys.contains(seq) {
                    continue;
                }
                if !self.is_shortcut_available(seq, &component_name, &context_name) {
                    debug!(key = %seq, component = %component_name, "conflicting shortcut denied");
                    return Ok(false);
                }
            }
        }

        if grab_eligible {
            let removed: Vec<KeySequence> = old_keys
                .iter()
                .filter(|seq| !seq.is_empty() && !keys.contains(seq))
                .cloned()
                .collect();
            let added: Vec<KeySequence> = keys
                .iter()
                .filter(|seq| !seq.is_empty() && !old_keys.contains(seq))
                .cloned()
                .collect();

            for seq in &removed {
                self.unregister_key(seq, handle);
            }
            let mut grabbed: Vec<&KeySequence> = Vec::new();
            let mut rejected = None;
            for seq in &added {
                if self.grabs.register_key(seq, handle) {
                    grabbed.push(seq);
                } else {
                    rejected = Some(seq.clone());
                    break;
                }
            }
            if let Some(seq) = rejected {
                debug!(key = %seq, "grab rejected, rolling back key change");
                for seq in grabbed {
                    self.grabs.unregister_key(seq, handle);
                }
                for seq in &removed {
                    if !self.grabs.register_key(seq, handle) {
                        warn!(key = %seq, "failed to restore grab after rollback");
                    }
                }
                return Ok(false);
            }
        }

        self.shortcut_mut(handle)
            .expect("live shortcut")
            .commit_keys(keys);
        Ok(true)
    }

    /// Marks a shortcut present or absent, registering or releasing its
    /// grabs accordingly.
    pub fn set_shortcut_present(&mut self, handle: ShortcutHandle, present: bool) {
        let Some(shortcut) = self.shortcut(handle) else {
            return;
        };
        if shortcut.is_present() == present {
            return;
        }
        let session = shortcut.is_session_shortcut();
        let sequences: Vec<KeySequence> = shortcut.active_sequences().cloned().collect();

        self.shortcut_mut(handle)
            .expect("live shortcut")
            .set_present_flag(present);

        if session || !self.grabs.has_backend() {
            return;
        }
        if present {
            for seq in &sequences {
                if !self.grabs.register_key(seq, handle) {
                    debug!(key = %seq, "grab denied while activating");
                }
            }
        } else {
            for seq in &sequences {
                self.unregister_key(seq, handle);
            }
        }
    }

    /// Removes an action registration entirely, releasing its grabs.
    pub fn unregister_action(&mut self, component: &str, action: &str) -> Result<bool> {
        let Some(handle) = self.find_action(component, action) else {
            return Ok(false);
        };
        let shortcut = self.shortcut(handle).expect("live shortcut");
        let sequences: Vec<KeySequence> = shortcut.active_sequences().cloned().collect();
        if shortcut.is_active() && !shortcut.is_session_shortcut() {
            for seq in &sequences {
                self.unregister_key(seq, handle);
            }
        }
        if self.last_shortcut == Some(handle) {
            self.last_shortcut = None;
        }
        self.components
            .get_mut(handle.component)
            .and_then(|c| c.context_mut(handle.context))
            .and_then(|ctx| ctx.remove_shortcut(handle.shortcut));
        Ok(true)
    }

    /// Current key sequences of an action, in token form.
    pub fn shortcut_keys(&self, component: &str, action: &str) -> Result<Vec<String>> {
        let handle = self
            .find_action(component, action)
            .ok_or_else(|| Error::UnknownAction(format!("{}/{}", component, action)))?;
        Ok(self
            .shortcut(handle)
            .expect("live shortcut")
            .keys()
            .iter()
            .map(|seq| seq.to_string())
            .collect())
    }

    // ------------------------------------------------------------------
    // Grabs

    pub(crate) fn unregister_key(&mut self, seq: &KeySequence, owner: ShortcutHandle) -> bool {
        let removed = self.grabs.unregister_key(seq, owner);
        if self.last_shortcut == Some(owner) {
            self.emit_released(owner);
            self.last_shortcut = None;
        }
        removed
    }

    /// The dispatch index, exposed for invariant checks in tests.
    pub fn active_keys(&self) -> Vec<(KeySequence, ShortcutHandle)> {
        self.grabs
            .active_keys()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    // ------------------------------------------------------------------
    // Queries

    /// True when `seq` could be admitted for `(component, context)`:
    /// no component except the requesting pair holds an overlapping binding.
    pub fn is_shortcut_available(&self, seq: &KeySequence, component: &str, context: &str) -> bool {
        let seq = normalize(seq);
        self.components
            .iter()
            .all(|(_, c)| c.is_shortcut_available(&seq, component, context))
    }

    /// First shortcut whose keys relate to `seq` under `policy`, scanning
    /// components in insertion order.
    pub fn shortcut_by_key(&self, seq: &KeySequence, policy: MatchType) -> Option<ShortcutHandle> {
        for (comp_id, comp) in self.components.iter() {
            if let Some((context, shortcut)) = comp.shortcut_by_key(seq, policy) {
                return Some(ShortcutHandle {
                    component: comp_id,
                    context,
                    shortcut,
                });
            }
        }
        None
    }

    /// All hits of the first component that has any.
    pub fn shortcuts_by_key(&self, seq: &KeySequence, policy: MatchType) -> Vec<ShortcutHandle> {
        for (comp_id, comp) in self.components.iter() {
            let hits = comp.shortcuts_by_key(seq, policy);
            if !hits.is_empty() {
                return hits
                    .into_iter()
                    .map(|(context, shortcut)| ShortcutHandle {
                        component: comp_id,
                        context,
                        shortcut,
                    })
                    .collect();
            }
        }
        Vec::new()
    }

    // ------------------------------------------------------------------
    // Activation

    /// Marks every shortcut of every component present, arming grabs.
    pub fn activate_shortcuts(&mut self) {
        for handle in self.all_handles() {
            self.set_shortcut_present(handle, true);
        }
    }

    /// Marks every shortcut absent, releasing grabs. A temporary
    /// deactivation (keyboard remap in progress) skips persistence;
    /// otherwise the settings are written out.
    pub fn deactivate_shortcuts(&mut self, temporarily: bool) {
        for handle in self.all_handles() {
            self.set_shortcut_present(handle, false);
        }
        if !temporarily {
            if let Err(e) = self.write_settings() {
                warn!(error = %e, "failed to persist settings on deactivation");
            }
        }
    }

    /// Re-arms every grab; the platform backend calls this after a keyboard
    /// remapping pass.
    pub fn grab_keys(&mut self) {
        self.activate_shortcuts();
    }

    /// Releases every grab ahead of a keyboard remapping pass.
    pub fn ungrab_keys(&mut self) {
        self.deactivate_shortcuts(true);
    }

    pub(crate) fn all_handles(&self) -> Vec<ShortcutHandle> {
        let mut handles = Vec::new();
        for (comp_id, comp) in self.components.iter() {
            for (ctx_id, ctx) in comp.contexts() {
                for (shortcut_id, _) in ctx.shortcuts() {
                    handles.push(ShortcutHandle {
                        component: comp_id,
                        context: ctx_id,
                        shortcut: shortcut_id,
                    });
                }
            }
        }
        handles
    }

    // ------------------------------------------------------------------
    // Notification

    pub(crate) fn emit_pressed(&mut self, handle: ShortcutHandle) {
        let Some((component, _, action)) = self.handle_identity(handle) else {
            return;
        };
        let comp = self.components.get(handle.component).expect("live component");
        match comp.kind() {
            ComponentKind::Client => {
                let event = ShortcutEvent {
                    component,
                    object_path: comp.object_path(),
                    action,
                    state: KeyState::Pressed,
                };
                let _ = self.events.send(event);
            }
            ComponentKind::ServiceAction(entry) => {
                let entry = entry.clone();
                let selected = if action == LAUNCH_ACTION {
                    None
                } else {
                    Some(action)
                };
                if let Err(e) = self.launcher.launch(&entry, selected.as_deref()) {
                    error!(entry = %entry.id, error = %e, "failed to launch service action");
                }
            }
        }
    }

    pub(crate) fn emit_released(&mut self, handle: ShortcutHandle) {
        let Some((component, _, action)) = self.handle_identity(handle) else {
            return;
        };
        let comp = self.components.get(handle.component).expect("live component");
        match comp.kind() {
            ComponentKind::Client => {
                let event = ShortcutEvent {
                    component,
                    object_path: comp.object_path(),
                    action,
                    state: KeyState::Released,
                };
                let _ = self.events.send(event);
            }
            ComponentKind::ServiceAction(_) => {
                trace!(action = %action, "service actions have no release notification");
            }
        }
    }

    pub(crate) fn dispatch_pressed(&mut self, handle: ShortcutHandle) {
        // Flush the windowing system so the receiving client's own grabs do
        // not race the delivery.
        self.grabs.sync();
        self.emit_pressed(handle);
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        // Components may already be half-dismantled; the grab table is the
        // sole guardian of the backend resource.
        self.grabs.release_all();
    }
}
