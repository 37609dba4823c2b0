//! Settings load and save.
//!
//! On-disk layout: one top-level group per client component, named after its
//! unique name, with `_k_friendly_name` plus one entry per action
//! (`<keys>\t<defaults>\t<display>`, lists encoding the empty list as the
//! literal `none`); named contexts become sub-groups with the same encoding.
//! Desktop-backed components live as sub-groups of the reserved `services`
//! group and store only the keys list, and only when it differs from the
//! entry's declared default.

use std::path::PathBuf;

use cfgtree::Group;
use keyspec::{KeySequence, format_list, normalize, parse_list};
use tracing::{debug, warn};

use crate::{
    Error, Result,
    component::Component,
    context::DEFAULT_CONTEXT,
    desktop::{DesktopEntry, LAUNCH_ACTION},
    registry::Registry,
};

/// Entry holding a component's or context's presentation name.
pub(crate) const FRIENDLY_NAME_KEY: &str = "_k_friendly_name";
/// Reserved top-level group owning desktop-backed components.
pub(crate) const SERVICES_GROUP: &str = "services";
/// Suffix marking desktop-backed component names.
pub(crate) const DESKTOP_SUFFIX: &str = ".desktop";
/// Obsolete sub-group that used to carry the friendly name.
const LEGACY_FRIENDLY_GROUP: &str = "Friendly Name";

/// Encodes a component-group entry value.
pub(crate) fn encode_triple(
    keys: &[KeySequence],
    defaults: &[KeySequence],
    friendly: &str,
) -> String {
    format!(
        "{}\t{}\t{}",
        format_list(keys),
        format_list(defaults),
        friendly
    )
}

/// Decodes a component-group entry value. Missing trailing fields are
/// tolerated; unparseable key lists are an error the caller reports.
pub(crate) fn decode_triple(
    entry: &str,
    value: &str,
) -> Result<(Vec<KeySequence>, Vec<KeySequence>, String)> {
    let mut parts = value.splitn(3, '\t');
    let keys_token = parts.next().unwrap_or("none");
    let defaults_token = parts.next().unwrap_or("none");
    let friendly = parts.next().unwrap_or("").to_string();
    let keys = parse_list(keys_token).map_err(|e| Error::MalformedConfig {
        entry: entry.to_string(),
        message: e.to_string(),
    })?;
    let defaults = parse_list(defaults_token).map_err(|e| Error::MalformedConfig {
        entry: entry.to_string(),
        message: e.to_string(),
    })?;
    Ok((keys, defaults, friendly))
}

impl Registry {
    /// Loads the configuration into the in-memory object graph. Called once
    /// at startup, after migrations.
    ///
    /// Order: top-level component groups, then `services` sub-groups, then
    /// the service-entry directory scan, then application entries declaring
    /// default shortcuts.
    pub fn load_settings(&mut self) -> Result<()> {
        let root = self.config.root().clone();

        for group_name in root.group_names() {
            if group_name == SERVICES_GROUP || group_name.ends_with(DESKTOP_SUFFIX) {
                continue;
            }
            debug!(group = %group_name, "loading component group");
            if self.component_id(&group_name).is_some() {
                // load_settings is not designed to be called twice.
                warn!(group = %group_name, "component already registered, skipping group");
                continue;
            }
            let group = root.group(&group_name).expect("listed group exists");
            let friendly = group.entry(FRIENDLY_NAME_KEY).unwrap_or("").to_string();
            let comp_id = self.add_component(Component::new_client(&group_name, friendly))?;

            for context_name in group.group_names() {
                if context_name == LEGACY_FRIENDLY_GROUP {
                    continue;
                }
                let context_group = group.group(&context_name).expect("listed group exists");
                let context_friendly = context_group
                    .entry(FRIENDLY_NAME_KEY)
                    .unwrap_or("")
                    .to_string();
                {
                    let comp = self.components.get_mut(comp_id).expect("live component");
                    comp.create_context(&context_name, context_friendly);
                    comp.activate_context(&context_name);
                }
                self.load_group_entries(comp_id, context_group);
            }

            let comp = self.components.get_mut(comp_id).expect("live component");
            comp.activate_context(DEFAULT_CONTEXT);
            self.load_group_entries(comp_id, group);
        }

        if let Some(services) = root.group(SERVICES_GROUP) {
            for name in services.group_names() {
                if let Err(e) = self.load_service_component(&name, services.group(&name)) {
                    warn!(service = %name, error = %e, "service component not instantiated");
                }
            }
        }

        self.scan_service_dirs()?;
        self.scan_application_dirs()?;
        Ok(())
    }

    fn load_group_entries(&mut self, comp_id: usize, group: &Group) {
        for (key, value) in group.entries() {
            if key == FRIENDLY_NAME_KEY {
                continue;
            }
            match decode_triple(key, value) {
                Ok((keys, defaults, friendly)) => {
                    if let Err(e) =
                        self.register_shortcut(comp_id, key, &friendly, keys, defaults)
                    {
                        warn!(entry = key, error = %e, "failed to register stored shortcut");
                    }
                }
                Err(e) => warn!(entry = key, error = %e, "skipping malformed config entry"),
            }
        }
    }

    fn locate_desktop_entry(&self, name: &str) -> Option<PathBuf> {
        self.service_dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }

    fn load_service_component(&mut self, name: &str, config_group: Option<&Group>) -> Result<()> {
        if self.component_id(name).is_some() {
            return Ok(());
        }
        let path = self
            .locate_desktop_entry(name)
            .ok_or_else(|| Error::MissingDesktopEntry(name.to_string()))?;
        let entry = DesktopEntry::load(&path)?;
        self.add_service_component(entry, config_group)
    }

    /// Instantiates a service-action component from a parsed entry,
    /// overriding declared defaults with any stored keys.
    pub(crate) fn add_service_component(
        &mut self,
        entry: DesktopEntry,
        config_group: Option<&Group>,
    ) -> Result<()> {
        let comp_id = self.add_component(Component::new_service(entry.clone()))?;

        let stored_keys = |action: &str, defaults: &[KeySequence]| -> Vec<KeySequence> {
            match config_group.and_then(|g| g.entry(action)) {
                Some(value) => match parse_list(value) {
                    Ok(list) => list,
                    Err(e) => {
                        warn!(action, error = %e, "skipping malformed service entry");
                        defaults.to_vec()
                    }
                },
                None => defaults.to_vec(),
            }
        };

        if entry.launchable {
            let keys = stored_keys(LAUNCH_ACTION, &entry.default_shortcuts);
            let handle = self.register_shortcut(
                comp_id,
                LAUNCH_ACTION,
                &entry.name,
                keys,
                entry.default_shortcuts.clone(),
            )?;
            self.set_shortcut_present(handle, true);
        }
        for action in &entry.actions {
            let keys = stored_keys(&action.name, &action.default_shortcuts);
            let handle = self.register_shortcut(
                comp_id,
                &action.name,
                &action.text,
                keys,
                action.default_shortcuts.clone(),
            )?;
            self.set_shortcut_present(handle, true);
        }
        Ok(())
    }

    fn scan_service_dirs(&mut self) -> Result<()> {
        for dir in self.service_dirs.clone() {
            let Ok(read_dir) = std::fs::read_dir(&dir) else {
                continue;
            };
            let mut names: Vec<String> = read_dir
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.ends_with(DESKTOP_SUFFIX))
                .collect();
            names.sort();
            for name in names {
                if self.component_id(&name).is_some() {
                    continue;
                }
                let entry = match DesktopEntry::load(&dir.join(&name)) {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(entry = %name, error = %e, "skipping unreadable desktop entry");
                        continue;
                    }
                };
                if entry.no_display {
                    continue;
                }
                self.add_service_component(entry, None)?;
            }
        }
        Ok(())
    }

    /// Stand-in for the application database query: pick up application
    /// entries that declare default shortcut lists.
    fn scan_application_dirs(&mut self) -> Result<()> {
        for dir in self.application_dirs.clone() {
            let Ok(read_dir) = std::fs::read_dir(&dir) else {
                continue;
            };
            let mut names: Vec<String> = read_dir
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.ends_with(DESKTOP_SUFFIX))
                .collect();
            names.sort();
            for name in names {
                if self.component_id(&name).is_some() {
                    continue;
                }
                let Ok(entry) = DesktopEntry::load(&dir.join(&name)) else {
                    continue;
                };
                if !entry.declares_shortcuts() {
                    continue;
                }
                self.add_service_component(entry, None)?;
            }
        }
        Ok(())
    }

    /// Serializes every component back to the configuration and syncs it.
    /// Components with no shortcuts at all lose their group and are dropped
    /// from memory.
    pub fn write_settings(&mut self) -> Result<()> {
        let snapshot: Vec<(usize, String, bool, bool)> = self
            .components
            .iter()
            .map(|(id, c)| {
                (
                    id,
                    c.unique_name().to_string(),
                    c.is_service(),
                    c.has_no_shortcuts(),
                )
            })
            .collect();

        for (id, name, is_service, empty) in snapshot {
            if empty {
                debug!(component = %name, "dropping component without shortcuts");
                if is_service {
                    self.config
                        .root_mut()
                        .group_mut(SERVICES_GROUP)
                        .remove_group(&name);
                } else {
                    self.config.root_mut().remove_group(&name);
                }
                self.components.remove(id);
                continue;
            }
            if is_service {
                self.write_service_component(id, &name);
            } else {
                self.write_client_component(id, &name);
            }
        }

        if self.config.path().is_some() {
            self.config.sync()?;
        }
        Ok(())
    }

    fn write_client_component(&mut self, id: usize, name: &str) {
        // Collect first so the component borrow ends before the config is
        // touched.
        let comp = self.components.get(id).expect("live component");
        let friendly = comp.friendly_name().to_string();
        let mut sections: Vec<(Option<String>, Vec<(String, String)>)> = Vec::new();
        for (_, ctx) in comp.contexts() {
            let mut entries = Vec::new();
            for (_, shortcut) in ctx.shortcuts() {
                // Fresh and session shortcuts are never persisted.
                if shortcut.is_fresh() || shortcut.is_session_shortcut() {
                    continue;
                }
                entries.push((
                    shortcut.unique_name().to_string(),
                    encode_triple(
                        shortcut.keys(),
                        shortcut.default_keys(),
                        shortcut.friendly_name(),
                    ),
                ));
            }
            let section = if ctx.unique_name() == DEFAULT_CONTEXT {
                None
            } else {
                Some(ctx.unique_name().to_string())
            };
            sections.push((section, entries));
        }

        let group = self.config.root_mut().group_mut(name);
        group.clear();
        group.set_entry(FRIENDLY_NAME_KEY, friendly);
        for (section, entries) in sections {
            let target = match &section {
                None => &mut *group,
                Some(context) => group.group_mut(context),
            };
            for (key, value) in entries {
                target.set_entry(&key, value);
            }
        }
    }

    fn write_service_component(&mut self, id: usize, name: &str) {
        let comp = self.components.get(id).expect("live component");
        let mut sections: Vec<(Option<String>, Vec<(String, String)>)> = Vec::new();
        for (_, ctx) in comp.contexts() {
            let mut entries = Vec::new();
            for (_, shortcut) in ctx.shortcuts() {
                if shortcut.is_fresh() || shortcut.is_session_shortcut() {
                    continue;
                }
                // Only deviations from the declared default are stored.
                if !same_keys(shortcut.keys(), shortcut.default_keys()) {
                    entries.push((
                        shortcut.unique_name().to_string(),
                        format_list(shortcut.keys()),
                    ));
                }
            }
            let section = if ctx.unique_name() == DEFAULT_CONTEXT {
                None
            } else {
                Some(ctx.unique_name().to_string())
            };
            sections.push((section, entries));
        }

        let group = self
            .config
            .root_mut()
            .group_mut(SERVICES_GROUP)
            .group_mut(name);
        group.clear();
        for (section, entries) in sections {
            let target = match &section {
                None => &mut *group,
                Some(context) => group.group_mut(context),
            };
            for (key, value) in entries {
                target.set_entry(&key, value);
            }
        }
    }
}

/// Compares two key lists modulo normalization and empty-sequence noise.
pub(crate) fn same_keys(a: &[KeySequence], b: &[KeySequence]) -> bool {
    let squash = |list: &[KeySequence]| -> Vec<KeySequence> {
        list.iter()
            .filter(|seq| !seq.is_empty())
            .map(normalize)
            .collect()
    };
    squash(a) == squash(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_roundtrip() {
        let keys = parse_list("Ctrl+T").unwrap();
        let defaults = parse_list("Ctrl+T;Alt+T").unwrap();
        let encoded = encode_triple(&keys, &defaults, "Toggle Thing");
        assert_eq!(encoded, "Ctrl+T\tCtrl+T;Alt+T\tToggle Thing");
        let (k, d, f) = decode_triple("Toggle", &encoded).unwrap();
        assert_eq!(k, keys);
        assert_eq!(d, defaults);
        assert_eq!(f, "Toggle Thing");
    }

    #[test]
    fn decode_tolerates_missing_fields() {
        let (k, d, f) = decode_triple("a", "none").unwrap();
        assert!(k.is_empty());
        assert!(d.is_empty());
        assert_eq!(f, "");
    }

    #[test]
    fn decode_reports_bad_tokens() {
        let err = decode_triple("a", "Ctrl+Bogus\tnone\tX").unwrap_err();
        assert!(matches!(err, Error::MalformedConfig { .. }));
    }

    #[test]
    fn same_keys_ignores_empties_and_spelling() {
        let a = parse_list("Control+T").unwrap();
        let b = vec![KeySequence::empty(), parse_list("Ctrl+T").unwrap().remove(0)];
        assert!(same_keys(&a, &b));
        assert!(!same_keys(&a, &parse_list("Ctrl+U").unwrap()));
    }
}
