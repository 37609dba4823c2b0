//! Startup configuration migrations.
//!
//! Both passes run unconditionally at every startup, before the settings are
//! loaded, and are idempotent against an already-migrated file:
//!
//! 1. the hot-keys migration converts legacy `Data_<i>` action groups into
//!    synthesized desktop entries and moves their shortcut out of the
//!    `khotkeys` indirection group into `services/<uuid>.desktop`;
//! 2. the service-action migration projects top-level `.desktop` component
//!    groups into the `services` group, keeping only entries whose stored
//!    keys differ from the stored default.

use std::{fs, path::Path};

use cfgtree::ConfigFile;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    Result,
    desktop::LAUNCH_ACTION,
    persist::{DESKTOP_SUFFIX, FRIENDLY_NAME_KEY, SERVICES_GROUP, decode_triple, same_keys},
    registry::Registry,
};

impl Registry {
    /// Runs the startup migrations in order, syncing the configuration when
    /// anything changed. `hotkeys` is the legacy hot-keys file, if present;
    /// `data_dir` is where synthesized desktop entries are written.
    pub fn run_startup_migrations(
        &mut self,
        hotkeys: Option<&ConfigFile>,
        data_dir: &Path,
    ) -> Result<()> {
        let mut changed = false;
        if let Some(hotkeys) = hotkeys {
            changed |= migrate_hotkeys(&mut self.config, hotkeys, data_dir)?;
        }
        changed |= migrate_service_groups(&mut self.config);
        if changed && self.config.path().is_some() {
            self.config.sync()?;
        }
        Ok(())
    }
}

/// Builds the Exec line capturing a legacy action: the command itself, or a
/// bus call rendered through `gdbus`.
fn exec_for_action(group: &cfgtree::Group) -> Option<String> {
    match group.entry("Type") {
        Some("COMMAND_URL") => group.entry("CommandURL").map(str::to_string),
        Some("DBUS") => {
            let app = group.entry("RemoteApp")?;
            let object = group.entry("RemoteObj")?;
            let call = group.entry("Call")?;
            let mut exec = format!(
                "gdbus call --session --dest {} --object-path {} --method {}",
                app, object, call
            );
            if let Some(arguments) = group.entry("Arguments") {
                if !arguments.is_empty() {
                    exec.push(' ');
                    exec.push_str(arguments);
                }
            }
            Some(exec)
        }
        _ => None,
    }
}

/// Hot-key migration pass. Returns whether the configuration changed.
pub fn migrate_hotkeys(
    config: &mut ConfigFile,
    hotkeys: &ConfigFile,
    data_dir: &Path,
) -> Result<bool> {
    let mut changed = false;
    let entry_dir = data_dir.join("hotkeyd");

    for group_name in hotkeys.root().group_names() {
        let Some(index) = group_name.strip_prefix("Data_") else {
            continue;
        };
        if index.parse::<u32>().is_err() {
            continue;
        }
        let group = hotkeys.root().group(&group_name).expect("listed group");
        if group.entry("Type") != Some("SIMPLE_ACTION_DATA") {
            continue;
        }
        let Some(display_name) = group.entry("Name") else {
            warn!(group = %group_name, "legacy action without a name, skipping");
            continue;
        };

        let uuid = hotkeys
            .root()
            .group(&format!("{}Triggers0", group_name))
            .and_then(|g| g.entry("Uuid"))
            .map(|u| u.trim_matches(['{', '}']).to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let Some(exec) = hotkeys
            .root()
            .group(&format!("{}Actions0", group_name))
            .and_then(exec_for_action)
        else {
            warn!(group = %group_name, "legacy action without a command, skipping");
            continue;
        };

        let file_name = format!("{}.desktop", uuid);
        let entry_path = entry_dir.join(&file_name);
        if !entry_path.exists() {
            debug!(entry = %file_name, "synthesizing desktop entry for legacy action");
            fs::create_dir_all(&entry_dir)?;
            fs::write(
                &entry_path,
                format!(
                    "[Desktop Entry]\nType=Application\nName={}\nExec={}\nNoDisplay=true\n",
                    display_name, exec
                ),
            )?;
            changed = true;
        }

        // Move the shortcut out of the khotkeys indirection group.
        let braced = format!("{{{}}}", uuid);
        let stored = config.root().group("khotkeys").and_then(|g| {
            g.entry(&braced)
                .or_else(|| g.entry(&uuid))
                .map(str::to_string)
        });
        if let Some(value) = stored {
            let keys_token = value.split('\t').next().unwrap_or("none").to_string();
            if !keys_token.is_empty() && !keys_token.eq_ignore_ascii_case("none") {
                config
                    .group_at_mut(&[SERVICES_GROUP, &file_name])
                    .set_entry(LAUNCH_ACTION, keys_token);
            }
            let khotkeys = config.root_mut().group_mut("khotkeys");
            khotkeys.remove_entry(&braced);
            khotkeys.remove_entry(&uuid);
            let only_friendly = khotkeys
                .entry_keys()
                .iter()
                .all(|k| k == FRIENDLY_NAME_KEY);
            if only_friendly && khotkeys.group_names().is_empty() {
                config.root_mut().remove_group("khotkeys");
            }
            changed = true;
        }
    }
    Ok(changed)
}

/// Service-action split pass. Returns whether the configuration changed.
pub fn migrate_service_groups(config: &mut ConfigFile) -> bool {
    let names: Vec<String> = config
        .root()
        .group_names()
        .into_iter()
        .filter(|name| name.ends_with(DESKTOP_SUFFIX))
        .collect();
    if names.is_empty() {
        return false;
    }

    for name in names {
        debug!(component = %name, "splitting desktop component into services");
        let source = config.root().group(&name).expect("listed group").clone();

        let mut projected: Vec<(Option<String>, Vec<(String, String)>)> = Vec::new();
        projected.push((None, project_entries(&source)));
        for context in source.group_names() {
            let context_group = source.group(&context).expect("listed group");
            projected.push((Some(context), project_entries(context_group)));
        }

        for (section, entries) in projected {
            if entries.is_empty() {
                continue;
            }
            let target = match &section {
                None => config.group_at_mut(&[SERVICES_GROUP, &name]),
                Some(context) => config.group_at_mut(&[SERVICES_GROUP, &name, context]),
            };
            for (key, value) in entries {
                target.set_entry(&key, value);
            }
        }
        config.root_mut().remove_group(&name);
    }
    true
}

/// Projects triple-format entries to the compact services format, keeping
/// only deviations from the stored default.
fn project_entries(group: &cfgtree::Group) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, value) in group.entries() {
        if key == FRIENDLY_NAME_KEY {
            continue;
        }
        match decode_triple(key, value) {
            Ok((keys, defaults, _)) => {
                if !same_keys(&keys, &defaults) {
                    out.push((key.to_string(), keyspec::format_list(&keys)));
                }
            }
            Err(e) => warn!(entry = key, error = %e, "skipping malformed entry in migration"),
        }
    }
    out
}
