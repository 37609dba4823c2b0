//! The `move` subcommand: relocate or rename groups and entries.
//!
//! Entry values are moved as opaque strings; the tool never interprets key
//! tokens. Groups under `services/*` store only the shortcut string, all
//! others the `<shortcut>\t<default>\t<display>` triple. Entries named
//! `_k_friendly_name` are skipped, and source groups left empty (or holding
//! only the friendly name) are deleted.

use std::path::{Path, PathBuf};

use cfgtree::ConfigFile;
use hotkeyd_registry::DesktopEntry;
use tracing::debug;

use crate::{MoveArgs, select};

const FRIENDLY_NAME_KEY: &str = "_k_friendly_name";
const SERVICES_GROUP: &str = "services";
const NONE_TOKEN: &str = "none";

/// Where moved entries derive their target fields from.
struct Target {
    path: Vec<String>,
    /// Append the source basename to `path` for each source group.
    keep_basename: bool,
    action: Option<String>,
    default_shortcut: Option<String>,
    display_name: Option<String>,
}

pub fn run(args: &MoveArgs) -> Result<(), String> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = ConfigFile::open(&config_path).map_err(|e| e.to_string())?;

    let sources = select::select_components(&config, &args.source_component)?;
    if sources.is_empty() {
        debug!("no matching source groups, nothing to do");
        return Ok(());
    }

    let target = resolve_target(args, &sources)?;

    for source in &sources {
        let mut path = target.path.clone();
        if target.keep_basename {
            path.push(source.last().expect("paths are non-empty").clone());
        }
        let actions: Vec<String> = match &args.source_action {
            Some(action) => vec![action.clone()],
            None => {
                let segments: Vec<&str> = source.iter().map(String::as_str).collect();
                config
                    .group_at(&segments)
                    .map(|g| g.entry_keys())
                    .unwrap_or_default()
            }
        };
        for action in actions {
            move_entry(&mut config, source, &action, &path, &target);
        }
        delete_if_spent(&mut config, source);
    }

    config.sync().map_err(|e| e.to_string())
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hotkeydrc")
}

fn resolve_target(args: &MoveArgs, sources: &[Vec<String>]) -> Result<Target, String> {
    if let Some(component) = &args.target_component {
        let keep_basename = component.ends_with('/');
        let path = select::path_segments(component);
        if path.is_empty() {
            return Err("invalid target component".to_string());
        }
        return Ok(Target {
            path,
            keep_basename,
            action: args.target_action.clone(),
            default_shortcut: None,
            display_name: None,
        });
    }

    let file = args
        .target_desktop_file
        .as_ref()
        .expect("clap enforces one target");
    if sources.len() > 1 {
        return Err("expected one source component for a desktop-file target".to_string());
    }
    let path = locate_desktop_file(file)?;
    let entry = DesktopEntry::load(&path).map_err(|e| e.to_string())?;

    let (action, default_shortcut, display_name) = match &args.target_desktop_file_action {
        Some(name) => {
            let action = entry
                .action(name)
                .ok_or_else(|| format!("action {:?} does not exist in {}", name, entry.id))?;
            (
                Some(name.clone()),
                Some(keyspec::format_list(&action.default_shortcuts)),
                Some(action.text.clone()),
            )
        }
        None if !entry.default_shortcuts.is_empty() => (
            Some(hotkeyd_registry::LAUNCH_ACTION.to_string()),
            Some(keyspec::format_list(&entry.default_shortcuts)),
            Some(entry.name.clone()),
        ),
        None => (None, None, None),
    };

    Ok(Target {
        path: vec![SERVICES_GROUP.to_string(), entry.id.clone()],
        keep_basename: false,
        action,
        default_shortcut,
        display_name,
    })
}

fn locate_desktop_file(file: &str) -> Result<PathBuf, String> {
    let direct = Path::new(file);
    if direct.is_absolute() {
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }
        return Err(format!("{} is not a desktop file", file));
    }
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(data) = dirs::data_dir() {
        candidates.push(data.join("hotkeyd").join(file));
    }
    let system = std::env::var("XDG_DATA_DIRS")
        .unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string());
    for dir in system.split(':').filter(|d| !d.is_empty()) {
        candidates.push(PathBuf::from(dir).join("hotkeyd").join(file));
    }
    candidates
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| format!("{} is not a desktop file", file))
}

/// Moves one entry from `source` into the target group. Mirrors the stored
/// value into the destination's format and deletes the source entry.
fn move_entry(
    config: &mut ConfigFile,
    source: &[String],
    action: &str,
    target_path: &[String],
    target: &Target,
) {
    if action == FRIENDLY_NAME_KEY {
        return;
    }
    let source_segments: Vec<&str> = source.iter().map(String::as_str).collect();
    let Some(value) = config
        .group_at(&source_segments)
        .and_then(|g| g.entry(action))
        .map(str::to_string)
    else {
        return;
    };

    let mut fields = value.splitn(3, '\t');
    let shortcut = match fields.next() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => NONE_TOKEN.to_string(),
    };
    let stored_default = fields.next().unwrap_or("").to_string();
    let stored_display = fields.next().unwrap_or("").to_string();

    let default_shortcut = match &target.default_shortcut {
        Some(default) if !default.is_empty() => default.clone(),
        _ if !stored_default.is_empty() => stored_default,
        _ => NONE_TOKEN.to_string(),
    };

    let entry_name = target
        .action
        .clone()
        .unwrap_or_else(|| action.to_string());

    let target_segments: Vec<&str> = target_path.iter().map(String::as_str).collect();
    let services_format = target_path.first().map(String::as_str) == Some(SERVICES_GROUP);

    config
        .group_at_mut(&source_segments)
        .remove_entry(action);

    if services_format {
        // Compact services format: the shortcut alone, defaults implicit.
        if shortcut != default_shortcut {
            config
                .group_at_mut(&target_segments)
                .set_entry(&entry_name, shortcut);
        }
    } else {
        let display = match &target.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => stored_display,
        };
        config.group_at_mut(&target_segments).set_entry(
            &entry_name,
            format!("{}\t{}\t{}", shortcut, default_shortcut, display),
        );
    }
}

/// Deletes a source group that holds nothing but its friendly name.
fn delete_if_spent(config: &mut ConfigFile, source: &[String]) {
    let segments: Vec<&str> = source.iter().map(String::as_str).collect();
    let spent = config
        .group_at(&segments)
        .map(|g| {
            g.group_names().is_empty()
                && g.entry_keys().iter().all(|k| k == FRIENDLY_NAME_KEY)
        })
        .unwrap_or(false);
    if !spent {
        return;
    }
    let (last, parent) = segments.split_last().expect("paths are non-empty");
    if parent.is_empty() {
        config.root_mut().remove_group(last);
    } else {
        config.group_at_mut(parent).remove_group(last);
    }
}
