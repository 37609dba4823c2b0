//! Desktop-entry model and the launching seam service components use.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
};

use keyspec::KeySequence;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Attribute carrying the default shortcut list of an entry or action.
pub const SHORTCUTS_KEY: &str = "X-Hotkeyd-Shortcuts";
/// Attribute distinguishing launchable applications from passive services.
pub const SHORTCUT_TYPE_KEY: &str = "X-Hotkeyd-ShortcutType";
/// Action name used for an entry's top-level launch shortcut.
pub const LAUNCH_ACTION: &str = "_launch";

/// One declared sub-action of a desktop entry.
#[derive(Debug, Clone)]
pub struct DesktopAction {
    /// Action identifier from the `Actions=` list.
    pub name: String,
    /// Presentation name.
    pub text: String,
    /// Command line, with field codes still embedded.
    pub exec: Option<String>,
    /// Declared default shortcut list.
    pub default_shortcuts: Vec<KeySequence>,
}

/// A parsed desktop entry, reduced to what the service-action component
/// consumes.
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    /// Storage id: the file basename including the `.desktop` suffix.
    pub id: String,
    /// Source file path.
    pub path: PathBuf,
    /// Entry name.
    pub name: String,
    /// Hidden entries are skipped by the data-directory scan.
    pub no_display: bool,
    /// Top-level command line.
    pub exec: Option<String>,
    /// When false the entry declares no top-level launch shortcut
    /// (its type is `Service`); sub-actions still apply.
    pub launchable: bool,
    /// Declared default shortcut list for the launch action.
    pub default_shortcuts: Vec<KeySequence>,
    /// Declared sub-actions.
    pub actions: Vec<DesktopAction>,
}

impl DesktopEntry {
    /// Parses a desktop file. Missing files map to
    /// [`Error::MissingDesktopEntry`].
    pub fn load(path: &Path) -> Result<DesktopEntry> {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !path.is_file() {
            return Err(Error::MissingDesktopEntry(id));
        }
        let text = std::fs::read_to_string(path)?;
        let tree = parse_ini(&text);

        let main = tree
            .iter()
            .find(|(name, _)| name == "Desktop Entry")
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or(&[]);

        let lookup = |entries: &[(String, String)], key: &str| -> Option<String> {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        let mut actions = Vec::new();
        for action_name in list_attr(lookup(main, "Actions").as_deref().unwrap_or("")) {
            let group_name = format!("Desktop Action {}", action_name);
            let Some((_, entries)) = tree.iter().find(|(name, _)| *name == group_name) else {
                warn!(entry = %id, action = %action_name, "declared action has no group");
                continue;
            };
            actions.push(DesktopAction {
                name: action_name.clone(),
                text: lookup(entries, "Name").unwrap_or_else(|| action_name.clone()),
                exec: lookup(entries, "Exec"),
                default_shortcuts: parse_shortcuts_attr(
                    lookup(entries, SHORTCUTS_KEY).as_deref().unwrap_or(""),
                ),
            });
        }

        let shortcut_type = lookup(main, SHORTCUT_TYPE_KEY).unwrap_or_default();
        Ok(DesktopEntry {
            id,
            path: path.to_path_buf(),
            name: lookup(main, "Name").unwrap_or_default(),
            no_display: lookup(main, "NoDisplay").as_deref() == Some("true"),
            exec: lookup(main, "Exec"),
            // Type can be Application or Service; assume Application when unset.
            launchable: shortcut_type.is_empty() || shortcut_type == "Application",
            default_shortcuts: parse_shortcuts_attr(
                lookup(main, SHORTCUTS_KEY).as_deref().unwrap_or(""),
            ),
            actions,
        })
    }

    /// Finds a declared action by name.
    pub fn action(&self, name: &str) -> Option<&DesktopAction> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// True when the entry or any of its actions declares default shortcuts.
    pub fn declares_shortcuts(&self) -> bool {
        !self.default_shortcuts.is_empty()
            || self.actions.iter().any(|a| !a.default_shortcuts.is_empty())
    }
}

/// Parses a `;`/`,`-separated shortcut attribute, skipping bad tokens.
pub fn parse_shortcuts_attr(attr: &str) -> Vec<KeySequence> {
    attr.split([';', ','])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match KeySequence::parse(token) {
            Ok(seq) if !seq.is_empty() => Some(seq),
            Ok(_) => None,
            Err(e) => {
                warn!(token, error = %e, "skipping unparseable shortcut attribute");
                None
            }
        })
        .collect()
}

fn list_attr(attr: &str) -> Vec<String> {
    attr.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Flat INI parse preserving group order; desktop files have no nesting.
fn parse_ini(text: &str) -> Vec<(String, Vec<(String, String)>)> {
    let mut groups: Vec<(String, Vec<(String, String)>)> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            groups.push((name.to_string(), Vec::new()));
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if let Some((_, entries)) = groups.last_mut() {
                entries.push((key.trim().to_string(), value.trim().to_string()));
            }
        }
    }
    groups
}

/// Seam through which a service-action component starts its target.
///
/// The daemon installs [`CommandLauncher`]; tests install
/// [`RecordingLauncher`]. Desktop entries under the daemon's data directory
/// are system-provided, so no untrusted-program confirmation is raised.
pub trait Launcher: Send {
    /// Launches `entry`, or one of its declared actions when `action` names
    /// one.
    fn launch(&mut self, entry: &DesktopEntry, action: Option<&str>) -> Result<()>;
}

/// Spawns the entry's command line detached from the daemon.
#[derive(Debug, Default)]
pub struct CommandLauncher;

impl Launcher for CommandLauncher {
    fn launch(&mut self, entry: &DesktopEntry, action: Option<&str>) -> Result<()> {
        let exec = match action {
            Some(name) => entry
                .action(name)
                .and_then(|a| a.exec.clone())
                .or_else(|| entry.exec.clone()),
            None => entry.exec.clone(),
        }
        .ok_or_else(|| Error::Launch(format!("{} declares no Exec line", entry.id)))?;

        let argv = split_exec(&exec);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Launch(format!("{} has an empty Exec line", entry.id)))?;

        debug!(entry = %entry.id, ?action, %exec, "launching");
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Launch(format!("{}: {}", entry.id, e)))?;
        Ok(())
    }
}

/// Splits an Exec line into argv, honoring double quotes and dropping
/// `%`-field codes.
fn split_exec(exec: &str) -> Vec<String> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = exec.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '%' if !in_quotes => {
                // Field codes (%f, %u, %%, ...) are launcher placeholders.
                if chars.peek() == Some(&'%') {
                    chars.next();
                    current.push('%');
                } else {
                    chars.next();
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    argv.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        argv.push(current);
    }
    argv
}

/// Records launch requests instead of spawning processes.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    launches: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl RecordingLauncher {
    /// A fresh recorder.
    pub fn new() -> RecordingLauncher {
        RecordingLauncher::default()
    }

    /// The `(entry id, action)` pairs launched so far.
    pub fn launches(&self) -> Vec<(String, Option<String>)> {
        self.launches.lock().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&mut self, entry: &DesktopEntry, action: Option<&str>) -> Result<()> {
        self.launches
            .lock()
            .push((entry.id.clone(), action.map(str::to_string)));
        Ok(())
    }
}
