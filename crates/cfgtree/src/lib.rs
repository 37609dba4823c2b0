//! Grouped INI-like configuration store.
//!
//! The on-disk format is line based: `[group]` and nested `[group][sub]`
//! headers introduce groups, `key=value` lines add entries to the current
//! group, `#` starts a comment. Groups and entries keep insertion order.
//! Tabs, newlines and backslashes in values are escaped, so tab-separated
//! entry payloads survive the round trip.
//!
//! Saving is atomic at file granularity: the serialized tree is written to a
//! sibling temp file, synced, then renamed over the target.
#![warn(missing_docs)]

use std::{
    fs,
    fs::File,
    io,
    io::Write,
    path::{Path, PathBuf},
    result::Result as StdResult,
};

use thiserror::Error;
use tracing::warn;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A line that is neither a header, an entry, a comment nor blank.
    #[error("malformed line {line}: {text:?}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        text: String,
    },
    /// A save was requested on an in-memory tree with no backing path.
    #[error("configuration has no backing file")]
    NoPath,
}

/// One group: ordered entries plus ordered sub-groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    entries: Vec<(String, String)>,
    groups: Vec<(String, Group)>,
}

impl Group {
    /// Looks up an entry value.
    pub fn entry(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets or replaces an entry, preserving its position when replacing.
    pub fn set_entry(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Removes an entry, returning its previous value.
    pub fn remove_entry(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Iterates `(key, value)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entry keys in insertion order.
    pub fn entry_keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Immutable access to a sub-group.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    /// Mutable access to a sub-group, creating it when absent.
    pub fn group_mut(&mut self, name: &str) -> &mut Group {
        if let Some(idx) = self.groups.iter().position(|(n, _)| n == name) {
            return &mut self.groups[idx].1;
        }
        self.groups.push((name.to_string(), Group::default()));
        &mut self.groups.last_mut().unwrap().1
    }

    /// Deletes a sub-group and everything under it.
    pub fn remove_group(&mut self, name: &str) -> bool {
        let Some(idx) = self.groups.iter().position(|(n, _)| n == name) else {
            return false;
        };
        self.groups.remove(idx);
        true
    }

    /// Sub-group names in insertion order.
    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|(n, _)| n.clone()).collect()
    }

    /// True when the group holds neither entries nor sub-groups.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.groups.is_empty()
    }

    /// Clears entries and sub-groups.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.groups.clear();
    }

    fn serialize_into(&self, path: &[String], out: &mut String) {
        if !self.entries.is_empty() && !path.is_empty() {
            for segment in path {
                out.push('[');
                out.push_str(segment);
                out.push(']');
            }
            out.push('\n');
            for (key, value) in &self.entries {
                out.push_str(key);
                out.push('=');
                out.push_str(&escape(value));
                out.push('\n');
            }
            out.push('\n');
        }
        for (name, group) in &self.groups {
            let mut child = path.to_vec();
            child.push(name.clone());
            group.serialize_into(&child, out);
        }
    }
}

/// A configuration tree, optionally backed by a file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    path: Option<PathBuf>,
    root: Group,
}

impl ConfigFile {
    /// An empty tree with no backing file. [`ConfigFile::sync`] will fail
    /// until a path is attached.
    pub fn in_memory() -> ConfigFile {
        ConfigFile::default()
    }

    /// Opens `path`, parsing it when it exists; a missing file yields an
    /// empty tree that will be created on the first sync.
    pub fn open(path: impl Into<PathBuf>) -> Result<ConfigFile> {
        let path = path.into();
        let root = match fs::read_to_string(&path) {
            Ok(text) => parse(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Group::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(ConfigFile {
            path: Some(path),
            root,
        })
    }

    /// The backing path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Attaches or replaces the backing path.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// The root group.
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Mutable root group.
    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    /// Resolves a slash-free group path, e.g. `["services", "a.desktop"]`.
    pub fn group_at(&self, segments: &[&str]) -> Option<&Group> {
        let mut current = &self.root;
        for segment in segments {
            current = current.group(segment)?;
        }
        Some(current)
    }

    /// Resolves a group path mutably, creating missing groups.
    pub fn group_at_mut(&mut self, segments: &[&str]) -> &mut Group {
        let mut current = &mut self.root;
        for segment in segments {
            current = current.group_mut(segment);
        }
        current
    }

    /// Serializes the tree to its text form.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.root.serialize_into(&[], &mut out);
        out
    }

    /// Atomically writes the tree to the backing file and syncs it.
    pub fn sync(&self) -> Result<()> {
        let path = self.path.as_ref().ok_or(Error::NoPath)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        let tmp = path.with_file_name(format!("{}.new", file_name));
        {
            let mut file = File::create(&tmp)?;
            file.write_all(self.to_text().as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                warn!("unknown escape \\{} in config value", other);
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn parse_header(line: &str, number: usize) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut rest = line;
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.split_once(']'))
            .ok_or_else(|| Error::Malformed {
                line: number,
                text: line.to_string(),
            })?;
        segments.push(inner.0.to_string());
        rest = inner.1;
    }
    if segments.is_empty() {
        return Err(Error::Malformed {
            line: number,
            text: line.to_string(),
        });
    }
    Ok(segments)
}

fn parse(text: &str) -> Result<Group> {
    let mut root = Group::default();
    let mut current: Vec<String> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            current = parse_header(line, idx + 1)?;
            // Materialize the group even if it stays empty.
            let mut group = &mut root;
            for segment in &current {
                group = group.group_mut(segment);
            }
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::Malformed {
                line: idx + 1,
                text: line.to_string(),
            });
        };
        let mut group = &mut root;
        for segment in &current {
            group = group.group_mut(segment);
        }
        group.set_entry(key.trim(), unescape(value));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested_groups() {
        let text = "\
[alpha]
one=1
_k_friendly_name=Alpha

[alpha][ctx]
two=2

[services][org.example.app.desktop]
_launch=Ctrl+T
";
        let mut cfg = ConfigFile::in_memory();
        *cfg.root_mut() = parse(text).unwrap();
        assert_eq!(cfg.group_at(&["alpha"]).unwrap().entry("one"), Some("1"));
        assert_eq!(
            cfg.group_at(&["alpha", "ctx"]).unwrap().entry("two"),
            Some("2")
        );
        assert_eq!(
            cfg.group_at(&["services", "org.example.app.desktop"])
                .unwrap()
                .entry("_launch"),
            Some("Ctrl+T")
        );
    }

    #[test]
    fn tabs_survive_round_trip() {
        let mut cfg = ConfigFile::in_memory();
        cfg.group_at_mut(&["comp"])
            .set_entry("Toggle", "Ctrl+T\tCtrl+T\tToggle");
        let text = cfg.to_text();
        assert!(text.contains("Toggle=Ctrl+T\\tCtrl+T\\tToggle"));
        let reparsed = parse(&text).unwrap();
        assert_eq!(
            reparsed.group("comp").unwrap().entry("Toggle"),
            Some("Ctrl+T\tCtrl+T\tToggle")
        );
    }

    #[test]
    fn empty_groups_are_dropped_on_save() {
        let mut cfg = ConfigFile::in_memory();
        cfg.group_at_mut(&["ghost"]);
        cfg.group_at_mut(&["real"]).set_entry("a", "b");
        let reparsed = parse(&cfg.to_text()).unwrap();
        assert!(reparsed.group("ghost").is_none());
        assert!(reparsed.group("real").is_some());
    }

    #[test]
    fn remove_group_and_entry() {
        let mut cfg = ConfigFile::in_memory();
        cfg.group_at_mut(&["a"]).set_entry("x", "1");
        cfg.group_at_mut(&["a", "b"]).set_entry("y", "2");
        assert_eq!(cfg.root_mut().group_mut("a").remove_entry("x").as_deref(), Some("1"));
        assert!(cfg.root_mut().group_mut("a").remove_group("b"));
        assert!(!cfg.root_mut().group_mut("a").remove_group("b"));
        assert!(cfg.group_at(&["a"]).unwrap().is_empty());
    }

    #[test]
    fn malformed_line_errors() {
        assert!(matches!(
            parse("not an entry\n"),
            Err(Error::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            parse("[unterminated\n"),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let cfg = ConfigFile::open(&path).unwrap();
        assert!(cfg.root().is_empty());
    }

    #[test]
    fn sync_then_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcutsrc");
        let mut cfg = ConfigFile::open(&path).unwrap();
        cfg.group_at_mut(&["comp"]).set_entry("action", "Alt+F1\tnone\tSwitch");
        cfg.group_at_mut(&["services", "a.desktop"]).set_entry("_launch", "Meta+E");
        cfg.sync().unwrap();

        let reopened = ConfigFile::open(&path).unwrap();
        assert_eq!(
            reopened.group_at(&["comp"]).unwrap().entry("action"),
            Some("Alt+F1\tnone\tSwitch")
        );
        assert_eq!(
            reopened
                .group_at(&["services", "a.desktop"])
                .unwrap()
                .entry("_launch"),
            Some("Meta+E")
        );
    }

    #[test]
    fn in_memory_sync_fails() {
        let cfg = ConfigFile::in_memory();
        assert!(matches!(cfg.sync(), Err(Error::NoPath)));
    }
}
