//! Settings round-trips over a real temporary config file.

use std::collections::BTreeMap;

use capture::TestBackend;
use cfgtree::ConfigFile;
use hotkeyd_registry::{RecordingLauncher, Registry};
use keyspec::parse_list;
use tempfile::TempDir;

fn registry_with_config(config: ConfigFile) -> Registry {
    let (registry, _events) = Registry::new(
        Some(Box::new(TestBackend::new())),
        config,
        Box::new(RecordingLauncher::new()),
    );
    registry
}

/// (component, context, action) → keys string, for comparison.
fn binding_map(registry: &Registry) -> BTreeMap<(String, String, String), String> {
    let mut map = BTreeMap::new();
    for (_, component) in registry.components() {
        for (_, context) in component.contexts() {
            for (_, shortcut) in context.shortcuts() {
                if shortcut.is_fresh() || shortcut.is_session_shortcut() {
                    continue;
                }
                map.insert(
                    (
                        component.unique_name().to_string(),
                        context.unique_name().to_string(),
                        shortcut.unique_name().to_string(),
                    ),
                    keyspec::format_list(shortcut.keys()),
                );
            }
        }
    }
    map
}

#[test]
fn load_after_write_is_identity_modulo_fresh_and_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shortcutsrc");

    let mut registry = registry_with_config(ConfigFile::open(&path).unwrap());

    let editor = registry
        .client_register("org.example.editor", "Editor", "save-all", "Save All", "", false)
        .unwrap();
    registry
        .set_shortcut_keys(editor, parse_list("Ctrl+Alt+S").unwrap())
        .unwrap();

    // A second context on the same component.
    let modal = registry
        .client_register("org.example.editor", "Editor", "leave-mode", "Leave Mode", "modal", false)
        .unwrap();
    registry
        .set_shortcut_keys(modal, parse_list("Esc").unwrap())
        .unwrap();

    // Explicitly unbound action: persists as `none`.
    let unbound = registry
        .client_register("org.example.editor", "Editor", "rarely-used", "Rarely Used", "", false)
        .unwrap();
    registry.set_shortcut_keys(unbound, Vec::new()).unwrap();

    // Fresh (registered, keys never set) and session shortcuts must not
    // survive the round trip.
    registry
        .client_register("org.example.editor", "Editor", "fresh-one", "Fresh", "", false)
        .unwrap();
    let session = registry
        .client_register("org.example.editor", "Editor", "temp", "Temp", "", true)
        .unwrap();
    registry
        .set_shortcut_keys(session, parse_list("Meta+F2").unwrap())
        .unwrap();

    let second = registry
        .client_register("org.example.viewer", "Viewer", "zoom", "Zoom", "", false)
        .unwrap();
    registry
        .set_shortcut_keys(second, parse_list("Meta+Home;Ctrl+F2").unwrap())
        .unwrap();

    let before = binding_map(&registry);
    registry.write_settings().unwrap();
    drop(registry);

    let mut reloaded = registry_with_config(ConfigFile::open(&path).unwrap());
    reloaded.load_settings().unwrap();
    let after = binding_map(&reloaded);

    assert_eq!(before, after);
    // The filtered shortcuts are genuinely gone.
    assert!(reloaded.shortcut_keys("org.example.editor", "fresh-one").is_err());
    assert!(reloaded.shortcut_keys("org.example.editor", "temp").is_err());
    // The unbound action survived as unbound.
    assert_eq!(
        reloaded.shortcut_keys("org.example.editor", "rarely-used").unwrap(),
        Vec::<String>::new()
    );
}

#[test]
fn friendly_names_survive() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shortcutsrc");

    let mut registry = registry_with_config(ConfigFile::open(&path).unwrap());
    let handle = registry
        .client_register("org.example.editor", "My Editor", "save", "Save Document", "", false)
        .unwrap();
    registry
        .set_shortcut_keys(handle, parse_list("Ctrl+S").unwrap())
        .unwrap();
    registry.write_settings().unwrap();
    drop(registry);

    let mut reloaded = registry_with_config(ConfigFile::open(&path).unwrap());
    reloaded.load_settings().unwrap();
    let id = reloaded.component_id("org.example.editor").unwrap();
    let component = reloaded.component(id).unwrap();
    assert_eq!(component.friendly_name(), "My Editor");
    let handle = reloaded.find_action("org.example.editor", "save").unwrap();
    assert_eq!(
        reloaded.shortcut(handle).unwrap().friendly_name(),
        "Save Document"
    );
}

#[test]
fn component_without_shortcuts_is_dropped_on_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shortcutsrc");

    let mut registry = registry_with_config(ConfigFile::open(&path).unwrap());
    let handle = registry
        .client_register("org.example.ghost", "Ghost", "only", "Only", "", false)
        .unwrap();
    registry
        .set_shortcut_keys(handle, parse_list("Ctrl+G").unwrap())
        .unwrap();
    registry.write_settings().unwrap();
    assert!(registry.config().group_at(&["org.example.ghost"]).is_some());

    registry.unregister_action("org.example.ghost", "only").unwrap();
    registry.write_settings().unwrap();
    assert!(registry.config().group_at(&["org.example.ghost"]).is_none());
    assert!(registry.component_id("org.example.ghost").is_none());
}

#[test]
fn service_component_stores_only_deviations() {
    let dir = TempDir::new().unwrap();
    let services = dir.path().join("entries");
    std::fs::create_dir_all(&services).unwrap();
    std::fs::write(
        services.join("org.example.music.desktop"),
        "[Desktop Entry]\nName=Music\nExec=musicplayer\nX-Hotkeyd-Shortcuts=Meta+M\n",
    )
    .unwrap();
    let path = dir.path().join("shortcutsrc");

    let mut registry = registry_with_config(ConfigFile::open(&path).unwrap());
    registry.set_service_dirs(vec![services.clone()]);
    registry.load_settings().unwrap();

    // At the declared default: nothing stored.
    registry.write_settings().unwrap();
    assert!(
        registry
            .config()
            .group_at(&["services", "org.example.music.desktop"])
            .is_none_or(|g| g.entry("_launch").is_none())
    );

    // Deviate from the default: the keys list alone is stored.
    let handle = registry
        .find_action("org.example.music.desktop", "_launch")
        .unwrap();
    registry
        .set_shortcut_keys(handle, parse_list("Ctrl+Alt+M").unwrap())
        .unwrap();
    registry.write_settings().unwrap();
    assert_eq!(
        registry
            .config()
            .group_at(&["services", "org.example.music.desktop"])
            .unwrap()
            .entry("_launch"),
        Some("Ctrl+Alt+M")
    );
    drop(registry);

    // The stored deviation overrides the declared default on reload.
    let mut reloaded = registry_with_config(ConfigFile::open(&path).unwrap());
    reloaded.set_service_dirs(vec![services]);
    reloaded.load_settings().unwrap();
    assert_eq!(
        reloaded
            .shortcut_keys("org.example.music.desktop", "_launch")
            .unwrap(),
        vec!["Ctrl+Alt+M".to_string()]
    );
}

#[test]
fn missing_desktop_entry_component_is_not_instantiated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shortcutsrc");
    let mut config = ConfigFile::open(&path).unwrap();
    config
        .group_at_mut(&["services", "gone.desktop"])
        .set_entry("_launch", "Meta+G");
    config.sync().unwrap();

    let mut registry = registry_with_config(ConfigFile::open(&path).unwrap());
    registry.load_settings().unwrap();
    assert!(registry.component_id("gone.desktop").is_none());
}

#[test]
fn malformed_entries_are_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shortcutsrc");
    let mut config = ConfigFile::open(&path).unwrap();
    {
        let group = config.group_at_mut(&["org.example.editor"]);
        group.set_entry("_k_friendly_name", "Editor");
        group.set_entry("good", "Ctrl+G\tCtrl+G\tGood");
        group.set_entry("bad", "Ctrl+Bogus\tnone\tBad");
    }
    config.sync().unwrap();

    let mut registry = registry_with_config(ConfigFile::open(&path).unwrap());
    registry.load_settings().unwrap();
    assert_eq!(
        registry.shortcut_keys("org.example.editor", "good").unwrap(),
        vec!["Ctrl+G".to_string()]
    );
    assert!(registry.shortcut_keys("org.example.editor", "bad").is_err());
}

#[test]
fn no_display_entries_are_skipped_by_the_scan() {
    let dir = TempDir::new().unwrap();
    let services = dir.path().join("entries");
    std::fs::create_dir_all(&services).unwrap();
    std::fs::write(
        services.join("hidden.desktop"),
        "[Desktop Entry]\nName=Hidden\nExec=hidden\nNoDisplay=true\n",
    )
    .unwrap();

    let mut registry = registry_with_config(ConfigFile::in_memory());
    registry.set_service_dirs(vec![services]);
    registry.load_settings().unwrap();
    assert!(registry.component_id("hidden.desktop").is_none());
}

#[test]
fn application_scan_requires_declared_shortcuts() {
    let dir = TempDir::new().unwrap();
    let apps = dir.path().join("applications");
    std::fs::create_dir_all(&apps).unwrap();
    std::fs::write(
        apps.join("plain.desktop"),
        "[Desktop Entry]\nName=Plain\nExec=plain\n",
    )
    .unwrap();
    std::fs::write(
        apps.join("declared.desktop"),
        "[Desktop Entry]\nName=Declared\nExec=declared\nX-Hotkeyd-Shortcuts=Meta+D\n",
    )
    .unwrap();

    let mut registry = registry_with_config(ConfigFile::in_memory());
    registry.set_application_dirs(vec![apps]);
    registry.load_settings().unwrap();
    assert!(registry.component_id("plain.desktop").is_none());
    assert!(registry.component_id("declared.desktop").is_some());
    assert_eq!(
        registry.shortcut_keys("declared.desktop", "_launch").unwrap(),
        vec!["Meta+D".to_string()]
    );
}
