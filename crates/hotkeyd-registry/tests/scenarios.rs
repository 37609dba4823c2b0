//! End-to-end recognizer scenarios driven through the capture test stub.

use capture::TestBackend;
use cfgtree::ConfigFile;
use hotkeyd_protocol::{KeyState, ShortcutEvent};
use hotkeyd_registry::{DEFAULT_CONTEXT, RecordingLauncher, Registry, ShortcutHandle};
use keyspec::{Chord, KeySequence, parse_list};
use tokio::sync::mpsc::UnboundedReceiver;

type Events = UnboundedReceiver<ShortcutEvent>;

fn new_registry() -> (Registry, TestBackend, RecordingLauncher, Events) {
    let backend = TestBackend::new();
    let launcher = RecordingLauncher::new();
    let (registry, events) = Registry::new(
        Some(Box::new(backend.clone())),
        ConfigFile::in_memory(),
        Box::new(launcher.clone()),
    );
    (registry, backend, launcher, events)
}

fn bind(registry: &mut Registry, component: &str, action: &str, keys: &str) -> bool {
    let handle = registry
        .client_register(component, component, action, action, "", false)
        .expect("registration");
    registry
        .set_shortcut_keys(handle, parse_list(keys).expect("keys parse"))
        .expect("set keys")
}

fn chord(s: &str) -> Chord {
    Chord::parse(s).expect("chord parse")
}

fn seq(s: &str) -> KeySequence {
    KeySequence::parse(s).expect("sequence parse")
}

fn presses(events: &mut Events) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.state == KeyState::Pressed {
            out.push(event.action);
        }
    }
    out
}

#[test]
fn s1_modifier_only_triggers_on_release() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    assert!(bind(&mut registry, "c1", "X", "Ctrl"));

    registry.key_pressed(chord("Ctrl"));
    registry.key_released(chord("Ctrl"));

    assert_eq!(presses(&mut events), vec!["X"]);
}

#[test]
fn s2_modifier_only_suppressed_by_combination() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    assert!(bind(&mut registry, "c1", "X", "Ctrl"));

    registry.key_pressed(chord("Ctrl"));
    registry.key_pressed(chord("Ctrl+P"));
    registry.key_released(chord("Ctrl+P"));
    registry.key_released(chord("Ctrl"));

    assert!(presses(&mut events).is_empty());
}

#[test]
fn s3_multi_modifier_fires_once_on_any_release() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    assert!(bind(&mut registry, "c1", "Y", "Ctrl+Shift"));

    registry.key_pressed(chord("Ctrl"));
    registry.key_pressed(chord("Ctrl+Shift"));
    registry.key_released(chord("Ctrl+Shift"));
    registry.key_pressed(chord("Ctrl+Alt"));
    registry.key_released(chord("Ctrl+Alt"));
    registry.key_released(chord("Ctrl"));

    assert_eq!(presses(&mut events), vec!["Y"]);
}

#[test]
fn modifier_only_not_fired_on_pointer_press() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    assert!(bind(&mut registry, "c1", "X", "Meta"));

    registry.key_pressed(chord("Meta"));
    registry.pointer_pressed(1);
    registry.key_released(chord("Meta"));

    assert!(presses(&mut events).is_empty(), "Meta+click must not fire bare Meta");
}

#[test]
fn modifier_only_not_fired_on_axis() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    assert!(bind(&mut registry, "c1", "X", "Ctrl"));

    registry.key_pressed(chord("Ctrl"));
    registry.axis_triggered(0);
    registry.key_released(chord("Ctrl"));

    assert!(presses(&mut events).is_empty());
}

#[test]
fn s4_sequence_wins_over_denied_suffix() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    assert!(bind(&mut registry, "c1", "A", "Ctrl+K,Ctrl+L"));
    // B overlaps A from the end and must be refused admission.
    assert!(!bind(&mut registry, "c2", "B", "Ctrl+L"));

    assert!(!registry.key_pressed(chord("Ctrl+K")));
    registry.key_released(chord("Ctrl+K"));
    assert!(registry.key_pressed(chord("Ctrl+L")));
    registry.key_released(chord("Ctrl+L"));

    assert_eq!(presses(&mut events), vec!["A"]);
}

#[test]
fn sequence_matches_through_rotated_garbage() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    assert!(bind(&mut registry, "c1", "A", "Ctrl+K,Ctrl+L"));

    // Unrelated presses first; the rolling buffer keeps the tail alive.
    registry.key_pressed(chord("Alt+F1"));
    registry.key_pressed(chord("Alt+F2"));
    registry.key_pressed(chord("Alt+F3"));
    registry.key_pressed(chord("Ctrl+K"));
    assert!(registry.key_pressed(chord("Ctrl+L")));

    assert_eq!(presses(&mut events), vec!["A"]);
}

#[test]
fn s5_conflict_admission() {
    let (mut registry, _backend, _launcher, _events) = new_registry();
    assert!(bind(&mut registry, "c1", "A", "Ctrl+K,Ctrl+L"));

    // The prefix shadows the sequence for everyone else.
    assert!(!registry.is_shortcut_available(&seq("Ctrl+K"), "c2", DEFAULT_CONTEXT));
    // The owner may replace its own binding.
    assert!(registry.is_shortcut_available(&seq("Ctrl+K"), "c1", DEFAULT_CONTEXT));
    // Disjoint keys stay available.
    assert!(registry.is_shortcut_available(&seq("Meta+Z"), "c2", DEFAULT_CONTEXT));
}

#[test]
fn press_release_pairing() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    assert!(bind(&mut registry, "c1", "A", "Ctrl+X"));

    registry.key_pressed(chord("Ctrl+X"));
    registry.key_released(chord("Ctrl+X"));

    let mut log = Vec::new();
    while let Ok(event) = events.try_recv() {
        log.push((event.action, event.state));
    }
    assert_eq!(
        log,
        vec![
            ("A".to_string(), KeyState::Pressed),
            ("A".to_string(), KeyState::Released),
        ]
    );
}

#[test]
fn release_of_previous_shortcut_precedes_new_press() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    assert!(bind(&mut registry, "c1", "A", "Ctrl+X"));
    assert!(bind(&mut registry, "c1", "B", "Ctrl+Y"));

    // Press A, then B without releasing any key in between.
    registry.key_pressed(chord("Ctrl+X"));
    registry.key_pressed(chord("Ctrl+Y"));

    let mut log = Vec::new();
    while let Ok(event) = events.try_recv() {
        log.push((event.action, event.state));
    }
    assert_eq!(
        log,
        vec![
            ("A".to_string(), KeyState::Pressed),
            ("A".to_string(), KeyState::Released),
            ("B".to_string(), KeyState::Pressed),
        ]
    );
}

#[test]
fn sync_happens_on_dispatch() {
    let (mut registry, backend, _launcher, _events) = new_registry();
    assert!(bind(&mut registry, "c1", "A", "Ctrl+X"));
    assert_eq!(backend.sync_calls(), 0);
    registry.key_pressed(chord("Ctrl+X"));
    assert_eq!(backend.sync_calls(), 1);
}

#[test]
fn grab_conservation_across_lifecycle() {
    let (mut registry, backend, _launcher, _events) = new_registry();
    assert!(bind(&mut registry, "c1", "A", "Ctrl+K,Ctrl+L"));
    // Shares the Ctrl+K chord with A; only one backend grab for it.
    assert!(bind(&mut registry, "c1", "B", "Ctrl+K,Ctrl+M"));
    let grab_count = backend
        .history()
        .iter()
        .filter(|call| call.grab)
        .count();
    assert_eq!(grab_count, 3, "Ctrl+K grabbed once, Ctrl+L and Ctrl+M once each");

    registry.unregister_action("c1", "A").unwrap();
    assert!(
        backend.grabbed().contains(&chord("Ctrl+K").packed()),
        "Ctrl+K still retained by B"
    );

    drop(registry);
    assert!(backend.grabbed().is_empty(), "all grabs released on teardown");
    assert!(backend.grabs_balanced());
    assert!(!backend.is_enabled(), "backend disabled after teardown");
}

#[test]
fn grab_failure_rolls_back_partial_grabs() {
    let (mut registry, backend, _launcher, _events) = new_registry();
    backend.fail_chord(chord("Ctrl+L").packed());

    assert!(!bind(&mut registry, "c1", "A", "Ctrl+K,Ctrl+L"));
    assert!(backend.grabbed().is_empty(), "partial grab of Ctrl+K rolled back");
    assert!(backend.grabs_balanced());

    let handle = registry
        .client_register("c1", "c1", "A", "A", "", false)
        .unwrap();
    assert!(registry.shortcut(handle).unwrap().keys().is_empty());
}

#[test]
fn rebind_moves_grabs_transactionally() {
    let (mut registry, backend, _launcher, _events) = new_registry();
    let handle = registry
        .client_register("c1", "c1", "A", "A", "", false)
        .unwrap();
    assert!(registry
        .set_shortcut_keys(handle, parse_list("Ctrl+X").unwrap())
        .unwrap());
    assert!(registry
        .set_shortcut_keys(handle, parse_list("Ctrl+Y").unwrap())
        .unwrap());

    assert!(!backend.grabbed().contains(&chord("Ctrl+X").packed()));
    assert!(backend.grabbed().contains(&chord("Ctrl+Y").packed()));
}

#[test]
fn index_consistency_after_mutations() {
    let (mut registry, _backend, _launcher, _events) = new_registry();
    assert!(bind(&mut registry, "c1", "A", "Ctrl+K,Ctrl+L"));
    assert!(bind(&mut registry, "c2", "C", "Meta+Space"));
    let handle = registry
        .client_register("c1", "c1", "A", "A", "", false)
        .unwrap();
    assert!(registry
        .set_shortcut_keys(handle, parse_list("Alt+F9").unwrap())
        .unwrap());
    registry.unregister_action("c2", "C").unwrap();

    check_index(&registry);
}

fn check_index(registry: &Registry) {
    // Every index entry points at a shortcut that really holds the key.
    for (key, handle) in registry.active_keys() {
        let shortcut = registry
            .shortcut(handle)
            .expect("index entry must resolve");
        assert!(
            shortcut.keys().contains(&key),
            "{} not among keys of {}",
            key,
            shortcut.unique_name()
        );
    }
    // Conversely, every active binding appears in the index.
    let index: Vec<(KeySequence, ShortcutHandle)> = registry.active_keys();
    for (_, component) in registry.components() {
        for (_, context) in component.contexts() {
            for (_, shortcut) in context.shortcuts() {
                if !shortcut.is_active() || shortcut.is_session_shortcut() {
                    continue;
                }
                for key in shortcut.active_sequences() {
                    assert!(
                        index.iter().any(|(k, _)| k == key),
                        "{} of {} missing from index",
                        key,
                        shortcut.unique_name()
                    );
                }
            }
        }
    }
}

#[test]
fn session_shortcuts_never_grab() {
    let (mut registry, backend, _launcher, _events) = new_registry();
    let handle = registry
        .client_register("c1", "c1", "volatile", "Volatile", "", true)
        .unwrap();
    assert!(registry
        .set_shortcut_keys(handle, parse_list("Ctrl+F12").unwrap())
        .unwrap());

    assert!(backend.history().is_empty(), "session shortcuts bypass the grab table");
    // Their keys still deny admission to others.
    assert!(!registry.is_shortcut_available(&seq("Ctrl+F12"), "c2", DEFAULT_CONTEXT));
}

#[test]
fn duplicate_component_registration_is_refused() {
    let (mut registry, _backend, _launcher, _events) = new_registry();
    registry
        .add_component(hotkeyd_registry::Component::new_client("c1", "One"))
        .unwrap();
    let err = registry
        .add_component(hotkeyd_registry::Component::new_client("c1", "Two"))
        .unwrap_err();
    assert!(matches!(err, hotkeyd_registry::Error::DuplicateRegistration(_)));
}

#[test]
fn backendless_registry_latches() {
    let launcher = RecordingLauncher::new();
    let (mut registry, mut events) = Registry::new(
        None,
        ConfigFile::in_memory(),
        Box::new(launcher),
    );
    // Registrations still work and keys are stored, but nothing is grabbed
    // and the state-machine entry points short-circuit.
    assert!(!registry.has_backend());
    assert!(bind(&mut registry, "c1", "A", "Ctrl+X"));
    assert_eq!(
        registry.shortcut_keys("c1", "A").unwrap(),
        vec!["Ctrl+X".to_string()]
    );
    assert!(registry.active_keys().is_empty());
    assert!(!registry.key_pressed(chord("Ctrl+X")));
    assert!(presses(&mut events).is_empty());
}

#[test]
fn service_component_launches_on_press() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("org.example.music.desktop"),
        "[Desktop Entry]\n\
         Name=Music\n\
         Exec=musicplayer\n\
         Actions=next\n\
         X-Hotkeyd-Shortcuts=Meta+M\n\
         \n\
         [Desktop Action next]\n\
         Name=Next\n\
         Exec=musicplayer --next\n\
         X-Hotkeyd-Shortcuts=Meta+N\n",
    )
    .unwrap();

    let (mut registry, _backend, launcher, _events) = new_registry();
    registry.set_service_dirs(vec![dir.path().to_path_buf()]);
    registry.load_settings().unwrap();

    assert!(registry.key_pressed(chord("Meta+M")));
    registry.key_released(chord("Meta+M"));
    assert!(registry.key_pressed(chord("Meta+N")));
    registry.key_released(chord("Meta+N"));

    assert_eq!(
        launcher.launches(),
        vec![
            ("org.example.music.desktop".to_string(), None),
            ("org.example.music.desktop".to_string(), Some("next".to_string())),
        ]
    );
}

#[test]
fn sequence_matching_ignores_spelling_differences() {
    let (mut registry, _backend, _launcher, mut events) = new_registry();
    // "Control" and "Ctrl" normalize to the same chord.
    assert!(bind(&mut registry, "c1", "A", "Control+T"));
    registry.key_pressed(chord("Ctrl+T"));
    assert_eq!(presses(&mut events), vec!["A"]);
}
