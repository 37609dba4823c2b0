//! The input state machine: multi-stroke recognition and modifier-only
//! shortcut latching.
//!
//! The capture backend feeds corrected chords into [`Registry::key_pressed`]
//! and [`Registry::key_released`]; pointer and axis events exist solely to
//! clear the modifier-only latch so that Meta+click does not fire a bare
//! Meta shortcut.

use keyspec::{Chord, Key, Modifiers, key_to_modifier, normalize_chord};
use tracing::{debug, warn};

use crate::{
    context::MatchType,
    registry::{Registry, ShortcutHandle},
};

/// Modifier-only recognition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyboardState {
    /// Waiting for input.
    #[default]
    Normal,
    /// Only modifier keys have been pressed since the last normal state.
    PressingModifierOnly,
    /// The first modifier was released after a modifier-only period;
    /// remaining releases must not re-trigger.
    ReleasingModifierOnly,
}

/// Event correction applied before the state machine sees a chord:
/// Super_L/Super_R fold to Meta, SysReq folds to Alt+Print.
///
/// The SysReq fold mirrors the platform's representation of Alt+Print;
/// multi-stroke sequences starting with such a chord are not supported.
pub(crate) fn correct_chord(chord: Chord) -> Chord {
    match chord.key {
        Key::SUPER_L | Key::SUPER_R => Chord::new(Key::META_KEY, chord.mods),
        Key::SYSREQ => Chord::new(Key::PRINT, chord.mods.union(Modifiers::ALT)),
        _ => chord,
    }
}

impl Registry {
    /// Handles a raw key press. Returns whether the event was consumed.
    pub fn key_pressed(&mut self, chord: Chord) -> bool {
        if !self.has_backend() {
            return false;
        }
        let chord = correct_chord(chord);

        if chord.key == Key::NONE {
            // Unidentifiable symbol: drop the pending sequence and pass the
            // event through.
            debug!("key press without a symbol, resetting active sequence");
            self.active_sequence.clear();
            self.state = KeyboardState::Normal;
            return false;
        }

        if chord.key.is_modifier_key() {
            self.current_modifiers = chord.mods.union(key_to_modifier(chord.key));
            self.state = KeyboardState::PressingModifierOnly;
            return false;
        }

        self.current_modifiers = chord.mods;
        self.state = KeyboardState::Normal;
        self.process_key(normalize_chord(chord))
    }

    /// Handles a raw key release. Modifier-only shortcuts fire here, on the
    /// first modifier release after a modifier-only press period.
    pub fn key_released(&mut self, chord: Chord) -> bool {
        if !self.has_backend() {
            return false;
        }
        let chord = correct_chord(chord);
        let mut handled = false;

        if chord.key.is_modifier_key() {
            let released = key_to_modifier(chord.key);
            match self.state {
                KeyboardState::PressingModifierOnly => {
                    let held = self.current_modifiers;
                    handled = self.process_key(Chord::modifier_only(held));
                    self.current_modifiers = self.current_modifiers.difference(released);
                    self.state = if self.current_modifiers.is_empty() {
                        KeyboardState::Normal
                    } else {
                        KeyboardState::ReleasingModifierOnly
                    };
                }
                KeyboardState::ReleasingModifierOnly => {
                    self.current_modifiers = self.current_modifiers.difference(released);
                    if self.current_modifiers.is_empty() {
                        self.state = KeyboardState::Normal;
                    }
                }
                KeyboardState::Normal => {
                    self.current_modifiers = self.current_modifiers.difference(released);
                }
            }
        } else {
            self.state = KeyboardState::Normal;
        }

        if let Some(last) = self.last_shortcut.take() {
            self.emit_released(last);
        }
        handled
    }

    /// A pointer press unconditionally clears the modifier-only latch.
    pub fn pointer_pressed(&mut self, _buttons: u32) -> bool {
        self.state = KeyboardState::Normal;
        false
    }

    /// An axis event unconditionally clears the modifier-only latch.
    pub fn axis_triggered(&mut self, _axis: i32) -> bool {
        self.state = KeyboardState::Normal;
        false
    }

    /// Backends call this for events they observe but will not forward.
    pub fn reset_modifier_only_state(&mut self) {
        self.state = KeyboardState::Normal;
    }

    /// The multi-stroke recognizer.
    ///
    /// Appends the chord to the rolling buffer and scans tails from the
    /// shortest up, so the most recently completed sequence wins. An
    /// unmatched buffer is retained: subsequent keys can still complete it.
    fn process_key(&mut self, chord: Chord) -> bool {
        self.active_sequence.push_rotating(chord);

        if self.active_sequence.len() > 1 {
            let first = self.active_sequence.chords()[0];
            if first.key == Key::PRINT && first.mods.contains(Modifiers::ALT) {
                // The platform folds Alt+Print into SysReq, which breaks
                // matching for later strokes of the sequence.
                warn!("multi-stroke sequence starting with Alt+Print is unreliable");
            }
        }

        let mut matched: Option<ShortcutHandle> = None;
        for length in 1..=self.active_sequence.len() {
            let tail = self
                .active_sequence
                .tail(length)
                .expect("length bounded by buffer");
            if let Some(handle) = self.shortcut_by_key(&tail, MatchType::Equal) {
                matched = Some(handle);
                break;
            }
        }

        let Some(handle) = matched else {
            debug!(sequence = %self.active_sequence, "no shortcut for current sequence");
            return false;
        };
        let shortcut = self.shortcut(handle).expect("index consistency");
        if !shortcut.is_active() {
            debug!(
                action = shortcut.unique_name(),
                "matched an inactive shortcut, ignoring"
            );
            return false;
        }

        debug!(
            sequence = %self.active_sequence,
            action = shortcut.unique_name(),
            "dispatching shortcut"
        );
        self.active_sequence.clear();

        if let Some(last) = self.last_shortcut {
            if last != handle {
                self.emit_released(last);
            }
        }
        self.dispatch_pressed(handle);
        self.last_shortcut = Some(handle);
        true
    }
}
