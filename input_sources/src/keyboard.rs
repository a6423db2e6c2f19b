//! Keyboard bridge
//!
//! Maps physical key codes (DOM `KeyboardEvent.code` names such as `"KeyW"`
//! or `"ArrowUp"`) to console actions.

use crate::{InputSlots, InputSource};
use input_types::InputAction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from physical key codes to actions
///
/// Several codes may map to the same action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap {
    bindings: BTreeMap<String, InputAction>,
}

impl KeyMap {
    /// Creates an empty mapping
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Creates a mapping from `(code, action)` pairs
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, InputAction)>) -> Self {
        Self {
            bindings: pairs
                .into_iter()
                .map(|(code, action)| (code.into(), action))
                .collect(),
        }
    }

    /// Adds or replaces a binding
    pub fn bind(mut self, code: impl Into<String>, action: InputAction) -> Self {
        self.bindings.insert(code.into(), action);
        self
    }

    /// Looks up the action for a key code
    pub fn get(&self, code: &str) -> Option<InputAction> {
        self.bindings.get(code).copied()
    }

    /// Codes bound to `action`, in code order
    pub fn codes_for(&self, action: InputAction) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|(_, bound)| **bound == action)
            .map(|(code, _)| code.as_str())
            .collect()
    }

    /// Number of bound codes
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Checks if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for KeyMap {
    /// WASD and the arrow keys for directions, J/X for A, K/Z for B
    fn default() -> Self {
        Self::from_pairs([
            ("KeyW", InputAction::Up),
            ("KeyA", InputAction::Left),
            ("KeyS", InputAction::Down),
            ("KeyD", InputAction::Right),
            ("KeyJ", InputAction::A),
            ("KeyK", InputAction::B),
            ("ArrowUp", InputAction::Up),
            ("ArrowLeft", InputAction::Left),
            ("ArrowRight", InputAction::Right),
            ("ArrowDown", InputAction::Down),
            ("KeyX", InputAction::A),
            ("KeyZ", InputAction::B),
        ])
    }
}

/// Keyboard input source
///
/// The host forwards its key down/up events by code; mapped codes are
/// emitted as actions and everything else is ignored.
#[derive(Debug, Default)]
pub struct KeyboardSource {
    slots: InputSlots,
    mapping: KeyMap,
}

impl KeyboardSource {
    /// Creates a source with the default mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source with a replacement mapping
    pub fn with_mapping(mapping: KeyMap) -> Self {
        Self {
            slots: InputSlots::new(),
            mapping,
        }
    }

    /// Handles a key going down
    ///
    /// Returns the mapped action, if any.
    pub fn key_down(&self, code: &str) -> Option<InputAction> {
        let action = self.mapping.get(code);
        tracing::debug!(code, action = ?action, "keydown");
        if let Some(action) = action {
            self.slots.emit_down(action);
        }
        action
    }

    /// Handles a key going up
    ///
    /// Returns the mapped action, if any.
    pub fn key_up(&self, code: &str) -> Option<InputAction> {
        let action = self.mapping.get(code);
        tracing::debug!(code, action = ?action, "keyup");
        if let Some(action) = action {
            self.slots.emit_up(action);
        }
        action
    }

    /// The active mapping
    pub fn mapping(&self) -> &KeyMap {
        &self.mapping
    }
}

impl InputSource for KeyboardSource {
    fn slots(&self) -> &InputSlots {
        &self.slots
    }

    fn name(&self) -> &str {
        "keyboard"
    }
}
