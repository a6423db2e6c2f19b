//! # Input Types
//!
//! This crate defines the logical game inputs for Pocket Console.
//!
//! ## Philosophy
//!
//! - **Actions, not keys**: Scenes see six logical buttons, never key codes
//! - **Always complete**: Input state always carries every action
//! - **Testable**: Actions are serializable and can be injected for testing
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Raw pointer, touch or key events (sources translate those)
//! - A listener registry (that's the controls aggregator)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

/// Logical game input
///
/// One of the six console buttons. Serialized as `"UP"`, `"DOWN"`,
/// `"LEFT"`, `"RIGHT"`, `"A"` and `"B"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputAction {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
}

impl InputAction {
    /// Every action, in canonical order
    pub const ALL: [InputAction; 6] = [
        InputAction::Up,
        InputAction::Down,
        InputAction::Left,
        InputAction::Right,
        InputAction::A,
        InputAction::B,
    ];

    /// Position of this action in `ALL`
    pub const fn index(self) -> usize {
        match self {
            InputAction::Up => 0,
            InputAction::Down => 1,
            InputAction::Left => 2,
            InputAction::Right => 3,
            InputAction::A => 4,
            InputAction::B => 5,
        }
    }

    /// Wire name of this action
    pub const fn as_str(self) -> &'static str {
        match self {
            InputAction::Up => "UP",
            InputAction::Down => "DOWN",
            InputAction::Left => "LEFT",
            InputAction::Right => "RIGHT",
            InputAction::A => "A",
            InputAction::B => "B",
        }
    }

    /// Returns true for the four directional actions
    pub const fn is_direction(self) -> bool {
        matches!(
            self,
            InputAction::Up | InputAction::Down | InputAction::Left | InputAction::Right
        )
    }

    /// Resolves a button's part list (e.g. `"button up"`) to an action
    ///
    /// Tokens are checked in the order up, down, left, right, a, b.
    /// Returns None if no token names an action.
    pub fn from_part(part: &str) -> Option<Self> {
        let has = |name: &str| part.split_whitespace().any(|token| token == name);

        [
            ("up", InputAction::Up),
            ("down", InputAction::Down),
            ("left", InputAction::Left),
            ("right", InputAction::Right),
            ("a", InputAction::A),
            ("b", InputAction::B),
        ]
        .into_iter()
        .find(|(name, _)| has(name))
        .map(|(_, action)| action)
    }
}

impl fmt::Display for InputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInputActionError {
    input: String,
}

impl fmt::Display for ParseInputActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown input action: {:?}", self.input)
    }
}

impl std::error::Error for ParseInputActionError {}

impl FromStr for InputAction {
    type Err = ParseInputActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InputAction::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseInputActionError {
                input: s.to_string(),
            })
    }
}

/// Phase of an input transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPhase {
    /// Button went down
    Down,
    /// Button was released
    Up,
}

impl fmt::Display for InputPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Up => write!(f, "up"),
        }
    }
}

/// Held/not-held table for every action
///
/// Backed by a fixed array, so it can never be missing an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InputState {
    held: [bool; 6],
}

impl InputState {
    /// Creates a state with nothing held
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if an action is held
    pub fn is_held(&self, action: InputAction) -> bool {
        self.held[action.index()]
    }

    /// Sets an action's held flag, returning the previous value
    pub fn set(&mut self, action: InputAction, held: bool) -> bool {
        std::mem::replace(&mut self.held[action.index()], held)
    }

    /// Releases every action
    pub fn reset(&mut self) {
        self.held = [false; 6];
    }

    /// Checks if nothing is held
    pub fn is_idle(&self) -> bool {
        self.held.iter().all(|held| !held)
    }

    /// Iterates every action with its held flag, in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (InputAction, bool)> + '_ {
        InputAction::ALL
            .into_iter()
            .map(move |action| (action, self.is_held(action)))
    }

    /// Returns the held actions, in canonical order
    pub fn held_actions(&self) -> Vec<InputAction> {
        self.iter()
            .filter_map(|(action, held)| held.then_some(action))
            .collect()
    }
}

impl Index<InputAction> for InputState {
    type Output = bool;

    fn index(&self, action: InputAction) -> &bool {
        &self.held[action.index()]
    }
}
