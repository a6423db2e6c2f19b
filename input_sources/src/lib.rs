//! # Input Sources
//!
//! This crate implements the input sources of Pocket Console: the action
//! buttons, the directional pad and the keyboard bridge.
//!
//! ## Philosophy
//!
//! - **Sources translate, they don't decide**: A source turns raw pointer or
//!   key activity into `InputAction` down/up calls and nothing more
//! - **Wired from outside**: Sources expose two callback slots that the
//!   controls aggregator fills in; before wiring, emitting is a no-op
//! - **Platform-free**: Pointer capture and vibration are tracked or
//!   delegated, never performed against a real device here
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Global input state (that's the controls aggregator)
//! - A DOM binding layer (hosts forward their events into these types)

pub mod actions;
pub mod dpad;
pub mod keyboard;
pub mod pointer;

pub use actions::ButtonSource;
pub use dpad::{hit_test, DpadSource, PadSize};
pub use keyboard::{KeyMap, KeyboardSource};
pub use pointer::{Haptics, NoHaptics, PointerButtons, PointerId};

use input_types::InputAction;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Callback a source invokes for a down or up transition
pub type InputCallback = Rc<dyn Fn(InputAction)>;

/// The two callback slots every input source exposes
///
/// The aggregator overwrites both slots when it wires the source. Emitting
/// into an empty slot does nothing.
#[derive(Default)]
pub struct InputSlots {
    on_input_down: RefCell<Option<InputCallback>>,
    on_input_up: RefCell<Option<InputCallback>>,
}

impl InputSlots {
    /// Creates unwired slots
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the down callback
    pub fn set_on_input_down(&self, callback: InputCallback) {
        *self.on_input_down.borrow_mut() = Some(callback);
    }

    /// Replaces the up callback
    pub fn set_on_input_up(&self, callback: InputCallback) {
        *self.on_input_up.borrow_mut() = Some(callback);
    }

    /// Empties both slots
    pub fn clear(&self) {
        self.on_input_down.borrow_mut().take();
        self.on_input_up.borrow_mut().take();
    }

    /// Checks if both slots are filled
    pub fn is_wired(&self) -> bool {
        self.on_input_down.borrow().is_some() && self.on_input_up.borrow().is_some()
    }

    /// Invokes the down callback, if any
    pub fn emit_down(&self, action: InputAction) {
        // Clone out of the slot so the callback may rewire it.
        let callback = self.on_input_down.borrow().clone();
        if let Some(callback) = callback {
            callback(action);
        }
    }

    /// Invokes the up callback, if any
    pub fn emit_up(&self, action: InputAction) {
        let callback = self.on_input_up.borrow().clone();
        if let Some(callback) = callback {
            callback(action);
        }
    }
}

impl fmt::Debug for InputSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSlots")
            .field("on_input_down", &self.on_input_down.borrow().is_some())
            .field("on_input_up", &self.on_input_up.borrow().is_some())
            .finish()
    }
}

/// Capability of producing input down/up transitions
pub trait InputSource {
    /// The callback slots the aggregator wires
    fn slots(&self) -> &InputSlots;

    /// Short name used in logs
    fn name(&self) -> &str {
        "source"
    }
}

impl<T: InputSource + ?Sized> InputSource for Rc<T> {
    fn slots(&self) -> &InputSlots {
        (**self).slots()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
