//! Action buttons (A and B)

use crate::pointer::{Haptics, NoHaptics, PointerButtons, PointerId};
use crate::{InputSlots, InputSource};
use input_types::InputAction;
use std::rc::Rc;
use std::time::Duration;

/// Part names of the default action buttons
pub const DEFAULT_ACTION_PARTS: [&str; 2] = ["button a", "button b"];

/// Vibration pulse on an action button press
pub const ACTION_PULSE: Duration = Duration::from_millis(200);

/// The action button pair
#[derive(Debug)]
pub struct ButtonSource {
    slots: InputSlots,
    buttons: PointerButtons,
}

impl ButtonSource {
    /// Creates the default A/B pair without haptics
    pub fn new() -> Self {
        Self::with_haptics(Rc::new(NoHaptics), ACTION_PULSE)
    }

    /// Creates the default A/B pair with haptic feedback
    pub fn with_haptics(haptics: Rc<dyn Haptics>, pulse: Duration) -> Self {
        Self::from_parts(DEFAULT_ACTION_PARTS, haptics, pulse)
    }

    /// Creates a source with one button per part name
    pub fn from_parts<'a>(
        parts: impl IntoIterator<Item = &'a str>,
        haptics: Rc<dyn Haptics>,
        pulse: Duration,
    ) -> Self {
        Self {
            slots: InputSlots::new(),
            buttons: PointerButtons::from_parts(parts, haptics, pulse),
        }
    }

    /// Pointer down on the button for `action`
    pub fn pointer_down(&self, action: InputAction, pointer: PointerId) -> bool {
        self.buttons.pointer_down(&self.slots, action, pointer)
    }

    /// Pointer up on the button for `action`
    pub fn pointer_up(&self, action: InputAction, pointer: PointerId) -> bool {
        self.buttons.pointer_up(&self.slots, action, pointer)
    }

    /// The bound buttons and their pointer captures
    pub fn buttons(&self) -> &PointerButtons {
        &self.buttons
    }
}

impl Default for ButtonSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for ButtonSource {
    fn slots(&self) -> &InputSlots {
        &self.slots
    }

    fn name(&self) -> &str {
        "actions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_default_binds_a_and_b() {
        let source = ButtonSource::new();
        assert_eq!(
            source.buttons().bound_actions(),
            &[InputAction::A, InputAction::B]
        );
        assert_eq!(source.name(), "actions");
    }

    #[test]
    fn test_press_emits_through_slots() {
        let source = ButtonSource::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let down = log.clone();
        source
            .slots()
            .set_on_input_down(Rc::new(move |a| down.borrow_mut().push(a)));

        assert!(source.pointer_down(InputAction::B, PointerId(3)));
        assert!(!source.pointer_down(InputAction::Up, PointerId(4)));

        assert_eq!(*log.borrow(), vec![InputAction::B]);
    }
}
