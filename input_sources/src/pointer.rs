//! Pointer-driven buttons and haptic feedback

use crate::InputSlots;
use input_types::InputAction;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Identifier of an active pointer (mouse, pen or one touch contact)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub i32);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pointer({})", self.0)
    }
}

/// Vibration feedback for button presses
pub trait Haptics {
    /// Pulses the device for `duration`
    fn vibrate(&self, duration: Duration);
}

/// Haptics for hosts without vibration
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn vibrate(&self, _duration: Duration) {}
}

/// A set of buttons bound to actions, driven by pointer down/up
///
/// Tracks which pointers are captured and by which action, so a release
/// can be matched to its press.
pub struct PointerButtons {
    bound: Vec<InputAction>,
    captured: RefCell<BTreeMap<PointerId, InputAction>>,
    haptics: Rc<dyn Haptics>,
    pulse: Duration,
}

impl PointerButtons {
    /// Binds one button per part name
    ///
    /// Part names that do not name an action leave their button unbound.
    pub fn from_parts<'a>(
        parts: impl IntoIterator<Item = &'a str>,
        haptics: Rc<dyn Haptics>,
        pulse: Duration,
    ) -> Self {
        let mut bound = Vec::new();
        for part in parts {
            match InputAction::from_part(part) {
                Some(action) => bound.push(action),
                None => tracing::debug!(part, "part did not name an input"),
            }
        }

        Self {
            bound,
            captured: RefCell::new(BTreeMap::new()),
            haptics,
            pulse,
        }
    }

    /// Actions that have a button, in binding order
    pub fn bound_actions(&self) -> &[InputAction] {
        &self.bound
    }

    /// Checks if a button is bound to `action`
    pub fn is_bound(&self, action: InputAction) -> bool {
        self.bound.contains(&action)
    }

    /// Handles a pointer going down on the button for `action`
    ///
    /// Captures the pointer, emits down and pulses haptics. Returns false
    /// if no button is bound to `action`.
    pub fn pointer_down(&self, slots: &InputSlots, action: InputAction, pointer: PointerId) -> bool {
        if !self.is_bound(action) {
            tracing::debug!(%action, %pointer, "no button bound for input");
            return false;
        }

        self.capture(pointer, action);
        slots.emit_down(action);
        self.pulse(self.pulse);
        true
    }

    /// Handles a pointer going up on the button for `action`
    ///
    /// Releases the capture and emits up. Returns false if no button is
    /// bound to `action`.
    pub fn pointer_up(&self, slots: &InputSlots, action: InputAction, pointer: PointerId) -> bool {
        if !self.is_bound(action) {
            tracing::debug!(%action, %pointer, "no button bound for input");
            return false;
        }

        self.release(pointer);
        slots.emit_up(action);
        true
    }

    /// Records that `pointer` is captured on behalf of `action`
    pub fn capture(&self, pointer: PointerId, action: InputAction) {
        self.captured.borrow_mut().insert(pointer, action);
    }

    /// Releases `pointer`, returning the action it was captured for
    pub fn release(&self, pointer: PointerId) -> Option<InputAction> {
        self.captured.borrow_mut().remove(&pointer)
    }

    /// Pointers currently captured, in id order
    pub fn captured_pointers(&self) -> Vec<PointerId> {
        self.captured.borrow().keys().copied().collect()
    }

    /// Pulses haptics for `duration`
    pub fn pulse(&self, duration: Duration) {
        if !duration.is_zero() {
            self.haptics.vibrate(duration);
        }
    }
}

impl fmt::Debug for PointerButtons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerButtons")
            .field("bound", &self.bound)
            .field("captured", &self.captured.borrow())
            .field("pulse", &self.pulse)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHaptics {
        pulses: RefCell<Vec<Duration>>,
    }

    impl Haptics for RecordingHaptics {
        fn vibrate(&self, duration: Duration) {
            self.pulses.borrow_mut().push(duration);
        }
    }

    fn wired_slots(log: &Rc<RefCell<Vec<(&'static str, InputAction)>>>) -> InputSlots {
        let slots = InputSlots::new();
        let down = log.clone();
        slots.set_on_input_down(Rc::new(move |a| down.borrow_mut().push(("down", a))));
        let up = log.clone();
        slots.set_on_input_up(Rc::new(move |a| up.borrow_mut().push(("up", a))));
        slots
    }

    #[test]
    fn test_from_parts_skips_unknown() {
        let buttons = PointerButtons::from_parts(
            ["button a", "center", "button b"],
            Rc::new(NoHaptics),
            Duration::from_millis(200),
        );
        assert_eq!(buttons.bound_actions(), &[InputAction::A, InputAction::B]);
    }

    #[test]
    fn test_press_and_release() {
        let haptics = Rc::new(RecordingHaptics::default());
        let buttons = PointerButtons::from_parts(
            ["button a"],
            haptics.clone(),
            Duration::from_millis(200),
        );
        let log = Rc::new(RefCell::new(Vec::new()));
        let slots = wired_slots(&log);

        assert!(buttons.pointer_down(&slots, InputAction::A, PointerId(7)));
        assert_eq!(buttons.captured_pointers(), vec![PointerId(7)]);

        assert!(buttons.pointer_up(&slots, InputAction::A, PointerId(7)));
        assert!(buttons.captured_pointers().is_empty());

        assert_eq!(
            *log.borrow(),
            vec![("down", InputAction::A), ("up", InputAction::A)]
        );
        assert_eq!(*haptics.pulses.borrow(), vec![Duration::from_millis(200)]);
    }

    #[test]
    fn test_unbound_action_ignored() {
        let buttons =
            PointerButtons::from_parts(["button a"], Rc::new(NoHaptics), Duration::ZERO);
        let log = Rc::new(RefCell::new(Vec::new()));
        let slots = wired_slots(&log);

        assert!(!buttons.pointer_down(&slots, InputAction::B, PointerId(1)));
        assert!(!buttons.pointer_up(&slots, InputAction::B, PointerId(1)));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_zero_pulse_skips_haptics() {
        let haptics = Rc::new(RecordingHaptics::default());
        let buttons = PointerButtons::from_parts(["button b"], haptics.clone(), Duration::ZERO);
        let slots = InputSlots::new();

        buttons.pointer_down(&slots, InputAction::B, PointerId(1));
        assert!(haptics.pulses.borrow().is_empty());
    }
}
