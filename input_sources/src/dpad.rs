//! Directional pad
//!
//! The pad has four buttons of its own and also accepts presses anywhere on
//! its surface, which are resolved to a direction by angle.

use crate::pointer::{Haptics, NoHaptics, PointerButtons, PointerId};
use crate::{InputSlots, InputSource};
use input_types::InputAction;
use std::cell::Cell;
use std::f64::consts::PI;
use std::rc::Rc;
use std::time::Duration;

/// Part names of the pad's four buttons
pub const DEFAULT_DPAD_PARTS: [&str; 4] = ["button up", "button left", "button down", "button right"];

/// Vibration pulse on a pad button press
pub const BUTTON_PULSE: Duration = Duration::from_millis(200);

/// Vibration pulse on a pad surface press
pub const SURFACE_PULSE: Duration = Duration::from_millis(100);

/// Size of the pad's bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadSize {
    pub width: f64,
    pub height: f64,
}

impl PadSize {
    /// Creates a pad size
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Resolves a press at `(x, y)` inside a `width` x `height` box to a direction
///
/// The angle around the box centre is measured in degrees, clockwise from
/// the positive x axis (y grows downwards), in `[0, 360)`:
///
/// - `(315, 360)` and `[0, 45)` map to `Right`
/// - `(45, 135)` maps to `Down`
/// - `(135, 225)` maps to `Left`
/// - `(225, 315)` maps to `Up`
///
/// The four diagonals (exactly 45, 135, 225 and 315) map to no direction.
pub fn hit_test(x: f64, y: f64, width: f64, height: f64) -> Option<InputAction> {
    let mut theta = (y - height * 0.5).atan2(x - width * 0.5);
    if theta < 0.0 {
        theta += PI * 2.0;
    }
    theta *= 180.0 / PI;

    if theta > 315.0 || theta < 45.0 {
        Some(InputAction::Right)
    } else if theta > 45.0 && theta < 135.0 {
        Some(InputAction::Down)
    } else if theta > 135.0 && theta < 225.0 {
        Some(InputAction::Left)
    } else if theta > 225.0 && theta < 315.0 {
        Some(InputAction::Up)
    } else {
        None
    }
}

/// The directional pad
#[derive(Debug)]
pub struct DpadSource {
    slots: InputSlots,
    buttons: PointerButtons,
    surface_pulse: Duration,
    /// Direction held by the current surface press
    active: Cell<Option<(PointerId, InputAction)>>,
}

impl DpadSource {
    /// Creates a pad without haptics
    pub fn new() -> Self {
        Self::with_haptics(Rc::new(NoHaptics), BUTTON_PULSE, SURFACE_PULSE)
    }

    /// Creates a pad with haptic feedback
    pub fn with_haptics(haptics: Rc<dyn Haptics>, button_pulse: Duration, surface_pulse: Duration) -> Self {
        Self {
            slots: InputSlots::new(),
            buttons: PointerButtons::from_parts(DEFAULT_DPAD_PARTS, haptics, button_pulse),
            surface_pulse,
            active: Cell::new(None),
        }
    }

    /// Pointer down on one of the pad's buttons
    pub fn button_down(&self, action: InputAction, pointer: PointerId) -> bool {
        self.buttons.pointer_down(&self.slots, action, pointer)
    }

    /// Pointer up on one of the pad's buttons
    pub fn button_up(&self, action: InputAction, pointer: PointerId) -> bool {
        self.buttons.pointer_up(&self.slots, action, pointer)
    }

    /// Pointer down on the pad surface itself, at offset `(x, y)`
    ///
    /// Returns the direction pressed, or None if the point sits on a
    /// diagonal.
    pub fn surface_down(&self, pointer: PointerId, x: f64, y: f64, size: PadSize) -> Option<InputAction> {
        let action = hit_test(x, y, size.width, size.height)?;

        self.active.set(Some((pointer, action)));
        self.buttons.capture(pointer, action);
        self.slots.emit_down(action);
        self.buttons.pulse(self.surface_pulse);
        Some(action)
    }

    /// Pointer up after a surface press
    ///
    /// Returns the released direction, or None if no surface press is
    /// active.
    pub fn surface_up(&self, pointer: PointerId) -> Option<InputAction> {
        let (captured, action) = self.active.take()?;

        if captured != pointer {
            tracing::debug!(%captured, %pointer, "surface released by a different pointer");
        }
        self.buttons.release(captured);
        self.slots.emit_up(action);
        Some(action)
    }

    /// Direction held by the current surface press
    pub fn active_direction(&self) -> Option<InputAction> {
        self.active.get().map(|(_, action)| action)
    }

    /// The pad buttons and their pointer captures
    pub fn buttons(&self) -> &PointerButtons {
        &self.buttons
    }
}

impl Default for DpadSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for DpadSource {
    fn slots(&self) -> &InputSlots {
        &self.slots
    }

    fn name(&self) -> &str {
        "dpad"
    }
}
