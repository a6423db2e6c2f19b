//! Locating console parts

use crate::registry::{ComponentRegistry, PartKind};
use crate::ConsoleConfig;
use display_slot::{DisplaySlot, DisplaySurface, NullSurface};
use input_sources::{ButtonSource, DpadSource, Haptics, NoHaptics};
use std::fmt;
use std::rc::Rc;

/// A part found under a console root
#[derive(Clone)]
pub enum ConsolePart {
    Display(DisplaySlot),
    Dpad(Rc<DpadSource>),
    Actions(Rc<ButtonSource>),
}

impl ConsolePart {
    pub fn kind(&self) -> PartKind {
        match self {
            ConsolePart::Display(_) => PartKind::Display,
            ConsolePart::Dpad(_) => PartKind::Dpad,
            ConsolePart::Actions(_) => PartKind::Actions,
        }
    }
}

impl fmt::Debug for ConsolePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsolePart({})", self.kind())
    }
}

/// The tree a console is assembled from
pub trait ConsoleRoot {
    /// Finds the part named by `selector`
    fn query(&self, selector: &str) -> Option<ConsolePart>;
}

/// The standard console layout: one display, one dpad, one pair of buttons
///
/// Parts are found through the component registry, so a tag that was never
/// defined finds nothing.
pub struct StandardRoot {
    display: DisplaySlot,
    dpad: Rc<DpadSource>,
    actions: Rc<ButtonSource>,
}

impl StandardRoot {
    /// Builds the parts over a platform surface and vibration adapter
    pub fn new(config: &ConsoleConfig, surface: Rc<dyn DisplaySurface>, haptics: Rc<dyn Haptics>) -> Self {
        let haptics: Rc<dyn Haptics> = if config.haptics.enabled {
            haptics
        } else {
            Rc::new(NoHaptics)
        };
        let pulses = config.haptics;

        Self {
            display: DisplaySlot::new(surface, config.display),
            dpad: Rc::new(DpadSource::with_haptics(
                haptics.clone(),
                pulses.button_pulse(),
                pulses.dpad_pulse(),
            )),
            actions: Rc::new(ButtonSource::with_haptics(haptics, pulses.button_pulse())),
        }
    }

    /// Builds the parts with no screen and no vibration
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(config, Rc::new(NullSurface), Rc::new(NoHaptics))
    }
}

impl ConsoleRoot for StandardRoot {
    fn query(&self, selector: &str) -> Option<ConsolePart> {
        match ComponentRegistry::lookup(selector)? {
            PartKind::Display => Some(ConsolePart::Display(self.display.clone())),
            PartKind::Dpad => Some(ConsolePart::Dpad(self.dpad.clone())),
            PartKind::Actions => Some(ConsolePart::Actions(self.actions.clone())),
            PartKind::Console => None,
        }
    }
}

impl fmt::Debug for StandardRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardRoot")
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}
