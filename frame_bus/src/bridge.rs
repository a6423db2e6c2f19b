//! Input forwarding across the frame boundary
//!
//! The console side mirrors every down/up of its controls into the child
//! frame; the child side turns those messages back into local input.

use crate::{KeyPayload, MessageBus, ON_KEY_DOWN, ON_KEY_UP};
use controls::Controls;
use disposables::CompositeDisposable;
use input_sources::{InputSlots, InputSource};
use input_types::InputAction;
use std::rc::Rc;

/// Child-side input source fed by `onKeyDown`/`onKeyUp` messages
#[derive(Debug)]
pub struct FrameInputSource {
    slots: Rc<InputSlots>,
    subscriptions: CompositeDisposable,
}

impl FrameInputSource {
    /// Subscribes to the key messages on `bus`
    pub fn new(bus: &MessageBus) -> Self {
        let slots = Rc::new(InputSlots::new());
        let subscriptions = CompositeDisposable::new();

        let down = slots.clone();
        subscriptions.add(bus.subscribe_typed(ON_KEY_DOWN, move |p: KeyPayload| {
            down.emit_down(p.key)
        }));
        let up = slots.clone();
        subscriptions.add(bus.subscribe_typed(ON_KEY_UP, move |p: KeyPayload| up.emit_up(p.key)));

        Self {
            slots,
            subscriptions,
        }
    }

    /// Stops listening to the bus
    pub fn detach(&self) {
        if let Err(err) = self.subscriptions.dispose() {
            tracing::warn!(error = %err, "detaching frame input failed");
        }
    }
}

impl InputSource for FrameInputSource {
    fn slots(&self) -> &InputSlots {
        &self.slots
    }

    fn name(&self) -> &str {
        "frame"
    }
}

/// Forwards every down/up of all six actions from `controls` into `bus`
///
/// Disposing the returned bag stops the forwarding. Send failures are
/// logged and dropped.
pub fn mirror_controls(controls: &Controls, bus: &MessageBus) -> CompositeDisposable {
    let mirrored = CompositeDisposable::new();

    for key in InputAction::ALL {
        let down = bus.clone();
        mirrored.add(controls.on_key_down(key, move || forward(&down, ON_KEY_DOWN, key)));
        let up = bus.clone();
        mirrored.add(controls.on_key_up(key, move || forward(&up, ON_KEY_UP, key)));
    }

    mirrored
}

fn forward(bus: &MessageBus, name: &str, key: InputAction) {
    if let Err(err) = bus.emit(name, &KeyPayload::new(key)) {
        tracing::warn!(name, %key, error = %err, "key not forwarded");
    }
}
