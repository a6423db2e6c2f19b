//! # Controls
//!
//! This crate implements the controls aggregator for Pocket Console.
//!
//! ## Philosophy
//!
//! - **One table, many sources**: Every wired source funnels into the same
//!   held/not-held table and the same listener registries
//! - **No double fire**: A down for an already-held action is dropped; an
//!   up always fires
//! - **Handles, not callbacks to remember**: Registering a listener hands
//!   back a `Disposable` that removes exactly that listener
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A source of input (sources live in `input_sources`)
//! - A focus manager or router
//! - A per-run listener scope (`reset` clears the table, never the
//!   registries; run-scoped registration lives on the scene runtime)

pub mod registry;

pub use registry::{Listener, ListenerId, ListenerRegistry};

use disposables::Disposable;
use input_sources::InputSource;
use input_types::{InputAction, InputPhase, InputState};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

struct Inner {
    state: InputState,
    down: ListenerRegistry,
    up: ListenerRegistry,
    next_listener: u64,
}

impl Inner {
    fn registry(&self, phase: InputPhase) -> &ListenerRegistry {
        match phase {
            InputPhase::Down => &self.down,
            InputPhase::Up => &self.up,
        }
    }

    fn registry_mut(&mut self, phase: InputPhase) -> &mut ListenerRegistry {
        match phase {
            InputPhase::Down => &mut self.down,
            InputPhase::Up => &mut self.up,
        }
    }
}

/// The controls aggregator
///
/// Cloning yields another handle to the same table and registries. The
/// aggregator keeps its sources alive; the sources only hold weak
/// references back.
///
/// ## Example
///
/// ```
/// use controls::Controls;
/// use input_types::InputAction;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let controls = Controls::new(Vec::new());
/// let presses = Rc::new(Cell::new(0));
/// let counter = presses.clone();
/// let handle = controls.on_key_down(InputAction::A, move || counter.set(counter.get() + 1));
///
/// controls.key_down(InputAction::A);
/// controls.key_down(InputAction::A);
/// assert_eq!(presses.get(), 1);
///
/// handle.dispose().unwrap();
/// ```
#[derive(Clone)]
pub struct Controls {
    inner: Rc<RefCell<Inner>>,
    sources: Rc<Vec<Rc<dyn InputSource>>>,
}

impl Controls {
    /// Creates an aggregator and wires every source into it
    ///
    /// Each source keeps its own slots; wiring order only affects the order
    /// sources appear in `source_names`.
    pub fn new(sources: Vec<Rc<dyn InputSource>>) -> Self {
        let inner = Rc::new(RefCell::new(Inner {
            state: InputState::new(),
            down: ListenerRegistry::new(),
            up: ListenerRegistry::new(),
            next_listener: 1,
        }));

        for source in &sources {
            let weak = Rc::downgrade(&inner);
            source.slots().set_on_input_down(Rc::new(move |action| {
                if let Some(inner) = weak.upgrade() {
                    dispatch_down(&inner, action);
                }
            }));

            let weak = Rc::downgrade(&inner);
            source.slots().set_on_input_up(Rc::new(move |action| {
                if let Some(inner) = weak.upgrade() {
                    dispatch_up(&inner, action);
                }
            }));

            tracing::debug!(source = source.name(), "input source wired");
        }

        Self {
            inner,
            sources: Rc::new(sources),
        }
    }

    /// Marks `action` held and fires its down listeners
    ///
    /// Does nothing if `action` is already held.
    pub fn key_down(&self, action: InputAction) {
        dispatch_down(&self.inner, action);
    }

    /// Marks `action` released and fires its up listeners
    ///
    /// Always fires, whether or not `action` was held.
    pub fn key_up(&self, action: InputAction) {
        dispatch_up(&self.inner, action);
    }

    /// Registers a listener for `action` going down
    pub fn on_key_down(&self, action: InputAction, listener: impl Fn() + 'static) -> Disposable {
        self.register(InputPhase::Down, action, Rc::new(listener))
    }

    /// Registers a listener for `action` going up
    pub fn on_key_up(&self, action: InputAction, listener: impl Fn() + 'static) -> Disposable {
        self.register(InputPhase::Up, action, Rc::new(listener))
    }

    /// Registers a listener for either phase
    ///
    /// Disposing the returned handle removes exactly this listener.
    pub fn register(&self, phase: InputPhase, action: InputAction, listener: Listener) -> Disposable {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = ListenerId::new(inner.next_listener);
            inner.next_listener += 1;
            inner.registry_mut(phase).add(action, id, listener);
            id
        };

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        Disposable::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().registry_mut(phase).remove(action, id);
            }
        })
    }

    /// Releases every action without touching the listener registries
    pub fn reset(&self) {
        self.inner.borrow_mut().state.reset();
    }

    /// Copy of the current held table
    pub fn state(&self) -> InputState {
        self.inner.borrow().state
    }

    /// Checks if `action` is held
    pub fn is_held(&self, action: InputAction) -> bool {
        self.inner.borrow().state.is_held(action)
    }

    /// Number of listeners registered for `action` in `phase`
    pub fn listener_count(&self, phase: InputPhase, action: InputAction) -> usize {
        self.inner.borrow().registry(phase).count(action)
    }

    /// Checks if `action` has a registry entry in `phase`
    pub fn has_registry(&self, phase: InputPhase, action: InputAction) -> bool {
        self.inner.borrow().registry(phase).contains(action)
    }

    /// Names of the wired sources, in wiring order
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for Controls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Controls")
            .field("state", &inner.state)
            .field("down", &inner.down)
            .field("up", &inner.up)
            .field("sources", &self.source_names())
            .finish()
    }
}

fn dispatch_down(inner: &Rc<RefCell<Inner>>, action: InputAction) {
    let listeners = {
        let mut inner = inner.borrow_mut();
        if inner.state.is_held(action) {
            tracing::debug!(%action, "down ignored, already held");
            return;
        }
        inner.state.set(action, true);
        inner.down.snapshot(action)
    };

    tracing::debug!(%action, listeners = listeners.len(), "key down");
    for listener in listeners {
        listener();
    }
}

fn dispatch_up(inner: &Rc<RefCell<Inner>>, action: InputAction) {
    let listeners = {
        let mut inner = inner.borrow_mut();
        inner.state.set(action, false);
        inner.up.snapshot(action)
    };

    tracing::debug!(%action, listeners = listeners.len(), "key up");
    for listener in listeners {
        listener();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_sources::{ButtonSource, KeyboardSource, PointerId};
    use std::cell::Cell;

    fn counter(controls: &Controls, phase: InputPhase, action: InputAction) -> (Rc<Cell<u32>>, Disposable) {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let handle = controls.register(phase, action, Rc::new(move || h.set(h.get() + 1)));
        (hits, handle)
    }

    #[test]
    fn test_double_down_fires_once() {
        let controls = Controls::default();
        let (hits, _handle) = counter(&controls, InputPhase::Down, InputAction::Left);

        controls.key_down(InputAction::Left);
        controls.key_down(InputAction::Left);

        assert_eq!(hits.get(), 1);
        assert!(controls.is_held(InputAction::Left));
    }

    #[test]
    fn test_up_always_fires() {
        let controls = Controls::default();
        let (hits, _handle) = counter(&controls, InputPhase::Up, InputAction::B);

        controls.key_up(InputAction::B);
        controls.key_up(InputAction::B);

        assert_eq!(hits.get(), 2);
        assert!(!controls.is_held(InputAction::B));
    }

    #[test]
    fn test_down_after_up_fires_again() {
        let controls = Controls::default();
        let (hits, _handle) = counter(&controls, InputPhase::Down, InputAction::A);

        controls.key_down(InputAction::A);
        controls.key_up(InputAction::A);
        controls.key_down(InputAction::A);

        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let controls = Controls::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut handles = Vec::new();
        for name in ["first", "second", "third"] {
            let log = log.clone();
            handles.push(controls.on_key_down(InputAction::Up, move || log.borrow_mut().push(name)));
        }

        controls.key_down(InputAction::Up);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_state_updated_before_listeners() {
        let controls = Controls::default();
        let seen = Rc::new(Cell::new(false));
        let watched = controls.clone();
        let s = seen.clone();
        let _handle = controls.on_key_down(InputAction::Right, move || s.set(watched.is_held(InputAction::Right)));

        controls.key_down(InputAction::Right);
        assert!(seen.get());
    }

    #[test]
    fn test_reset_keeps_listeners() {
        let controls = Controls::default();
        let (hits, _handle) = counter(&controls, InputPhase::Down, InputAction::Down);

        controls.key_down(InputAction::Down);
        controls.key_down(InputAction::A);
        controls.reset();

        assert!(controls.state().is_idle());
        assert_eq!(controls.listener_count(InputPhase::Down, InputAction::Down), 1);

        controls.key_down(InputAction::Down);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_dispose_removes_only_that_listener() {
        let controls = Controls::default();
        let (first, first_handle) = counter(&controls, InputPhase::Down, InputAction::A);
        let (second, second_handle) = counter(&controls, InputPhase::Down, InputAction::A);

        first_handle.dispose().unwrap();
        assert!(controls.has_registry(InputPhase::Down, InputAction::A));
        assert_eq!(controls.listener_count(InputPhase::Down, InputAction::A), 1);

        controls.key_down(InputAction::A);
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);

        second_handle.dispose().unwrap();
        assert!(!controls.has_registry(InputPhase::Down, InputAction::A));
    }

    #[test]
    fn test_same_closure_registered_twice_removed_once() {
        let controls = Controls::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let listener: Listener = Rc::new(move || h.set(h.get() + 1));

        let a = controls.register(InputPhase::Up, InputAction::Up, listener.clone());
        let _b = controls.register(InputPhase::Up, InputAction::Up, listener);

        a.dispose().unwrap();
        controls.key_up(InputAction::Up);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_may_dispose_itself() {
        let controls = Controls::default();
        let slot: Rc<RefCell<Option<Disposable>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let s = slot.clone();
        let h = hits.clone();
        let handle = controls.on_key_down(InputAction::B, move || {
            h.set(h.get() + 1);
            if let Some(handle) = s.borrow_mut().take() {
                handle.dispose().unwrap();
            }
        });
        *slot.borrow_mut() = Some(handle);

        controls.key_down(InputAction::B);
        controls.key_up(InputAction::B);
        controls.key_down(InputAction::B);

        assert_eq!(hits.get(), 1);
        assert!(!controls.has_registry(InputPhase::Down, InputAction::B));
    }

    #[test]
    fn test_listener_registered_during_dispatch_waits_for_next_event() {
        let controls = Controls::default();
        let late_hits = Rc::new(Cell::new(0));
        let handles = Rc::new(RefCell::new(Vec::new()));

        let c = controls.clone();
        let lh = late_hits.clone();
        let hs = handles.clone();
        let _outer = controls.on_key_up(InputAction::A, move || {
            let lh = lh.clone();
            hs.borrow_mut().push(c.on_key_up(InputAction::A, move || lh.set(lh.get() + 1)));
        });

        controls.key_up(InputAction::A);
        assert_eq!(late_hits.get(), 0);
        controls.key_up(InputAction::A);
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn test_dispose_after_controls_dropped() {
        let controls = Controls::default();
        let (_hits, handle) = counter(&controls, InputPhase::Down, InputAction::A);
        drop(controls);
        assert!(handle.dispose().is_ok());
    }

    #[test]
    fn test_sources_funnel_into_one_table() {
        let buttons = Rc::new(ButtonSource::new());
        let keyboard = Rc::new(KeyboardSource::new());
        let controls = Controls::new(vec![
            buttons.clone() as Rc<dyn InputSource>,
            keyboard.clone() as Rc<dyn InputSource>,
        ]);
        let (hits, _handle) = counter(&controls, InputPhase::Down, InputAction::A);

        buttons.pointer_down(InputAction::A, PointerId(1));
        keyboard.key_down("KeyJ");
        assert_eq!(hits.get(), 1);
        assert!(controls.is_held(InputAction::A));

        keyboard.key_up("KeyX");
        assert!(!controls.is_held(InputAction::A));
        assert_eq!(controls.source_names(), vec!["actions", "keyboard"]);
    }

    #[test]
    fn test_source_outliving_controls_is_inert() {
        let keyboard = Rc::new(KeyboardSource::new());
        let controls = Controls::new(vec![keyboard.clone() as Rc<dyn InputSource>]);
        drop(controls);

        assert_eq!(keyboard.key_down("KeyW"), Some(InputAction::Up));
    }
}
