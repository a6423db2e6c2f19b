//! The per-run context handed to scenes

use crate::FrameScheduler;
use controls::Controls;
use disposables::{CompositeDisposable, Disposable};
use display_slot::{DisplayError, DisplayNode, DisplaySlot};
use input_types::InputAction;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Unique identifier for one scene run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new unique run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID value
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run:{}", self.0)
    }
}

/// Capability to conclude a run with a result
pub struct Finish<R>(Rc<dyn Fn(R)>);

impl<R> Finish<R> {
    /// Wraps the function that receives the result
    pub fn new(f: impl Fn(R) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Hands over the result
    pub fn call(&self, result: R) {
        (self.0)(result)
    }
}

impl<R> Clone for Finish<R> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<R> fmt::Debug for Finish<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Finish")
    }
}

/// What a runtime may do with the console screen
#[derive(Debug, Clone)]
pub enum DisplayAccess {
    /// Scenes mount into this slot
    Slot(DisplaySlot),
    /// No screen (code running inside an embedded frame)
    Unavailable,
}

/// Per-run context passed to a scene's lifecycle functions
///
/// `controls` is shared with every other run on the console. `state` and
/// `disposables` belong to this run; everything added to `disposables` is
/// released when the run ends.
pub struct Runtime<S, R> {
    pub controls: Controls,
    pub state: S,
    pub disposables: CompositeDisposable,
    finish: Finish<R>,
    display: DisplayAccess,
    clock: Rc<dyn FrameScheduler>,
    run_id: RunId,
}

impl<S, R> Runtime<S, R> {
    /// Assembles a runtime from its parts
    pub fn from_parts(
        controls: Controls,
        state: S,
        disposables: CompositeDisposable,
        finish: Finish<R>,
        display: DisplayAccess,
        clock: Rc<dyn FrameScheduler>,
        run_id: RunId,
    ) -> Self {
        Self {
            controls,
            state,
            disposables,
            finish,
            display,
            clock,
            run_id,
        }
    }

    /// Concludes the run with `result`
    ///
    /// Only the first call per run has an effect.
    pub fn finish(&self, result: R) {
        self.finish.call(result);
    }

    /// Claims the display slot for `node`, or clears it for `None`
    pub fn set_display(&self, node: Option<DisplayNode>) -> Result<Disposable, DisplayError> {
        match &self.display {
            DisplayAccess::Slot(slot) => slot.set_current(node),
            DisplayAccess::Unavailable => Err(DisplayError::Unavailable),
        }
    }

    /// Registers a down listener that lives as long as this run
    pub fn on_key_down(&self, action: InputAction, listener: impl Fn() + 'static) -> Disposable {
        let handle = self.controls.on_key_down(action, listener);
        self.disposables.add(handle.clone());
        handle
    }

    /// Registers an up listener that lives as long as this run
    pub fn on_key_up(&self, action: InputAction, listener: impl Fn() + 'static) -> Disposable {
        let handle = self.controls.on_key_up(action, listener);
        self.disposables.add(handle.clone());
        handle
    }

    /// The clock driving this run's frames
    pub fn clock(&self) -> Rc<dyn FrameScheduler> {
        self.clock.clone()
    }

    /// The finish capability, for handing to other parts of a scene
    pub fn finisher(&self) -> Finish<R> {
        self.finish.clone()
    }

    /// Identifier of this run
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Replaces the state, keeping every other part
    pub fn with_state<T>(self, state: T) -> Runtime<T, R> {
        Runtime {
            controls: self.controls,
            state,
            disposables: self.disposables,
            finish: self.finish,
            display: self.display,
            clock: self.clock,
            run_id: self.run_id,
        }
    }
}

impl<S: Clone, R> Clone for Runtime<S, R> {
    fn clone(&self) -> Self {
        Self {
            controls: self.controls.clone(),
            state: self.state.clone(),
            disposables: self.disposables.clone(),
            finish: self.finish.clone(),
            display: self.display.clone(),
            clock: self.clock.clone(),
            run_id: self.run_id,
        }
    }
}

impl<S: fmt::Debug, R> fmt::Debug for Runtime<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("run_id", &self.run_id)
            .field("state", &self.state)
            .field("disposables", &self.disposables)
            .field("display", &self.display)
            .finish()
    }
}
