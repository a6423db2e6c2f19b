//! Scene values

use crate::{Runtime, SceneError};
use futures::future::{FutureExt, LocalBoxFuture};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

pub(crate) type SetupFn<P, S, R> =
    Rc<dyn Fn(Runtime<(), R>, P) -> LocalBoxFuture<'static, Result<S, SceneError>>>;
pub(crate) type UpdateFn<S, R> = Rc<dyn Fn(&mut Runtime<S, R>, f64)>;
pub(crate) type TeardownFn<S, R> = Rc<dyn Fn(Runtime<S, R>) -> LocalBoxFuture<'static, Option<R>>>;

/// A unit of interactive behavior
///
/// - `setup(runtime, params)` produces the run's state; it may suspend
/// - `update(runtime, dt)` runs once per frame, `dt` in seconds
/// - `teardown(runtime)` runs when the run ends; it may suspend and may
///   supply a result for runs cancelled from outside
///
/// A scene holds no run state of its own, so one value can be run any
/// number of times. Cloning is cheap.
///
/// ## Example
///
/// ```
/// use scene_runtime::Scene;
///
/// let countdown: Scene<u32, u32, &'static str> = Scene::new(|_rt, frames| Ok(frames))
///     .with_update(|rt, _dt| {
///         if rt.state == 0 {
///             rt.finish("done");
///         } else {
///             rt.state -= 1;
///         }
///     });
/// assert!(countdown.has_update());
/// ```
pub struct Scene<P, S, R> {
    pub(crate) setup: SetupFn<P, S, R>,
    pub(crate) update: Option<UpdateFn<S, R>>,
    pub(crate) teardown: Option<TeardownFn<S, R>>,
}

impl<P: 'static, S: 'static, R: 'static> Scene<P, S, R> {
    /// Creates a scene with a synchronous setup
    pub fn new(setup: impl Fn(&Runtime<(), R>, P) -> Result<S, SceneError> + 'static) -> Self {
        Self {
            setup: Rc::new(move |runtime, params| {
                let state = setup(&runtime, params);
                async move { state }.boxed_local()
            }),
            update: None,
            teardown: None,
        }
    }

    /// Creates a scene whose setup suspends
    pub fn new_async<F, Fut>(setup: F) -> Self
    where
        F: Fn(Runtime<(), R>, P) -> Fut + 'static,
        Fut: Future<Output = Result<S, SceneError>> + 'static,
    {
        Self {
            setup: Rc::new(move |runtime, params| setup(runtime, params).boxed_local()),
            update: None,
            teardown: None,
        }
    }

    /// Adds a per-frame update
    pub fn with_update(mut self, update: impl Fn(&mut Runtime<S, R>, f64) + 'static) -> Self {
        self.update = Some(Rc::new(update));
        self
    }

    /// Adds a synchronous teardown
    pub fn with_teardown(mut self, teardown: impl Fn(&mut Runtime<S, R>) -> Option<R> + 'static) -> Self {
        self.teardown = Some(Rc::new(move |mut runtime| {
            let result = teardown(&mut runtime);
            async move { result }.boxed_local()
        }));
        self
    }

    /// Adds a teardown that suspends
    pub fn with_async_teardown<F, Fut>(mut self, teardown: F) -> Self
    where
        F: Fn(Runtime<S, R>) -> Fut + 'static,
        Fut: Future<Output = Option<R>> + 'static,
    {
        self.teardown = Some(Rc::new(move |runtime| teardown(runtime).boxed_local()));
        self
    }
}

impl<P, S, R> Scene<P, S, R> {
    /// Checks if the scene has a per-frame update
    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }

    /// Checks if the scene has a teardown
    pub fn has_teardown(&self) -> bool {
        self.teardown.is_some()
    }
}

impl<P, S, R> Clone for Scene<P, S, R> {
    fn clone(&self) -> Self {
        Self {
            setup: self.setup.clone(),
            update: self.update.clone(),
            teardown: self.teardown.clone(),
        }
    }
}

impl<P, S, R> fmt::Debug for Scene<P, S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("update", &self.has_update())
            .field("teardown", &self.has_teardown())
            .finish()
    }
}
