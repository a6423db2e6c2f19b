//! The scene engine

use crate::scene::UpdateFn;
use crate::{DisplayAccess, Finish, FrameRequestId, FrameScheduler, RunError, RunId, Runtime, Scene};
use controls::Controls;
use disposables::CompositeDisposable;
use futures::channel::oneshot;
use futures::future::{self, Either, FutureExt, LocalBoxFuture};
use lifecycle::{CancellationReason, CancellationSource, CancellationToken};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::task::Context;
use tracing::Instrument;

/// Phase of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    Created,
    SettingUp,
    /// Set up, no update loop
    Idle,
    /// Set up, update loop running
    Updating,
    TearingDown,
    Finished,
}

impl RunPhase {
    /// Checks if moving from `self` to `next` is a legal step
    pub fn can_transition_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Created, SettingUp)
                | (SettingUp, Idle)
                | (SettingUp, Updating)
                | (SettingUp, TearingDown)
                | (Idle, TearingDown)
                | (Updating, TearingDown)
                | (TearingDown, Finished)
        )
    }

    fn advance(&mut self, next: RunPhase) {
        debug_assert!(self.can_transition_to(next), "{} -> {}", self, next);
        tracing::debug!(from = %self, to = %next, "run phase");
        *self = next;
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Created => "created",
            RunPhase::SettingUp => "setting_up",
            RunPhase::Idle => "idle",
            RunPhase::Updating => "updating",
            RunPhase::TearingDown => "tearing_down",
            RunPhase::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// How a run reached its end
enum Outcome<R> {
    Finished(R),
    Cancelled(CancellationReason),
    Abandoned,
}

struct LoopState {
    pending: Option<FrameRequestId>,
    stopped: bool,
    last_tick: f64,
}

/// The update loop of one run
#[derive(Clone)]
struct FrameLoop {
    clock: Rc<dyn FrameScheduler>,
    state: Rc<RefCell<LoopState>>,
}

impl FrameLoop {
    fn new(clock: Rc<dyn FrameScheduler>) -> Self {
        let now = clock.now_ms();
        Self {
            clock,
            state: Rc::new(RefCell::new(LoopState {
                pending: None,
                stopped: false,
                last_tick: now,
            })),
        }
    }

    fn is_stopped(&self) -> bool {
        self.state.borrow().stopped
    }

    /// Stops the loop and drops its pending frame
    fn stop(&self) {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.stopped = true;
            state.pending.take()
        };
        if let Some(id) = pending {
            self.clock.cancel_frame(id);
        }
    }

    /// Seconds since the previous tick
    fn tick(&self, now: f64) -> f64 {
        let mut state = self.state.borrow_mut();
        state.pending = None;
        let dt = (now - state.last_tick) / 1000.0;
        state.last_tick = now;
        dt
    }

    fn start<S: 'static, R: 'static>(
        &self,
        runtime: Rc<RefCell<Option<Runtime<S, R>>>>,
        update: UpdateFn<S, R>,
        finished: Rc<Cell<bool>>,
    ) {
        self.state.borrow_mut().last_tick = self.clock.now_ms();
        self.request(runtime, update, finished);
    }

    fn request<S: 'static, R: 'static>(
        &self,
        runtime: Rc<RefCell<Option<Runtime<S, R>>>>,
        update: UpdateFn<S, R>,
        finished: Rc<Cell<bool>>,
    ) {
        let frames = self.clone();
        let id = self.clock.request_frame(Box::new(move |now| {
            if frames.is_stopped() || finished.get() {
                return;
            }
            let dt = frames.tick(now);

            // Take the runtime out so no borrow is held while the scene runs.
            let taken = runtime.borrow_mut().take();
            if let Some(mut rt) = taken {
                update(&mut rt, dt);
                *runtime.borrow_mut() = Some(rt);
            }

            if frames.is_stopped() || finished.get() {
                return;
            }
            frames.request(runtime, update, finished);
        }));
        self.state.borrow_mut().pending = Some(id);
    }
}

/// Decrements the engine's run count when a run ends or is dropped
struct ActiveRun(Rc<Cell<usize>>);

impl ActiveRun {
    fn enter(count: &Rc<Cell<usize>>) -> Self {
        let active = count.get();
        if active > 0 {
            tracing::warn!(active, "concurrent scene runs share the same controls");
        }
        count.set(active + 1);
        Self(count.clone())
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Cancels a run whose future was dropped before it settled
struct CancelOnDrop(CancellationSource);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.0.is_cancelled() {
            tracing::info!("run dropped before it settled");
            self.0.cancel(CancellationReason::Custom("dropped".to_string()));
        }
    }
}

/// Polls `future` now, then once per frame until it completes
fn drive_detached(clock: Rc<dyn FrameScheduler>, mut future: LocalBoxFuture<'static, ()>) {
    let mut cx = Context::from_waker(futures::task::noop_waker_ref());
    if future.poll_unpin(&mut cx).is_pending() {
        let next = clock.clone();
        clock.request_frame(Box::new(move |_| drive_detached(next, future)));
    }
}

/// Drives scenes through setup, update and teardown
///
/// The engine owns nothing per run; every run gets its own runtime,
/// cancellation source and disposable bag. The controls are shared by all
/// runs. Cloning is cheap.
#[derive(Clone)]
pub struct SceneEngine {
    controls: Controls,
    display: DisplayAccess,
    clock: Rc<dyn FrameScheduler>,
    active_runs: Rc<Cell<usize>>,
}

impl SceneEngine {
    /// Creates an engine over shared controls, a display and a frame clock
    pub fn new(controls: Controls, display: DisplayAccess, clock: Rc<dyn FrameScheduler>) -> Self {
        Self {
            controls,
            display,
            clock,
            active_runs: Rc::new(Cell::new(0)),
        }
    }

    /// The shared controls
    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// The frame clock
    pub fn clock(&self) -> Rc<dyn FrameScheduler> {
        self.clock.clone()
    }

    /// Number of runs in progress
    pub fn active_runs(&self) -> usize {
        self.active_runs.get()
    }

    /// Runs `scene` until it finishes
    pub fn run<P, S, R>(&self, scene: &Scene<P, S, R>, params: P) -> LocalBoxFuture<'static, Result<R, RunError>>
    where
        P: 'static,
        S: 'static,
        R: 'static,
    {
        self.run_until_cancelled(scene, params, CancellationToken::none())
    }

    /// Runs `scene` until it finishes or `token` is cancelled
    ///
    /// The run ends in this order: the run's disposables are released, the
    /// shared controls are reset, the update loop stops, then teardown runs.
    /// A finished run resolves with the value passed to `finish` without
    /// waiting for teardown, which keeps going on later frames if it
    /// suspends; its value is ignored. A cancelled run awaits teardown and
    /// resolves with its value if it supplies one, otherwise with
    /// `RunError::Cancelled`. Dropping the returned future cancels the run
    /// with `CancellationReason::Custom("dropped")` and skips teardown.
    pub fn run_until_cancelled<P, S, R>(
        &self,
        scene: &Scene<P, S, R>,
        params: P,
        token: CancellationToken,
    ) -> LocalBoxFuture<'static, Result<R, RunError>>
    where
        P: 'static,
        S: 'static,
        R: 'static,
    {
        let engine = self.clone();
        let scene = scene.clone();
        let run_id = RunId::new();
        let span = tracing::info_span!("scene_run", run_id = %run_id);

        async move { engine.drive(scene, params, token, run_id).await }
            .instrument(span)
            .boxed_local()
    }

    async fn drive<P, S, R>(
        self,
        scene: Scene<P, S, R>,
        params: P,
        token: CancellationToken,
        run_id: RunId,
    ) -> Result<R, RunError>
    where
        P: 'static,
        S: 'static,
        R: 'static,
    {
        let _active = ActiveRun::enter(&self.active_runs);
        let mut phase = RunPhase::Created;
        tracing::info!("run started");

        let run_source = CancellationSource::new();
        let _dropped = CancelOnDrop(run_source.clone());
        let disposables = CompositeDisposable::new();
        let (finish, result_rx, finished) = finish_channel::<R>();
        let frames = FrameLoop::new(self.clock.clone());

        let run_token = run_source.token();
        {
            let disposables = disposables.clone();
            run_token.on_cancel(move |_| {
                if let Err(err) = disposables.dispose() {
                    tracing::warn!(error = %err, "run resources failed to release");
                }
            });
        }
        {
            let controls = self.controls.clone();
            run_token.on_cancel(move |_| controls.reset());
        }
        {
            let frames = frames.clone();
            run_token.on_cancel(move |_| frames.stop());
        }

        let base = Runtime::from_parts(
            self.controls.clone(),
            (),
            disposables,
            finish,
            self.display.clone(),
            self.clock.clone(),
            run_id,
        );

        phase.advance(RunPhase::SettingUp);
        let setup = (scene.setup)(base.clone(), params);
        let state = match future::select(setup, token.cancelled()).await {
            Either::Left((Ok(state), _)) => state,
            Either::Left((Err(err), _)) => {
                tracing::warn!(error = %err, "scene setup failed");
                phase.advance(RunPhase::TearingDown);
                run_source.cancel(CancellationReason::Custom("setup failed".to_string()));
                phase.advance(RunPhase::Finished);
                return Err(RunError::Setup(err));
            }
            Either::Right((reason, _)) => {
                tracing::info!(%reason, "run cancelled during setup");
                phase.advance(RunPhase::TearingDown);
                run_source.cancel(reason.clone());
                phase.advance(RunPhase::Finished);
                return Err(RunError::Cancelled { reason });
            }
        };

        let runtime = Rc::new(RefCell::new(Some(base.with_state(state))));
        match &scene.update {
            Some(update) if !finished.get() && !run_source.is_cancelled() => {
                phase.advance(RunPhase::Updating);
                frames.start(runtime.clone(), update.clone(), finished.clone());
            }
            _ => phase.advance(RunPhase::Idle),
        }

        let outcome = match future::select(result_rx, token.cancelled()).await {
            Either::Left((Ok(result), _)) => Outcome::Finished(result),
            Either::Left((Err(_), _)) => Outcome::Abandoned,
            Either::Right((reason, _)) => Outcome::Cancelled(reason),
        };

        phase.advance(RunPhase::TearingDown);
        let reason = match &outcome {
            Outcome::Finished(_) => CancellationReason::Finished,
            Outcome::Cancelled(reason) => reason.clone(),
            Outcome::Abandoned => CancellationReason::Custom("abandoned".to_string()),
        };
        run_source.cancel(reason);

        let taken = runtime.borrow_mut().take();
        let teardown = match (&scene.teardown, taken) {
            (Some(teardown), Some(rt)) => Some(teardown(rt)),
            _ => None,
        };

        let cancelled = match outcome {
            Outcome::Finished(result) => {
                if let Some(teardown) = teardown {
                    let detached = async move {
                        if teardown.await.is_some() {
                            tracing::debug!("teardown result ignored, run already finished");
                        }
                    }
                    .instrument(tracing::Span::current())
                    .boxed_local();
                    drive_detached(self.clock.clone(), detached);
                }
                phase.advance(RunPhase::Finished);
                tracing::info!("run finished");
                return Ok(result);
            }
            Outcome::Cancelled(reason) => Some(reason),
            Outcome::Abandoned => None,
        };

        let torn_down = match teardown {
            Some(teardown) => teardown.await,
            None => None,
        };
        phase.advance(RunPhase::Finished);

        match (cancelled, torn_down) {
            (Some(reason), Some(result)) => {
                tracing::info!(%reason, "run cancelled, teardown supplied the result");
                Ok(result)
            }
            (Some(reason), None) => {
                tracing::info!(%reason, "run cancelled");
                Err(RunError::Cancelled { reason })
            }
            (None, torn_down) => torn_down.ok_or(RunError::Abandoned),
        }
    }
}

impl fmt::Debug for SceneEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneEngine")
            .field("controls", &self.controls)
            .field("display", &self.display)
            .field("active_runs", &self.active_runs.get())
            .finish()
    }
}

/// The finish capability of one run and the receiving end of its result
fn finish_channel<R: 'static>() -> (Finish<R>, oneshot::Receiver<R>, Rc<Cell<bool>>) {
    let (tx, rx) = oneshot::channel();
    let sender = RefCell::new(Some(tx));
    let finished = Rc::new(Cell::new(false));

    let flag = finished.clone();
    let finish = Finish::new(move |result: R| {
        let tx = sender.borrow_mut().take();
        match tx {
            Some(tx) => {
                flag.set(true);
                tracing::debug!("finish");
                if tx.send(result).is_err() {
                    tracing::debug!("finish arrived after the run ended");
                }
            }
            None => tracing::debug!("finish called again, ignored"),
        }
    });

    (finish, rx, finished)
}
