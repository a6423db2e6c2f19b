//! Frame-driven animation helpers

use crate::FrameScheduler;
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::rc::Rc;

/// Calls `block` once per frame with the progress fraction in `[0, 1]`
///
/// Progress is `elapsed / duration_ms`, clamped. The last call always sees
/// exactly `1.0`, after which the future resolves. A non-positive duration
/// makes a single call with `1.0`. Dropping the future stops the animation
/// at its next frame.
pub fn animate(
    clock: Rc<dyn FrameScheduler>,
    duration_ms: f64,
    block: impl FnMut(f64) + 'static,
) -> LocalBoxFuture<'static, ()> {
    let (tx, rx) = oneshot::channel::<()>();
    let start = clock.now_ms();
    let step = Rc::new(RefCell::new(AnimationStep {
        clock: clock.clone(),
        start,
        duration_ms,
        block: Box::new(block),
        done: Some(tx),
    }));
    clock.request_frame(AnimationStep::callback(step));

    async move {
        let _ = rx.await;
    }
    .boxed_local()
}

/// Resolves on the first frame at least `ms` after the call
///
/// Resolves immediately for `ms <= 0`.
pub fn pause(clock: Rc<dyn FrameScheduler>, ms: f64) -> LocalBoxFuture<'static, ()> {
    if ms <= 0.0 {
        return futures::future::ready(()).boxed_local();
    }
    animate(clock, ms, |_| {})
}

struct AnimationStep {
    clock: Rc<dyn FrameScheduler>,
    start: f64,
    duration_ms: f64,
    block: Box<dyn FnMut(f64)>,
    done: Option<oneshot::Sender<()>>,
}

impl AnimationStep {
    fn callback(step: Rc<RefCell<AnimationStep>>) -> crate::FrameCallback {
        Box::new(move |now| AnimationStep::run(step, now))
    }

    fn run(step: Rc<RefCell<AnimationStep>>, now: f64) {
        let (fraction, clock) = {
            let s = step.borrow();
            match &s.done {
                Some(done) if !done.is_canceled() => {}
                _ => return,
            }
            (progress(now - s.start, s.duration_ms), s.clock.clone())
        };

        // Take the block out so a nested frame request cannot see a borrow.
        let mut block: Box<dyn FnMut(f64)> =
            std::mem::replace(&mut step.borrow_mut().block, Box::new(|_| {}));
        block(fraction);
        step.borrow_mut().block = block;

        if fraction < 1.0 {
            clock.request_frame(AnimationStep::callback(step));
        } else if let Some(done) = step.borrow_mut().done.take() {
            let _ = done.send(());
        }
    }
}

fn progress(elapsed: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    (elapsed / duration_ms).clamp(0.0, 1.0)
}
