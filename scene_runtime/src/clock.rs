//! Frame clocks

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Callback run on an animation frame with the frame timestamp in ms
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Handle for a requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRequestId(u64);

impl FrameRequestId {
    /// Creates a request id from a raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Source of animation frames (`requestAnimationFrame` on the web)
pub trait FrameScheduler {
    /// Current time in milliseconds
    fn now_ms(&self) -> f64;

    /// Runs `callback` on the next frame
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId;

    /// Drops a requested frame that has not run yet
    fn cancel_frame(&self, id: FrameRequestId);
}

struct ClockInner {
    now: f64,
    next_id: u64,
    pending: Vec<(FrameRequestId, FrameCallback)>,
}

/// Deterministic frame clock driven by hand
///
/// Time only moves on `advance`, which runs every frame requested before
/// the call. Frames requested while running land on the next advance.
/// Clones share the same clock.
///
/// ## Example
///
/// ```
/// use scene_runtime::{FrameScheduler, ManualFrameClock};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let clock = ManualFrameClock::new();
/// let seen = Rc::new(Cell::new(0.0));
/// let s = seen.clone();
/// clock.request_frame(Box::new(move |now| s.set(now)));
///
/// assert_eq!(clock.advance(16.0), 1);
/// assert_eq!(seen.get(), 16.0);
/// ```
#[derive(Clone)]
pub struct ManualFrameClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl ManualFrameClock {
    /// Creates a clock at time zero
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Creates a clock at `now` ms
    pub fn starting_at(now: f64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ClockInner {
                now,
                next_id: 1,
                pending: Vec::new(),
            })),
        }
    }

    /// Moves time forward by `ms` and runs the due frames
    ///
    /// Returns the number of frame callbacks run.
    pub fn advance(&self, ms: f64) -> usize {
        let (now, due) = {
            let mut inner = self.inner.borrow_mut();
            inner.now += ms;
            (inner.now, std::mem::take(&mut inner.pending))
        };

        let count = due.len();
        for (_, callback) in due {
            callback(now);
        }
        count
    }

    /// Advances `frames` times by `step_ms`
    ///
    /// Returns the total number of frame callbacks run.
    pub fn run_frames(&self, frames: usize, step_ms: f64) -> usize {
        (0..frames).map(|_| self.advance(step_ms)).sum()
    }

    /// Number of requested frames waiting to run
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }
}

impl Default for ManualFrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for ManualFrameClock {
    fn now_ms(&self) -> f64 {
        self.inner.borrow().now
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let mut inner = self.inner.borrow_mut();
        let id = FrameRequestId(inner.next_id);
        inner.next_id += 1;
        inner.pending.push((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        self.inner.borrow_mut().pending.retain(|(rid, _)| *rid != id);
    }
}

impl fmt::Debug for ManualFrameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ManualFrameClock")
            .field("now", &inner.now)
            .field("pending", &inner.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_frames_requested_during_advance_wait() {
        let clock = ManualFrameClock::new();
        let hits = Rc::new(Cell::new(0));

        let c = clock.clone();
        let h = hits.clone();
        clock.request_frame(Box::new(move |_| {
            h.set(h.get() + 1);
            let h = h.clone();
            c.request_frame(Box::new(move |_| h.set(h.get() + 1)));
        }));

        assert_eq!(clock.advance(10.0), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(clock.pending(), 1);
        assert_eq!(clock.advance(10.0), 1);
        assert_eq!(hits.get(), 2);
        assert_eq!(clock.now_ms(), 20.0);
    }

    #[test]
    fn test_cancel_frame() {
        let clock = ManualFrameClock::starting_at(100.0);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = clock.request_frame(Box::new(move |_| h.set(h.get() + 1)));

        clock.cancel_frame(id);
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.advance(16.0), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_run_frames() {
        let clock = ManualFrameClock::new();
        assert_eq!(clock.run_frames(3, 16.0), 0);
        assert_eq!(clock.now_ms(), 48.0);
    }
}
