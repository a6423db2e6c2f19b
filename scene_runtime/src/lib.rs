//! # Scene Runtime
//!
//! Runs scenes: small units of interactive behavior with a setup, an
//! optional per-frame update and an optional teardown.
//!
//! ## Philosophy
//!
//! - **Runs are isolated**: Each run gets its own state, cancellation and
//!   disposable bag; only the controls are shared
//! - **Deterministic cleanup**: Ending a run releases its resources, resets
//!   the controls and stops its frames, in that order
//! - **First result wins**: `finish` concludes a run once; later calls are
//!   ignored
//! - **Injected time**: Frames come from a `FrameScheduler`, so tests drive
//!   time by hand
//!
//! ## Core Concepts
//!
//! - `Scene`: setup, update and teardown functions
//! - `Runtime`: per-run context handed to those functions
//! - `SceneEngine`: drives a scene from setup to result
//! - `animate` and `pause`: frame-driven helpers for scene code
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A game loop with fixed timesteps
//! - Multi-threaded (every handle is `Rc`-based)

pub mod animation;
pub mod clock;
pub mod engine;
pub mod runtime;
pub mod scene;

pub use animation::{animate, pause};
pub use clock::{FrameCallback, FrameRequestId, FrameScheduler, ManualFrameClock};
pub use engine::{RunPhase, SceneEngine};
pub use lifecycle::{CancellationReason, CancellationSource, CancellationToken};
pub use runtime::{DisplayAccess, Finish, RunId, Runtime};
pub use scene::Scene;

use display_slot::DisplayError;
use thiserror::Error;

/// Errors raised by scene code
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Scene error: {0}")]
    Custom(String),
}

impl SceneError {
    /// Creates a free-form scene error
    pub fn custom(reason: impl Into<String>) -> Self {
        SceneError::Custom(reason.into())
    }
}

/// Ways a run can end without a result
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("Scene setup failed: {0}")]
    Setup(SceneError),

    #[error("Run cancelled: {reason}")]
    Cancelled { reason: CancellationReason },

    #[error("Run ended without a result")]
    Abandoned,
}
