//! # Lifecycle
//!
//! Deterministic cancellation primitives for Pocket Console scene runs.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Cancellation is explicit, not hidden
//! - **Ordered reactions**: Cleanup steps run in the order they registered
//! - **Single-threaded**: Handles are `Rc`-based and never cross threads
//! - **No async runtime required**: Works in sync contexts; `cancelled()`
//!   is an ordinary future for hosts that have an executor
//!
//! ## Core Concepts
//!
//! - `CancellationToken`: Cloneable handle to observe cancellation
//! - `CancellationSource`: Controller that triggers cancellation
//! - `CancellationReason`: Why cancellation occurred
//! - `ReactionId`: Handle for removing a registered reaction

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Reason for cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationReason {
    /// The scene called `finish`
    Finished,
    /// The host cancelled the run
    HostCancel,
    /// The scene was replaced by another one
    Replaced,
    /// Custom reason with description
    Custom(String),
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancellationReason::Finished => write!(f, "finished"),
            CancellationReason::HostCancel => write!(f, "host cancelled"),
            CancellationReason::Replaced => write!(f, "replaced"),
            CancellationReason::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

/// Handle for a registered cancellation reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReactionId(u64);

type Reaction = Box<dyn FnOnce(&CancellationReason)>;

/// Internal state of a cancellation token
enum CancellationState {
    Active {
        reactions: Vec<(ReactionId, Reaction)>,
    },
    Cancelled(CancellationReason),
}

struct SharedInner {
    state: CancellationState,
    next_reaction: u64,
}

/// Shared state between CancellationToken and CancellationSource
#[derive(Clone)]
struct SharedCancellationState {
    inner: Rc<RefCell<SharedInner>>,
}

impl SharedCancellationState {
    fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SharedInner {
                state: CancellationState::Active {
                    reactions: Vec::new(),
                },
                next_reaction: 1,
            })),
        }
    }

    fn is_cancelled(&self) -> bool {
        matches!(self.inner.borrow().state, CancellationState::Cancelled(_))
    }

    fn reason(&self) -> Option<CancellationReason> {
        match &self.inner.borrow().state {
            CancellationState::Active { .. } => None,
            CancellationState::Cancelled(reason) => Some(reason.clone()),
        }
    }

    fn on_cancel(&self, reaction: Reaction) -> ReactionId {
        let (id, late) = {
            let mut inner = self.inner.borrow_mut();
            let id = ReactionId(inner.next_reaction);
            inner.next_reaction += 1;

            match &mut inner.state {
                CancellationState::Active { reactions } => {
                    reactions.push((id, reaction));
                    (id, None)
                }
                CancellationState::Cancelled(reason) => (id, Some((reaction, reason.clone()))),
            }
        };

        if let Some((reaction, reason)) = late {
            reaction(&reason);
        }
        id
    }

    #[cfg(test)]
    fn pending_reactions(&self) -> usize {
        match &self.inner.borrow().state {
            CancellationState::Active { reactions } => reactions.len(),
            CancellationState::Cancelled(_) => 0,
        }
    }

    fn remove_reaction(&self, id: ReactionId) -> bool {
        match &mut self.inner.borrow_mut().state {
            CancellationState::Active { reactions } => {
                let before = reactions.len();
                reactions.retain(|(rid, _)| *rid != id);
                reactions.len() != before
            }
            CancellationState::Cancelled(_) => false,
        }
    }

    fn cancel(&self, reason: CancellationReason) -> bool {
        let reactions = {
            let mut inner = self.inner.borrow_mut();
            if matches!(inner.state, CancellationState::Cancelled(_)) {
                return false;
            }
            match std::mem::replace(&mut inner.state, CancellationState::Cancelled(reason.clone())) {
                CancellationState::Active { reactions } => reactions,
                CancellationState::Cancelled(_) => Vec::new(),
            }
        };

        // Run reactions without holding the borrow; they may query the token.
        for (_, reaction) in reactions {
            reaction(&reason);
        }
        true
    }
}

/// A cloneable token that can be checked for cancellation
///
/// CancellationToken is designed to be passed to operations that should
/// be cancellable. It's cheap to clone and check.
///
/// ## Example
///
/// ```
/// use lifecycle::{CancellationSource, CancellationReason};
///
/// let source = CancellationSource::new();
/// let token = source.token();
///
/// assert!(!token.is_cancelled());
///
/// source.cancel(CancellationReason::HostCancel);
/// assert!(token.is_cancelled());
/// assert_eq!(token.reason(), Some(CancellationReason::HostCancel));
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    shared: SharedCancellationState,
}

impl CancellationToken {
    /// Creates a new token that is never cancelled
    ///
    /// Useful for operations that don't support cancellation.
    pub fn none() -> Self {
        Self {
            shared: SharedCancellationState::new(),
        }
    }

    /// Checks if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }

    /// Returns the reason for cancellation, if cancelled
    pub fn reason(&self) -> Option<CancellationReason> {
        self.shared.reason()
    }

    /// Registers a reaction to run when cancellation happens
    ///
    /// Reactions run synchronously inside `cancel`, in registration order.
    /// A reaction registered after cancellation runs immediately.
    pub fn on_cancel(&self, reaction: impl FnOnce(&CancellationReason) + 'static) -> ReactionId {
        self.shared.on_cancel(Box::new(reaction))
    }

    /// Removes a reaction that has not run yet
    ///
    /// Returns true if the reaction was still pending.
    pub fn remove_reaction(&self, id: ReactionId) -> bool {
        self.shared.remove_reaction(id)
    }

    /// Returns a future resolving with the reason once cancelled
    ///
    /// The future stays pending forever for a token that is never cancelled.
    /// Dropping it before it resolves unregisters its reaction.
    pub fn cancelled(&self) -> LocalBoxFuture<'static, CancellationReason> {
        let (tx, rx) = oneshot::channel();
        let id = self.on_cancel(move |reason| {
            let _ = tx.send(reason.clone());
        });
        let registration = Registration {
            token: self.clone(),
            id,
        };
        async move {
            let _registration = registration;
            match rx.await {
                Ok(reason) => reason,
                // The sender lives in the token state, so this only happens
                // when every handle is gone and nothing can cancel anymore.
                Err(_) => futures::future::pending().await,
            }
        }
        .boxed_local()
    }
}

/// Removes a reaction when dropped; a no-op once the reaction ran
struct Registration {
    token: CancellationToken,
    id: ReactionId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.token.remove_reaction(self.id);
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("reason", &self.reason())
            .finish()
    }
}

/// A controller that can trigger cancellation
///
/// CancellationSource creates tokens and can cancel them all at once.
///
/// ## Example
///
/// ```
/// use lifecycle::{CancellationSource, CancellationReason};
///
/// let source = CancellationSource::new();
/// let token1 = source.token();
/// let token2 = source.token();
///
/// // Both tokens see the same cancellation
/// source.cancel(CancellationReason::Finished);
/// assert!(token1.is_cancelled());
/// assert!(token2.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancellationSource {
    shared: SharedCancellationState,
}

impl CancellationSource {
    /// Creates a new cancellation source
    pub fn new() -> Self {
        Self {
            shared: SharedCancellationState::new(),
        }
    }

    /// Creates a token from this source
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            shared: self.shared.clone(),
        }
    }

    /// Cancels all tokens from this source
    ///
    /// Only the first call has an effect; it returns true.
    pub fn cancel(&self, reason: CancellationReason) -> bool {
        self.shared.cancel(reason)
    }

    /// Checks if this source has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSource")
            .field("reason", &self.shared.reason())
            .finish()
    }
}
