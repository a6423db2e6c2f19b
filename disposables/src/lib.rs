//! # Disposables
//!
//! Uniform resource-cleanup handles for Pocket Console.
//!
//! ## Philosophy
//!
//! - **Explicit release**: Every acquired resource hands back a handle
//! - **Idempotent**: Disposing a handle twice runs its cleanup once
//! - **Ordered**: Composite bags release in registration order
//! - **Keep going**: One failing cleanup never stops the rest of the sweep
//!
//! ## Core Concepts
//!
//! - `Disposable`: Cloneable handle around a one-shot cleanup action
//! - `CompositeDisposable`: Growable, shared bag of handles disposed together
//! - `DisposeError`: Why a cleanup failed

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Errors raised while releasing resources
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DisposeError {
    #[error("Dispose failed: {0}")]
    Failed(String),

    #[error("{} disposables failed to release", .0.len())]
    Aggregate(Vec<DisposeError>),
}

impl DisposeError {
    /// Creates a failure with a description
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// Folds a list of failures into one error
    ///
    /// Returns None for an empty list and the failure itself for a list of one.
    pub fn collect(mut errors: Vec<DisposeError>) -> Option<DisposeError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(DisposeError::Aggregate(errors)),
        }
    }

    /// Number of individual failures carried by this error
    pub fn failure_count(&self) -> usize {
        match self {
            DisposeError::Failed(_) => 1,
            DisposeError::Aggregate(errors) => errors.iter().map(|e| e.failure_count()).sum(),
        }
    }
}

static NEXT_DISPOSABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a disposable handle
///
/// Clones of a handle share the same id, which is what
/// `CompositeDisposable::remove` matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisposableId(u64);

impl DisposableId {
    fn next() -> Self {
        Self(NEXT_DISPOSABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DisposableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Disposable({})", self.0)
    }
}

type DisposeAction = Box<dyn FnOnce() -> Result<(), DisposeError>>;

/// A handle for releasing an acquired resource exactly once
///
/// ## Example
///
/// ```
/// use disposables::Disposable;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let released = Rc::new(Cell::new(0));
/// let counter = released.clone();
/// let handle = Disposable::new(move || counter.set(counter.get() + 1));
///
/// handle.dispose().unwrap();
/// handle.dispose().unwrap();
/// assert_eq!(released.get(), 1);
/// ```
#[derive(Clone)]
pub struct Disposable {
    id: DisposableId,
    action: Rc<RefCell<Option<DisposeAction>>>,
}

impl Disposable {
    /// Creates a handle around an infallible cleanup action
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self::fallible(move || {
            action();
            Ok(())
        })
    }

    /// Creates a handle around a cleanup action that can fail
    pub fn fallible(action: impl FnOnce() -> Result<(), DisposeError> + 'static) -> Self {
        Self {
            id: DisposableId::next(),
            action: Rc::new(RefCell::new(Some(Box::new(action)))),
        }
    }

    /// Creates a handle with nothing to release
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Returns the identity of this handle
    pub fn id(&self) -> DisposableId {
        self.id
    }

    /// Checks if the cleanup action already ran
    pub fn is_disposed(&self) -> bool {
        self.action.borrow().is_none()
    }

    /// Runs the cleanup action
    ///
    /// Only the first call does anything; later calls return `Ok(())`.
    pub fn dispose(&self) -> Result<(), DisposeError> {
        // Take the action out before running it so it may touch this handle.
        let action = self.action.borrow_mut().take();
        match action {
            Some(action) => action(),
            None => Ok(()),
        }
    }
}

impl PartialEq for Disposable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Disposable {}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// An ordered, growable bag of disposables
///
/// Clones share the same bag. Disposing empties the bag, so it can be
/// reused for a fresh set of resources afterwards.
#[derive(Clone, Default)]
pub struct CompositeDisposable {
    entries: Rc<RefCell<Vec<Disposable>>>,
}

impl CompositeDisposable {
    /// Creates an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handle
    pub fn add(&self, disposable: Disposable) {
        self.entries.borrow_mut().push(disposable);
    }

    /// Appends several handles, keeping their order
    pub fn extend(&self, disposables: impl IntoIterator<Item = Disposable>) {
        self.entries.borrow_mut().extend(disposables);
    }

    /// Removes the exact handle without disposing it
    ///
    /// Returns true if the handle was in the bag.
    pub fn remove(&self, disposable: &Disposable) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|d| d.id() != disposable.id());
        entries.len() != before
    }

    /// Returns the number of held handles
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Checks if the bag holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Disposes every held handle in insertion order, then empties the bag
    ///
    /// A failing entry does not stop the sweep; all failures are reported
    /// together once every entry has been released.
    pub fn dispose(&self) -> Result<(), DisposeError> {
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        let mut errors = Vec::new();

        for entry in entries {
            if let Err(err) = entry.dispose() {
                tracing::warn!(disposable = %entry.id(), error = %err, "dispose failed");
                errors.push(err);
            }
        }

        match DisposeError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Wraps this bag in a single handle that disposes the whole bag
    pub fn into_disposable(self) -> Disposable {
        Disposable::fallible(move || self.dispose())
    }
}

impl fmt::Debug for CompositeDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDisposable")
            .field("len", &self.len())
            .finish()
    }
}
