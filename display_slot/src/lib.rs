//! # Display Slot
//!
//! This crate implements the single-occupancy display slot of Pocket Console.
//!
//! ## Philosophy
//!
//! - **One thing on screen**: At most one content node is mounted at a time
//! - **Loud conflicts**: Mounting over existing content is an error, never a
//!   silent replace
//! - **Handles own the mount**: The handle returned by a mount unmounts that
//!   node and no other
//! - **The slot sizes content**: Scenes hand over nodes; the slot decides
//!   how they are stretched
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A layout engine
//! - A renderer (the `DisplaySurface` adapter does the platform work)

pub mod surface;

pub use surface::{DisplaySurface, NullSurface, RecordingSurface, SurfaceEvent};

use disposables::Disposable;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a content node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Creates a new unique node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a NodeId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Type of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    /// Drawing surface; stretched to fill the slot
    Canvas,
    /// Any other element
    Element,
    /// Embedded child frame
    Frame,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Canvas => write!(f, "Canvas"),
            ContentKind::Element => write!(f, "Element"),
            ContentKind::Frame => write!(f, "Frame"),
        }
    }
}

/// A piece of content that can be mounted in the slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNode {
    pub id: NodeId,
    pub kind: ContentKind,
    pub label: String,
}

impl DisplayNode {
    /// Creates a node with a fresh id
    pub fn new(kind: ContentKind, label: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            label: label.into(),
        }
    }

    /// Creates a canvas node
    pub fn canvas(label: impl Into<String>) -> Self {
        Self::new(ContentKind::Canvas, label)
    }

    /// Creates a plain element node
    pub fn element(label: impl Into<String>) -> Self {
        Self::new(ContentKind::Element, label)
    }

    /// Creates a child frame node
    pub fn frame(label: impl Into<String>) -> Self {
        Self::new(ContentKind::Frame, label)
    }
}

/// Logical size of the console screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeSize {
    pub width: u32,
    pub height: u32,
}

impl NativeSize {
    /// Creates a size
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for NativeSize {
    fn default() -> Self {
        Self::new(400, 400)
    }
}

/// How mounted content is sized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// Stretch to the slot's full extent
    Fill,
    /// Fixed logical size
    Fixed(NativeSize),
}

/// Display slot error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DisplayError {
    #[error("Display is already set: {current} is mounted, cannot mount {requested}")]
    Occupied { current: NodeId, requested: NodeId },

    #[error("Display is unavailable in this context")]
    Unavailable,
}

/// The single-occupancy mount point for scene content
///
/// Cloning yields another handle to the same slot.
#[derive(Clone)]
pub struct DisplaySlot {
    current: Rc<RefCell<Option<DisplayNode>>>,
    surface: Rc<dyn DisplaySurface>,
    native: NativeSize,
}

impl DisplaySlot {
    /// Creates an empty slot over `surface`
    pub fn new(surface: Rc<dyn DisplaySurface>, native: NativeSize) -> Self {
        Self {
            current: Rc::new(RefCell::new(None)),
            surface,
            native,
        }
    }

    /// Creates an empty slot that shows nothing
    pub fn headless() -> Self {
        Self::new(Rc::new(NullSurface), NativeSize::default())
    }

    /// Mounts `node`, or clears the slot for `None`
    ///
    /// Mounting while something is mounted fails with `Occupied`. Clearing
    /// always succeeds. The returned handle unmounts the node it mounted,
    /// and only while that node is still the one on screen.
    pub fn set_current(&self, node: Option<DisplayNode>) -> Result<Disposable, DisplayError> {
        let Some(node) = node else {
            self.clear();
            return Ok(Disposable::noop());
        };

        if let Some(current) = self.current.borrow().as_ref() {
            return Err(DisplayError::Occupied {
                current: current.id,
                requested: node.id,
            });
        }

        let sizing = self.sizing_for(node.kind);
        tracing::debug!(node = %node.id, kind = %node.kind, label = %node.label, "display set");
        *self.current.borrow_mut() = Some(node.clone());
        self.surface.mount(&node, sizing);

        let slot = self.clone();
        let id = node.id;
        Ok(Disposable::new(move || slot.unmount_if_current(id)))
    }

    /// Unmounts whatever is mounted
    pub fn clear(&self) {
        let previous = self.current.borrow_mut().take();
        if let Some(previous) = previous {
            tracing::debug!(node = %previous.id, "display cleared");
            self.surface.unmount(&previous);
        }
    }

    /// The mounted node, if any
    pub fn current(&self) -> Option<DisplayNode> {
        self.current.borrow().clone()
    }

    /// Checks if a node is mounted
    pub fn is_occupied(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Sizing applied to content of `kind`
    pub fn sizing_for(&self, kind: ContentKind) -> Sizing {
        match kind {
            ContentKind::Canvas => Sizing::Fill,
            ContentKind::Element | ContentKind::Frame => Sizing::Fixed(self.native),
        }
    }

    /// Logical size of the slot
    pub fn native_size(&self) -> NativeSize {
        self.native
    }

    fn unmount_if_current(&self, id: NodeId) {
        let previous = {
            let mut current = self.current.borrow_mut();
            match current.as_ref() {
                Some(node) if node.id == id => current.take(),
                _ => None,
            }
        };

        match previous {
            Some(previous) => {
                tracing::debug!(node = %id, "display released");
                self.surface.unmount(&previous);
            }
            None => tracing::debug!(node = %id, "stale display handle ignored"),
        }
    }
}

impl fmt::Debug for DisplaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplaySlot")
            .field("current", &self.current.borrow().as_ref().map(|n| n.id))
            .field("native", &self.native)
            .finish()
    }
}
