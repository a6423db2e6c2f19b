//! Mount surfaces

use crate::{DisplayNode, NodeId, Sizing};
use std::cell::RefCell;

/// Platform adapter that actually attaches content to the console screen
pub trait DisplaySurface {
    /// Attaches `node`, applying `sizing`
    fn mount(&self, node: &DisplayNode, sizing: Sizing);

    /// Detaches `node`
    fn unmount(&self, node: &DisplayNode);
}

/// Surface that shows nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl DisplaySurface for NullSurface {
    fn mount(&self, _node: &DisplayNode, _sizing: Sizing) {}

    fn unmount(&self, _node: &DisplayNode) {}
}

/// One call made on a `RecordingSurface`
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Mounted { node: NodeId, sizing: Sizing },
    Unmounted { node: NodeId },
}

/// Surface that records every mount and unmount
///
/// Used by headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: RefCell<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    /// Creates an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded call, oldest first
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.borrow().clone()
    }

    /// The node left mounted by the recorded calls, if any
    pub fn mounted(&self) -> Option<NodeId> {
        let mut mounted = None;
        for event in self.events.borrow().iter() {
            match event {
                SurfaceEvent::Mounted { node, .. } => mounted = Some(*node),
                SurfaceEvent::Unmounted { node } if mounted == Some(*node) => mounted = None,
                SurfaceEvent::Unmounted { .. } => {}
            }
        }
        mounted
    }
}

impl DisplaySurface for RecordingSurface {
    fn mount(&self, node: &DisplayNode, sizing: Sizing) {
        self.events
            .borrow_mut()
            .push(SurfaceEvent::Mounted { node: node.id, sizing });
    }

    fn unmount(&self, node: &DisplayNode) {
        self.events
            .borrow_mut()
            .push(SurfaceEvent::Unmounted { node: node.id });
    }
}
