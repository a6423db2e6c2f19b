//! Transports

use crate::{BusError, MessageBus};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Outbound half of a `postMessage`-like channel
pub trait MessageTransport {
    /// Sends one encoded frame to the other side
    fn post_message(&self, data: &str) -> Result<(), BusError>;
}

/// In-process transport that queues outbound frames
///
/// Queued frames are delivered to a bus with `pump`. A closed transport
/// refuses new frames.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    queue: RefCell<VecDeque<String>>,
    closed: Cell<bool>,
}

impl MemoryTransport {
    /// Creates an open, empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every queued frame, oldest first
    pub fn drain(&self) -> Vec<String> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Number of queued frames
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Checks if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Stops accepting frames
    pub fn close(&self) {
        self.closed.set(true);
    }

    /// Checks if the transport was closed
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl MessageTransport for MemoryTransport {
    fn post_message(&self, data: &str) -> Result<(), BusError> {
        if self.closed.get() {
            return Err(BusError::Transport {
                reason: "transport closed".to_string(),
            });
        }
        self.queue.borrow_mut().push_back(data.to_string());
        Ok(())
    }
}

/// Delivers every frame queued on `from` to `to`
///
/// Frames posted while delivering are delivered too. Returns the number of
/// frames delivered.
pub fn pump(from: &MemoryTransport, to: &MessageBus) -> usize {
    let mut delivered = 0;
    loop {
        // Pop one at a time so listeners may post more frames.
        let next = from.queue.borrow_mut().pop_front();
        let Some(frame) = next else {
            return delivered;
        };
        to.handle_message(&frame);
        delivered += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_and_drain() {
        let transport = MemoryTransport::new();
        transport.post_message("one").unwrap();
        transport.post_message("two").unwrap();
        assert_eq!(transport.len(), 2);
        assert_eq!(transport.drain(), vec!["one", "two"]);
        assert!(transport.is_empty());
    }

    #[test]
    fn test_closed_transport_refuses() {
        let transport = MemoryTransport::new();
        transport.close();
        assert!(matches!(
            transport.post_message("x"),
            Err(BusError::Transport { .. })
        ));
        assert!(transport.is_empty());
    }
}
