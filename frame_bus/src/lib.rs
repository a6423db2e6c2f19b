//! # Frame Bus
//!
//! This crate implements the cross-frame message bus of Pocket Console: a
//! named publish/subscribe channel layered over a `postMessage`-like
//! transport between a console and a game embedded in a child frame.
//!
//! ## Philosophy
//!
//! - **JSON on the wire**: Every frame is `{ "type": name, "payload": any }`
//! - **Never crash the host**: Malformed inbound frames are logged and
//!   dropped, never returned as errors or panics
//! - **Transport is a seam**: The bus only needs `post_message`; hosts
//!   deliver inbound frames with `handle_message`
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A versioned schema (no validation beyond JSON shape)
//! - A request/response protocol
//! - A network transport

pub mod bridge;
pub mod bus;
pub mod transport;
pub mod wire;

pub use bridge::{mirror_controls, FrameInputSource};
pub use bus::{BusListener, MessageBus, SubscriptionId};
pub use transport::{pump, MemoryTransport, MessageTransport};
pub use wire::{KeyPayload, WireMessage, FINISH, ON_KEY_DOWN, ON_KEY_UP};

use thiserror::Error;

/// Message bus error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("Failed to encode message: {reason}")]
    Encode { reason: String },

    #[error("Failed to decode message: {reason}")]
    Decode { reason: String },

    #[error("Transport failed: {reason}")]
    Transport { reason: String },
}

impl BusError {
    pub(crate) fn encode(err: serde_json::Error) -> Self {
        Self::Encode {
            reason: err.to_string(),
        }
    }

    pub(crate) fn decode(err: serde_json::Error) -> Self {
        Self::Decode {
            reason: err.to_string(),
        }
    }
}
