//! Wire format

use crate::BusError;
use input_types::InputAction;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parent to child: an action went down
pub const ON_KEY_DOWN: &str = "onKeyDown";

/// Parent to child: an action went up
pub const ON_KEY_UP: &str = "onKeyUp";

/// Child to parent: the embedded scene is done; payload is its result
pub const FINISH: &str = "finish";

/// One frame on the wire
///
/// A missing payload decodes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl WireMessage {
    /// Creates a frame, encoding `payload` as JSON
    pub fn new<T: Serialize + ?Sized>(kind: impl Into<String>, payload: &T) -> Result<Self, BusError> {
        Ok(Self {
            kind: kind.into(),
            payload: serde_json::to_value(payload).map_err(BusError::encode)?,
        })
    }

    /// Encodes the frame as a JSON string
    pub fn encode(&self) -> Result<String, BusError> {
        serde_json::to_string(self).map_err(BusError::encode)
    }

    /// Decodes a frame from a JSON string
    pub fn decode(data: &str) -> Result<Self, BusError> {
        serde_json::from_str(data).map_err(BusError::decode)
    }

    /// Decodes the payload into `T`
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, BusError> {
        serde_json::from_value(self.payload.clone()).map_err(BusError::decode)
    }
}

/// Payload of `onKeyDown` and `onKeyUp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPayload {
    pub key: InputAction,
}

impl KeyPayload {
    /// Creates a key payload
    pub fn new(key: InputAction) -> Self {
        Self { key }
    }
}
