//! Console configuration

use display_slot::NativeSize;
use input_sources::KeyMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid console config: {reason}")]
    Parse { reason: String },

    #[error("Invalid console config: {field} must be non-zero")]
    Zero { field: &'static str },
}

/// Vibration feedback settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticsConfig {
    pub enabled: bool,
    /// Pulse on button presses, in ms
    pub button_ms: u64,
    /// Pulse on dpad surface presses, in ms
    pub dpad_ms: u64,
}

impl HapticsConfig {
    pub fn button_pulse(&self) -> Duration {
        Duration::from_millis(self.button_ms)
    }

    pub fn dpad_pulse(&self) -> Duration {
        Duration::from_millis(self.dpad_ms)
    }
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            button_ms: 200,
            dpad_ms: 100,
        }
    }
}

/// Console settings
///
/// Every field has a default, so `{}` is a complete config.
///
/// ```
/// use console_host::ConsoleConfig;
///
/// let config = ConsoleConfig::from_json_str(r#"{ "display": { "width": 320, "height": 240 } }"#).unwrap();
/// assert_eq!(config.display.width, 320);
/// assert_eq!(config.log_filter, "info");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Logical size of the display slot
    pub display: NativeSize,
    /// Replaces the default key table when present
    pub keyboard: Option<KeyMap>,
    pub haptics: HapticsConfig,
    /// `tracing` filter directive; `RUST_LOG` takes precedence
    pub log_filter: String,
}

impl ConsoleConfig {
    /// Parses and validates a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ConsoleConfig = serde_json::from_str(json).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot rule out
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.width == 0 {
            return Err(ConfigError::Zero { field: "display.width" });
        }
        if self.display.height == 0 {
            return Err(ConfigError::Zero { field: "display.height" });
        }
        Ok(())
    }

    /// The key table in effect
    pub fn key_map(&self) -> KeyMap {
        self.keyboard.clone().unwrap_or_default()
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            display: NativeSize::default(),
            keyboard: None,
            haptics: HapticsConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}
