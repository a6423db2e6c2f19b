//! # Console Host
//!
//! Assembles a Pocket Console: display, directional pad, action buttons
//! and keyboard wired into shared controls, with a scene engine on top.
//!
//! ## Philosophy
//!
//! - **Parts by tag**: The console finds its parts through a root, by the
//!   tags in the component registry
//! - **Fail at construction**: A missing or mismatched part is an error
//!   from `Console::from_root`, never a late surprise
//! - **Platform behind traits**: Surfaces, vibration, animation frames and
//!   child frames are adapters, so a console runs headless
//!
//! ## Example
//!
//! ```
//! use console_host::{Console, ConsoleConfig};
//! use futures::executor::LocalPool;
//! use scene_runtime::{ManualFrameClock, Scene};
//! use std::rc::Rc;
//!
//! let console = Console::headless(ConsoleConfig::default(), Rc::new(ManualFrameClock::new())).unwrap();
//! let hello: Scene<&'static str, (), String> = Scene::new(|rt, name| {
//!     rt.finish(format!("hello {name}"));
//!     Ok(())
//! });
//!
//! let result = LocalPool::new().run_until(console.run(&hello, "world"));
//! assert_eq!(result.unwrap(), "hello world");
//! ```
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A renderer or a styling layer
//! - A browser binding (hosts supply the adapters)

pub mod config;
pub mod console;
pub mod embed;
pub mod logging;
pub mod registry;
pub mod root;

pub use config::{ConfigError, ConsoleConfig, HapticsConfig};
pub use console::{Console, ConsoleError};
pub use embed::{child_runtime, embedded_scene, FrameEmbedder, FrameLoaded, FrameOptions, FRAME_MARKER};
pub use registry::{ComponentRegistry, PartKind, CONSOLE_ACTIONS, CONSOLE_DISPLAY, CONSOLE_DPAD, GAME_CONSOLE};
pub use root::{ConsolePart, ConsoleRoot, StandardRoot};
