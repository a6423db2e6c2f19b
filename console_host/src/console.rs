//! The assembled console

use crate::registry::{ComponentRegistry, PartKind};
use crate::root::{ConsolePart, ConsoleRoot, StandardRoot};
use crate::{ConfigError, ConsoleConfig};
use controls::Controls;
use display_slot::DisplaySlot;
use futures::future::LocalBoxFuture;
use input_sources::{ButtonSource, DpadSource, InputSource, KeyboardSource};
use input_types::InputAction;
use lifecycle::CancellationToken;
use scene_runtime::{DisplayAccess, FrameScheduler, RunError, Scene, SceneEngine};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Console assembly errors
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Console part '{tag}' not found")]
    MissingPart { tag: String },

    #[error("Console part '{tag}' is a {found}, expected a {expected}")]
    WrongPart {
        tag: String,
        expected: PartKind,
        found: PartKind,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A console: display, dpad, action buttons and keyboard around a scene engine
///
/// Controls are fed by the dpad, the action buttons and the keyboard, in
/// that order. Every scene run on the console shares them.
pub struct Console {
    controls: Controls,
    display: DisplaySlot,
    dpad: Rc<DpadSource>,
    actions: Rc<ButtonSource>,
    keyboard: Rc<KeyboardSource>,
    engine: SceneEngine,
    config: ConsoleConfig,
}

impl Console {
    /// Defines the console part tags
    ///
    /// Safe to call any number of times.
    pub fn setup() {
        let defined = ComponentRegistry::define_standard();
        if defined > 0 {
            tracing::debug!(defined, "console components registered");
        }
    }

    /// Assembles a console from the parts under `root`
    pub fn from_root(
        root: &dyn ConsoleRoot,
        config: ConsoleConfig,
        clock: Rc<dyn FrameScheduler>,
    ) -> Result<Self, ConsoleError> {
        config.validate()?;

        let display = match find(root, PartKind::Display)? {
            ConsolePart::Display(slot) => slot,
            other => return Err(wrong_part(PartKind::Display, &other)),
        };
        let dpad = match find(root, PartKind::Dpad)? {
            ConsolePart::Dpad(dpad) => dpad,
            other => return Err(wrong_part(PartKind::Dpad, &other)),
        };
        let actions = match find(root, PartKind::Actions)? {
            ConsolePart::Actions(actions) => actions,
            other => return Err(wrong_part(PartKind::Actions, &other)),
        };
        let keyboard = Rc::new(KeyboardSource::with_mapping(config.key_map()));

        let controls = Controls::new(vec![
            dpad.clone() as Rc<dyn InputSource>,
            actions.clone() as Rc<dyn InputSource>,
            keyboard.clone() as Rc<dyn InputSource>,
        ]);
        let engine = SceneEngine::new(controls.clone(), DisplayAccess::Slot(display.clone()), clock);

        tracing::info!(
            width = config.display.width,
            height = config.display.height,
            sources = ?controls.source_names(),
            "console ready"
        );
        Ok(Self {
            controls,
            display,
            dpad,
            actions,
            keyboard,
            engine,
            config,
        })
    }

    /// Assembles the standard console with no screen and no vibration
    pub fn headless(config: ConsoleConfig, clock: Rc<dyn FrameScheduler>) -> Result<Self, ConsoleError> {
        Self::setup();
        let root = StandardRoot::from_config(&config);
        Self::from_root(&root, config, clock)
    }

    /// Runs `scene` until it finishes
    pub fn run<P, S, R>(&self, scene: &Scene<P, S, R>, params: P) -> LocalBoxFuture<'static, Result<R, RunError>>
    where
        P: 'static,
        S: 'static,
        R: 'static,
    {
        self.engine.run(scene, params)
    }

    /// Runs `scene` until it finishes or `token` is cancelled
    pub fn run_until_cancelled<P, S, R>(
        &self,
        scene: &Scene<P, S, R>,
        params: P,
        token: CancellationToken,
    ) -> LocalBoxFuture<'static, Result<R, RunError>>
    where
        P: 'static,
        S: 'static,
        R: 'static,
    {
        self.engine.run_until_cancelled(scene, params, token)
    }

    /// Forwards a host key-down by physical code
    pub fn key_down(&self, code: &str) -> Option<InputAction> {
        self.keyboard.key_down(code)
    }

    /// Forwards a host key-up by physical code
    pub fn key_up(&self, code: &str) -> Option<InputAction> {
        self.keyboard.key_up(code)
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn display(&self) -> &DisplaySlot {
        &self.display
    }

    pub fn dpad(&self) -> &Rc<DpadSource> {
        &self.dpad
    }

    pub fn actions(&self) -> &Rc<ButtonSource> {
        &self.actions
    }

    pub fn keyboard(&self) -> &Rc<KeyboardSource> {
        &self.keyboard
    }

    pub fn engine(&self) -> &SceneEngine {
        &self.engine
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("controls", &self.controls)
            .field("display", &self.display)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn find(root: &dyn ConsoleRoot, kind: PartKind) -> Result<ConsolePart, ConsoleError> {
    let tag = kind.standard_tag();
    root.query(tag).ok_or_else(|| ConsoleError::MissingPart { tag: tag.to_string() })
}

fn wrong_part(expected: PartKind, found: &ConsolePart) -> ConsoleError {
    ConsoleError::WrongPart {
        tag: expected.standard_tag().to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CONSOLE_ACTIONS, CONSOLE_DISPLAY};
    use input_sources::PointerId;
    use scene_runtime::ManualFrameClock;

    struct SwappedRoot(StandardRoot);

    impl ConsoleRoot for SwappedRoot {
        fn query(&self, selector: &str) -> Option<ConsolePart> {
            match selector {
                CONSOLE_DISPLAY => self.0.query(CONSOLE_ACTIONS),
                other => self.0.query(other),
            }
        }
    }

    struct EmptyRoot;

    impl ConsoleRoot for EmptyRoot {
        fn query(&self, _selector: &str) -> Option<ConsolePart> {
            None
        }
    }

    fn clock() -> Rc<dyn FrameScheduler> {
        Rc::new(ManualFrameClock::new())
    }

    #[test]
    fn test_inputs_reach_controls_in_order() {
        ComponentRegistry::teardown();
        let console = Console::headless(ConsoleConfig::default(), clock()).unwrap();
        assert_eq!(console.controls().source_names(), vec!["dpad", "actions", "keyboard"]);

        assert_eq!(console.key_down("KeyD"), Some(InputAction::Right));
        assert!(console.controls().is_held(InputAction::Right));
        console.key_up("KeyD");
        assert!(!console.controls().is_held(InputAction::Right));

        console.actions().pointer_down(InputAction::B, PointerId(4));
        assert!(console.controls().is_held(InputAction::B));
        console.dpad().button_down(InputAction::Up, PointerId(5));
        assert!(console.controls().is_held(InputAction::Up));
    }

    #[test]
    fn test_unmapped_key_is_ignored() {
        ComponentRegistry::teardown();
        let console = Console::headless(ConsoleConfig::default(), clock()).unwrap();
        assert_eq!(console.key_down("F13"), None);
        assert!(console.controls().state().is_idle());
    }

    #[test]
    fn test_headless_redefines_cleared_tags() {
        ComponentRegistry::teardown();
        ComponentRegistry::define("x-pad", PartKind::Dpad);
        assert!(Console::headless(ConsoleConfig::default(), clock()).is_ok());
        assert_eq!(ComponentRegistry::tags().len(), 5);

        ComponentRegistry::teardown();
        assert!(ComponentRegistry::tags().is_empty());
        assert!(Console::headless(ConsoleConfig::default(), clock()).is_ok());
        assert_eq!(ComponentRegistry::tags().len(), 4);
        ComponentRegistry::teardown();
    }

    #[test]
    fn test_missing_part_fails() {
        let err = Console::from_root(&EmptyRoot, ConsoleConfig::default(), clock()).unwrap_err();
        assert!(matches!(err, ConsoleError::MissingPart { tag } if tag == CONSOLE_DISPLAY));
    }

    #[test]
    fn test_wrong_part_fails() {
        ComponentRegistry::teardown();
        Console::setup();
        let root = SwappedRoot(StandardRoot::from_config(&ConsoleConfig::default()));
        let err = Console::from_root(&root, ConsoleConfig::default(), clock()).unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::WrongPart {
                expected: PartKind::Display,
                found: PartKind::Actions,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_config_fails() {
        ComponentRegistry::teardown();
        let mut config = ConsoleConfig::default();
        config.display.height = 0;
        let err = Console::headless(config, clock()).unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));
    }
}
