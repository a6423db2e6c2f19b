//! Games embedded in a child frame
//!
//! The console side mounts the frame, mirrors its controls into it and
//! waits for the child's `finish` message. The child side gets a runtime
//! whose input arrives over the same bus.

use controls::Controls;
use disposables::{CompositeDisposable, Disposable};
use display_slot::DisplayNode;
use frame_bus::{mirror_controls, FrameInputSource, MessageBus, MessageTransport, FINISH};
use input_sources::InputSource;
use scene_runtime::{DisplayAccess, Finish, FrameScheduler, RunId, Runtime, Scene};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// Marker attribute set on every console frame
pub const FRAME_MARKER: (&str, &str) = ("data-console", "v1");

/// Size and permissions of an embedded frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameOptions {
    pub width: u32,
    pub height: u32,
    /// Permissions policy, e.g. `"fullscreen; gamepad"`
    #[serde(default)]
    pub allow: Option<String>,
    #[serde(default)]
    pub allow_fullscreen: bool,
}

impl FrameOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            allow: None,
            allow_fullscreen: false,
        }
    }

    pub fn with_allow(mut self, allow: impl Into<String>) -> Self {
        self.allow = Some(allow.into());
        self
    }

    pub fn with_fullscreen(mut self) -> Self {
        self.allow_fullscreen = true;
        self
    }

    /// Element attributes for a frame showing `url`
    pub fn attributes(&self, url: &str) -> Vec<(String, String)> {
        let mut attrs = vec![
            ("src".to_string(), url.to_string()),
            ("width".to_string(), self.width.to_string()),
            ("height".to_string(), self.height.to_string()),
            ("frameborder".to_string(), "0".to_string()),
            (FRAME_MARKER.0.to_string(), FRAME_MARKER.1.to_string()),
        ];
        if let Some(allow) = &self.allow {
            attrs.push(("allow".to_string(), allow.clone()));
        }
        if self.allow_fullscreen {
            attrs.push(("allowfullscreen".to_string(), String::new()));
        }
        attrs
    }
}

/// Called once the frame has loaded, with the transport into the frame
///
/// Returns the bus the embedder must feed the frame's inbound messages to.
pub type FrameLoaded = Box<dyn FnOnce(Rc<dyn MessageTransport>) -> MessageBus>;

/// Platform adapter that creates child frames
pub trait FrameEmbedder {
    /// Creates a frame showing `url`; it is mounted by the caller
    fn create_frame(&self, url: &str, options: &FrameOptions) -> DisplayNode;

    /// Calls `loaded` when the frame for `node` has loaded
    fn on_load(&self, node: &DisplayNode, loaded: FrameLoaded);
}

/// A scene that shows `url` in a child frame and resolves with its result
///
/// The child's `finish` payload is decoded into `R`; payloads that do not
/// decode are logged and dropped. The frame and its message wiring are
/// released when the run ends.
pub fn embedded_scene<R>(url: impl Into<String>, options: FrameOptions, embedder: Rc<dyn FrameEmbedder>) -> Scene<(), (), R>
where
    R: DeserializeOwned + 'static,
{
    let url = url.into();
    Scene::new(move |runtime, _| {
        let frame = CompositeDisposable::new();
        let node = embedder.create_frame(&url, &options);
        frame.add(runtime.set_display(Some(node.clone()))?);

        let live = Rc::new(Cell::new(true));
        let alive = live.clone();
        frame.add(Disposable::new(move || alive.set(false)));

        let controls = runtime.controls.clone();
        let finish = runtime.finisher();
        let wiring = frame.clone();
        let url_for_log = url.clone();
        embedder.on_load(
            &node,
            Box::new(move |transport| {
                let bus = MessageBus::new(transport);
                if live.get() {
                    tracing::debug!(url = %url_for_log, "frame loaded");
                    wire_frame(&wiring, &controls, &bus, finish);
                } else {
                    tracing::debug!(url = %url_for_log, "frame loaded after its run ended");
                }
                bus
            }),
        );

        runtime.disposables.add(frame.into_disposable());
        Ok(())
    })
}

fn wire_frame<R>(wiring: &CompositeDisposable, controls: &Controls, bus: &MessageBus, finish: Finish<R>)
where
    R: DeserializeOwned + 'static,
{
    wiring.add(mirror_controls(controls, bus).into_disposable());
    wiring.add(bus.subscribe_typed(FINISH, move |result: R| finish.call(result)));
}

/// Runtime for code running inside an embedded frame
///
/// Input arrives as `onKeyDown`/`onKeyUp` messages on `bus`. `finish`
/// releases the runtime's disposables, then sends the result to the
/// console; only the first call does anything. The display belongs to the
/// console, so `set_display` fails.
pub fn child_runtime<R>(bus: &MessageBus, clock: Rc<dyn FrameScheduler>) -> Runtime<(), R>
where
    R: Serialize + 'static,
{
    let input = Rc::new(FrameInputSource::new(bus));
    let controls = Controls::new(vec![input as Rc<dyn InputSource>]);
    let disposables = CompositeDisposable::new();

    let bag = disposables.clone();
    let out = bus.clone();
    let done = Cell::new(false);
    let finish = Finish::new(move |result: R| {
        if done.replace(true) {
            tracing::debug!("finish called again, ignored");
            return;
        }
        if let Err(err) = bag.dispose() {
            tracing::warn!(error = %err, "child resources failed to release");
        }
        if let Err(err) = out.emit(FINISH, &result) {
            tracing::warn!(error = %err, "finish not sent");
        }
    });

    Runtime::from_parts(
        controls,
        (),
        disposables,
        finish,
        DisplayAccess::Unavailable,
        clock,
        RunId::new(),
    )
}
