//! Integration tests for games embedded in a child frame
//!
//! Both sides of the frame boundary run in-process, connected by memory
//! transports that the tests pump by hand.

use console_host::{child_runtime, embedded_scene, Console, ConsoleConfig, FrameEmbedder, FrameLoaded, FrameOptions};
use display_slot::{ContentKind, DisplayError, DisplayNode};
use frame_bus::{pump, MemoryTransport, MessageBus, FINISH};
use futures::executor::LocalPool;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use input_types::{InputAction, InputPhase};
use lifecycle::{CancellationReason, CancellationSource};
use scene_runtime::{ManualFrameClock, RunError};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct TestEmbedder {
    created: RefCell<Vec<(String, FrameOptions, DisplayNode)>>,
    pending: RefCell<Vec<FrameLoaded>>,
}

impl TestEmbedder {
    /// Reports the oldest frame as loaded
    fn load(&self, transport: Rc<MemoryTransport>) -> MessageBus {
        let loaded = self.pending.borrow_mut().remove(0);
        loaded(transport)
    }
}

impl FrameEmbedder for TestEmbedder {
    fn create_frame(&self, url: &str, options: &FrameOptions) -> DisplayNode {
        let node = DisplayNode::frame(url);
        self.created
            .borrow_mut()
            .push((url.to_string(), options.clone(), node.clone()));
        node
    }

    fn on_load(&self, _node: &DisplayNode, loaded: FrameLoaded) {
        self.pending.borrow_mut().push(loaded);
    }
}

struct Fixture {
    pool: LocalPool,
    clock: ManualFrameClock,
    console: Console,
    embedder: Rc<TestEmbedder>,
    to_child: Rc<MemoryTransport>,
    to_parent: Rc<MemoryTransport>,
}

impl Fixture {
    fn new() -> Self {
        let clock = ManualFrameClock::new();
        let console = Console::headless(ConsoleConfig::default(), Rc::new(clock.clone())).unwrap();
        Self {
            pool: LocalPool::new(),
            clock,
            console,
            embedder: Rc::new(TestEmbedder::default()),
            to_child: Rc::new(MemoryTransport::new()),
            to_parent: Rc::new(MemoryTransport::new()),
        }
    }

    fn spawn<T: 'static>(&mut self, fut: LocalBoxFuture<'static, T>) -> Rc<RefCell<Option<T>>> {
        let out = Rc::new(RefCell::new(None));
        let slot = out.clone();
        self.pool
            .spawner()
            .spawn_local(async move {
                *slot.borrow_mut() = Some(fut.await);
            })
            .unwrap();
        self.pool.run_until_stalled();
        out
    }
}

#[test]
fn test_embedded_game_round_trip() {
    let mut fx = Fixture::new();
    let scene = embedded_scene::<u32>(
        "https://games.example/snake",
        FrameOptions::new(400, 400),
        fx.embedder.clone(),
    );
    let result = fx.spawn(fx.console.run(&scene, ()));

    // The frame is mounted with fixed sizing while it loads.
    let mounted = fx.console.display().current().unwrap();
    assert_eq!(mounted.kind, ContentKind::Frame);
    assert_eq!(fx.embedder.created.borrow()[0].0, "https://games.example/snake");

    let parent_bus = fx.embedder.load(fx.to_child.clone());
    let child_bus = MessageBus::new(fx.to_parent.clone());
    let child = child_runtime::<u32>(&child_bus, Rc::new(fx.clock.clone()));

    let presses = Rc::new(Cell::new(0));
    let p = presses.clone();
    let _listener = child.on_key_down(InputAction::A, move || p.set(p.get() + 1));

    // Parent key events reach the child's controls.
    assert_eq!(fx.console.key_down("KeyJ"), Some(InputAction::A));
    pump(&fx.to_child, &child_bus);
    assert!(child.controls.is_held(InputAction::A));
    assert_eq!(presses.get(), 1);

    fx.console.key_up("KeyJ");
    pump(&fx.to_child, &child_bus);
    assert!(!child.controls.is_held(InputAction::A));

    // The child's finish resolves the parent run.
    child.finish(7);
    assert!(child.disposables.is_empty());
    assert_eq!(pump(&fx.to_parent, &parent_bus), 1);
    fx.pool.run_until_stalled();
    assert_eq!(*result.borrow(), Some(Ok(7)));

    // Everything the frame wired is gone.
    assert!(!fx.console.display().is_occupied());
    assert_eq!(fx.console.controls().listener_count(InputPhase::Down, InputAction::A), 0);
    assert_eq!(parent_bus.listener_count(FINISH), 0);
    fx.console.key_down("KeyJ");
    assert!(fx.to_child.is_empty());
}

#[test]
fn test_undecodable_finish_is_dropped() {
    let mut fx = Fixture::new();
    let scene = embedded_scene::<u32>("game.html", FrameOptions::new(100, 100), fx.embedder.clone());
    let result = fx.spawn(fx.console.run(&scene, ()));

    let parent_bus = fx.embedder.load(fx.to_child.clone());
    parent_bus.handle_message(r#"{"type":"finish","payload":"not a number"}"#);
    fx.pool.run_until_stalled();
    assert!(result.borrow().is_none());

    parent_bus.handle_message(r#"{"type":"finish","payload":12}"#);
    fx.pool.run_until_stalled();
    assert_eq!(*result.borrow(), Some(Ok(12)));
}

#[test]
fn test_cancelled_run_releases_frame() {
    let mut fx = Fixture::new();
    let source = CancellationSource::new();
    let scene = embedded_scene::<()>("game.html", FrameOptions::new(100, 100), fx.embedder.clone());
    let result = fx.spawn(fx.console.run_until_cancelled(&scene, (), source.token()));
    assert!(fx.console.display().is_occupied());

    source.cancel(CancellationReason::HostCancel);
    fx.pool.run_until_stalled();
    assert_eq!(
        *result.borrow(),
        Some(Err(RunError::Cancelled {
            reason: CancellationReason::HostCancel
        }))
    );
    assert!(!fx.console.display().is_occupied());

    // A load that arrives late wires nothing.
    let late = fx.embedder.load(fx.to_child.clone());
    assert_eq!(late.listener_count(FINISH), 0);
    fx.console.key_down("KeyW");
    assert!(fx.to_child.is_empty());
}

#[test]
fn test_second_frame_while_mounted_fails_setup() {
    let mut fx = Fixture::new();
    let scene = embedded_scene::<()>("a.html", FrameOptions::new(10, 10), fx.embedder.clone());
    let _first = fx.spawn(fx.console.run(&scene, ()));
    let second = fx.spawn(fx.console.run(&scene, ()));

    assert!(matches!(*second.borrow(), Some(Err(RunError::Setup(_)))));
}

#[test]
fn test_child_runtime_has_no_display() {
    let bus = MessageBus::new(Rc::new(MemoryTransport::new()));
    let child = child_runtime::<()>(&bus, Rc::new(ManualFrameClock::new()));
    assert_eq!(
        child.set_display(Some(DisplayNode::canvas("c"))).unwrap_err(),
        DisplayError::Unavailable
    );
}

#[test]
fn test_child_finish_sends_once() {
    let out = Rc::new(MemoryTransport::new());
    let bus = MessageBus::new(out.clone());
    let child = child_runtime::<&str>(&bus, Rc::new(ManualFrameClock::new()));

    let released = Rc::new(Cell::new(false));
    let r = released.clone();
    child.disposables.add(disposables::Disposable::new(move || r.set(true)));

    child.finish("won");
    child.finish("again");

    assert!(released.get());
    let frames = out.drain();
    assert_eq!(frames.len(), 1);
    let message: serde_json::Value = serde_json::from_str(&frames[0]).unwrap();
    assert_eq!(message["type"], "finish");
    assert_eq!(message["payload"], "won");
}
