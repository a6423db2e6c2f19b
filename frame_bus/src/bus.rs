//! The message bus

use crate::{BusError, MessageTransport, WireMessage};
use disposables::Disposable;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Listener for one message name; receives the decoded payload
pub type BusListener = Rc<dyn Fn(&Value)>;

/// Identity of one bus listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription({})", self.0)
    }
}

struct BusInner {
    listeners: HashMap<String, Vec<(SubscriptionId, BusListener)>>,
    next_id: u64,
}

impl BusInner {
    fn remove(&mut self, name: &str, id: SubscriptionId) -> bool {
        let Some(listeners) = self.listeners.get_mut(name) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            self.listeners.remove(name);
        }
        removed
    }
}

/// Named publish/subscribe channel over a transport
///
/// Cloning yields another handle to the same listeners and transport.
///
/// ## Example
///
/// ```
/// use frame_bus::{pump, MemoryTransport, MessageBus};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let parent_out = Rc::new(MemoryTransport::new());
/// let child_out = Rc::new(MemoryTransport::new());
/// let parent = MessageBus::new(parent_out.clone());
/// let child = MessageBus::new(child_out.clone());
///
/// let seen = Rc::new(Cell::new(0));
/// let s = seen.clone();
/// let _sub = child.subscribe("ping", move |payload| s.set(payload.as_i64().unwrap_or(0)));
///
/// parent.emit("ping", &7).unwrap();
/// pump(&parent_out, &child);
/// assert_eq!(seen.get(), 7);
/// ```
#[derive(Clone)]
pub struct MessageBus {
    transport: Rc<dyn MessageTransport>,
    inner: Rc<RefCell<BusInner>>,
}

impl MessageBus {
    /// Creates a bus that sends through `transport`
    pub fn new(transport: Rc<dyn MessageTransport>) -> Self {
        Self {
            transport,
            inner: Rc::new(RefCell::new(BusInner {
                listeners: HashMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Sends `{ type: name, payload }` to the other side
    pub fn emit<T: Serialize + ?Sized>(&self, name: &str, payload: &T) -> Result<(), BusError> {
        let data = WireMessage::new(name, payload)?.encode()?;
        tracing::debug!(name, "emit");
        self.transport.post_message(&data)
    }

    /// Adds a listener for messages named `name`
    pub fn add_event_listener(&self, name: &str, listener: BusListener) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner
            .listeners
            .entry(name.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    /// Removes a listener added with `add_event_listener`
    ///
    /// Returns true if the listener was registered under `name`.
    pub fn remove_event_listener(&self, name: &str, id: SubscriptionId) -> bool {
        self.inner.borrow_mut().remove(name, id)
    }

    /// Adds a listener and returns a handle that removes it
    pub fn subscribe(&self, name: &str, listener: impl Fn(&Value) + 'static) -> Disposable {
        let id = self.add_event_listener(name, Rc::new(listener));
        let weak: Weak<RefCell<BusInner>> = Rc::downgrade(&self.inner);
        let name = name.to_string();
        Disposable::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().remove(&name, id);
            }
        })
    }

    /// Adds a listener whose payload is decoded into `T`
    ///
    /// Payloads that do not decode are logged and dropped.
    pub fn subscribe_typed<T, F>(&self, name: &str, listener: F) -> Disposable
    where
        T: DeserializeOwned,
        F: Fn(T) + 'static,
    {
        let message = name.to_string();
        self.subscribe(name, move |payload| {
            match serde_json::from_value::<T>(payload.clone()) {
                Ok(decoded) => listener(decoded),
                Err(err) => tracing::error!(name = %message, error = %err, "invalid payload dropped"),
            }
        })
    }

    /// Delivers one inbound frame to its listeners
    ///
    /// Returns the number of listeners invoked. A frame that is not JSON or
    /// lacks a string `type` is logged and dropped.
    pub fn handle_message(&self, data: &str) -> usize {
        let message = match WireMessage::decode(data) {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(error = %err, "invalid frame 'message' payload");
                return 0;
            }
        };

        let listeners: Vec<BusListener> = self
            .inner
            .borrow()
            .listeners
            .get(&message.kind)
            .map(|ls| ls.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        tracing::debug!(name = %message.kind, listeners = listeners.len(), "message");
        for listener in &listeners {
            listener(&message.payload);
        }
        listeners.len()
    }

    /// Number of listeners registered under `name`
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner.borrow().listeners.get(name).map_or(0, Vec::len)
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut names: Vec<_> = inner.listeners.keys().cloned().collect();
        names.sort();
        f.debug_struct("MessageBus").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pump, MemoryTransport, FINISH};
    use serde::Deserialize;
    use serde_json::json;
    use std::cell::Cell;

    fn pair() -> (Rc<MemoryTransport>, MessageBus) {
        let transport = Rc::new(MemoryTransport::new());
        let bus = MessageBus::new(transport.clone());
        (transport, bus)
    }

    #[test]
    fn test_emit_encodes_frame() {
        let (transport, bus) = pair();
        bus.emit(FINISH, &json!({ "score": 3 })).unwrap();

        let frames = transport.drain();
        assert_eq!(frames.len(), 1);
        let value: Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(value, json!({ "type": "finish", "payload": { "score": 3 } }));
    }

    #[test]
    fn test_emit_reports_transport_failure() {
        let (transport, bus) = pair();
        transport.close();
        assert!(matches!(bus.emit("x", &()), Err(BusError::Transport { .. })));
    }

    #[test]
    fn test_all_listeners_for_name_invoked() {
        let (_transport, bus) = pair();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["one", "two"] {
            let log = log.clone();
            bus.add_event_listener("tick", Rc::new(move |p: &Value| log.borrow_mut().push((tag, p.clone()))));
        }
        let other = log.clone();
        bus.add_event_listener("tock", Rc::new(move |p: &Value| other.borrow_mut().push(("tock", p.clone()))));

        let invoked = bus.handle_message(r#"{"type":"tick","payload":1}"#);

        assert_eq!(invoked, 2);
        assert_eq!(*log.borrow(), vec![("one", json!(1)), ("two", json!(1))]);
    }

    #[test]
    fn test_remove_event_listener() {
        let (_transport, bus) = pair();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = bus.add_event_listener("tick", Rc::new(move |_: &Value| h.set(h.get() + 1)));

        assert!(bus.remove_event_listener("tick", id));
        assert!(!bus.remove_event_listener("tick", id));
        assert_eq!(bus.handle_message(r#"{"type":"tick"}"#), 0);
        assert_eq!(hits.get(), 0);
        assert_eq!(bus.listener_count("tick"), 0);
    }

    #[test]
    fn test_subscribe_handle_removes_listener() {
        let (_transport, bus) = pair();
        let sub = bus.subscribe("tick", |_| {});
        assert_eq!(bus.listener_count("tick"), 1);
        sub.dispose().unwrap();
        assert_eq!(bus.listener_count("tick"), 0);
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let (_transport, bus) = pair();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let _sub = bus.subscribe("tick", move |_| h.set(h.get() + 1));

        for frame in ["", "not json", "{", "42", r#"{"payload":1}"#, r#"{"type":null}"#] {
            assert_eq!(bus.handle_message(frame), 0, "{frame}");
        }
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_unknown_type_invokes_nothing() {
        let (_transport, bus) = pair();
        assert_eq!(bus.handle_message(r#"{"type":"nobody","payload":{}}"#), 0);
    }

    #[test]
    fn test_subscribe_typed() {
        #[derive(Deserialize)]
        struct Score {
            points: u32,
        }

        let (_transport, bus) = pair();
        let total = Rc::new(Cell::new(0));
        let t = total.clone();
        let _sub = bus.subscribe_typed("score", move |s: Score| t.set(t.get() + s.points));

        bus.handle_message(r#"{"type":"score","payload":{"points":5}}"#);
        bus.handle_message(r#"{"type":"score","payload":"oops"}"#);
        bus.handle_message(r#"{"type":"score","payload":{"points":2}}"#);

        assert_eq!(total.get(), 7);
    }

    #[test]
    fn test_listener_may_emit_while_handling() {
        let (transport, bus) = pair();
        let echo = bus.clone();
        let _sub = bus.subscribe("ping", move |p| {
            echo.emit("pong", p).unwrap();
        });

        bus.handle_message(r#"{"type":"ping","payload":"hi"}"#);
        let frames = transport.drain();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].contains("pong"));
    }

    #[test]
    fn test_two_buses_talk_through_pump() {
        let (parent_out, parent) = pair();
        let (child_out, child) = pair();

        let replies = Rc::new(Cell::new(0));
        let r = replies.clone();
        let _parent_sub = parent.subscribe(FINISH, move |p| r.set(p.as_u64().unwrap_or(0)));
        let reply = child.clone();
        let _child_sub = child.subscribe("start", move |_| {
            reply.emit(FINISH, &99).unwrap();
        });

        parent.emit("start", &()).unwrap();
        assert_eq!(pump(&parent_out, &child), 1);
        assert_eq!(pump(&child_out, &parent), 1);
        assert_eq!(replies.get(), 99);
    }
}
