//! Per-action listener registries

use input_types::InputAction;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Zero-argument listener invoked on a down or up transition
pub type Listener = Rc<dyn Fn()>;

/// Identity of one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Creates a listener id from a raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({})", self.0)
    }
}

/// Ordered listeners per action
///
/// An action has an entry only while at least one listener is registered
/// for it.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: HashMap<InputAction, Vec<(ListenerId, Listener)>>,
}

impl ListenerRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener for `action`
    pub fn add(&mut self, action: InputAction, id: ListenerId, listener: Listener) {
        self.entries.entry(action).or_default().push((id, listener));
    }

    /// Removes exactly the listener `id` from `action`
    ///
    /// Drops the action's entry once it is empty. Returns true if the
    /// listener was registered.
    pub fn remove(&mut self, action: InputAction, id: ListenerId) -> bool {
        let Some(listeners) = self.entries.get_mut(&action) else {
            return false;
        };

        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        let removed = listeners.len() != before;

        if listeners.is_empty() {
            self.entries.remove(&action);
        }
        removed
    }

    /// Copies the listeners for `action`, in registration order
    pub fn snapshot(&self, action: InputAction) -> Vec<Listener> {
        self.entries
            .get(&action)
            .map(|listeners| listeners.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of listeners registered for `action`
    pub fn count(&self, action: InputAction) -> usize {
        self.entries.get(&action).map_or(0, Vec::len)
    }

    /// Checks if `action` has an entry
    pub fn contains(&self, action: InputAction) -> bool {
        self.entries.contains_key(&action)
    }

    /// Total number of listeners across all actions
    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .entries
            .iter()
            .map(|(action, listeners)| (*action, listeners.len()))
            .collect();
        counts.sort();
        f.debug_struct("ListenerRegistry")
            .field("counts", &counts)
            .finish()
    }
}
