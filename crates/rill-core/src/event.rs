#![forbid(unsafe_code)]

//! Named-event source boundary.
//!
//! Anything that can register and remove a listener for a named event can
//! feed a stream: the core calls [`EventSource::add_listener`] at subscribe
//! time and [`EventSource::remove_listener`] at teardown, and knows nothing
//! else about the source. [`EventBus`] is the in-process implementation,
//! standing in for DOM elements, sockets, or other push producers.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Emit with no listeners | Event is dropped |
//! | Remove unknown listener | No-op |
//! | Listener adds/removes listeners while handling | Takes effect from the next emit |
//! | Listener re-enters its own callback via `emit` | Panics (`RefCell` borrow) |

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Identifier of a registered listener, used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// External object capable of registering and removing named-event
/// listeners.
pub trait EventSource<E> {
    /// Register `listener` for events named `event`.
    fn add_listener(&self, event: &str, listener: Box<dyn FnMut(E)>) -> ListenerId;

    /// Remove a previously registered listener. Unknown ids are ignored.
    fn remove_listener(&self, event: &str, id: ListenerId);
}

type ListenerCell<E> = Rc<RefCell<Box<dyn FnMut(E)>>>;

struct BusState<E> {
    next_id: u64,
    listeners: HashMap<String, Vec<(ListenerId, ListenerCell<E>)>>,
}

/// In-process event target with named listener lists.
///
/// Cloning shares the same listener table. Listeners are invoked in
/// registration order; the table borrow is released before the calls so a
/// listener may add or remove listeners (including itself) while handling
/// an event.
pub struct EventBus<E> {
    state: Rc<RefCell<BusState<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    /// An empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState {
                next_id: 0,
                listeners: HashMap::new(),
            })),
        }
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .get(event)
            .map_or(0, Vec::len)
    }
}

impl<E: Clone> EventBus<E> {
    /// Deliver `payload` to every listener of `event`, in registration
    /// order. Each listener receives its own clone.
    pub fn emit(&self, event: &str, payload: E) {
        let targets: Vec<ListenerCell<E>> = self
            .state
            .borrow()
            .listeners
            .get(event)
            .map(|entries| entries.iter().map(|(_, cell)| Rc::clone(cell)).collect())
            .unwrap_or_default();
        for target in targets {
            (target.borrow_mut())(payload.clone());
        }
    }
}

impl<E> EventSource<E> for EventBus<E> {
    fn add_listener(&self, event: &str, listener: Box<dyn FnMut(E)>) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state
            .listeners
            .entry(event.to_owned())
            .or_default()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    fn remove_listener(&self, event: &str, id: ListenerId) {
        let mut state = self.state.borrow_mut();
        if let Some(entries) = state.listeners.get_mut(event) {
            entries.retain(|(entry_id, _)| *entry_id != id);
        }
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventBus")
            .field("event_names", &state.listeners.len())
            .finish()
    }
}
