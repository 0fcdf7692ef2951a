#![forbid(unsafe_code)]

//! Subscription handles and teardown bookkeeping.
//!
//! A [`Subscription`] represents one active producer-to-observer link. It
//! collects [`Teardown`] actions from every stage of a pipeline (producer
//! listener removal, operator timers, inner subscriptions) and runs them all
//! when the link closes, whether by explicit [`Subscription::unsubscribe`]
//! or by a terminal signal.
//!
//! # Invariants
//!
//! 1. `unsubscribe()` is synchronous and idempotent.
//! 2. Each teardown runs at most once, even if registered after close
//!    (late registration runs the action immediately).
//! 3. A failing teardown is isolated: it is reported via `tracing::warn!`
//!    and sibling teardowns still run.
//! 4. A child subscription closes with its parent; a child that closes
//!    first detaches its link so the parent does not accumulate dead
//!    entries under heavy churn (e.g. `switch_map`).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::StreamError;

// ============================================================================
// Teardown
// ============================================================================

/// One-shot, idempotent cleanup action.
pub struct Teardown(Option<Box<dyn FnOnce()>>);

impl Teardown {
    /// Teardown from an infallible cleanup closure.
    #[must_use]
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// Teardown from a fallible cleanup closure.
    ///
    /// A returned [`StreamError`] is reported via `tracing::warn!` and
    /// otherwise discarded, so one failing resource cannot block its
    /// siblings from being released.
    #[must_use]
    pub fn fallible(f: impl FnOnce() -> Result<(), StreamError> + 'static) -> Self {
        Self::new(move || {
            if let Err(err) = f() {
                tracing::warn!(error = %err, "teardown failed; continuing with remaining teardowns");
            }
        })
    }

    /// Teardown that does nothing. Used by operators whose cleanup is fully
    /// covered by the subscription they attach to.
    #[must_use]
    pub fn none() -> Self {
        Self(None)
    }

    /// Run the action. Calling this more than once has no additional effect.
    pub fn run(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Teardown")
            .field(&if self.0.is_some() { "armed" } else { "spent" })
            .finish()
    }
}

/// Identifier of a teardown registered on a [`Subscription`], usable with
/// [`Subscription::remove`] to drop the entry without running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TeardownId(u64);

// ============================================================================
// Subscription
// ============================================================================

struct SubscriptionInner {
    closed: Cell<bool>,
    next_id: Cell<u64>,
    teardowns: RefCell<Vec<(TeardownId, Teardown)>>,
    /// Link to the parent entry for child subscriptions, removed when the
    /// child closes before the parent does.
    parent: RefCell<Option<(Weak<SubscriptionInner>, TeardownId)>>,
}

/// Shared cancellation handle for one active subscription.
///
/// Cloning produces another handle to the same link; cancelling any clone
/// cancels the link. Dropping a handle does *not* cancel (wrap the handle
/// with [`Subscription::into_guard`] for RAII semantics).
pub struct Subscription {
    inner: Rc<SubscriptionInner>,
}

impl Clone for Subscription {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscription {
    /// A fresh, open subscription with no teardowns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SubscriptionInner {
                closed: Cell::new(false),
                next_id: Cell::new(0),
                teardowns: RefCell::new(Vec::new()),
                parent: RefCell::new(None),
            }),
        }
    }

    /// Whether the subscription has been cancelled or terminated.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Register a teardown. If the subscription is already closed the
    /// action runs immediately.
    pub fn add(&self, mut teardown: Teardown) -> TeardownId {
        let id = TeardownId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        if self.inner.closed.get() {
            teardown.run();
        } else {
            self.inner.teardowns.borrow_mut().push((id, teardown));
        }
        id
    }

    /// Drop a registered teardown without running it. Unknown ids are
    /// ignored (the entry may already have run or been removed).
    pub fn remove(&self, id: TeardownId) {
        self.inner
            .teardowns
            .borrow_mut()
            .retain(|(entry_id, _)| *entry_id != id);
    }

    /// Cancel the link: runs every registered teardown, in registration
    /// order, synchronously. Idempotent.
    pub fn unsubscribe(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        // Detach from the parent so the parent's entry list stays bounded.
        if let Some((parent, id)) = self.inner.parent.borrow_mut().take() {
            if let Some(parent) = parent.upgrade() {
                parent
                    .teardowns
                    .borrow_mut()
                    .retain(|(entry_id, _)| *entry_id != id);
            }
        }
        // Take the list out before running so teardowns may re-enter
        // (a child's unsubscribe touches this subscription's state).
        let mut teardowns = self.inner.teardowns.take();
        for (_, teardown) in &mut teardowns {
            teardown.run();
        }
    }

    /// Create a child subscription: cancelled when `self` is cancelled, but
    /// independently cancellable without affecting `self`. Used for inner
    /// pipelines (`switch_map` inners, `take_until` notifiers, ...).
    #[must_use]
    pub fn child(&self) -> Subscription {
        let child = Subscription::new();
        if self.is_closed() {
            child.unsubscribe();
            return child;
        }
        let link = child.clone();
        let id = self.add(Teardown::new(move || link.unsubscribe()));
        *child.inner.parent.borrow_mut() = Some((Rc::downgrade(&self.inner), id));
        child
    }

    /// Wrap in a guard that unsubscribes on drop.
    #[must_use]
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }

    /// Number of pending teardowns. Zero once closed.
    #[must_use]
    pub fn teardown_count(&self) -> usize {
        self.inner.teardowns.borrow().len()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .field("teardowns", &self.teardown_count())
            .finish()
    }
}

/// RAII wrapper: cancels the wrapped subscription when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    /// The wrapped handle.
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.0
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}
