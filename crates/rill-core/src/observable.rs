#![forbid(unsafe_code)]

//! Cold, push-based observables.
//!
//! An [`Observable<T>`] is a lazy description of a producer: nothing runs
//! until [`subscribe`](Observable::subscribe), and every subscription
//! re-runs the producer from scratch with its own state (cold semantics).
//! The description itself is immutable and cheap to clone, so one
//! observable may back many independent subscriptions.
//!
//! Producers receive an [`Emitter`], the per-subscription gate that
//! enforces the signal grammar, and return a [`Teardown`] releasing
//! whatever the producer acquired (listeners, timers).
//!
//! # Invariants
//!
//! 1. **Terminal-state**: after `error` or `complete` is delivered, no
//!    further signal reaches the observer on that subscription.
//! 2. A terminal signal runs the subscription's teardown chain
//!    synchronously, destroying all per-subscription operator state.
//! 3. The producer runs once per subscription; no producer side effects
//!    are shared across subscribers.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Signal after terminal | Silently ignored by the emitter gate |
//! | Signal after `unsubscribe` | Silently ignored |
//! | Observer re-enters its own stage | Panics (`RefCell` borrow) |
//! | Error with no error callback | Reported via `tracing::error!` |

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::StreamError;
use crate::observer::{FnObserver, Observer};
use crate::subscription::{Subscription, Teardown};

type SharedObserver<T> = Rc<RefCell<dyn Observer<T>>>;

// ============================================================================
// Emitter
// ============================================================================

/// Per-subscription gate between a producer and its observer.
///
/// Clones share the gate, so a producer may stash copies in timer and
/// listener callbacks. Signals after a terminal signal, or after the
/// subscription has been cancelled, are ignored.
pub struct Emitter<T> {
    observer: SharedObserver<T>,
    done: Rc<Cell<bool>>,
    subscription: Subscription,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            observer: Rc::clone(&self.observer),
            done: Rc::clone(&self.done),
            subscription: self.subscription.clone(),
        }
    }
}

impl<T: 'static> Emitter<T> {
    fn new(observer: SharedObserver<T>, subscription: Subscription) -> Self {
        Self {
            observer,
            done: Rc::new(Cell::new(false)),
            subscription,
        }
    }

    /// Deliver a value, unless the subscription has terminated.
    pub fn next(&self, value: T) {
        if self.is_closed() {
            return;
        }
        self.observer.borrow_mut().next(value);
    }

    /// Deliver a terminal error, then run the teardown chain.
    pub fn error(&self, err: StreamError) {
        if self.done.replace(true) || self.subscription.is_closed() {
            return;
        }
        self.observer.borrow_mut().error(err);
        self.subscription.unsubscribe();
    }

    /// Deliver completion, then run the teardown chain.
    pub fn complete(&self) {
        if self.done.replace(true) || self.subscription.is_closed() {
            return;
        }
        self.observer.borrow_mut().complete();
        self.subscription.unsubscribe();
    }

    /// Whether a terminal signal was delivered or the subscription was
    /// cancelled. Long-lived producers use this to stop early.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.done.get() || self.subscription.is_closed()
    }

    /// The subscription this emitter feeds. Operators attach teardowns and
    /// spawn child subscriptions for inner pipelines through it.
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl<T> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("done", &self.done.get())
            .field("subscription", &self.subscription)
            .finish()
    }
}

// ============================================================================
// Observable
// ============================================================================

type Producer<T> = dyn Fn(Emitter<T>) -> Teardown;

/// Lazy description of a value producer. See the module docs.
#[must_use = "observables are lazy and do nothing until subscribed"]
pub struct Observable<T: 'static> {
    producer: Rc<Producer<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Rc::clone(&self.producer),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Observable from a custom producer.
    ///
    /// The producer is invoked once per subscription. It may emit
    /// synchronously, or capture the emitter for later delivery from timer
    /// or listener callbacks; the returned [`Teardown`] must release
    /// whatever the producer acquired.
    ///
    /// ```
    /// use rill_core::{Observable, Teardown};
    ///
    /// let ticks = Observable::new(|out| {
    ///     out.next(1u32);
    ///     out.next(2);
    ///     out.complete();
    ///     Teardown::none()
    /// });
    /// ticks.subscribe_next(|v| println!("{v}"));
    /// ```
    pub fn new(producer: impl Fn(Emitter<T>) -> Teardown + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// Run the producer for a fresh observer. Returns the cancellation
    /// handle for the whole pipeline.
    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        let subscription = Subscription::new();
        self.subscribe_with(Rc::new(RefCell::new(observer)), &subscription);
        subscription
    }

    /// Subscribe with only a value callback. Errors fall through to the
    /// default handler, which reports them via `tracing::error!`.
    pub fn subscribe_next(&self, next: impl FnMut(T) + 'static) -> Subscription {
        self.subscribe(FnObserver::new(next))
    }

    /// Subscribe an already-shared observer onto an existing subscription.
    /// The seam operators use to tie upstream stages and inner pipelines
    /// to the lifetime of the downstream subscription.
    pub(crate) fn subscribe_with(&self, observer: SharedObserver<T>, subscription: &Subscription) {
        let emitter = Emitter::new(observer, subscription.clone());
        let teardown = (self.producer)(emitter);
        subscription.add(teardown);
    }

    /// Closure form of [`subscribe_with`](Self::subscribe_with).
    pub(crate) fn subscribe_on(
        &self,
        subscription: &Subscription,
        next: impl FnMut(T) + 'static,
        error: impl FnMut(StreamError) + 'static,
        complete: impl FnMut() + 'static,
    ) {
        let observer = FnObserver::new(next).on_error(error).on_complete(complete);
        self.subscribe_with(Rc::new(RefCell::new(observer)), subscription);
    }

    /// Apply an [`Operator`]. Equivalent to calling the operator directly;
    /// exists so dynamically assembled pipelines stay left-to-right.
    pub fn pipe<U: 'static>(self, op: impl Operator<T, U>) -> Observable<U> {
        op.apply(self)
    }
}

impl<T> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

// ============================================================================
// Operator
// ============================================================================

/// A transform from one observable to another.
///
/// Implemented for every `Fn(Observable<I>) -> Observable<O>`, so plain
/// closures compose:
///
/// ```
/// use rill_core::Observable;
///
/// let doubled_evens = |source: Observable<i32>| {
///     source.filter(|v| v % 2 == 0).map(|v| v * 2)
/// };
/// let out = Observable::of([1, 2, 3, 4]).pipe(doubled_evens);
/// out.subscribe_next(|v| println!("{v}"));
/// ```
pub trait Operator<I: 'static, O: 'static> {
    /// Apply this operator to `source`.
    fn apply(&self, source: Observable<I>) -> Observable<O>;
}

impl<I: 'static, O: 'static, F> Operator<I, O> for F
where
    F: Fn(Observable<I>) -> Observable<O>,
{
    fn apply(&self, source: Observable<I>) -> Observable<O> {
        self(source)
    }
}
