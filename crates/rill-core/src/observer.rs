#![forbid(unsafe_code)]

//! Observer side of a subscription.
//!
//! An observer is a triple of callbacks: `next`, `error`, `complete`. Any
//! subset may be provided; absent callbacks are no-ops, except `error`,
//! where an unhandled stream error is surfaced through `tracing::error!`
//! rather than silently dropped.

use crate::error::StreamError;

/// Consumer of the values, error, and completion of one subscription.
///
/// Implementations receive signals in producer order. After `error` or
/// `complete` has been delivered, no further signal arrives (enforced by the
/// emitter gate, see `Observable`).
pub trait Observer<T> {
    /// A value was produced.
    fn next(&mut self, value: T);

    /// The stream failed. Terminal.
    ///
    /// The default implementation reports the error via `tracing::error!`
    /// so that pipelines without an error callback never swallow failures.
    fn error(&mut self, err: StreamError) {
        report_unhandled(&err);
    }

    /// The stream finished normally. Terminal.
    fn complete(&mut self) {}
}

/// Report an error that no observer callback claimed.
pub(crate) fn report_unhandled(err: &StreamError) {
    tracing::error!(error = %err, "unhandled stream error");
}

/// Observer assembled from closures, any of which may be omitted.
///
/// ```
/// use rill_core::{FnObserver, Observable};
///
/// let observer = FnObserver::new(|v: i32| println!("next {v}"))
///     .on_complete(|| println!("complete"));
/// Observable::of([1, 2, 3]).subscribe(observer);
/// ```
pub struct FnObserver<T> {
    next: Box<dyn FnMut(T)>,
    error: Option<Box<dyn FnMut(StreamError)>>,
    complete: Option<Box<dyn FnMut()>>,
}

impl<T> FnObserver<T> {
    /// Observer with only a `next` callback.
    #[must_use]
    pub fn new(next: impl FnMut(T) + 'static) -> Self {
        Self {
            next: Box::new(next),
            error: None,
            complete: None,
        }
    }

    /// Attach an error callback.
    #[must_use]
    pub fn on_error(mut self, error: impl FnMut(StreamError) + 'static) -> Self {
        self.error = Some(Box::new(error));
        self
    }

    /// Attach a completion callback.
    #[must_use]
    pub fn on_complete(mut self, complete: impl FnMut() + 'static) -> Self {
        self.complete = Some(Box::new(complete));
        self
    }
}

impl<T> Observer<T> for FnObserver<T> {
    fn next(&mut self, value: T) {
        (self.next)(value);
    }

    fn error(&mut self, err: StreamError) {
        match self.error.as_mut() {
            Some(f) => f(err),
            None => report_unhandled(&err),
        }
    }

    fn complete(&mut self) {
        if let Some(f) = self.complete.as_mut() {
            f();
        }
    }
}

impl<T> std::fmt::Debug for FnObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnObserver")
            .field("has_error", &self.error.is_some())
            .field("has_complete", &self.complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn partial_observer_absent_callbacks_are_noops() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let mut observer = FnObserver::new(move |v: i32| seen_clone.borrow_mut().push(v));

        observer.next(1);
        observer.complete(); // no callback registered, must not panic
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn callbacks_fire_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = Rc::clone(&log);
        let l2 = Rc::clone(&log);
        let mut observer = FnObserver::new(move |v: i32| l1.borrow_mut().push(format!("next {v}")))
            .on_complete(move || l2.borrow_mut().push("complete".into()));

        observer.next(7);
        observer.complete();
        assert_eq!(*log.borrow(), vec!["next 7".to_string(), "complete".into()]);
    }

    #[test]
    fn error_callback_receives_error() {
        let got = Rc::new(RefCell::new(None));
        let got_clone = Rc::clone(&got);
        let mut observer = FnObserver::new(|_: i32| {})
            .on_error(move |e| *got_clone.borrow_mut() = Some(e));

        observer.error(StreamError::producer("boom"));
        assert_eq!(*got.borrow(), Some(StreamError::producer("boom")));
    }
}
