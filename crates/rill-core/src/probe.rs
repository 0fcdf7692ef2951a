#![forbid(unsafe_code)]

//! Recording observer for deterministic assertions.
//!
//! A [`Probe`] records every signal a subscription delivers, in order, so
//! tests can assert on the exact sequence without sleeps or channels. It
//! is ordinary library surface (not test-gated): deterministic pipelines
//! are useful to embedders as well, in the same spirit as the
//! [`VirtualScheduler`](crate::scheduler::VirtualScheduler).

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::StreamError;
use crate::observer::Observer;

/// One recorded signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    /// A value was delivered.
    Next(T),
    /// The stream failed.
    Error(StreamError),
    /// The stream completed.
    Complete,
}

/// Signal recorder. Create one, subscribe its [`observer`](Probe::observer),
/// then assert on [`values`](Probe::values) / [`signals`](Probe::signals).
#[derive(Debug)]
pub struct Probe<T> {
    signals: Rc<RefCell<Vec<Signal<T>>>>,
}

impl<T> Default for Probe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Probe<T> {
    /// An empty probe.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signals: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// An observer feeding this probe. May be called more than once; all
    /// observers append to the same log.
    #[must_use]
    pub fn observer(&self) -> ProbeObserver<T> {
        ProbeObserver {
            signals: Rc::clone(&self.signals),
        }
    }

    /// Whether `Complete` was recorded.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.signals
            .borrow()
            .iter()
            .any(|s| matches!(s, Signal::Complete))
    }

    /// The recorded error, if any.
    #[must_use]
    pub fn error(&self) -> Option<StreamError> {
        self.signals.borrow().iter().find_map(|s| match s {
            Signal::Error(err) => Some(err.clone()),
            _ => None,
        })
    }

    /// Number of recorded signals of any kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.borrow().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.borrow().is_empty()
    }
}

impl<T: Clone> Probe<T> {
    /// The recorded values, in delivery order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.signals
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Signal::Next(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    /// The full signal log, in delivery order.
    #[must_use]
    pub fn signals(&self) -> Vec<Signal<T>> {
        self.signals.borrow().clone()
    }
}

/// Observer half of a [`Probe`].
#[derive(Debug)]
pub struct ProbeObserver<T> {
    signals: Rc<RefCell<Vec<Signal<T>>>>,
}

impl<T> Observer<T> for ProbeObserver<T> {
    fn next(&mut self, value: T) {
        self.signals.borrow_mut().push(Signal::Next(value));
    }

    fn error(&mut self, err: StreamError) {
        self.signals.borrow_mut().push(Signal::Error(err));
    }

    fn complete(&mut self) {
        self.signals.borrow_mut().push(Signal::Complete);
    }
}
