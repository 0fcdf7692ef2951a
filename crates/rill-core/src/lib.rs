#![forbid(unsafe_code)]

//! Core: observables, operators, subscriptions, and schedulers.
//!
//! # Role in Rill
//! `rill-core` is the whole reactive engine. It defines cold push-based
//! [`Observable`] streams, the [`Subscription`] resource tree that makes
//! cancellation synchronous and total, the operator set (transform, filter,
//! rate limit, flatten, recover), and the [`Scheduler`] seam that keeps
//! every time-based operator testable on a virtual clock.
//!
//! # Primary responsibilities
//! - **Observable**: lazy stream descriptions; each subscribe re-runs the
//!   producer (`of`, `interval`, `from_event`, ...).
//! - **Subscription**: hierarchical teardown registry; unsubscribing a
//!   parent releases every child resource exactly once.
//! - **Operators**: composable stream-to-stream transforms as method
//!   chains, including the four flattening strategies.
//! - **Scheduler**: timer injection ([`VirtualScheduler`] for tests and
//!   [`RunLoop`] for wall-clock execution).
//!
//! # How it fits in the system
//! `rill-harness` drives these primitives in scripted scenarios: an
//! [`EventBus`] stands in for a UI event target, [`VirtualScheduler`]
//! replaces wall-clock time, and [`Probe`] records what a pipeline
//! delivered. Everything is single-threaded; values never cross threads.
//!
//! ```
//! use std::rc::Rc;
//! use std::time::Duration;
//! use rill_core::{Observable, VirtualScheduler};
//!
//! let clock = Rc::new(VirtualScheduler::new());
//! let handle = clock.clone().into_handle();
//!
//! let sub = Observable::interval(Duration::from_millis(100), &handle)
//!     .map(|n| n * 2)
//!     .take(3)
//!     .subscribe_next(|n| println!("tick {n}"));
//!
//! clock.advance(Duration::from_millis(300));
//! assert!(sub.is_closed());
//! ```

pub mod error;
pub mod event;
pub mod http;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod probe;
pub mod scheduler;
pub mod sources;
pub mod subscription;

pub use error::StreamError;
pub use event::{EventBus, EventSource, ListenerId};
pub use http::{Fetch, Method, Request, Response, fetch_ok};
pub use observable::{Emitter, Observable, Operator};
pub use observer::{FnObserver, Observer};
pub use probe::{Probe, Signal};
pub use scheduler::{RunLoop, Scheduler, SchedulerHandle, TimerHandle, VirtualScheduler};
pub use subscription::{Subscription, SubscriptionGuard, Teardown, TeardownId};
