#![forbid(unsafe_code)]

//! Built-in observable sources.
//!
//! Finite synchronous sources (`of`, `just`, `range`, `empty`, `throw`),
//! timer-driven sources (`interval`, `timer`), and the external-event
//! source (`from_event`). All are cold: each subscription re-runs the
//! producer independently.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::error::StreamError;
use crate::event::EventSource;
use crate::observable::{Emitter, Observable};
use crate::scheduler::{SchedulerHandle, TimerHandle};
use crate::subscription::Teardown;

impl<T: Clone + 'static> Observable<T> {
    /// Emit each value synchronously, in order, then complete.
    ///
    /// ```
    /// use rill_core::Observable;
    ///
    /// Observable::of([1, 2, 3]).subscribe_next(|v| println!("{v}"));
    /// ```
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        let values: Rc<Vec<T>> = Rc::new(values.into_iter().collect());
        Observable::new(move |out| {
            for value in values.iter() {
                if out.is_closed() {
                    break;
                }
                out.next(value.clone());
            }
            out.complete();
            Teardown::none()
        })
    }

    /// Emit a single value, then complete.
    pub fn just(value: T) -> Self {
        Observable::of([value])
    }
}

impl<T: 'static> Observable<T> {
    /// Complete immediately without emitting.
    pub fn empty() -> Self {
        Observable::new(|out| {
            out.complete();
            Teardown::none()
        })
    }

    /// Never emit and never complete. Only unsubscription releases the
    /// observer.
    pub fn never() -> Self {
        Observable::new(|_out| Teardown::none())
    }

    /// Error immediately with `err`.
    pub fn throw(err: StreamError) -> Self {
        Observable::new(move |out| {
            out.error(err.clone());
            Teardown::none()
        })
    }
}

impl Observable<u64> {
    /// Emit `start`, `start + 1`, ... for `count` values, then complete.
    pub fn range(start: u64, count: u64) -> Self {
        Observable::new(move |out| {
            for value in start..start.saturating_add(count) {
                if out.is_closed() {
                    break;
                }
                out.next(value);
            }
            out.complete();
            Teardown::none()
        })
    }

    /// Emit an increasing counter (0, 1, 2, ...) every `period`,
    /// indefinitely, until unsubscribed.
    pub fn interval(period: Duration, scheduler: &SchedulerHandle) -> Self {
        let scheduler = Rc::clone(scheduler);
        Observable::new(move |out| {
            let state = Rc::new(IntervalState {
                scheduler: Rc::clone(&scheduler),
                period,
                count: Cell::new(0),
                out,
                timer: RefCell::new(None),
            });
            arm_interval(&state);
            let state = Rc::clone(&state);
            Teardown::new(move || {
                if let Some(timer) = state.timer.borrow_mut().take() {
                    timer.cancel();
                }
            })
        })
    }

    /// Emit a single `0` after `delay`, then complete.
    pub fn timer(delay: Duration, scheduler: &SchedulerHandle) -> Self {
        let scheduler = Rc::clone(scheduler);
        Observable::new(move |out| {
            let timer = scheduler.schedule(
                delay,
                Box::new(move || {
                    out.next(0);
                    out.complete();
                }),
            );
            timer.into_teardown()
        })
    }
}

struct IntervalState {
    scheduler: SchedulerHandle,
    period: Duration,
    count: Cell<u64>,
    out: Emitter<u64>,
    timer: RefCell<Option<TimerHandle>>,
}

fn arm_interval(state: &Rc<IntervalState>) {
    let next = Rc::clone(state);
    let timer = state.scheduler.schedule(
        state.period,
        Box::new(move || {
            let n = next.count.get();
            next.count.set(n + 1);
            next.out.next(n);
            if !next.out.is_closed() {
                arm_interval(&next);
            }
        }),
    );
    *state.timer.borrow_mut() = Some(timer);
}

impl<T: 'static> Observable<T> {
    /// One value per occurrence of the named event on `source`, until
    /// unsubscribed. Infinite and push-driven: the listener is registered
    /// at subscribe time and removed at teardown.
    pub fn from_event<S>(source: &S, event: &str) -> Self
    where
        S: EventSource<T> + Clone + 'static,
    {
        let source = source.clone();
        let event: Rc<str> = event.into();
        Observable::new(move |out| {
            let id = source.add_listener(&event, Box::new(move |value| out.next(value)));
            let source = source.clone();
            let event = Rc::clone(&event);
            Teardown::new(move || source.remove_listener(&event, id))
        })
    }
}
