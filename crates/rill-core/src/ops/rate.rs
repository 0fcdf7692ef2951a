#![forbid(unsafe_code)]

//! Rate limiting: `debounce_time`, `throttle_time`, `delay`.
//!
//! All three register callbacks on a caller-supplied scheduler and return
//! control immediately; none of them blocks. Cancelling the subscription
//! cancels every pending timer synchronously.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::observable::Observable;
use crate::scheduler::{SchedulerHandle, TimerHandle};
use crate::subscription::{Teardown, TeardownId};

impl<T: 'static> Observable<T> {
    /// Forward a value only once `window` has elapsed with no newer value;
    /// each input resets the timer and replaces the pending value.
    ///
    /// A pending value is flushed when the source completes. On error the
    /// pending value is dropped.
    pub fn debounce_time(self, window: Duration, scheduler: &SchedulerHandle) -> Observable<T> {
        let scheduler = Rc::clone(scheduler);
        Observable::new(move |out| {
            let scheduler = Rc::clone(&scheduler);
            let pending: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
            let timer: Rc<RefCell<Option<TimerHandle>>> = Rc::new(RefCell::new(None));

            let on_next = out.clone();
            let pending_next = Rc::clone(&pending);
            let timer_next = Rc::clone(&timer);
            let next = move |value: T| {
                *pending_next.borrow_mut() = Some(value);
                if let Some(old) = timer_next.borrow_mut().take() {
                    old.cancel();
                }
                let emit = on_next.clone();
                let slot = Rc::clone(&pending_next);
                let handle = scheduler.schedule(
                    window,
                    Box::new(move || {
                        if let Some(value) = slot.borrow_mut().take() {
                            emit.next(value);
                        }
                    }),
                );
                *timer_next.borrow_mut() = Some(handle);
            };

            let on_error = out.clone();
            let pending_err = Rc::clone(&pending);
            let timer_err = Rc::clone(&timer);
            let error = move |err| {
                pending_err.borrow_mut().take();
                if let Some(old) = timer_err.borrow_mut().take() {
                    old.cancel();
                }
                on_error.error(err);
            };

            let on_complete = out.clone();
            let pending_done = Rc::clone(&pending);
            let timer_done = Rc::clone(&timer);
            let complete = move || {
                if let Some(old) = timer_done.borrow_mut().take() {
                    old.cancel();
                }
                if let Some(value) = pending_done.borrow_mut().take() {
                    on_complete.next(value);
                }
                on_complete.complete();
            };

            self.subscribe_on(out.subscription(), next, error, complete);

            let timer_teardown = Rc::clone(&timer);
            Teardown::new(move || {
                if let Some(handle) = timer_teardown.borrow_mut().take() {
                    handle.cancel();
                }
            })
        })
    }

    /// Forward the first value, then ignore values for `window`, then
    /// accept the next one (leading edge).
    ///
    /// Ignoring is the operator's contract, not an error; drops are logged
    /// at trace level.
    pub fn throttle_time(self, window: Duration, scheduler: &SchedulerHandle) -> Observable<T> {
        let scheduler = Rc::clone(scheduler);
        Observable::new(move |out| {
            let scheduler = Rc::clone(&scheduler);
            let open = Rc::new(Cell::new(true));
            let timer: Rc<RefCell<Option<TimerHandle>>> = Rc::new(RefCell::new(None));

            let on_next = out.clone();
            let open_next = Rc::clone(&open);
            let timer_next = Rc::clone(&timer);
            let next = move |value: T| {
                if !open_next.get() {
                    tracing::trace!(window_ms = window.as_millis() as u64, "throttle_time: value dropped inside window");
                    return;
                }
                open_next.set(false);
                on_next.next(value);
                let reopen = Rc::clone(&open_next);
                let handle = scheduler.schedule(window, Box::new(move || reopen.set(true)));
                *timer_next.borrow_mut() = Some(handle);
            };

            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                next,
                move |err| on_error.error(err),
                move || on_complete.complete(),
            );

            let timer_teardown = Rc::clone(&timer);
            Teardown::new(move || {
                if let Some(handle) = timer_teardown.borrow_mut().take() {
                    handle.cancel();
                }
            })
        })
    }

    /// Forward each value `wait` after it was received, preserving relative
    /// order. Completion is delayed by the same amount so it trails every
    /// pending value; an error propagates immediately and drops whatever is
    /// still pending.
    pub fn delay(self, wait: Duration, scheduler: &SchedulerHandle) -> Observable<T> {
        let scheduler = Rc::clone(scheduler);
        Observable::new(move |out| {
            let scheduler = Rc::clone(&scheduler);

            let on_next = out.clone();
            let sched_next = Rc::clone(&scheduler);
            let next = move |value: T| {
                let emit = on_next.clone();
                let subscription = on_next.subscription().clone();
                let entry: Rc<Cell<Option<TeardownId>>> = Rc::new(Cell::new(None));
                let entry_inner = Rc::clone(&entry);
                let handle = sched_next.schedule(
                    wait,
                    Box::new(move || {
                        emit.next(value);
                        // The timer has fired; drop its cancel entry so the
                        // subscription's teardown list stays bounded.
                        if let Some(id) = entry_inner.take() {
                            emit.subscription().remove(id);
                        }
                    }),
                );
                let id = subscription.add(handle.into_teardown());
                entry.set(Some(id));
            };

            let on_error = out.clone();
            let on_complete = out.clone();
            let sched_done = Rc::clone(&scheduler);
            self.subscribe_on(
                out.subscription(),
                next,
                move |err| on_error.error(err),
                move || {
                    let emit = on_complete.clone();
                    let handle = sched_done.schedule(wait, Box::new(move || emit.complete()));
                    on_complete.subscription().add(handle.into_teardown());
                },
            );
            Teardown::none()
        })
    }
}
