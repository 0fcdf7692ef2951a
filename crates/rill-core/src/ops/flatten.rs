#![forbid(unsafe_code)]

//! Flattening: `merge_map`, `merge_map_limit`, `switch_map`, `concat_map`,
//! `exhaust_map`.
//!
//! Each input value is projected to an inner observable; the operators
//! differ only in how concurrent inners are handled:
//!
//! | Operator | Concurrent inners | Surplus input values |
//! |----------|-------------------|----------------------|
//! | `merge_map` | unbounded | n/a |
//! | `merge_map_limit(n)` | at most `n` | queued in arrival order |
//! | `switch_map` | at most 1, newest wins | cancel current inner, start new |
//! | `concat_map` | at most 1, strict order | queued in arrival order |
//! | `exhaust_map` | at most 1, current wins | dropped (documented contract) |
//!
//! Inner outputs interleave by callback arrival order; no inter-stream
//! ordering holds beyond each inner's own ordering (`concat_map` restores
//! a total order by serializing). Outer completion defers downstream
//! completion until every active inner (and queue) has drained. Any error,
//! outer or inner, is terminal and cancels everything reachable.
//!
//! Inner pipelines run on child subscriptions, so cancelling one inner
//! (`switch_map`) or recovering from an error never tears down the outer
//! link, while cancelling the outer link synchronously cancels all inners.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::observable::{Emitter, Observable};
use crate::subscription::Teardown;

type Project<T, U> = Rc<dyn Fn(T) -> Observable<U>>;

// ============================================================================
// merge_map
// ============================================================================

struct MergeState<T> {
    active: usize,
    outer_done: bool,
    queue: VecDeque<T>,
}

struct MergeCtx<T, U: 'static> {
    out: Emitter<U>,
    project: Project<T, U>,
    limit: Option<usize>,
    state: RefCell<MergeState<T>>,
}

impl<T: 'static, U: 'static> MergeCtx<T, U> {
    fn value(self: &Rc<Self>, value: T) {
        let ready = {
            let mut state = self.state.borrow_mut();
            if self.limit.is_none_or(|limit| state.active < limit) {
                state.active += 1;
                Some(value)
            } else {
                tracing::trace!("merge_map: concurrency limit reached, queueing value");
                state.queue.push_back(value);
                None
            }
        };
        if let Some(value) = ready {
            self.spawn(value);
        }
    }

    fn spawn(self: &Rc<Self>, value: T) {
        let inner = (self.project)(value);
        let child = self.out.subscription().child();
        let on_next = self.out.clone();
        let on_error = self.out.clone();
        let ctx = Rc::clone(self);
        inner.subscribe_on(
            &child,
            move |inner_value| on_next.next(inner_value),
            move |err| on_error.error(err),
            move || ctx.inner_complete(),
        );
    }

    fn inner_complete(self: &Rc<Self>) {
        let (next_value, finished) = {
            let mut state = self.state.borrow_mut();
            state.active -= 1;
            match state.queue.pop_front() {
                Some(value) => {
                    state.active += 1;
                    (Some(value), false)
                }
                None => (None, state.outer_done && state.active == 0),
            }
        };
        if let Some(value) = next_value {
            self.spawn(value);
        } else if finished {
            self.out.complete();
        }
    }

    fn outer_complete(self: &Rc<Self>) {
        let finished = {
            let mut state = self.state.borrow_mut();
            state.outer_done = true;
            state.active == 0 && state.queue.is_empty()
        };
        if finished {
            self.out.complete();
        }
    }
}

impl<T: 'static> Observable<T> {
    /// For each value, subscribe to `project(value)` and forward its
    /// outputs interleaved with all other active inners. Unbounded
    /// concurrency.
    pub fn merge_map<U: 'static>(
        self,
        project: impl Fn(T) -> Observable<U> + 'static,
    ) -> Observable<U> {
        self.merge_map_impl(Rc::new(project), None)
    }

    /// [`merge_map`](Self::merge_map) with at most `limit` concurrent
    /// inners; surplus values queue in arrival order. `limit` is clamped
    /// to at least 1.
    pub fn merge_map_limit<U: 'static>(
        self,
        limit: usize,
        project: impl Fn(T) -> Observable<U> + 'static,
    ) -> Observable<U> {
        self.merge_map_impl(Rc::new(project), Some(limit.max(1)))
    }

    fn merge_map_impl<U: 'static>(
        self,
        project: Project<T, U>,
        limit: Option<usize>,
    ) -> Observable<U> {
        Observable::new(move |out| {
            let ctx = Rc::new(MergeCtx {
                out: out.clone(),
                project: Rc::clone(&project),
                limit,
                state: RefCell::new(MergeState {
                    active: 0,
                    outer_done: false,
                    queue: VecDeque::new(),
                }),
            });
            let on_value = Rc::clone(&ctx);
            let on_error = out.clone();
            let on_done = Rc::clone(&ctx);
            self.subscribe_on(
                out.subscription(),
                move |value| on_value.value(value),
                move |err| on_error.error(err),
                move || on_done.outer_complete(),
            );
            Teardown::none()
        })
    }
}

// ============================================================================
// switch_map
// ============================================================================

struct SwitchCtx<T, U: 'static> {
    out: Emitter<U>,
    project: Project<T, U>,
    current: RefCell<Option<crate::subscription::Subscription>>,
    inner_active: Cell<bool>,
    outer_done: Cell<bool>,
}

impl<T: 'static, U: 'static> SwitchCtx<T, U> {
    fn value(self: &Rc<Self>, value: T) {
        // Newest wins: drop the in-flight inner before starting the next.
        if let Some(previous) = self.current.borrow_mut().take() {
            previous.unsubscribe();
        }
        let inner = (self.project)(value);
        let child = self.out.subscription().child();
        *self.current.borrow_mut() = Some(child.clone());
        self.inner_active.set(true);

        let on_next = self.out.clone();
        let on_error = self.out.clone();
        let ctx = Rc::clone(self);
        inner.subscribe_on(
            &child,
            move |inner_value| on_next.next(inner_value),
            move |err| on_error.error(err),
            move || {
                ctx.inner_active.set(false);
                ctx.current.borrow_mut().take();
                if ctx.outer_done.get() {
                    ctx.out.complete();
                }
            },
        );
    }

    fn outer_complete(&self) {
        self.outer_done.set(true);
        if !self.inner_active.get() {
            self.out.complete();
        }
    }
}

impl<T: 'static> Observable<T> {
    /// For each value, cancel any in-flight inner from a prior value and
    /// subscribe to `project(value)` instead. At most one inner is active;
    /// outputs of a superseded inner are never delivered.
    pub fn switch_map<U: 'static>(
        self,
        project: impl Fn(T) -> Observable<U> + 'static,
    ) -> Observable<U> {
        let project: Project<T, U> = Rc::new(project);
        Observable::new(move |out| {
            let ctx = Rc::new(SwitchCtx {
                out: out.clone(),
                project: Rc::clone(&project),
                current: RefCell::new(None),
                inner_active: Cell::new(false),
                outer_done: Cell::new(false),
            });
            let on_value = Rc::clone(&ctx);
            let on_error = out.clone();
            let on_done = Rc::clone(&ctx);
            self.subscribe_on(
                out.subscription(),
                move |value| on_value.value(value),
                move |err| on_error.error(err),
                move || on_done.outer_complete(),
            );
            Teardown::none()
        })
    }
}

// ============================================================================
// concat_map
// ============================================================================

struct ConcatCtx<T, U: 'static> {
    out: Emitter<U>,
    project: Project<T, U>,
    queue: RefCell<VecDeque<T>>,
    active: Cell<bool>,
    outer_done: Cell<bool>,
}

impl<T: 'static, U: 'static> ConcatCtx<T, U> {
    fn value(self: &Rc<Self>, value: T) {
        if self.active.get() {
            self.queue.borrow_mut().push_back(value);
        } else {
            self.launch(value);
        }
    }

    fn launch(self: &Rc<Self>, value: T) {
        self.active.set(true);
        let inner = (self.project)(value);
        let child = self.out.subscription().child();
        let on_next = self.out.clone();
        let on_error = self.out.clone();
        let ctx = Rc::clone(self);
        inner.subscribe_on(
            &child,
            move |inner_value| on_next.next(inner_value),
            move |err| on_error.error(err),
            move || {
                let queued = ctx.queue.borrow_mut().pop_front();
                match queued {
                    Some(value) => ctx.launch(value),
                    None => {
                        ctx.active.set(false);
                        if ctx.outer_done.get() {
                            ctx.out.complete();
                        }
                    }
                }
            },
        );
    }

    fn outer_complete(&self) {
        self.outer_done.set(true);
        if !self.active.get() && self.queue.borrow().is_empty() {
            self.out.complete();
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Queue inners and run them strictly one at a time, in input order.
    /// A long-running inner backs up the queue; that is the point.
    pub fn concat_map<U: 'static>(
        self,
        project: impl Fn(T) -> Observable<U> + 'static,
    ) -> Observable<U> {
        let project: Project<T, U> = Rc::new(project);
        Observable::new(move |out| {
            let ctx = Rc::new(ConcatCtx {
                out: out.clone(),
                project: Rc::clone(&project),
                queue: RefCell::new(VecDeque::new()),
                active: Cell::new(false),
                outer_done: Cell::new(false),
            });
            let on_value = Rc::clone(&ctx);
            let on_error = out.clone();
            let on_done = Rc::clone(&ctx);
            self.subscribe_on(
                out.subscription(),
                move |value| on_value.value(value),
                move |err| on_error.error(err),
                move || on_done.outer_complete(),
            );
            Teardown::none()
        })
    }
}

// ============================================================================
// exhaust_map
// ============================================================================

struct ExhaustCtx<T, U: 'static> {
    out: Emitter<U>,
    project: Project<T, U>,
    active: Cell<bool>,
    outer_done: Cell<bool>,
}

impl<T: 'static, U: 'static> ExhaustCtx<T, U> {
    fn value(self: &Rc<Self>, value: T) {
        if self.active.get() {
            tracing::trace!("exhaust_map: value ignored while inner stream is active");
            return;
        }
        self.active.set(true);
        let inner = (self.project)(value);
        let child = self.out.subscription().child();
        let on_next = self.out.clone();
        let on_error = self.out.clone();
        let ctx = Rc::clone(self);
        inner.subscribe_on(
            &child,
            move |inner_value| on_next.next(inner_value),
            move |err| on_error.error(err),
            move || {
                ctx.active.set(false);
                if ctx.outer_done.get() {
                    ctx.out.complete();
                }
            },
        );
    }

    fn outer_complete(&self) {
        self.outer_done.set(true);
        if !self.active.get() {
            self.out.complete();
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Ignore input values while an inner stream is active; subscribe to a
    /// new inner only when idle. Ignoring is the operator's contract
    /// (suited to login buttons and refresh spamming), not an error.
    pub fn exhaust_map<U: 'static>(
        self,
        project: impl Fn(T) -> Observable<U> + 'static,
    ) -> Observable<U> {
        let project: Project<T, U> = Rc::new(project);
        Observable::new(move |out| {
            let ctx = Rc::new(ExhaustCtx {
                out: out.clone(),
                project: Rc::clone(&project),
                active: Cell::new(false),
                outer_done: Cell::new(false),
            });
            let on_value = Rc::clone(&ctx);
            let on_error = out.clone();
            let on_done = Rc::clone(&ctx);
            self.subscribe_on(
                out.subscription(),
                move |value| on_value.value(value),
                move |err| on_error.error(err),
                move || on_done.outer_complete(),
            );
            Teardown::none()
        })
    }
}
