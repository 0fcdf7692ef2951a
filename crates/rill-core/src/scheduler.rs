#![forbid(unsafe_code)]

//! Timer scheduling for time-based operators.
//!
//! Rill has no ambient global timer state: every time-based source or
//! operator takes an explicit [`SchedulerHandle`] supplied by the caller.
//! Two implementations ship with the core:
//!
//! - [`VirtualScheduler`]: a deterministic, manually advanced clock.
//!   The backbone of every test and demo in this repository: no sleeps,
//!   no flakiness, exact control over "when".
//! - [`RunLoop`]: a wall-clock, single-threaded loop that sleeps until the
//!   next deadline and drains timers until none remain.
//!
//! # Invariants
//!
//! 1. `schedule` never invokes the callback synchronously, not even for a
//!    zero delay.
//! 2. Callbacks fire in deadline order; ties fire in registration order.
//! 3. A cancelled timer's callback never fires ([`TimerHandle::cancel`] is
//!    effective until the deadline and idempotent afterwards).
//! 4. Callbacks may schedule further timers and cancel existing ones.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::subscription::Teardown;

/// Timer registry used by time-based sources and operators.
pub trait Scheduler {
    /// Run `callback` once, `delay` from now. Never synchronous.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle;
}

/// Shared handle to a caller-supplied scheduler.
pub type SchedulerHandle = Rc<dyn Scheduler>;

/// Handle to one pending timer.
///
/// Cancellation is cooperative: the entry stays queued but its callback is
/// skipped when the deadline arrives.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TimerHandle {
    fn new() -> Self {
        Self {
            cancelled: Rc::new(Cell::new(false)),
        }
    }

    /// Prevent the callback from firing. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Convert into a [`Teardown`] that cancels the timer.
    #[must_use]
    pub fn into_teardown(self) -> Teardown {
        Teardown::new(move || self.cancel())
    }
}

// ============================================================================
// VirtualScheduler
// ============================================================================

struct VirtualEntry {
    due: Duration,
    seq: u64,
    cancelled: Rc<Cell<bool>>,
    callback: Box<dyn FnOnce()>,
}

// Ordering is reversed so the BinaryHeap pops the earliest deadline first;
// `seq` breaks ties in registration order.
impl PartialEq for VirtualEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for VirtualEntry {}

impl PartialOrd for VirtualEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VirtualEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct VirtualState {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<VirtualEntry>,
}

/// Deterministic scheduler with a manually advanced clock.
///
/// ```
/// use std::rc::Rc;
/// use std::time::Duration;
/// use rill_core::{Scheduler, VirtualScheduler};
///
/// let clock = Rc::new(VirtualScheduler::new());
/// let handle = clock.clone().into_handle();
/// let timer = handle.schedule(Duration::from_millis(10), Box::new(|| println!("fired")));
///
/// clock.advance(Duration::from_millis(9)); // nothing yet
/// clock.advance(Duration::from_millis(1)); // prints "fired"
/// # drop(timer);
/// ```
pub struct VirtualScheduler {
    state: RefCell<VirtualState>,
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualScheduler {
    /// A scheduler at virtual time zero with no pending timers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(VirtualState {
                now: Duration::ZERO,
                seq: 0,
                queue: BinaryHeap::new(),
            }),
        }
    }

    /// Coerce an `Rc<VirtualScheduler>` into a [`SchedulerHandle`].
    #[must_use]
    pub fn into_handle(self: Rc<Self>) -> SchedulerHandle {
        self
    }

    /// Elapsed virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of queued timers, cancelled entries included.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Advance the clock by `delta`, firing every timer due on the way in
    /// deadline order. A callback that schedules a timer still within the
    /// window sees it fire during the same call.
    pub fn advance(&self, delta: Duration) {
        let target = self.state.borrow().now + delta;
        self.advance_to(target);
    }

    /// Advance the clock to an absolute virtual time. No-op if `target` is
    /// in the past.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let entry = {
                let mut state = self.state.borrow_mut();
                match state.queue.peek() {
                    Some(head) if head.due <= target => state.queue.pop(),
                    _ => None,
                }
            };
            let Some(entry) = entry else { break };
            self.state.borrow_mut().now = entry.due;
            if !entry.cancelled.get() {
                (entry.callback)();
            }
        }
        let mut state = self.state.borrow_mut();
        if target > state.now {
            state.now = target;
        }
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut state = self.state.borrow_mut();
        let due = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        tracing::trace!(due_ms = due.as_millis() as u64, seq, "virtual timer scheduled");
        state.queue.push(VirtualEntry {
            due,
            seq,
            cancelled: Rc::clone(&handle.cancelled),
            callback,
        });
        handle
    }
}

// ============================================================================
// RunLoop
// ============================================================================

struct WallEntry {
    due: Instant,
    seq: u64,
    cancelled: Rc<Cell<bool>>,
    callback: Box<dyn FnOnce()>,
}

impl PartialEq for WallEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for WallEntry {}

impl PartialOrd for WallEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct WallState {
    seq: u64,
    queue: BinaryHeap<WallEntry>,
}

/// Wall-clock, single-threaded cooperative loop.
///
/// [`run`](Self::run) sleeps until the next deadline, fires the timer, and
/// repeats until the queue is empty or [`stop`](Self::stop) is requested
/// from a callback. All subscriber code executes on the calling thread.
pub struct RunLoop {
    state: RefCell<WallState>,
    stopped: Cell<bool>,
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLoop {
    /// An empty, runnable loop.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(WallState {
                seq: 0,
                queue: BinaryHeap::new(),
            }),
            stopped: Cell::new(false),
        }
    }

    /// Coerce an `Rc<RunLoop>` into a [`SchedulerHandle`].
    #[must_use]
    pub fn into_handle(self: Rc<Self>) -> SchedulerHandle {
        self
    }

    /// Request the loop to exit. Takes effect once the currently running
    /// callback (if any) returns.
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    /// Drive timers until the queue drains or [`stop`](Self::stop) is
    /// called.
    pub fn run(&self) {
        enum Step {
            Idle,
            Fire(WallEntry),
            Sleep(Duration),
        }

        self.stopped.set(false);
        loop {
            if self.stopped.get() {
                break;
            }
            let step = {
                let mut state = self.state.borrow_mut();
                match state.queue.peek().map(|entry| entry.due) {
                    None => Step::Idle,
                    Some(due) if due <= Instant::now() => match state.queue.pop() {
                        Some(entry) => Step::Fire(entry),
                        None => Step::Idle,
                    },
                    Some(due) => Step::Sleep(due.saturating_duration_since(Instant::now())),
                }
            };
            match step {
                Step::Idle => break,
                Step::Fire(entry) => {
                    if !entry.cancelled.get() {
                        (entry.callback)();
                    }
                }
                Step::Sleep(wait) => std::thread::sleep(wait),
            }
        }
    }
}

impl Scheduler for RunLoop {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut state = self.state.borrow_mut();
        let seq = state.seq;
        state.seq += 1;
        state.queue.push(WallEntry {
            due: Instant::now() + delay,
            seq,
            cancelled: Rc::clone(&handle.cancelled),
            callback,
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> (Rc<VirtualScheduler>, SchedulerHandle) {
        let clock = Rc::new(VirtualScheduler::new());
        let handle = clock.clone().into_handle();
        (clock, handle)
    }

    #[test]
    fn schedule_is_never_synchronous() {
        let (clock, handle) = clock();
        let fired = Rc::new(Cell::new(false));
        let fired_clone = Rc::clone(&fired);
        let _t = handle.schedule(Duration::ZERO, Box::new(move || fired_clone.set(true)));

        assert!(!fired.get());
        clock.advance(Duration::ZERO);
        assert!(fired.get());
    }

    #[test]
    fn timers_fire_in_deadline_order_with_fifo_ties() {
        let (clock, handle) = clock();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay_ms, label) in [(20u64, "b"), (10, "a"), (20, "c")] {
            let log = Rc::clone(&log);
            let _t = handle.schedule(
                Duration::from_millis(delay_ms),
                Box::new(move || log.borrow_mut().push(label)),
            );
        }

        clock.advance(Duration::from_millis(30));
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let (clock, handle) = clock();
        let fired = Rc::new(Cell::new(false));
        let fired_clone = Rc::clone(&fired);
        let timer = handle.schedule(Duration::from_millis(5), Box::new(move || fired_clone.set(true)));

        timer.cancel();
        clock.advance(Duration::from_millis(10));
        assert!(!fired.get());
        assert!(timer.is_cancelled());
    }

    #[test]
    fn callback_may_schedule_more_timers_inside_window() {
        let (clock, handle) = clock();
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_outer = Rc::clone(&log);
        let handle_inner = Rc::clone(&handle);
        let _t = handle.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                log_outer.borrow_mut().push("outer");
                let log_inner = Rc::clone(&log_outer);
                let _t2 = handle_inner.schedule(
                    Duration::from_millis(5),
                    Box::new(move || log_inner.borrow_mut().push("inner")),
                );
            }),
        );

        clock.advance(Duration::from_millis(20));
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
        assert_eq!(clock.now(), Duration::from_millis(20));
    }

    #[test]
    fn callback_fires_at_its_deadline_not_the_window_edge() {
        let (clock, handle) = clock();
        let seen_at = Rc::new(Cell::new(Duration::ZERO));
        let seen_clone = Rc::clone(&seen_at);
        let clock_inner = Rc::clone(&clock);
        let _t = handle.schedule(
            Duration::from_millis(7),
            Box::new(move || seen_clone.set(clock_inner.now())),
        );

        clock.advance(Duration::from_millis(100));
        assert_eq!(seen_at.get(), Duration::from_millis(7));
    }

    #[test]
    fn run_loop_drains_and_stops() {
        let run_loop = Rc::new(RunLoop::new());
        let handle = run_loop.clone().into_handle();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay_ms, label) in [(2u64, "second"), (1, "first")] {
            let log = Rc::clone(&log);
            let _t = handle.schedule(
                Duration::from_millis(delay_ms),
                Box::new(move || log.borrow_mut().push(label)),
            );
        }

        run_loop.run();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn run_loop_stop_from_callback() {
        let run_loop = Rc::new(RunLoop::new());
        let handle = run_loop.clone().into_handle();
        let stopper = Rc::clone(&run_loop);
        let _t = handle.schedule(Duration::from_millis(1), Box::new(move || stopper.stop()));
        let fired = Rc::new(Cell::new(false));
        let fired_clone = Rc::clone(&fired);
        let _t2 = handle.schedule(
            Duration::from_millis(50),
            Box::new(move || fired_clone.set(true)),
        );

        run_loop.run();
        assert!(!fired.get());
    }
}
