#![forbid(unsafe_code)]

//! Scripted event timelines over virtual time.

use std::rc::Rc;
use std::time::Duration;

use rill_core::{EventBus, SchedulerHandle, VirtualScheduler};

/// A deterministic script: named events fired at fixed offsets against one
/// [`EventBus`], replayed on a [`VirtualScheduler`].
///
/// Subscribe pipelines first (via [`bus`](Self::bus) and
/// [`scheduler`](Self::scheduler)), then [`run`](Self::run):
///
/// ```
/// use rill_harness::Timeline;
/// use rill_core::{Observable, Probe};
///
/// let mut timeline: Timeline<i32> = Timeline::new();
/// let probe = Probe::new();
/// Observable::from_event(timeline.bus(), "click")
///     .subscribe(probe.observer());
///
/// timeline.at(0, "click", 1);
/// timeline.at(50, "click", 2);
/// timeline.run();
/// assert_eq!(probe.values(), vec![1, 2]);
/// ```
pub struct Timeline<E: Clone + 'static> {
    clock: Rc<VirtualScheduler>,
    handle: SchedulerHandle,
    bus: EventBus<E>,
    entries: Vec<(u64, Rc<str>, E)>,
}

impl<E: Clone + 'static> Timeline<E> {
    #[must_use]
    pub fn new() -> Self {
        let clock = Rc::new(VirtualScheduler::new());
        let handle = clock.clone().into_handle();
        Self {
            clock,
            handle,
            bus: EventBus::new(),
            entries: Vec::new(),
        }
    }

    /// The bus the script emits on; subscribe `from_event` streams here.
    #[must_use]
    pub fn bus(&self) -> &EventBus<E> {
        &self.bus
    }

    /// The scheduler handle for time-based operators in the pipeline under
    /// test, so their timers share the script's clock.
    #[must_use]
    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.handle
    }

    /// The underlying virtual clock, for manual `advance` between runs.
    #[must_use]
    pub fn clock(&self) -> &Rc<VirtualScheduler> {
        &self.clock
    }

    /// Script `payload` to be emitted as event `name` at `at_ms`
    /// milliseconds after [`run`](Self::run) starts.
    pub fn at(&mut self, at_ms: u64, name: &str, payload: E) -> &mut Self {
        self.entries.push((at_ms, name.into(), payload));
        self
    }

    /// Replay every scripted entry in due order, then advance the clock to
    /// the last entry's offset. Timers the pipeline sets beyond that point
    /// stay pending; use [`settle`](Self::settle) to let them fire.
    pub fn run(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        let mut last = 0u64;
        for (at_ms, name, payload) in entries {
            last = last.max(at_ms);
            let bus = self.bus.clone();
            self.handle.schedule(
                Duration::from_millis(at_ms),
                Box::new(move || bus.emit(&name, payload)),
            );
        }
        self.clock.advance(Duration::from_millis(last));
    }

    /// Advance the clock past the scripted entries so trailing timers
    /// (debounce windows, in-flight mock requests) settle.
    pub fn settle(&mut self, extra: Duration) {
        self.clock.advance(extra);
    }
}

impl<E: Clone + 'static> Default for Timeline<E> {
    fn default() -> Self {
        Self::new()
    }
}
