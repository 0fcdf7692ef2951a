#![forbid(unsafe_code)]

//! Resource-release guarantees across the subscription tree.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use rill_core::{
    EventBus, Observable, Probe, SchedulerHandle, Subscription, Teardown, VirtualScheduler,
};

fn clock() -> (Rc<VirtualScheduler>, SchedulerHandle) {
    let clock = Rc::new(VirtualScheduler::new());
    let handle = clock.clone().into_handle();
    (clock, handle)
}

#[test]
fn unsubscribe_releases_every_stage_of_a_pipeline() {
    let (clock, handle) = clock();
    let bus: EventBus<u64> = EventBus::new();
    let probe = Probe::new();

    let sub = Observable::from_event(&bus, "tick")
        .debounce_time(Duration::from_millis(50), &handle)
        .map(|v| v + 1)
        .subscribe(probe.observer());

    bus.emit("tick", 1);
    clock.advance(Duration::from_millis(10));
    sub.unsubscribe();

    assert_eq!(bus.listener_count("tick"), 0, "event listener removed");
    bus.emit("tick", 2);
    clock.advance(Duration::from_millis(200));
    assert!(probe.values().is_empty(), "no delivery after unsubscribe");
}

#[test]
fn unsubscribe_is_idempotent() {
    let count = Rc::new(Cell::new(0u32));
    let count_clone = Rc::clone(&count);
    let source: Observable<i32> = Observable::new(move |_out| {
        let count = Rc::clone(&count_clone);
        Teardown::new(move || count.set(count.get() + 1))
    });

    let sub = source.subscribe_next(|_| {});
    sub.unsubscribe();
    sub.unsubscribe();
    sub.unsubscribe();
    assert_eq!(count.get(), 1);
}

#[test]
fn terminal_signals_run_teardown_exactly_once() {
    let count = Rc::new(Cell::new(0u32));
    let count_clone = Rc::clone(&count);
    let source: Observable<i32> = Observable::new(move |out| {
        out.next(1);
        out.complete();
        let count = Rc::clone(&count_clone);
        Teardown::new(move || count.set(count.get() + 1))
    });

    let sub = source.subscribe_next(|_| {});
    assert_eq!(count.get(), 1);
    sub.unsubscribe();
    assert_eq!(count.get(), 1);
}

#[test]
fn child_subscriptions_close_with_the_parent() {
    let parent = Subscription::new();
    let child = parent.child();
    let grandchild = child.child();

    let released = Rc::new(Cell::new(0u32));
    for sub in [&child, &grandchild] {
        let released = Rc::clone(&released);
        sub.add(Teardown::new(move || released.set(released.get() + 1)));
    }

    parent.unsubscribe();
    assert!(child.is_closed());
    assert!(grandchild.is_closed());
    assert_eq!(released.get(), 2);
}

#[test]
fn completed_children_detach_from_a_long_lived_parent() {
    // A switch_map-shaped workload: many short inners against one parent.
    // The parent's teardown list must not grow with churn.
    let parent = Subscription::new();
    let baseline = parent.teardown_count();
    for _ in 0..1000 {
        let child = parent.child();
        child.add(Teardown::new(|| {}));
        child.unsubscribe();
    }
    assert_eq!(parent.teardown_count(), baseline);
    parent.unsubscribe();
}

#[test]
fn switch_map_churn_does_not_leak_parent_entries() {
    let (clock, handle) = clock();
    let bus: EventBus<u64> = EventBus::new();
    let probe = Probe::new();
    let inner_handle = Rc::clone(&handle);
    Observable::from_event(&bus, "query")
        .switch_map(move |n| {
            Observable::timer(Duration::from_millis(5), &inner_handle).map(move |_| n)
        })
        .subscribe(probe.observer());

    for n in 0..500 {
        bus.emit("query", n);
        clock.advance(Duration::from_millis(10));
    }
    assert_eq!(probe.len(), 500, "each query settles before the next");
    assert_eq!(clock.pending(), 0);
}

#[test]
fn guard_unsubscribes_on_drop() {
    let bus: EventBus<i32> = EventBus::new();
    let probe = Probe::new();
    {
        let _guard = Observable::from_event(&bus, "click")
            .subscribe(probe.observer())
            .into_guard();
        bus.emit("click", 1);
        assert_eq!(bus.listener_count("click"), 1);
    }
    assert_eq!(bus.listener_count("click"), 0);
    bus.emit("click", 2);
    assert_eq!(probe.values(), vec![1]);
}

#[test]
fn cancelling_mid_flattening_cancels_queued_and_active_inners() {
    let (clock, handle) = clock();
    let bus: EventBus<u64> = EventBus::new();
    let probe = Probe::new();
    let inner_handle = Rc::clone(&handle);
    let sub = Observable::from_event(&bus, "job")
        .concat_map(move |n| {
            Observable::timer(Duration::from_millis(100), &inner_handle).map(move |_| n)
        })
        .subscribe(probe.observer());

    bus.emit("job", 1);
    bus.emit("job", 2);
    clock.advance(Duration::from_millis(50));
    sub.unsubscribe();
    clock.advance(Duration::from_millis(1000));

    assert!(probe.values().is_empty());
    assert_eq!(bus.listener_count("job"), 0);
}
