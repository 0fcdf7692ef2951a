#![forbid(unsafe_code)]

//! Filtering and truncation: `filter`, `take`, `first`, `take_while`,
//! `take_while_inclusive`, `take_until`, `distinct_until_changed`,
//! `distinct_until_changed_by`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::observable::Observable;
use crate::subscription::Teardown;

impl<T: 'static> Observable<T> {
    /// Forward only values satisfying `pred`.
    pub fn filter(self, pred: impl Fn(&T) -> bool + 'static) -> Observable<T> {
        let pred = Rc::new(pred);
        Observable::new(move |out| {
            let pred = Rc::clone(&pred);
            let on_next = out.clone();
            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                move |value| {
                    if pred(&value) {
                        on_next.next(value);
                    }
                },
                move |err| on_error.error(err),
                move || on_complete.complete(),
            );
            Teardown::none()
        })
    }

    /// Forward the first `count` values, then complete. `take(0)` completes
    /// immediately without subscribing upstream.
    ///
    /// Completion tears down the pipeline, so the upstream producer stops
    /// as soon as the quota is reached.
    pub fn take(self, count: usize) -> Observable<T> {
        Observable::new(move |out| {
            if count == 0 {
                out.complete();
                return Teardown::none();
            }
            let remaining = Rc::new(Cell::new(count));
            let on_next = out.clone();
            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                move |value| {
                    let left = remaining.get();
                    if left == 0 {
                        return;
                    }
                    remaining.set(left - 1);
                    on_next.next(value);
                    if left == 1 {
                        on_next.complete();
                    }
                },
                move |err| on_error.error(err),
                move || on_complete.complete(),
            );
            Teardown::none()
        })
    }

    /// Forward only the first value, then complete. Completes without a
    /// value on an empty source.
    pub fn first(self) -> Observable<T> {
        self.take(1)
    }

    /// Forward values while `pred` holds, then complete. The first failing
    /// value is not forwarded.
    pub fn take_while(self, pred: impl Fn(&T) -> bool + 'static) -> Observable<T> {
        self.take_while_impl(pred, false)
    }

    /// Like [`take_while`](Self::take_while), but the first failing value
    /// is forwarded too before completing.
    pub fn take_while_inclusive(self, pred: impl Fn(&T) -> bool + 'static) -> Observable<T> {
        self.take_while_impl(pred, true)
    }

    fn take_while_impl(
        self,
        pred: impl Fn(&T) -> bool + 'static,
        inclusive: bool,
    ) -> Observable<T> {
        let pred = Rc::new(pred);
        Observable::new(move |out| {
            let pred = Rc::clone(&pred);
            let on_next = out.clone();
            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                move |value| {
                    if pred(&value) {
                        on_next.next(value);
                    } else {
                        if inclusive {
                            on_next.next(value);
                        }
                        on_next.complete();
                    }
                },
                move |err| on_error.error(err),
                move || on_complete.complete(),
            );
            Teardown::none()
        })
    }

    /// Forward values until `notifier` emits its first value or completes,
    /// then complete.
    ///
    /// Note the completion case: a notifier that completes without emitting
    /// also stops the source here. The notifier is subscribed first, so a
    /// synchronously firing notifier prevents the source subscription
    /// entirely.
    pub fn take_until<U: 'static>(self, notifier: Observable<U>) -> Observable<T> {
        Observable::new(move |out| {
            let gate = out.subscription().child();
            let stop_on_value = out.clone();
            let stop_on_done = out.clone();
            let on_notifier_error = out.clone();
            notifier.subscribe_on(
                &gate,
                move |_| stop_on_value.complete(),
                move |err| on_notifier_error.error(err),
                move || stop_on_done.complete(),
            );
            if out.is_closed() {
                return Teardown::none();
            }
            let on_next = out.clone();
            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                move |value| on_next.next(value),
                move |err| on_error.error(err),
                move || on_complete.complete(),
            );
            Teardown::none()
        })
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Suppress values equal to the immediately preceding forwarded value.
    ///
    /// `[1, 2, 3, 3, 3, 4, 5]` becomes `[1, 2, 3, 4, 5]`.
    pub fn distinct_until_changed(self) -> Observable<T> {
        self.distinct_until_changed_by(|value| value.clone())
    }
}

impl<T: 'static> Observable<T> {
    /// Suppress values whose key (per `key_fn`) equals the key of the
    /// immediately preceding forwarded value.
    pub fn distinct_until_changed_by<K: PartialEq + 'static>(
        self,
        key_fn: impl Fn(&T) -> K + 'static,
    ) -> Observable<T> {
        let key_fn = Rc::new(key_fn);
        Observable::new(move |out| {
            let key_fn = Rc::clone(&key_fn);
            let last_key: Rc<RefCell<Option<K>>> = Rc::new(RefCell::new(None));
            let on_next = out.clone();
            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                move |value| {
                    let key = key_fn(&value);
                    let changed = last_key.borrow().as_ref() != Some(&key);
                    if changed {
                        *last_key.borrow_mut() = Some(key);
                        on_next.next(value);
                    }
                },
                move |err| on_error.error(err),
                move || on_complete.complete(),
            );
            Teardown::none()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Probe;

    #[test]
    fn filter_drops_failing_values() {
        let probe = Probe::new();
        Observable::of([1, 2, 3, 4, 5])
            .filter(|v| *v > 2)
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![3, 4, 5]);
        assert!(probe.completed());
    }

    #[test]
    fn take_forwards_exactly_n_then_completes() {
        let probe = Probe::new();
        Observable::of([1, 2, 3, 4, 5])
            .take(3)
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![1, 2, 3]);
        assert!(probe.completed());
    }

    #[test]
    fn take_more_than_available_completes_with_upstream() {
        let probe = Probe::new();
        Observable::of([1, 2]).take(10).subscribe(probe.observer());
        assert_eq!(probe.values(), vec![1, 2]);
        assert!(probe.completed());
    }

    #[test]
    fn take_zero_completes_without_subscribing_upstream() {
        let ran = Rc::new(Cell::new(false));
        let ran_clone = Rc::clone(&ran);
        let source = Observable::new(move |out| {
            ran_clone.set(true);
            out.complete();
            Teardown::none()
        });

        let probe: Probe<i32> = Probe::new();
        source.take(0).subscribe(probe.observer());
        assert!(probe.values().is_empty());
        assert!(probe.completed());
        assert!(!ran.get());
    }

    #[test]
    fn take_stops_the_upstream_producer() {
        let torn_down = Rc::new(Cell::new(false));
        let torn_clone = Rc::clone(&torn_down);
        let source = Observable::new(move |out| {
            for v in 0.. {
                if out.is_closed() {
                    break;
                }
                out.next(v);
            }
            let torn = Rc::clone(&torn_clone);
            Teardown::new(move || torn.set(true))
        });

        let probe = Probe::new();
        source.take(3).subscribe(probe.observer());
        assert_eq!(probe.values(), vec![0, 1, 2]);
        assert!(torn_down.get());
    }

    #[test]
    fn first_is_take_one() {
        let probe = Probe::new();
        Observable::of([7, 8, 9]).first().subscribe(probe.observer());
        assert_eq!(probe.values(), vec![7]);
        assert!(probe.completed());
    }

    #[test]
    fn take_while_excludes_failing_value() {
        let probe = Probe::new();
        Observable::of([1, 2, 3, 4, 1])
            .take_while(|v| *v < 3)
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![1, 2]);
        assert!(probe.completed());
    }

    #[test]
    fn take_while_inclusive_includes_failing_value() {
        let probe = Probe::new();
        Observable::of([1, 2, 3, 4, 1])
            .take_while_inclusive(|v| *v < 3)
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![1, 2, 3]);
        assert!(probe.completed());
    }

    #[test]
    fn take_until_completes_on_notifier_value() {
        use crate::event::EventBus;

        let bus: EventBus<()> = EventBus::new();
        let source_bus: EventBus<i32> = EventBus::new();
        let probe = Probe::new();
        Observable::from_event(&source_bus, "tick")
            .take_until(Observable::from_event(&bus, "stop"))
            .subscribe(probe.observer());

        source_bus.emit("tick", 1);
        source_bus.emit("tick", 2);
        bus.emit("stop", ());
        source_bus.emit("tick", 3);

        assert_eq!(probe.values(), vec![1, 2]);
        assert!(probe.completed());
        assert_eq!(source_bus.listener_count("tick"), 0);
        assert_eq!(bus.listener_count("stop"), 0);
    }

    #[test]
    fn take_until_completes_on_notifier_completion() {
        let probe: Probe<i32> = Probe::new();
        Observable::never()
            .take_until(Observable::<()>::empty())
            .subscribe(probe.observer());
        assert!(probe.values().is_empty());
        assert!(probe.completed());
    }

    #[test]
    fn distinct_until_changed_compresses_runs() {
        let probe = Probe::new();
        Observable::of([1, 2, 3, 3, 3, 4, 5])
            .distinct_until_changed()
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn distinct_until_changed_by_key() {
        #[derive(Clone, Debug, PartialEq)]
        struct User {
            name: &'static str,
            token: u32,
        }

        let probe = Probe::new();
        Observable::of([
            User { name: "brian", token: 1 },
            User { name: "brian", token: 2 },
            User { name: "ana", token: 3 },
        ])
        .distinct_until_changed_by(|u| u.name)
        .subscribe(probe.observer());

        let names: Vec<_> = probe.values().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["brian", "ana"]);
    }
}
