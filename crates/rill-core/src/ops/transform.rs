#![forbid(unsafe_code)]

//! Value transforms: `map`, `try_map`, `map_to`, `tap`, `scan`, `reduce`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::StreamError;
use crate::observable::Observable;
use crate::subscription::Teardown;

impl<T: 'static> Observable<T> {
    /// Transform each value with a pure function.
    ///
    /// Preserves sequence length and order: output `i` is `f(input[i])`.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Observable<U> {
        let f = Rc::new(f);
        Observable::new(move |out| {
            let f = Rc::clone(&f);
            let on_next = out.clone();
            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                move |value| on_next.next(f(value)),
                move |err| on_error.error(err),
                move || on_complete.complete(),
            );
            Teardown::none()
        })
    }

    /// Fallible transform. An `Err` terminates the subscription and
    /// propagates on the error channel, the stream rendering of a throwing
    /// transform function.
    pub fn try_map<U: 'static>(
        self,
        f: impl Fn(T) -> Result<U, StreamError> + 'static,
    ) -> Observable<U> {
        let f = Rc::new(f);
        Observable::new(move |out| {
            let f = Rc::clone(&f);
            let on_next = out.clone();
            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                move |value| match f(value) {
                    Ok(mapped) => on_next.next(mapped),
                    Err(err) => on_next.error(err),
                },
                move |err| on_error.error(err),
                move || on_complete.complete(),
            );
            Teardown::none()
        })
    }

    /// Replace every value with a clone of `value`.
    pub fn map_to<U: Clone + 'static>(self, value: U) -> Observable<U> {
        self.map(move |_| value.clone())
    }

    /// Run a side effect on each value without altering the stream.
    /// Debugging aid; the closure's return value is ignored by design of
    /// the operator (it only observes).
    pub fn tap(self, f: impl Fn(&T) + 'static) -> Observable<T> {
        self.map(move |value| {
            f(&value);
            value
        })
    }

    /// Running accumulator: starts from `seed`, emits the updated
    /// accumulator for every input value.
    ///
    /// `scan(0, add)` over `[1, 2, 3, 4, 5]` yields `[1, 3, 6, 10, 15]`.
    pub fn scan<A: Clone + 'static>(
        self,
        seed: A,
        f: impl Fn(A, T) -> A + 'static,
    ) -> Observable<A> {
        let f = Rc::new(f);
        Observable::new(move |out| {
            let f = Rc::clone(&f);
            let acc = Rc::new(RefCell::new(seed.clone()));
            let on_next = out.clone();
            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                move |value| {
                    let prev = acc.borrow().clone();
                    let next = f(prev, value);
                    *acc.borrow_mut() = next.clone();
                    on_next.next(next);
                },
                move |err| on_error.error(err),
                move || on_complete.complete(),
            );
            Teardown::none()
        })
    }

    /// Like [`scan`](Self::scan), but emits only the final accumulator,
    /// when the source completes.
    pub fn reduce<A: Clone + 'static>(
        self,
        seed: A,
        f: impl Fn(A, T) -> A + 'static,
    ) -> Observable<A> {
        let f = Rc::new(f);
        Observable::new(move |out| {
            let f = Rc::clone(&f);
            let acc = Rc::new(RefCell::new(seed.clone()));
            let acc_done = Rc::clone(&acc);
            let on_error = out.clone();
            let on_complete = out.clone();
            self.subscribe_on(
                out.subscription(),
                move |value| {
                    let prev = acc.borrow().clone();
                    *acc.borrow_mut() = f(prev, value);
                },
                move |err| on_error.error(err),
                move || {
                    let total = acc_done.borrow().clone();
                    on_complete.next(total);
                    on_complete.complete();
                },
            );
            Teardown::none()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Probe;
    use std::cell::Cell;

    #[test]
    fn map_transforms_each_value() {
        let probe = Probe::new();
        Observable::of([1, 2, 3, 4, 5])
            .map(|v| v * 10)
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![10, 20, 30, 40, 50]);
        assert!(probe.completed());
    }

    #[test]
    fn try_map_error_is_terminal() {
        let probe = Probe::new();
        Observable::of([1, 2, 3])
            .try_map(|v| {
                if v == 2 {
                    Err(StreamError::operator("two is not allowed"))
                } else {
                    Ok(v)
                }
            })
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![1]);
        assert_eq!(probe.error(), Some(StreamError::operator("two is not allowed")));
        assert!(!probe.completed());
    }

    #[test]
    fn map_to_replaces_values() {
        let probe = Probe::new();
        Observable::of([1, 2, 3])
            .map_to("pressed")
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec!["pressed", "pressed", "pressed"]);
    }

    #[test]
    fn tap_observes_without_altering() {
        let seen = Rc::new(Cell::new(0));
        let seen_clone = Rc::clone(&seen);
        let probe = Probe::new();
        Observable::of([1, 2, 3])
            .tap(move |v| seen_clone.set(seen_clone.get() + *v))
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![1, 2, 3]);
        assert_eq!(seen.get(), 6);
    }

    #[test]
    fn scan_emits_running_accumulator() {
        let probe = Probe::new();
        Observable::of([1, 2, 3, 4, 5])
            .scan(0, |acc, v| acc + v)
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![1, 3, 6, 10, 15]);
    }

    #[test]
    fn scan_state_is_per_subscription() {
        let summed = Observable::of([1, 2, 3]).scan(0, |acc, v| acc + v);
        let first = Probe::new();
        summed.clone().subscribe(first.observer());
        let second = Probe::new();
        summed.subscribe(second.observer());
        assert_eq!(first.values(), vec![1, 3, 6]);
        assert_eq!(second.values(), vec![1, 3, 6]);
    }

    #[test]
    fn reduce_emits_only_the_total() {
        let probe = Probe::new();
        Observable::of([1, 2, 3, 4, 5])
            .reduce(0, |acc, v| acc + v)
            .subscribe(probe.observer());
        assert_eq!(probe.values(), vec![15]);
        assert!(probe.completed());
    }
}
