#![forbid(unsafe_code)]

//! Recovery: `catch_error`.

use std::rc::Rc;

use crate::error::StreamError;
use crate::observable::Observable;
use crate::subscription::Teardown;

impl<T: 'static> Observable<T> {
    /// On upstream error, switch to the observable returned by `f` instead
    /// of propagating the error. Values already delivered stay delivered;
    /// the fallback continues the stream from the point of failure.
    ///
    /// The handler itself may return [`Observable::throw`] to rethrow, or a
    /// stream that errors again; a second failure propagates downstream
    /// unhandled (no retry loop is attempted here).
    pub fn catch_error(
        self,
        f: impl Fn(StreamError) -> Observable<T> + 'static,
    ) -> Observable<T> {
        let f = Rc::new(f);
        Observable::new(move |out| {
            let f = Rc::clone(&f);
            // The upstream link lives on a child so that switching to the
            // fallback can sever it without closing the downstream line.
            let upstream = out.subscription().child();
            let on_next = out.clone();
            let on_complete = out.clone();
            let recover = out.clone();
            let upstream_link = upstream.clone();
            self.subscribe_on(
                &upstream,
                move |value| on_next.next(value),
                move |err| {
                    upstream_link.unsubscribe();
                    let fallback = f(err);
                    let on_next = recover.clone();
                    let on_error = recover.clone();
                    let on_complete = recover.clone();
                    fallback.subscribe_on(
                        recover.subscription(),
                        move |value| on_next.next(value),
                        move |err| on_error.error(err),
                        move || on_complete.complete(),
                    );
                },
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
    fn fallback_continues_after_error() {
        let probe = Probe::new();
        Observable::of([1, 2, 3])
            .try_map(|v| {
                if v == 3 {
                    Err(StreamError::operator("three exploded"))
                } else {
                    Ok(v)
                }
            })
            .catch_error(|_| Observable::of([97, 98]))
            .subscribe(probe.observer());

        assert_eq!(probe.values(), vec![1, 2, 97, 98]);
        assert!(probe.completed());
        assert_eq!(probe.error(), None);
    }

    #[test]
    fn handler_sees_the_original_error() {
        let probe = Probe::new();
        Observable::<String>::throw(StreamError::producer("boom"))
            .catch_error(|err| Observable::just(format!("recovered from {}", err.message())))
            .subscribe(probe.observer());

        assert_eq!(probe.values(), vec!["recovered from boom".to_string()]);
        assert!(probe.completed());
    }

    #[test]
    fn rethrowing_propagates_the_new_error() {
        let probe: Probe<i32> = Probe::new();
        Observable::throw(StreamError::producer("first"))
            .catch_error(|_| Observable::throw(StreamError::operator("second")))
            .subscribe(probe.observer());

        assert_eq!(probe.error(), Some(StreamError::operator("second")));
        assert!(!probe.completed());
    }

    #[test]
    fn error_free_stream_never_invokes_the_handler() {
        let called = std::rc::Rc::new(std::cell::Cell::new(false));
        let called_clone = Rc::clone(&called);
        let probe = Probe::new();
        Observable::of([1, 2])
            .catch_error(move |_| {
                called_clone.set(true);
                Observable::empty()
            })
            .subscribe(probe.observer());

        assert_eq!(probe.values(), vec![1, 2]);
        assert!(probe.completed());
        assert!(!called.get());
    }
}
