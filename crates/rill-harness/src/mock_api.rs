#![forbid(unsafe_code)]

//! Canned-route HTTP fake behind the `Fetch` seam.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use rill_core::{Fetch, Observable, Request, Response, SchedulerHandle, StreamError};

#[derive(Clone)]
enum Outcome {
    Respond(Response),
    Fail(String),
}

#[derive(Clone)]
struct Route {
    latency: Duration,
    outcome: Outcome,
}

struct Inner {
    scheduler: SchedulerHandle,
    routes: RefCell<HashMap<String, Route>>,
    calls: RefCell<Vec<Request>>,
}

/// A fake HTTP backend with scripted routes.
///
/// Routes are keyed by exact URL. Each dispatched request is recorded (one
/// record per subscription, since `Fetch` observables are cold) and
/// answered after the route's latency on the shared scheduler, so requests
/// cancelled before the latency elapses never deliver, the behavior
/// `switch_map` and friends rely on.
///
/// Clones share state, like `EventBus`.
#[derive(Clone)]
pub struct MockApi {
    inner: Rc<Inner>,
}

impl MockApi {
    #[must_use]
    pub fn new(scheduler: &SchedulerHandle) -> Self {
        Self {
            inner: Rc::new(Inner {
                scheduler: Rc::clone(scheduler),
                routes: RefCell::new(HashMap::new()),
                calls: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Answer `url` with `response` after `latency`. A non-2xx status is
    /// surfaced to the stream as a producer error, per the `Fetch`
    /// contract.
    pub fn respond(&self, url: impl Into<String>, latency: Duration, response: Response) {
        self.inner.routes.borrow_mut().insert(
            url.into(),
            Route {
                latency,
                outcome: Outcome::Respond(response),
            },
        );
    }

    /// Answer `url` with a 200 response whose body is `value` serialized.
    pub fn respond_json(&self, url: impl Into<String>, latency: Duration, value: &serde_json::Value) {
        self.respond(url, latency, Response::ok(value.to_string()));
    }

    /// Fail `url` at the transport level after `latency`.
    pub fn fail(&self, url: impl Into<String>, latency: Duration, message: impl Into<String>) {
        self.inner.routes.borrow_mut().insert(
            url.into(),
            Route {
                latency,
                outcome: Outcome::Fail(message.into()),
            },
        );
    }

    /// Every request dispatched so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Request> {
        self.inner.calls.borrow().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.calls.borrow().len()
    }

    /// The transport function to hand to pipelines under test.
    #[must_use]
    pub fn fetch(&self) -> Fetch {
        let api = self.clone();
        Rc::new(move |request: Request| {
            let api = api.clone();
            Observable::new(move |out| {
                tracing::debug!(method = %request.method, url = %request.url, "mock dispatch");
                api.inner.calls.borrow_mut().push(request.clone());
                let route = api.inner.routes.borrow().get(&request.url).cloned();
                let Some(route) = route else {
                    out.error(StreamError::producer(format!(
                        "no route for {} {}",
                        request.method, request.url
                    )));
                    return rill_core::Teardown::none();
                };
                let url = request.url.clone();
                let timer = api.inner.scheduler.schedule(
                    route.latency,
                    Box::new(move || match route.outcome {
                        Outcome::Respond(response) if response.is_success() => {
                            out.next(response);
                            out.complete();
                        }
                        Outcome::Respond(response) => {
                            out.error(StreamError::producer(format!(
                                "{} for {url}",
                                response.status
                            )));
                        }
                        Outcome::Fail(message) => {
                            out.error(StreamError::producer(message));
                        }
                    }),
                );
                timer.into_teardown()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::{Probe, VirtualScheduler};
    use serde_json::json;

    fn clock() -> (Rc<VirtualScheduler>, SchedulerHandle) {
        let clock = Rc::new(VirtualScheduler::new());
        let handle = clock.clone().into_handle();
        (clock, handle)
    }

    #[test]
    fn routed_request_answers_after_latency() {
        let (clock, handle) = clock();
        let api = MockApi::new(&handle);
        api.respond_json(
            "https://api.test/breweries?by_name=ale",
            Duration::from_millis(40),
            &json!([{"name": "Ale Works"}]),
        );

        let probe = Probe::new();
        (api.fetch())(Request::get("https://api.test/breweries?by_name=ale"))
            .subscribe(probe.observer());

        assert!(probe.values().is_empty());
        clock.advance(Duration::from_millis(40));
        assert_eq!(probe.values()[0].status, 200);
        assert!(probe.values()[0].body.contains("Ale Works"));
        assert!(probe.completed());
        assert_eq!(api.call_count(), 1);
    }

    #[test]
    fn unrouted_request_errors_immediately() {
        let (_clock, handle) = clock();
        let api = MockApi::new(&handle);
        let probe = Probe::new();
        (api.fetch())(Request::get("https://api.test/missing")).subscribe(probe.observer());
        assert_eq!(
            probe.error(),
            Some(StreamError::producer("no route for GET https://api.test/missing"))
        );
    }

    #[test]
    fn non_success_status_is_a_producer_error() {
        let (clock, handle) = clock();
        let api = MockApi::new(&handle);
        api.respond(
            "https://api.test/login",
            Duration::from_millis(10),
            Response { status: 401, body: String::new() },
        );

        let probe = Probe::new();
        (api.fetch())(Request::post("https://api.test/login", "{}")).subscribe(probe.observer());
        clock.advance(Duration::from_millis(10));
        assert_eq!(
            probe.error(),
            Some(StreamError::producer("401 for https://api.test/login"))
        );
    }

    #[test]
    fn cancelled_request_never_delivers() {
        let (clock, handle) = clock();
        let api = MockApi::new(&handle);
        api.respond("https://api.test/slow", Duration::from_millis(100), Response::ok("{}"));

        let probe = Probe::new();
        let sub = (api.fetch())(Request::get("https://api.test/slow")).subscribe(probe.observer());
        clock.advance(Duration::from_millis(50));
        sub.unsubscribe();
        clock.advance(Duration::from_millis(100));

        assert!(probe.values().is_empty());
        assert_eq!(api.call_count(), 1, "the dispatch itself still happened");
    }

    #[test]
    fn each_subscription_is_a_fresh_request() {
        let (clock, handle) = clock();
        let api = MockApi::new(&handle);
        api.respond("https://api.test/ping", Duration::from_millis(1), Response::ok("pong"));

        let stream = (api.fetch())(Request::get("https://api.test/ping"));
        let first = Probe::new();
        let second = Probe::new();
        stream.clone().subscribe(first.observer());
        stream.subscribe(second.observer());
        clock.advance(Duration::from_millis(1));

        assert_eq!(api.call_count(), 2);
        assert!(first.completed());
        assert!(second.completed());
    }
}
