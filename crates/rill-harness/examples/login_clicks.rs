//! Login clicks lab: button mashing triggers exactly one login request.
//!
//! `exhaust_map` ignores clicks while a request is in flight; once it
//! settles, the next click starts a fresh one.
//!
//! Run with `cargo run -p rill-harness --example login_clicks`.

use std::time::Duration;

use rill_core::{Observable, Request};
use rill_harness::{MockApi, Timeline};
use serde_json::json;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut timeline: Timeline<()> = Timeline::new();
    let api = MockApi::new(timeline.scheduler());
    api.respond_json(
        "https://auth.example/login",
        Duration::from_millis(400),
        &json!({"token": "abc123"}),
    );

    let fetch = api.fetch();
    let _guard = Observable::from_event(timeline.bus(), "click")
        .exhaust_map(move |()| {
            fetch(Request::post(
                "https://auth.example/login",
                json!({"user": "brian"}).to_string(),
            ))
        })
        .subscribe_next(|response| println!("logged in: {}", response.body))
        .into_guard();

    // Five rapid clicks, then one more after the request settles.
    for ms in [0, 50, 100, 150, 200] {
        timeline.at(ms, "click", ());
    }
    timeline.at(600, "click", ());
    timeline.run();
    timeline.settle(Duration::from_secs(1));

    println!("requests sent: {}", api.call_count());
}
