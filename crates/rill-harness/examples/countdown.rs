//! Countdown lab: tick once per second from 10 toward liftoff, with an
//! abort button that stops the countdown via `take_until`.
//!
//! Run with `cargo run -p rill-harness --example countdown`.

use std::time::Duration;

use rill_core::{FnObserver, Observable};
use rill_harness::Timeline;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut timeline: Timeline<()> = Timeline::new();

    let abort = Observable::from_event(timeline.bus(), "abort");
    let observer = FnObserver::new(|left: i64| {
        if left == 0 {
            println!("liftoff!");
        } else {
            println!("T-minus {left}");
        }
    })
    .on_complete(|| println!("countdown stopped"));

    let sub = Observable::interval(Duration::from_secs(1), timeline.scheduler())
        .scan(10i64, |left, _| left - 1)
        .take_while_inclusive(|left| *left > 0)
        .take_until(abort)
        .subscribe(observer);

    // The abort button is pressed between the sixth and seventh tick.
    timeline.at(6500, "abort", ());
    timeline.run();

    assert!(sub.is_closed(), "abort tears the countdown down");
    assert_eq!(timeline.bus().listener_count("abort"), 0);
}
