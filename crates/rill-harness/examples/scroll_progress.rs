//! Scroll progress lab: noisy scroll offsets become a deduplicated
//! percentage read-out.
//!
//! Run with `cargo run -p rill-harness --example scroll_progress`.

use rill_core::Observable;
use rill_harness::Timeline;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Payload: (scroll offset, scrollable height).
    let mut timeline: Timeline<(f64, f64)> = Timeline::new();

    let _guard = Observable::from_event(timeline.bus(), "scroll")
        .map(|(offset, height): (f64, f64)| ((offset / height) * 100.0).round() as i64)
        .distinct_until_changed()
        .subscribe_next(|percent| println!("read {percent}%"))
        .into_guard();

    let height = 2400.0;
    for (ms, offset) in [(0, 0.0), (40, 90.0), (80, 110.0), (120, 600.0), (200, 1200.0), (240, 1205.0), (300, 2400.0)] {
        timeline.at(ms, "scroll", (offset, height));
    }
    timeline.run();
}
