//! Typeahead lab: keystrokes become at most one in-flight search request.
//!
//! Debounce settles bursts of typing, distinct suppresses unchanged text,
//! and `switch_map` cancels a stale request the moment a newer query goes
//! out.
//!
//! Run with `cargo run -p rill-harness --example typeahead`.

use std::rc::Rc;
use std::time::Duration;

use rill_core::{Observable, Request};
use rill_harness::{MockApi, Timeline};
use serde_json::json;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut timeline: Timeline<String> = Timeline::new();
    let api = MockApi::new(timeline.scheduler());
    api.respond_json(
        "https://api.openbrewerydb.org/breweries?by_name=ale",
        Duration::from_millis(500),
        &json!([{"name": "Ale Asylum"}, {"name": "Ale Works"}]),
    );
    api.respond_json(
        "https://api.openbrewerydb.org/breweries?by_name=ale+house",
        Duration::from_millis(500),
        &json!([{"name": "The Ale House"}]),
    );

    let fetch = api.fetch();
    let _guard = Observable::from_event(timeline.bus(), "input")
        .debounce_time(Duration::from_millis(300), timeline.scheduler())
        .distinct_until_changed()
        .switch_map(move |query: String| {
            let url = format!(
                "https://api.openbrewerydb.org/breweries?by_name={}",
                query.replace(' ', "+")
            );
            fetch(Request::get(url))
        })
        .subscribe_next(|response| println!("results: {}", response.body))
        .into_guard();

    // A burst of typing, a pause, then a refinement while the first
    // request is still in flight.
    timeline.at(0, "input", "a".to_string());
    timeline.at(80, "input", "al".to_string());
    timeline.at(160, "input", "ale".to_string());
    timeline.at(560, "input", "ale house".to_string());
    timeline.run();
    timeline.settle(Duration::from_secs(2));

    println!("requests sent: {}", api.call_count());
}
