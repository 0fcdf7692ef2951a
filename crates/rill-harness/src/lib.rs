#![forbid(unsafe_code)]

//! Harness: deterministic timelines and a mock HTTP collaborator.
//!
//! # Role in Rill
//! `rill-harness` drives `rill-core` pipelines in scripted scenarios. A
//! [`Timeline`] replays named events against an `EventBus` on virtual
//! time; a [`MockApi`] stands in for an HTTP backend behind the `Fetch`
//! seam, with per-route latency and failure injection. The crate's
//! examples rebuild the classic UI labs (countdown, scroll progress,
//! typeahead search, login clicks) on these pieces.
//!
//! Nothing here touches a real network or a real clock.

pub mod mock_api;
pub mod script;

pub use mock_api::MockApi;
pub use script::Timeline;
