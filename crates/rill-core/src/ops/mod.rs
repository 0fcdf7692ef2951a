#![forbid(unsafe_code)]

//! Operators: transforms from one observable to another.
//!
//! Every operator is lazy and composes left-to-right as a method chain (or
//! through [`Observable::pipe`](crate::Observable::pipe)). Operator state
//! (accumulators, timers, queues, inner subscriptions) is created per
//! subscription and destroyed when that subscription terminates; the
//! observable descriptions themselves stay stateless and reusable.
//!
//! Grouping follows the shape of the API:
//!
//! - [`transform`]: `map`, `try_map`, `map_to`, `tap`, `scan`, `reduce`
//! - [`filter`]: `filter`, `take`, `first`, `take_while`,
//!   `take_while_inclusive`, `take_until`, `distinct_until_changed`,
//!   `distinct_until_changed_by`
//! - [`rate`]: `debounce_time`, `throttle_time`, `delay`
//! - [`flatten`]: `merge_map`, `merge_map_limit`, `switch_map`,
//!   `concat_map`, `exhaust_map`
//! - [`recover`]: `catch_error`
//!
//! Dropped values are part of an operator's documented contract, never an
//! accident: `throttle_time` and `exhaust_map` log drops at trace level.

pub mod filter;
pub mod flatten;
pub mod rate;
pub mod recover;
pub mod transform;
