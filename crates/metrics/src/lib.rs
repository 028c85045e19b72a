//! evrouter metrics - Event counter registry
//!
//! An explicit registry object counting accepted events, constructed once
//! at startup and passed into the admission path. Its lifecycle is tied to
//! the process run, not to ambient global state, so tests can build as
//! many registries as they like.
//!
//! # Design
//!
//! - Per-type totals are lock-free atomics on the hot path
//! - The labeled breakdown sits behind a short-lived mutex; admission
//!   touches it once per accepted event
//! - `snapshot()` returns plain owned data safe to serialize or assert on

mod counters;

pub use counters::{EventKey, EventMetrics, EventMetricsSnapshot};
