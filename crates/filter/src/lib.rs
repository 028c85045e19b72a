//! evrouter filter - Admission filtering for observed events
//!
//! The admission filter decides, from an event's involved object, whether
//! the event enters the delivery pipeline at all. It runs on the producer
//! side, before any record is constructed or queued.

mod filter;

pub use filter::EventFilter;
