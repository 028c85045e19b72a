//! evrouter pipeline - Bounded coalescing queue and batch drain loop
//!
//! The pieces shared by every network-facing destination:
//!
//! - `queue` - a fixed-capacity buffer between the admission path and one
//!   consumer, with an explicit overflow policy (block vs drop-newest)
//! - `DrainLoop` - the consumer: waits for the first available record,
//!   drains everything queued since, and hands the whole burst to a
//!   transport as one batch
//! - `BatchTransport` - the contract a destination adapter implements
//!
//! # Data Flow
//!
//! ```text
//! [Router] --push--> [QueueSender | QueueReceiver] --recv+drain--> [DrainLoop] --write_batch--> [Transport]
//! ```
//!
//! # Concurrency Contract
//!
//! Any number of producers may call `push`; exactly one consumer owns the
//! `QueueReceiver`. Records are immutable, so the queue is the only
//! synchronization point between the two sides.

mod drain;
mod error;
mod queue;

pub use drain::{BatchTransport, DrainLoop, DrainStats};
pub use error::{DeliveryError, QueueClosed};
pub use queue::{OverflowPolicy, QueueReceiver, QueueSender, queue};
