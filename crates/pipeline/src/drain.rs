//! Batch drain loop
//!
//! The steady-state consumer of a network-facing destination. The loop
//! parks on the queue until a record arrives, then gathers everything
//! buffered since the last cycle into one batch and delivers it through
//! the transport - so a burst of events becomes one outbound write rather
//! than one write per event.
//!
//! # States
//!
//! ```text
//! WAITING --record--> DRAINING --> DELIVERING --> WAITING
//!    |
//!    +--stop signal--> STOPPED
//! ```
//!
//! The stop signal is only observed while WAITING; a delivery in flight
//! always runs to completion first. Delivery failures are logged and the
//! batch is dropped - the loop itself never fails.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use evr_protocol::EventRecord;

use crate::error::DeliveryError;
use crate::queue::QueueReceiver;

/// Destination-side contract for delivering one batch
///
/// Implementations own all destination-specific behavior: serialization
/// into the wire format, size or time windowing, retries, and the physical
/// write. `write_batch` returning an error means the batch was abandoned
/// after the transport exhausted its own recovery; the loop does not
/// re-queue it.
#[async_trait]
pub trait BatchTransport: Send {
    /// Short destination name, used in log lines
    fn name(&self) -> &str;

    /// Deliver one batch of records, in insertion order
    async fn write_batch(&mut self, batch: Vec<EventRecord>) -> Result<(), DeliveryError>;
}

/// Counters accumulated over a drain loop's lifetime
///
/// Returned when the loop stops and included in its shutdown log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Batches handed to the transport that succeeded
    pub batches_delivered: u64,

    /// Batches abandoned after the transport gave up
    pub batches_failed: u64,

    /// Records contained in successful batches
    pub records_delivered: u64,
}

/// The single consumer driving one destination
pub struct DrainLoop<T> {
    receiver: QueueReceiver,
    transport: T,
}

impl<T: BatchTransport> DrainLoop<T> {
    /// Create a drain loop over a queue receiver and a transport
    pub fn new(receiver: QueueReceiver, transport: T) -> Self {
        Self {
            receiver,
            transport,
        }
    }

    /// Run until the stop token fires or every producer is gone
    pub async fn run(mut self, stop: CancellationToken) -> DrainStats {
        tracing::info!(transport = %self.transport.name(), "drain loop starting");

        let mut stats = DrainStats::default();

        loop {
            // WAITING: park until a record arrives or stop is signalled.
            // `biased` checks the token first, so a stop that raced a
            // record wins here rather than after one more delivery.
            let first = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                record = self.receiver.recv() => match record {
                    Some(record) => record,
                    None => break,
                },
            };

            // DRAINING: coalesce everything buffered since the last cycle
            let mut batch = vec![first];
            batch.extend(self.receiver.drain());
            let count = batch.len();

            // DELIVERING: synchronous; not raced against the stop token
            match self.transport.write_batch(batch).await {
                Ok(()) => {
                    stats.batches_delivered += 1;
                    stats.records_delivered += count as u64;
                }
                Err(e) => {
                    stats.batches_failed += 1;
                    tracing::warn!(
                        transport = %self.transport.name(),
                        records = count,
                        error = %e,
                        "delivery failed, dropping batch"
                    );
                }
            }
        }

        tracing::info!(
            transport = %self.transport.name(),
            batches_delivered = stats.batches_delivered,
            batches_failed = stats.batches_failed,
            records_delivered = stats.records_delivered,
            "drain loop stopped"
        );

        stats
    }
}
