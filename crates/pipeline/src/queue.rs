//! Bounded coalescing queue
//!
//! A fixed-capacity buffer of records between the fast admission path and
//! the slower batch-drain consumer. The admission policy is explicit in
//! the type rather than inherited from channel defaults, so the
//! backpressure contract stays visible and testable on its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use evr_protocol::EventRecord;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::QueueClosed;

/// What `push` does when the queue is at capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Suspend the producer until the consumer frees capacity; never drops
    Block,

    /// Discard the incoming record silently; the queue contents are kept
    #[default]
    DropNewest,
}

/// Create a bounded queue with the given capacity and overflow policy
///
/// `capacity` must be positive. The sender side is cheaply cloneable for
/// multiple producers; the receiver side is owned by exactly one consumer.
pub fn queue(capacity: usize, policy: OverflowPolicy) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity);

    let sender = QueueSender {
        tx,
        policy,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    let receiver = QueueReceiver { rx };

    (sender, receiver)
}

/// Producer handle for a bounded queue
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<EventRecord>,

    policy: OverflowPolicy,

    /// Records discarded under `DropNewest`, shared across clones
    dropped: Arc<AtomicU64>,
}

impl QueueSender {
    /// Push a record into the queue, applying the overflow policy
    ///
    /// Under `Block` this suspends until the queue has capacity. Under
    /// `DropNewest` it never suspends: a full queue discards the incoming
    /// record, counts the drop, and reports success to the caller - an
    /// overflow drop is an observability signal, not an error.
    ///
    /// # Errors
    ///
    /// Returns `QueueClosed` only when the consumer is gone.
    pub async fn push(&self, record: EventRecord) -> Result<(), QueueClosed> {
        match self.policy {
            OverflowPolicy::Block => self.tx.send(record).await.map_err(|_| QueueClosed),
            OverflowPolicy::DropNewest => match self.tx.try_send(record) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
                Err(TrySendError::Closed(_)) => Err(QueueClosed),
            },
        }
    }

    /// The overflow policy this queue was built with
    #[inline]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Number of records discarded so far under `DropNewest`
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer handle for a bounded queue
///
/// Owned by the drain loop; not cloneable. Two concurrent consumers are
/// not a supported usage.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<EventRecord>,
}

impl QueueReceiver {
    /// Wait for the next record
    ///
    /// This is the drain loop's only suspension point per cycle: it parks
    /// until a record arrives. Returns `None` once every sender is gone
    /// and the queue is empty.
    pub async fn recv(&mut self) -> Option<EventRecord> {
        self.rx.recv().await
    }

    /// Take every record currently queued, in insertion order
    ///
    /// Never blocks: an empty queue yields an empty vector. Callers are
    /// expected to have already waited for at least one record via
    /// [`recv`](Self::recv).
    pub fn drain(&mut self) -> Vec<EventRecord> {
        let mut records = Vec::new();
        while let Ok(record) = self.rx.try_recv() {
            records.push(record);
        }
        records
    }
}
