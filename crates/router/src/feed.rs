//! NDJSON event feed
//!
//! The bundled implementation of the inbound notification interface: one
//! JSON envelope per line, read from stdin or a file. A control-plane
//! adapter produces the same shape, so the router behaves identically
//! whether events come from a live watch or a recorded stream.
//!
//! Malformed lines are logged and skipped; they never stop the feed.

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use evr_protocol::Event;

use crate::router::EventRouter;

/// How the event entered the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedVerb {
    Added,
    Updated,
    Deleted,
}

/// One notification line
#[derive(Debug, Deserialize)]
pub struct FeedEnvelope {
    pub verb: FeedVerb,

    pub event: Event,

    /// Previous version; required for `UPDATED`
    #[serde(default)]
    pub old_event: Option<Event>,
}

/// Counters accumulated over a feed's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Envelopes dispatched to the router
    pub processed: u64,

    /// Lines skipped as unparseable or inconsistent
    pub malformed: u64,
}

/// Read notifications until EOF or stop, dispatching each to the router
pub async fn run_feed<R>(
    reader: R,
    router: &EventRouter,
    stop: CancellationToken,
) -> FeedStats
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = FeedStats::default();

    loop {
        let line = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<FeedEnvelope>(&line) {
                    Ok(envelope) => match dispatch(router, envelope).await {
                        Ok(()) => stats.processed += 1,
                        Err(reason) => {
                            stats.malformed += 1;
                            tracing::warn!(reason, "skipping inconsistent feed line");
                        }
                    },
                    Err(e) => {
                        stats.malformed += 1;
                        tracing::warn!(error = %e, "skipping malformed feed line");
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "event feed read failed");
                break;
            }
        }
    }

    stats
}

async fn dispatch(router: &EventRouter, envelope: FeedEnvelope) -> Result<(), &'static str> {
    match envelope.verb {
        FeedVerb::Added => {
            router.on_added(envelope.event).await;
            Ok(())
        }
        FeedVerb::Updated => match envelope.old_event {
            Some(old) => {
                router.on_updated(old, envelope.event).await;
                Ok(())
            }
            None => Err("UPDATED notification without old_event"),
        },
        FeedVerb::Deleted => {
            router.on_deleted(&envelope.event);
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod feed_test;
