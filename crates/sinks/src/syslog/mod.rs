//! Syslog sink - coalesced framed lines over TCP
//!
//! Sends records to a remote syslog drain over one TCP connection, using
//! the same framed `<byte count><SP><JSON payload>` messages as the HTTP
//! sink, one per line, with a single socket write per coalesced batch.
//!
//! The connection is established lazily and invalidated on any write
//! failure or timeout; the next attempt reconnects. Retries follow the
//! shared backoff policy.

use std::time::Duration;

use async_trait::async_trait;
use evr_config::SyslogSinkConfig;
use evr_pipeline::{BatchTransport, DeliveryError};
use evr_protocol::{EventRecord, encode_framed_into};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::common::{RunningSink, spawn_buffered};
use crate::retry::{RetryPolicy, backoff_delay};

/// Build the syslog sink and start its delivery worker
///
/// Construction cannot fail: the first connection attempt happens on the
/// first delivery.
pub fn spawn(config: SyslogSinkConfig) -> RunningSink {
    let transport = SyslogTransport {
        address: format!("{}:{}", config.endpoint, config.port),
        connection: None,
        connection_timeout: config.connection_timeout,
        write_timeout: config.write_timeout,
        policy: config.retry.clone().into(),
        body: Vec::with_capacity(4096),
    };

    spawn_buffered("syslog", &config.queue, transport)
}

/// Transport performing one socket write per coalesced batch
pub struct SyslogTransport {
    address: String,

    /// Lazily established; `None` after any failure
    connection: Option<TcpStream>,

    connection_timeout: Duration,
    write_timeout: Duration,
    policy: RetryPolicy,

    /// Reused body buffer, truncated per batch
    body: Vec<u8>,
}

impl SyslogTransport {
    async fn connect(&mut self) -> Result<(), DeliveryError> {
        let stream = match timeout(self.connection_timeout, TcpStream::connect(&self.address))
            .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(DeliveryError::transient_from(
                    format!("connection to {} failed", self.address),
                    e,
                ));
            }
            Err(_) => {
                return Err(DeliveryError::transient(format!(
                    "connection to {} timed out",
                    self.address
                )));
            }
        };

        tracing::debug!(address = %self.address, "connected to syslog drain");
        self.connection = Some(stream);
        Ok(())
    }

    /// One write attempt over the current connection
    async fn send_once(&mut self) -> Result<(), DeliveryError> {
        if self.connection.is_none() {
            self.connect().await?;
        }

        let body = &self.body;
        let Some(stream) = self.connection.as_mut() else {
            return Err(DeliveryError::transient("no connection"));
        };

        let result = timeout(self.write_timeout, async {
            stream.write_all(body).await?;
            stream.flush().await
        })
        .await;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                // Connection is suspect after any error; reconnect next time
                self.connection = None;
                Err(DeliveryError::transient_from("socket write failed", e))
            }
            Err(_) => {
                self.connection = None;
                Err(DeliveryError::transient("socket write timed out"))
            }
        }
    }
}

#[async_trait]
impl BatchTransport for SyslogTransport {
    fn name(&self) -> &str {
        "syslog"
    }

    async fn write_batch(&mut self, batch: Vec<EventRecord>) -> Result<(), DeliveryError> {
        self.body.clear();

        let mut serialized = 0usize;
        for record in &batch {
            match encode_framed_into(record, &mut self.body) {
                Ok(_) => {
                    self.body.push(b'\n');
                    serialized += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unserializable record");
                }
            }
        }

        if serialized == 0 {
            return Ok(());
        }

        // The retry loop lives here rather than in `retry()` because each
        // attempt needs mutable access to the connection state.
        let mut attempt = 0;
        loop {
            match self.send_once().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = backoff_delay(&self.policy, attempt);
                    tracing::debug!(
                        attempt = attempt + 1,
                        max_attempts = self.policy.max_retries + 1,
                        error = %e,
                        "syslog write failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
