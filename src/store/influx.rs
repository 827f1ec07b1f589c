//! InfluxDB adapter: HTTP line-protocol writer with background batching.
//!
//! A single writer task owns the HTTP client and a [`BatchBuffer`];
//! submitters hand it encoded lines over an MPSC channel and never block on
//! transmission. Flushes are acknowledged over oneshot channels so `flush`
//! can guarantee everything enqueued before the call was attempted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::point::Point;
use crate::store::buffer::BatchBuffer;
use crate::store::line_protocol::encode_point;
use crate::store::{StoreClient, StoreError};

// =============================================================================
// Constants
// =============================================================================

/// Maximum lines per batch before a size-based flush.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Maximum time a non-empty batch may wait before a time-based flush.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Timeout for connection establishment and the startup health probe.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the submit queue in front of the writer task.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Wake-up interval for the writer task while its buffer is empty.
const IDLE_TICK: Duration = Duration::from_secs(60);

// =============================================================================
// Commands
// =============================================================================

enum Command {
    /// Enqueue encoded lines for batched transmission.
    Write(Vec<String>),
    /// Transmit everything buffered so far and acknowledge.
    Flush(oneshot::Sender<Result<(), StoreError>>),
    /// Final flush, acknowledge, and stop the writer.
    Close(oneshot::Sender<Result<(), StoreError>>),
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`InfluxClient`] connections.
pub struct InfluxClientBuilder {
    url: String,
    token: String,
    database: String,
    batch_size: usize,
    flush_interval: Duration,
    connect_timeout: Duration,
    channel_capacity: usize,
}

impl InfluxClientBuilder {
    /// Create a builder for the given endpoint, access token, and logical
    /// database (bucket) name.
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            database: database.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the size threshold for batched writes.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the time threshold for batched writes.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set the connection/health-probe timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the submit queue capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Establish the connection and spawn the writer task.
    ///
    /// Probes the store's health endpoint first so an unreachable or
    /// misconfigured store fails at startup rather than on the first write.
    ///
    /// # Errors
    /// Returns [`StoreError::Connection`] when the HTTP client cannot be
    /// built or the health probe fails.
    pub async fn connect(self) -> Result<InfluxClient, StoreError> {
        tracing::info!(url = %self.url, database = %self.database, "Connecting to time-series store");

        let http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| StoreError::Connection {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let health_url = format!("{}/health", self.url.trim_end_matches('/'));
        let response = http
            .get(&health_url)
            .timeout(self.connect_timeout)
            .send()
            .await
            .map_err(|e| StoreError::Connection {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(StoreError::Connection {
                url: self.url.clone(),
                reason: format!("health check returned {}", response.status()),
            });
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let writer = WriterTask {
            rx,
            http,
            write_url: write_url(&self.url, &self.database),
            token: self.token,
            buffer: BatchBuffer::new(self.batch_size, self.flush_interval),
        };
        let handle = tokio::spawn(writer.run());

        Ok(InfluxClient {
            tx,
            handle: Mutex::new(Some(handle)),
            closed: AtomicBool::new(false),
        })
    }
}

/// Build the v2 write endpoint URL for a database (bucket).
fn write_url(base: &str, database: &str) -> String {
    format!(
        "{}/api/v2/write?bucket={}&precision=ns",
        base.trim_end_matches('/'),
        database
    )
}

// =============================================================================
// Client
// =============================================================================

/// Store client backed by the InfluxDB v2 HTTP write API.
pub struct InfluxClient {
    tx: mpsc::Sender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl InfluxClient {
    /// Connect with default batching parameters.
    ///
    /// # Errors
    /// Returns [`StoreError::Connection`] when the store is unreachable.
    pub async fn connect(
        url: impl Into<String>,
        token: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self, StoreError> {
        InfluxClientBuilder::new(url, token, database).connect().await
    }
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl StoreClient for InfluxClient {
    async fn submit(&self, points: Vec<Point>) -> Result<(), StoreError> {
        let mut lines = Vec::with_capacity(points.len());
        for point in &points {
            lines.push(encode_point(point)?);
        }

        self.tx.try_send(Command::Write(lines)).map_err(|e| match e {
            TrySendError::Full(_) => StoreError::Submission("writer queue full".to_string()),
            TrySendError::Closed(_) => StoreError::Submission("writer stopped".to_string()),
        })
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let (ack, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack))
            .await
            .map_err(|_| StoreError::Flush("writer stopped".to_string()))?;
        ack_rx
            .await
            .map_err(|_| StoreError::Flush("writer dropped flush acknowledgement".to_string()))?
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut result = Ok(());
        let (ack, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Close(ack)).await.is_ok() {
            if let Ok(flush_result) = ack_rx.await {
                result = flush_result;
            }
        }

        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Writer task join failed");
            }
        }

        result
    }
}

// =============================================================================
// Writer task
// =============================================================================

/// Background task owning the HTTP client and the batch buffer.
struct WriterTask {
    rx: mpsc::Receiver<Command>,
    http: reqwest::Client,
    write_url: String,
    token: String,
    buffer: BatchBuffer,
}

impl WriterTask {
    async fn run(mut self) {
        tracing::debug!("Store writer started");

        loop {
            let wait = self.buffer.time_until_flush().unwrap_or(IDLE_TICK);

            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(Command::Write(lines)) => {
                        for line in lines {
                            if let Some(batch) = self.buffer.add(line) {
                                if let Err(reason) = self.post(batch).await {
                                    tracing::error!(error = %reason, "Batch write failed");
                                }
                            }
                        }
                    }
                    Some(Command::Flush(ack)) => {
                        let _ = ack.send(self.flush_buffered().await);
                    }
                    Some(Command::Close(ack)) => {
                        let _ = ack.send(self.flush_buffered().await);
                        break;
                    }
                    None => {
                        // All client handles dropped; drain what's left.
                        if let Err(reason) = self.flush_buffered().await {
                            tracing::warn!(error = %reason, "Final flush failed");
                        }
                        break;
                    }
                },
                _ = tokio::time::sleep(wait) => {
                    if self.buffer.should_flush() {
                        let batch = self.buffer.take();
                        if let Err(reason) = self.post(batch).await {
                            tracing::error!(error = %reason, "Batch write failed");
                        }
                    }
                }
            }
        }

        tracing::debug!("Store writer stopped");
    }

    async fn flush_buffered(&mut self) -> Result<(), StoreError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let batch = self.buffer.take();
        self.post(batch).await.map_err(StoreError::Flush)
    }

    async fn post(&self, lines: Vec<String>) -> Result<(), String> {
        let count = lines.len();
        let response = self
            .http
            .post(&self.write_url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(lines.join("\n"))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("store returned {}", response.status()));
        }

        tracing::debug!(count, "Batch written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_url_joins_without_double_slash() {
        assert_eq!(
            write_url("http://localhost:8086/", "groceries"),
            "http://localhost:8086/api/v2/write?bucket=groceries&precision=ns"
        );
        assert_eq!(
            write_url("http://localhost:8086", "groceries"),
            "http://localhost:8086/api/v2/write?bucket=groceries&precision=ns"
        );
    }

    #[test]
    fn builder_defaults() {
        let builder = InfluxClientBuilder::new("http://localhost:8086", "t", "db");
        assert_eq!(builder.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(builder.flush_interval, DEFAULT_FLUSH_INTERVAL);
        assert_eq!(builder.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn builder_overrides() {
        let builder = InfluxClientBuilder::new("http://localhost:8086", "t", "db")
            .batch_size(10)
            .flush_interval(Duration::from_millis(100))
            .channel_capacity(64);
        assert_eq!(builder.batch_size, 10);
        assert_eq!(builder.flush_interval, Duration::from_millis(100));
        assert_eq!(builder.channel_capacity, 64);
    }
}
