//! Store client trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::point::Point;

/// Errors that can occur in the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection establishment failed. Fatal to startup; the caller must
    /// not proceed to ingest.
    #[error("failed to connect to store at {url}: {reason}")]
    Connection { url: String, reason: String },

    /// A submission could not be enqueued or transmitted. Recoverable: the
    /// ingest loop reports it and continues with the next record.
    #[error("failed to submit points: {0}")]
    Submission(String),

    /// Flush could not confirm delivery of previously submitted points.
    #[error("flush failed: {0}")]
    Flush(String),

    /// A point without fields cannot be encoded for the wire.
    #[error("point for measurement '{measurement}' has no fields")]
    EmptyFields { measurement: String },
}

/// Capability contract of the time-series store.
///
/// Implementations own connection, batching, and transmission mechanics.
/// All methods take `&self` and must be safe to call from multiple
/// concurrent tasks without external locking; points are owned by the
/// store once submitted.
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    /// Enqueue one or more points for eventual transmission.
    ///
    /// Non-blocking from the caller's perspective: the implementation may
    /// batch internally and transmit on its own schedule.
    ///
    /// # Errors
    /// Returns [`StoreError::EmptyFields`] if any point carries no fields
    /// (nothing is enqueued in that case), or [`StoreError::Submission`]
    /// when the enqueue itself fails.
    async fn submit(&self, points: Vec<Point>) -> Result<(), StoreError>;

    /// Block until all previously submitted points have been transmitted or
    /// definitively failed.
    async fn flush(&self) -> Result<(), StoreError>;

    /// Flush, then release the connection. Idempotent.
    async fn close(&self) -> Result<(), StoreError>;
}
