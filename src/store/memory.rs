//! In-process capturing store.
//!
//! Implements [`StoreClient`] against plain vectors so tests and embedders
//! can observe exactly which points were submitted and whether a flush has
//! drained them. No batching, no I/O.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::point::Point;
use crate::store::{StoreClient, StoreError};

#[derive(Debug, Default)]
struct Inner {
    submitted: Vec<Point>,
    unflushed: usize,
    flushes: usize,
}

/// Capturing [`StoreClient`] backed by memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All points submitted so far, in submission order.
    pub fn submitted(&self) -> Vec<Point> {
        self.lock().submitted.clone()
    }

    /// Number of points submitted since the last flush.
    pub fn unflushed(&self) -> usize {
        self.lock().unflushed
    }

    /// Number of completed flush calls (close counts as one).
    pub fn flushes(&self) -> usize {
        self.lock().flushes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock can only be poisoned by a panicking test; propagate the state.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn submit(&self, points: Vec<Point>) -> Result<(), StoreError> {
        for point in &points {
            if point.fields.is_empty() {
                return Err(StoreError::EmptyFields {
                    measurement: point.measurement.clone(),
                });
            }
        }

        let mut inner = self.lock();
        inner.unflushed += points.len();
        inner.submitted.extend(points);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.unflushed = 0;
        inner.flushes += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn records_submissions_in_order() {
        let store = MemoryStore::new();
        let a = Point::new("m", Utc::now()).with_field("v", 1i64);
        let b = Point::new("m", Utc::now()).with_field("v", 2i64);

        store.submit(vec![a.clone()]).await.unwrap();
        store.submit(vec![b.clone()]).await.unwrap();

        let submitted = store.submitted();
        assert_eq!(submitted, vec![a, b]);
        assert_eq!(store.unflushed(), 2);
    }

    #[tokio::test]
    async fn flush_drains_pending() {
        let store = MemoryStore::new();
        store
            .submit(vec![Point::new("m", Utc::now()).with_field("v", 1i64)])
            .await
            .unwrap();

        store.flush().await.unwrap();
        assert_eq!(store.unflushed(), 0);
        assert_eq!(store.flushes(), 1);
        // Submitted history survives the flush.
        assert_eq!(store.submitted().len(), 1);
    }

    #[tokio::test]
    async fn rejects_fieldless_points() {
        let store = MemoryStore::new();
        let err = store
            .submit(vec![Point::new("m", Utc::now())])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::EmptyFields { .. }));
        assert_eq!(store.submitted().len(), 0);
    }
}
