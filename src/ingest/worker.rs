//! Streaming ingest worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::model::ProductObservation;
use crate::point::PointBuilder;
use crate::store::{StoreClient, StoreError};

/// Drains a stream of product observations into the store.
///
/// One point is submitted per observation, in arrival order. Submission
/// failures are reported and counted but never stop the loop: one bad
/// record must not halt the ingestion of subsequent, independent records.
///
/// The worker stops when the input channel closes (all producers dropped)
/// or the cancellation token fires. Either way it finishes the record
/// already dequeued, flushes the store so nothing consumed from the input
/// is silently lost, and returns. A failed final flush is the only error
/// `run` surfaces.
pub struct IngestWorker<S> {
    builder: PointBuilder,
    store: Arc<S>,
    processed: Arc<AtomicU64>,
    submit_failures: Arc<AtomicU64>,
}

impl<S: StoreClient> IngestWorker<S> {
    /// Create a worker translating with `builder` and writing to `store`.
    pub fn new(builder: PointBuilder, store: Arc<S>) -> Self {
        Self {
            builder,
            store,
            processed: Arc::new(AtomicU64::new(0)),
            submit_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter of observations consumed from the input stream.
    ///
    /// Increases once per record regardless of submission outcome; callers
    /// use deltas to compute processing rates.
    pub fn processed_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.processed)
    }

    /// Shared counter of failed submissions.
    pub fn failure_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.submit_failures)
    }

    /// Run until the input stream closes or cancellation is requested.
    pub async fn run(
        self,
        mut input: mpsc::Receiver<ProductObservation>,
        cancel: CancellationToken,
    ) -> Result<(), StoreError> {
        tracing::info!("Ingest worker started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Ingest worker cancelled, stopping intake");
                    break;
                }
                observation = input.recv() => match observation {
                    Some(obs) => self.write(obs).await,
                    None => {
                        tracing::info!("Input stream closed");
                        break;
                    }
                },
            }
        }

        let flushed = self.store.flush().await;
        if let Err(ref e) = flushed {
            tracing::warn!(error = %e, "Shutdown flush could not confirm delivery");
        }
        tracing::info!(
            processed = self.processed.load(Ordering::Relaxed),
            failed = self.submit_failures.load(Ordering::Relaxed),
            "Ingest worker stopped"
        );
        flushed
    }

    async fn write(&self, obs: ProductObservation) {
        let point = self.builder.product_point(&obs);
        if let Err(e) = self.store.submit(vec![point]).await {
            self.submit_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, id = %obs.id, "Point submission failed, continuing");
        }
        self.processed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::FieldValue;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;

    fn builder() -> PointBuilder {
        PointBuilder::new("products", "system", "pricefeed")
    }

    fn obs(price: i64, prev: i64) -> ProductObservation {
        ProductObservation::new("1", "Test Product", price)
            .with_store("Test Store")
            .with_previous_price(prev)
            .with_weight(1000)
            .with_timestamp(Utc::now())
    }

    /// Store whose submit fails on selected calls, delegating otherwise.
    struct FlakyStore {
        inner: MemoryStore,
        calls: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl StoreClient for FlakyStore {
        async fn submit(&self, points: Vec<crate::point::Point>) -> Result<(), StoreError> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            if call == self.fail_on {
                return Err(StoreError::Submission("injected failure".to_string()));
            }
            self.inner.submit(points).await
        }

        async fn flush(&self) -> Result<(), StoreError> {
            self.inner.flush().await
        }

        async fn close(&self) -> Result<(), StoreError> {
            self.inner.close().await
        }
    }

    #[tokio::test]
    async fn submits_points_in_arrival_order_with_change_fields() {
        let store = Arc::new(MemoryStore::new());
        let worker = IngestWorker::new(builder(), Arc::clone(&store));
        let (tx, rx) = mpsc::channel(16);

        for (price, prev) in [(100, 0), (101, 100), (99, 101)] {
            tx.send(obs(price, prev)).await.unwrap();
        }
        drop(tx);

        worker.run(rx, CancellationToken::new()).await.unwrap();

        let points = store.submitted();
        assert_eq!(points.len(), 3);

        assert_eq!(points[0].fields["cents"], FieldValue::Integer(100));
        assert_eq!(points[0].fields["grams"], FieldValue::Integer(1000));
        assert!(!points[0].fields.contains_key("cents_change"));

        assert_eq!(points[1].fields["cents"], FieldValue::Integer(101));
        assert_eq!(points[1].fields["cents_change"], FieldValue::Integer(1));

        assert_eq!(points[2].fields["cents"], FieldValue::Integer(99));
        assert_eq!(points[2].fields["cents_change"], FieldValue::Integer(-2));
    }

    #[tokio::test]
    async fn flushes_on_stream_close() {
        let store = Arc::new(MemoryStore::new());
        let worker = IngestWorker::new(builder(), Arc::clone(&store));
        let (tx, rx) = mpsc::channel(16);

        tx.send(obs(100, 0)).await.unwrap();
        drop(tx);

        worker.run(rx, CancellationToken::new()).await.unwrap();

        assert_eq!(store.unflushed(), 0);
        assert!(store.flushes() >= 1);
    }

    #[tokio::test]
    async fn submission_failure_does_not_stop_the_loop() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            calls: AtomicUsize::new(0),
            fail_on: 1, // second record fails
        });
        let worker = IngestWorker::new(builder(), Arc::clone(&store));
        let processed = worker.processed_counter();
        let failures = worker.failure_counter();
        let (tx, rx) = mpsc::channel(16);

        for price in [100, 200, 300] {
            tx.send(obs(price, 0)).await.unwrap();
        }
        drop(tx);

        worker.run(rx, CancellationToken::new()).await.unwrap();

        assert_eq!(processed.load(Ordering::Relaxed), 3);
        assert_eq!(failures.load(Ordering::Relaxed), 1);
        let points = store.inner.submitted();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].fields["cents"], FieldValue::Integer(100));
        assert_eq!(points[1].fields["cents"], FieldValue::Integer(300));
    }

    #[tokio::test]
    async fn cancellation_stops_intake_and_flushes() {
        let store = Arc::new(MemoryStore::new());
        let worker = IngestWorker::new(builder(), Arc::clone(&store));
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        tx.send(obs(100, 0)).await.unwrap();

        // Let the worker drain the queued record, then cancel while the
        // producer is still alive.
        let handle = tokio::spawn(worker.run(rx, cancel.clone()));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        cancel.cancel();

        handle.await.unwrap().unwrap();

        assert_eq!(store.submitted().len(), 1);
        assert_eq!(store.unflushed(), 0);
        drop(tx);
    }
}
