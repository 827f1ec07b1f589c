//! One-shot system telemetry writes.

use std::sync::Arc;

use crate::model::SystemStatusSnapshot;
use crate::point::{FieldValue, PointBuilder};
use crate::store::{StoreClient, StoreError};

/// Thin facade for writing system telemetry directly to the store.
///
/// Unlike the ingest worker these are one-shot calls with no stream in
/// front of them; a periodic scheduler outside this crate decides when to
/// invoke them. Errors propagate to that caller.
#[derive(Debug, Clone)]
pub struct SystemMetricsEmitter<S> {
    builder: PointBuilder,
    store: Arc<S>,
}

impl<S: StoreClient> SystemMetricsEmitter<S> {
    pub fn new(builder: PointBuilder, store: Arc<S>) -> Self {
        Self { builder, store }
    }

    /// Write one system status snapshot.
    ///
    /// # Errors
    /// Returns [`StoreError::Submission`] when the point cannot be enqueued.
    pub async fn emit_status(&self, snapshot: &SystemStatusSnapshot) -> Result<(), StoreError> {
        let point = self.builder.system_status_point(snapshot);
        self.store.submit(vec![point]).await
    }

    /// Write a single named scalar metric, tagged with the service identity.
    ///
    /// # Errors
    /// Returns [`StoreError::Submission`] when the point cannot be enqueued.
    pub async fn emit_metric(
        &self,
        name: &str,
        value: impl Into<FieldValue> + Send,
    ) -> Result<(), StoreError> {
        let point = self.builder.metric_point(name, value);
        self.store.submit(vec![point]).await
    }
}
