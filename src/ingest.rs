//! Ingestion Layer
//!
//! The streaming and one-shot write paths in front of the store:
//!
//! - [`IngestWorker`]: long-lived task draining a product-observation
//!   stream, one point per record, in arrival order
//! - [`SystemMetricsEmitter`]: synchronous one-shot status and metric
//!   writes, invoked by an external scheduler
//!
//! Both paths share one [`StoreClient`](crate::store::StoreClient); the
//! store's own thread-safety contract makes external locking unnecessary.

mod emitter;
mod worker;

pub use emitter::SystemMetricsEmitter;
pub use worker::IngestWorker;
