//! Pricefeed - Grocery Price Telemetry Ingestion
//!
//! This crate turns product price/weight observations and system health
//! snapshots into timestamped, tagged points and streams them into a
//! time-series store. It can be used as a library by upstream collectors,
//! or run standalone with the `pricefeed` executable.
//!
//! # Architecture
//!
//! - **Model**: immutable domain records produced upstream
//! - **Point**: pure record-to-point translation (tags, fields, timestamp)
//! - **Store**: narrow client seam plus the InfluxDB line-protocol adapter
//! - **Ingest**: the streaming worker and one-shot telemetry emitters
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pricefeed::{IngestWorker, InfluxClient, PointBuilder};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), pricefeed::StoreError> {
//! let store = Arc::new(InfluxClient::connect("http://localhost:8086", "token", "groceries").await?);
//! let builder = PointBuilder::new("products", "system", "pricefeed");
//! let (tx, rx) = tokio::sync::mpsc::channel(1024);
//! # let _ = &tx;
//! let worker = IngestWorker::new(builder, store);
//! worker.run(rx, CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod ingest;
pub mod model;
pub mod point;
pub mod store;
pub mod sysmon;

pub use config::AppConfig;
pub use ingest::{IngestWorker, SystemMetricsEmitter};
pub use model::{ProductObservation, SystemStatusSnapshot};
pub use point::{FieldValue, Point, PointBuilder};
pub use store::{InfluxClient, MemoryStore, StoreClient, StoreError};
pub use sysmon::SystemSampler;
