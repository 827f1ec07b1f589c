//! Store Layer
//!
//! Narrow seam between the ingestion core and the time-series database:
//!
//! - [`StoreClient`]: capability trait (submit, flush, close); safe to share
//!   across the ingest worker and any number of direct emitters
//! - [`InfluxClient`]: HTTP line-protocol adapter with a background writer
//!   task that batches and posts submitted points
//! - [`MemoryStore`]: in-process capturing implementation for tests and
//!   embedders
//!
//! Batching and flush mechanics belong to this layer; callers submit one or
//! more points and never block on transmission.

mod buffer;
mod client;
mod influx;
mod line_protocol;
mod memory;

pub use client::{StoreClient, StoreError};
pub use influx::{
    InfluxClient, InfluxClientBuilder, DEFAULT_BATCH_SIZE, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_FLUSH_INTERVAL,
};
pub use memory::MemoryStore;
