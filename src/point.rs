//! Point Translation Layer
//!
//! Pure translation of domain records into store-facing points:
//!
//! - [`Point`] / [`FieldValue`]: the tagged, fielded, timestamped record
//!   written to the time-series store
//! - [`PointBuilder`]: deterministic record-to-point mapping, no I/O
//!
//! Measurement names and the service identifier are injected at
//! construction so the builder stays free of ambient state.

mod builder;
mod types;

pub use builder::{
    PointBuilder, HDD_BYTES_FREE_FIELD, PRODUCTS_PER_SECOND_FIELD,
    RAM_UTILISATION_PERCENT_FIELD, TOTAL_PRODUCT_COUNT_FIELD,
};
pub use types::{FieldValue, Point};
