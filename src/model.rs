//! Domain records consumed by the ingestion pipeline.
//!
//! - [`ProductObservation`]: one price/weight reading for a retail product
//! - [`SystemStatusSnapshot`]: one periodic sample of process/host health
//!
//! Both are immutable value objects produced upstream (scrapers, samplers)
//! and consumed exactly once by the point translation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price/weight reading for a retail product at a point in time.
///
/// Prices and weights are non-negative integers for well-formed input, but
/// this layer does not validate: malformed records pass through unchanged
/// and validation stays an upstream concern.
///
/// A `previous_price_cents` of zero means "no prior observation", not a
/// real zero price. Price-change derivation keys off this convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductObservation {
    /// Stable identifier, unique per product and store.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Store name (e.g. a retail chain).
    pub store: String,
    /// Department within the store.
    #[serde(default)]
    pub department: String,
    /// Store location.
    #[serde(default)]
    pub location: String,
    /// Current price in integer cents.
    pub price_cents: i64,
    /// Price at the previous observation, in integer cents. Zero when unknown.
    #[serde(default)]
    pub previous_price_cents: i64,
    /// Weight in grams.
    #[serde(default)]
    pub weight_grams: i64,
    /// When the observation was taken (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ProductObservation {
    /// Create an observation with the given identity and current price.
    ///
    /// Remaining fields default to empty/zero; use the `with_*` builders to
    /// fill them in.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_cents: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            store: String::new(),
            department: String::new(),
            location: String::new(),
            price_cents,
            previous_price_cents: 0,
            weight_grams: 0,
            timestamp: Utc::now(),
        }
    }

    /// Set the store name.
    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = store.into();
        self
    }

    /// Set the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the previous price in cents.
    pub fn with_previous_price(mut self, cents: i64) -> Self {
        self.previous_price_cents = cents;
        self
    }

    /// Set the weight in grams.
    pub fn with_weight(mut self, grams: i64) -> Self {
        self.weight_grams = grams;
        self
    }

    /// Set the observation timestamp.
    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = ts;
        self
    }
}

/// One periodic sample of process/host health.
///
/// All fields are always present; the write timestamp is assigned when the
/// snapshot is turned into a point, not carried on the record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemStatusSnapshot {
    /// RAM utilisation as a percentage of total memory.
    pub ram_utilisation_percent: f64,
    /// Observations processed per second since the previous sample.
    pub products_per_second: f64,
    /// Free disk space in bytes.
    pub hdd_bytes_free: i64,
    /// Total number of distinct products observed so far.
    pub total_product_count: i64,
}
