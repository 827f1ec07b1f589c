//! Record-to-point translation.

use chrono::Utc;

use crate::model::{ProductObservation, SystemStatusSnapshot};
use crate::point::types::{FieldValue, Point};

// =============================================================================
// Fixed field keys
// =============================================================================

// These four names are a wire contract with downstream dashboards and must
// not change independently of the queries that read them.

/// RAM utilisation percentage field on system status points.
pub const RAM_UTILISATION_PERCENT_FIELD: &str = "ram_utilisation_percent";

/// Observations-processed-per-second field on system status points.
pub const PRODUCTS_PER_SECOND_FIELD: &str = "products_per_second";

/// Free disk bytes field on system status points.
pub const HDD_BYTES_FREE_FIELD: &str = "hdd_bytes_free";

/// Total observed-product count field on system status points.
pub const TOTAL_PRODUCT_COUNT_FIELD: &str = "total_product_count";

// =============================================================================
// Builder
// =============================================================================

/// Deterministic, side-effect-free mapping from domain records to points.
///
/// Measurement names and the service identifier are configuration values
/// passed in at construction, keeping the builder pure and testable without
/// process-wide setup.
#[derive(Debug, Clone)]
pub struct PointBuilder {
    product_measurement: String,
    system_measurement: String,
    service_name: String,
}

impl PointBuilder {
    /// Create a builder bound to the given measurement names and service
    /// identifier.
    pub fn new(
        product_measurement: impl Into<String>,
        system_measurement: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            product_measurement: product_measurement.into(),
            system_measurement: system_measurement.into(),
            service_name: service_name.into(),
        }
    }

    /// Translate a product observation into a point.
    ///
    /// Tags (`id`, `name`, `store`, `location`, `department`) are copied
    /// verbatim; empty strings pass through. Fields are `cents` and `grams`,
    /// plus `cents_change` when a real price change occurred: both the
    /// current and previous price non-zero and different. An absent change
    /// field and a zero change field mean different things downstream, so
    /// the key is omitted entirely otherwise.
    ///
    /// The point keeps the observation's own timestamp so backfilled data
    /// preserves provenance.
    pub fn product_point(&self, obs: &ProductObservation) -> Point {
        let mut point = Point::new(self.product_measurement.clone(), obs.timestamp)
            .with_tag("id", obs.id.clone())
            .with_tag("name", obs.name.clone())
            .with_tag("store", obs.store.clone())
            .with_tag("location", obs.location.clone())
            .with_tag("department", obs.department.clone())
            .with_field("cents", obs.price_cents)
            .with_field("grams", obs.weight_grams);

        if obs.price_cents != 0
            && obs.previous_price_cents != 0
            && obs.price_cents != obs.previous_price_cents
        {
            point = point.with_field("cents_change", obs.price_cents - obs.previous_price_cents);
        }

        point
    }

    /// Translate a system status snapshot into a point.
    ///
    /// Carries no tags and exactly the four fixed fields. The snapshot has
    /// no timestamp of its own, so the point is stamped at build time.
    pub fn system_status_point(&self, snapshot: &SystemStatusSnapshot) -> Point {
        Point::new(self.system_measurement.clone(), Utc::now())
            .with_field(
                RAM_UTILISATION_PERCENT_FIELD,
                snapshot.ram_utilisation_percent,
            )
            .with_field(PRODUCTS_PER_SECOND_FIELD, snapshot.products_per_second)
            .with_field(HDD_BYTES_FREE_FIELD, snapshot.hdd_bytes_free)
            .with_field(TOTAL_PRODUCT_COUNT_FIELD, snapshot.total_product_count)
    }

    /// Build a point for a single named scalar metric.
    ///
    /// Written to the system measurement with the fixed `service` tag so
    /// ad-hoc counters and gauges can be told apart from other services
    /// sharing the measurement.
    pub fn metric_point(&self, name: &str, value: impl Into<FieldValue>) -> Point {
        Point::new(self.system_measurement.clone(), Utc::now())
            .with_tag("service", self.service_name.clone())
            .with_field(name, value)
    }
}
