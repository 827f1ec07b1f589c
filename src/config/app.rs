//! Application configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_FLUSH_INTERVAL,
};

use super::validation::{expand_env_vars, ConfigError};

// =============================================================================
// Constants
// =============================================================================

/// Default service identifier tag for system telemetry.
pub const DEFAULT_SERVICE_NAME: &str = "pricefeed";

/// Default cadence for periodic system status emission.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(60);

fn default_product_measurement() -> String {
    "products".to_string()
}

fn default_system_measurement() -> String {
    "system".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_flush_interval() -> Duration {
    DEFAULT_FLUSH_INTERVAL
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

// =============================================================================
// Store Configuration
// =============================================================================

/// Time-series store connection and write settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store endpoint URL (e.g. `http://localhost:8086`).
    pub url: String,

    /// Access token. Usually injected via `${INFLUXDB_TOKEN}` expansion.
    pub token: String,

    /// Logical database (bucket) name.
    pub database: String,

    /// Measurement receiving product observations (default: "products").
    #[serde(default = "default_product_measurement")]
    pub product_measurement: String,

    /// Measurement receiving system telemetry (default: "system").
    #[serde(default = "default_system_measurement")]
    pub system_measurement: String,

    /// Lines per batched write (default: 500).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum time a non-empty batch may wait (default: 1s).
    #[serde(default = "default_flush_interval", with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Connection/health-probe timeout (default: 5s).
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
}

// =============================================================================
// Service Configuration
// =============================================================================

/// Service identity and status cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Process-wide service identifier, used as the `service` tag on
    /// arbitrary metrics (default: "pricefeed").
    pub name: String,

    /// Interval between periodic system status points (default: 1m).
    #[serde(with = "humantime_serde")]
    pub status_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            status_interval: DEFAULT_STATUS_INTERVAL,
        }
    }
}

// =============================================================================
// Ingest Configuration
// =============================================================================

/// Ingest stream sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Capacity of the observation channel between producers and the
    /// ingest worker (default: 10000).
    pub channel_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Time-series store settings.
    pub store: StoreConfig,

    /// Service identity settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Ingest stream settings.
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment variables in the raw text are expanded before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let expanded = expand_env_vars(&content);
        let config: Self = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.store.url.starts_with("http://") && !self.store.url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "store url must be http(s): '{}'",
                self.store.url
            )));
        }

        if self.store.token.is_empty() {
            return Err(ConfigError::Validation(
                "store token must not be empty".to_string(),
            ));
        }

        if self.store.database.is_empty() {
            return Err(ConfigError::Validation(
                "store database must not be empty".to_string(),
            ));
        }

        if self.store.product_measurement.is_empty() || self.store.system_measurement.is_empty() {
            return Err(ConfigError::Validation(
                "measurement names must not be empty".to_string(),
            ));
        }

        // Product data and system telemetry go to separate measurements;
        // sharing one would mix schemas under dashboard queries.
        if self.store.product_measurement == self.store.system_measurement {
            return Err(ConfigError::Validation(
                "product and system measurements must differ".to_string(),
            ));
        }

        if self.store.batch_size == 0 {
            return Err(ConfigError::Validation(
                "store batch_size must be positive".to_string(),
            ));
        }

        if self.service.name.is_empty() {
            return Err(ConfigError::Validation(
                "service name must not be empty".to_string(),
            ));
        }

        if self.service.status_interval.is_zero() {
            return Err(ConfigError::Validation(
                "service status_interval must be positive".to_string(),
            ));
        }

        if self.ingest.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "ingest channel_capacity must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        AppConfig {
            store: StoreConfig {
                url: "http://localhost:8086".to_string(),
                token: "token".to_string(),
                database: "groceries".to_string(),
                product_measurement: default_product_measurement(),
                system_measurement: default_system_measurement(),
                batch_size: DEFAULT_BATCH_SIZE,
                flush_interval: DEFAULT_FLUSH_INTERVAL,
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            },
            service: ServiceConfig::default(),
            ingest: IngestConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_url() {
        let mut config = valid_config();
        config.store.url = "localhost:8086".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_token_and_database() {
        let mut config = valid_config();
        config.store.token = String::new();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.store.database = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_shared_measurement_name() {
        let mut config = valid_config();
        config.store.system_measurement = config.store.product_measurement.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn rejects_zero_capacities() {
        let mut config = valid_config();
        config.store.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.ingest.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_yaml_with_defaults_and_env_expansion() {
        // SAFETY: test-scoped variable, removed before returning.
        unsafe {
            std::env::set_var("PRICEFEED_TEST_CFG_TOKEN", "from-env");
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "store:\n  url: http://localhost:8086\n  token: ${{PRICEFEED_TEST_CFG_TOKEN}}\n  database: groceries\n"
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.store.token, "from-env");
        assert_eq!(config.store.product_measurement, "products");
        assert_eq!(config.store.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.service.name, "pricefeed");
        assert_eq!(config.service.status_interval, DEFAULT_STATUS_INTERVAL);
        assert_eq!(config.ingest.channel_capacity, 10_000);

        unsafe {
            std::env::remove_var("PRICEFEED_TEST_CFG_TOKEN");
        }
    }

    #[test]
    fn load_rejects_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "store: [not, a, mapping").unwrap();
        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn duration_fields_parse_humantime() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "store:\n  url: http://localhost:8086\n  token: t\n  database: d\n  flush_interval: 250ms\nservice:\n  status_interval: 2m\n"
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.store.flush_interval, Duration::from_millis(250));
        assert_eq!(config.service.status_interval, Duration::from_secs(120));
    }
}
