//! Host health sampling.
//!
//! Builds [`SystemStatusSnapshot`] values for the periodic status loop: RAM
//! utilisation and free disk space come from the OS, the processing rate
//! from the ingest worker's shared counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use sysinfo::{Disks, System};

use crate::model::SystemStatusSnapshot;

/// Stateful sampler; keeps the previous counter reading so each sample
/// reports the rate over the window since the last one.
pub struct SystemSampler {
    system: System,
    processed: Arc<AtomicU64>,
    last_count: u64,
    last_sample: Instant,
}

impl std::fmt::Debug for SystemSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSampler")
            .field("last_count", &self.last_count)
            .finish_non_exhaustive()
    }
}

impl SystemSampler {
    /// Create a sampler reading rates from the given processed counter.
    pub fn new(processed: Arc<AtomicU64>) -> Self {
        Self {
            system: System::new(),
            processed,
            last_count: 0,
            last_sample: Instant::now(),
        }
    }

    /// Take one snapshot.
    ///
    /// Free disk space is the available space on the largest mounted disk;
    /// summing across mounts would double-count overlay filesystems.
    pub fn sample(&mut self, total_product_count: i64) -> SystemStatusSnapshot {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        let ram_utilisation_percent = if total > 0 {
            self.system.used_memory() as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let disks = Disks::new_with_refreshed_list();
        let hdd_bytes_free = disks
            .list()
            .iter()
            .map(|d| d.available_space())
            .max()
            .unwrap_or(0) as i64;

        let now = Instant::now();
        let count = self.processed.load(Ordering::Relaxed);
        let elapsed = now.duration_since(self.last_sample).as_secs_f64();
        let products_per_second = if elapsed > 0.0 {
            count.saturating_sub(self.last_count) as f64 / elapsed
        } else {
            0.0
        };
        self.last_count = count;
        self.last_sample = now;

        SystemStatusSnapshot {
            ram_utilisation_percent,
            products_per_second,
            hdd_bytes_free,
            total_product_count,
        }
    }
}
