//! Discover → scan pipeline.
//!
//! [`CycleScheduler`] walks the configured endpoints, [`BucketDiscoverer`]
//! fans out one task per accessible bucket, and [`ObjectScanner`] fans out
//! one task per access-log object. Every network call on those paths first
//! takes a slot from the shared [`Governor`].
mod buckets;
mod cycle;
mod governor;
mod lines;
mod objects;
mod report;

#[cfg(test)]
mod test_support;

use std::time::Duration;

pub use buckets::BucketDiscoverer;
pub use cycle::CycleScheduler;
pub use governor::{Governor, Slot};
pub use objects::{BucketScanStats, ObjectScanner, ScanOutcome};
pub use report::{BucketOutcome, CycleReport, EndpointReport};

/// Object-key prefix under which access logs are written.
pub const DEFAULT_LOG_PREFIX: &str = "logs/";
/// Largest page the S3 list API returns.
pub const MAX_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(200);

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub max_concurrency: usize,
    pub page_size: u32,
    pub log_prefix: String,
    pub cycle_interval: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            page_size: MAX_PAGE_SIZE,
            log_prefix: DEFAULT_LOG_PREFIX.to_owned(),
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
        }
    }
}
