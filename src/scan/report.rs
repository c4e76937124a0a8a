use std::time::Duration;

use serde::Serialize;

use super::objects::BucketScanStats;

/// What happened to one bucket during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOutcome {
    Scanned(BucketScanStats),
    /// No access-log objects under the prefix.
    Empty,
    /// Head-bucket answered 403.
    Forbidden,
    /// Head-bucket failed for another reason.
    Skipped,
    /// Owner lookup or listing failed; the previous entry was kept.
    Failed,
}

/// Per-endpoint tallies for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointReport {
    pub region: String,
    pub buckets_listed: u64,
    pub buckets_scanned: u64,
    pub buckets_empty: u64,
    pub buckets_forbidden: u64,
    pub buckets_skipped: u64,
    pub buckets_failed: u64,
    pub objects_scanned: u64,
    pub objects_failed: u64,
    pub observations: u64,
    /// Set when the endpoint could not be connected or listed at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EndpointReport {
    #[must_use]
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(region: &str, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(region)
        }
    }

    pub fn record(&mut self, outcome: BucketOutcome) {
        let counter = match outcome {
            BucketOutcome::Scanned(stats) => {
                self.objects_scanned = self.objects_scanned.saturating_add(stats.objects_scanned);
                self.objects_failed = self.objects_failed.saturating_add(stats.objects_failed);
                self.observations = self.observations.saturating_add(stats.observations);
                &mut self.buckets_scanned
            }
            BucketOutcome::Empty => &mut self.buckets_empty,
            BucketOutcome::Forbidden => &mut self.buckets_forbidden,
            BucketOutcome::Skipped => &mut self.buckets_skipped,
            BucketOutcome::Failed => &mut self.buckets_failed,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Summary of one pass over every configured endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub endpoints: Vec<EndpointReport>,
    pub elapsed_ms: u64,
}

impl CycleReport {
    pub(super) fn finish(endpoints: Vec<EndpointReport>, elapsed: Duration) -> Self {
        Self {
            endpoints,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    #[must_use]
    pub fn buckets_scanned(&self) -> u64 {
        self.endpoints
            .iter()
            .fold(0_u64, |total, endpoint| total.saturating_add(endpoint.buckets_scanned))
    }

    #[must_use]
    pub fn failed_endpoints(&self) -> usize {
        self.endpoints
            .iter()
            .filter(|endpoint| endpoint.error.is_some())
            .count()
    }
}
