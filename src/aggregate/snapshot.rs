use std::collections::BTreeMap;

use serde::Serialize;

use super::parser::LogMethod;
use super::store::{BucketMetrics, TagSet};

/// Tag keys projected onto sample labels. The first key that is present wins;
/// `Enviroment` is the spelling older bucket tags were created with.
const ENVIRONMENT_TAGS: [&str; 2] = ["Environment", "Enviroment"];
const NAMESPACE_TAG: &str = "Namespace";
const TENANT_TAG: &str = "Tenant";

/// Point-in-time copy of the aggregate registry and the tag table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    pub buckets: BTreeMap<String, BucketMetrics>,
    pub tags: BTreeMap<String, TagSet>,
}

/// One labelled row per bucket and observed method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSample {
    pub bucket: String,
    pub method: LogMethod,
    pub region: String,
    pub owner: String,
    pub environment: String,
    pub namespace: String,
    pub tenant: String,
    pub requests: u64,
    pub request_bytes: u64,
    pub response_bytes: u64,
}

impl StoreSnapshot {
    /// Flattens the snapshot into exporter rows, ordered by bucket then method.
    #[must_use]
    pub fn samples(&self) -> Vec<BucketSample> {
        let empty = TagSet::new();
        let mut samples = Vec::new();
        for (bucket, metrics) in &self.buckets {
            let tags = self.tags.get(bucket).unwrap_or(&empty);
            let environment = ENVIRONMENT_TAGS
                .iter()
                .find_map(|key| tags.get(*key))
                .cloned()
                .unwrap_or_default();
            let namespace = tags.get(NAMESPACE_TAG).cloned().unwrap_or_default();
            let tenant = tags.get(TENANT_TAG).cloned().unwrap_or_default();
            for method in metrics.method_counts.keys() {
                samples.push(BucketSample {
                    bucket: bucket.clone(),
                    method: *method,
                    region: metrics.region.clone(),
                    owner: metrics.owner.clone(),
                    environment: environment.clone(),
                    namespace: namespace.clone(),
                    tenant: tenant.clone(),
                    requests: metrics.requests(*method),
                    request_bytes: metrics.request_bytes(*method),
                    response_bytes: metrics.response_bytes(*method),
                });
            }
        }
        samples
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.buckets
            .values()
            .fold(0u64, |total, metrics| total.saturating_add(metrics.total_requests()))
    }
}
