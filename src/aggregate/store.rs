use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use super::parser::{LogMethod, Observation};
use super::snapshot::StoreSnapshot;

/// Owner label used when the bucket ACL carries no display name.
pub const UNKNOWN_OWNER: &str = "Unknown";

/// Tag key to tag value, one map per bucket.
pub type TagSet = BTreeMap<String, String>;

/// Aggregated access-log statistics for one bucket.
///
/// A method missing from any of the maps counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketMetrics {
    pub method_counts: BTreeMap<LogMethod, u64>,
    pub request_sizes: BTreeMap<LogMethod, u64>,
    pub response_sizes: BTreeMap<LogMethod, u64>,
    pub region: String,
    pub owner: String,
}

impl BucketMetrics {
    #[must_use]
    pub fn new(region: &str, owner: &str) -> Self {
        Self {
            region: region.to_owned(),
            owner: owner.to_owned(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, observation: &Observation) {
        let method = observation.method;
        let count = self.method_counts.entry(method).or_default();
        *count = count.saturating_add(1);
        if let Some(size) = observation.request_size {
            let total = self.request_sizes.entry(method).or_default();
            *total = total.saturating_add(size);
        }
        if let Some(size) = observation.response_size {
            let total = self.response_sizes.entry(method).or_default();
            *total = total.saturating_add(size);
        }
    }

    /// Adds the counters of `other`; region and owner stay as they are.
    pub fn merge(&mut self, other: &Self) {
        add_totals(&mut self.method_counts, &other.method_counts);
        add_totals(&mut self.request_sizes, &other.request_sizes);
        add_totals(&mut self.response_sizes, &other.response_sizes);
    }

    #[must_use]
    pub fn requests(&self, method: LogMethod) -> u64 {
        self.method_counts.get(&method).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn request_bytes(&self, method: LogMethod) -> u64 {
        self.request_sizes.get(&method).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn response_bytes(&self, method: LogMethod) -> u64 {
        self.response_sizes.get(&method).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.method_counts
            .values()
            .fold(0u64, |total, count| total.saturating_add(*count))
    }
}

fn add_totals(totals: &mut BTreeMap<LogMethod, u64>, other: &BTreeMap<LogMethod, u64>) {
    for (method, value) in other {
        let total = totals.entry(*method).or_default();
        *total = total.saturating_add(*value);
    }
}

/// Process-wide registry of bucket metrics and bucket tags.
///
/// Scans accumulate into a pending entry guarded by that bucket's own mutex
/// and publish it with [`AggregateStore::finish_scan`], which replaces the
/// registry entry wholesale. Entries of buckets that are no longer discovered
/// are kept until a later scan overwrites them.
#[derive(Debug, Default)]
pub struct AggregateStore {
    registry: RwLock<HashMap<String, BucketMetrics>>,
    pending: RwLock<HashMap<String, Arc<Mutex<BucketMetrics>>>>,
    tags: RwLock<HashMap<String, TagSet>>,
}

impl AggregateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the registry entry for `name`.
    pub fn upsert_bucket(&self, name: &str, metrics: BucketMetrics) {
        write(&self.registry).insert(name.to_owned(), metrics);
    }

    /// Replaces the tag set for `name`.
    pub fn set_tags(&self, name: &str, tags: TagSet) {
        write(&self.tags).insert(name.to_owned(), tags);
    }

    /// Starts a fresh pending accumulation for `name`, discarding any
    /// leftover from an interrupted scan.
    pub fn begin_scan(&self, name: &str, region: &str, owner: &str) {
        let entry = Arc::new(Mutex::new(BucketMetrics::new(region, owner)));
        write(&self.pending).insert(name.to_owned(), entry);
    }

    /// Adds one observation to the pending scan of `name`.
    ///
    /// Returns `false` when no scan of `name` is in progress.
    pub fn record_observation(&self, name: &str, observation: &Observation) -> bool {
        self.record_observations(name, std::slice::from_ref(observation))
    }

    /// Adds a batch of observations under a single acquisition of the
    /// bucket's lock.
    ///
    /// Returns `false` when no scan of `name` is in progress.
    pub fn record_observations(&self, name: &str, observations: &[Observation]) -> bool {
        let Some(entry) = self.pending_entry(name) else {
            return false;
        };
        let mut metrics = lock(&entry);
        for observation in observations {
            metrics.record(observation);
        }
        true
    }

    /// Merges a fully read object's counters into the pending scan of `name`.
    ///
    /// Returns `false` when no scan of `name` is in progress.
    pub fn merge_metrics(&self, name: &str, metrics: &BucketMetrics) -> bool {
        let Some(entry) = self.pending_entry(name) else {
            return false;
        };
        lock(&entry).merge(metrics);
        true
    }

    /// Publishes the pending scan of `name` into the registry.
    ///
    /// Returns `false` when no scan of `name` is in progress.
    pub fn finish_scan(&self, name: &str) -> bool {
        let Some(entry) = write(&self.pending).remove(name) else {
            return false;
        };
        let metrics = match Arc::try_unwrap(entry) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => lock(&shared).clone(),
        };
        self.upsert_bucket(name, metrics);
        true
    }

    /// Drops the pending scan of `name`; the registry keeps its previous entry.
    pub fn abandon_scan(&self, name: &str) {
        write(&self.pending).remove(name);
    }

    #[must_use]
    pub fn bucket(&self, name: &str) -> Option<BucketMetrics> {
        read(&self.registry).get(name).cloned()
    }

    #[must_use]
    pub fn tags(&self, name: &str) -> Option<TagSet> {
        read(&self.tags).get(name).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.registry).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.registry).is_empty()
    }

    /// Copies the registry and tag table for the exporter.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let buckets = read(&self.registry)
            .iter()
            .map(|(name, metrics)| (name.clone(), metrics.clone()))
            .collect();
        let tags = read(&self.tags)
            .iter()
            .map(|(name, tags)| (name.clone(), tags.clone()))
            .collect();
        StoreSnapshot { buckets, tags }
    }

    fn pending_entry(&self, name: &str) -> Option<Arc<Mutex<BucketMetrics>>> {
        read(&self.pending).get(name).cloned()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
