use std::sync::Arc;

use futures_util::StreamExt;
use serde::Serialize;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, warn};

use super::governor::{Governor, Slot};
use super::lines::LineBuffer;
use crate::aggregate::{AggregateStore, BucketMetrics, LogLineParser, UNKNOWN_OWNER};
use crate::error::{ScanError, StorageResult};
use crate::storage::{ObjectPage, StorageClient};

/// Per-bucket counters reported after a completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketScanStats {
    pub objects_scanned: u64,
    pub objects_failed: u64,
    pub observations: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The bucket's entry was rebuilt from its current log objects.
    Scanned(BucketScanStats),
    /// No objects under the log prefix; the store was left untouched.
    Empty,
}

/// Reads every access-log object of a bucket into the aggregate store.
#[derive(Debug)]
pub struct ObjectScanner {
    store: Arc<AggregateStore>,
    governor: Governor,
    parser: LogLineParser,
    prefix: String,
    page_size: u32,
}

type ObjectResult = StorageResult<u64>;

impl ObjectScanner {
    #[must_use]
    pub fn new(
        store: Arc<AggregateStore>,
        governor: Governor,
        parser: LogLineParser,
        prefix: &str,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            governor,
            parser,
            prefix: prefix.to_owned(),
            page_size: page_size.max(1),
        }
    }

    /// Rebuilds the store entry of `bucket` from the objects under the log prefix.
    ///
    /// Objects that fail to download are skipped. The previous entry is kept
    /// when the owner lookup or a listing call fails.
    ///
    /// # Errors
    ///
    /// Returns an error when the owner cannot be resolved or a page cannot be listed.
    pub async fn scan_bucket(
        &self,
        client: Arc<dyn StorageClient>,
        bucket: &str,
    ) -> Result<ScanOutcome, ScanError> {
        let owner = self.resolve_owner(client.as_ref(), bucket).await?;
        let first_page = self.list_page(client.as_ref(), bucket, None).await?;
        if first_page.keys.is_empty() {
            debug!("Bucket '{}' has no objects under '{}'.", bucket, self.prefix);
            return Ok(ScanOutcome::Empty);
        }

        self.refresh_tags(client.as_ref(), bucket).await;
        self.store.begin_scan(bucket, client.region(), &owner);

        let mut tasks: JoinSet<ObjectResult> = JoinSet::new();
        let mut stats = BucketScanStats::default();
        let mut page = first_page;
        loop {
            for key in page.keys {
                let slot = match self.slot(bucket).await {
                    Ok(slot) => slot,
                    Err(err) => return Err(self.abort(bucket, tasks, err).await),
                };
                tasks.spawn(read_object(
                    slot,
                    Arc::clone(&client),
                    Arc::clone(&self.store),
                    self.parser.clone(),
                    bucket.to_owned(),
                    key,
                ));
                while let Some(result) = tasks.try_join_next() {
                    tally(&mut stats, bucket, result);
                }
            }

            let Some(token) = page.next_page_token else {
                break;
            };
            page = match self.list_page(client.as_ref(), bucket, Some(&token)).await {
                Ok(page) => page,
                Err(err) => return Err(self.abort(bucket, tasks, err).await),
            };
        }

        while let Some(result) = tasks.join_next().await {
            tally(&mut stats, bucket, result);
        }
        self.store.finish_scan(bucket);
        debug!(
            "Scanned bucket '{}': {} objects, {} failed, {} records.",
            bucket, stats.objects_scanned, stats.objects_failed, stats.observations
        );
        Ok(ScanOutcome::Scanned(stats))
    }

    async fn resolve_owner(
        &self,
        client: &dyn StorageClient,
        bucket: &str,
    ) -> Result<String, ScanError> {
        let _slot = self.slot(bucket).await?;
        let owner = client
            .get_bucket_acl(bucket)
            .await
            .map_err(|source| ScanError::OwnerLookup {
                bucket: bucket.to_owned(),
                source,
            })?;
        Ok(owner.unwrap_or_else(|| UNKNOWN_OWNER.to_owned()))
    }

    async fn refresh_tags(&self, client: &dyn StorageClient, bucket: &str) {
        let Ok(_slot) = self.governor.acquire().await else {
            return;
        };
        match client.get_bucket_tagging(bucket).await {
            Ok(tags) => self.store.set_tags(bucket, tags),
            Err(err) => warn!("Failed to read tags of bucket '{}': {}", bucket, err),
        }
    }

    async fn list_page(
        &self,
        client: &dyn StorageClient,
        bucket: &str,
        page_token: Option<&str>,
    ) -> Result<ObjectPage, ScanError> {
        let _slot = self.slot(bucket).await?;
        client
            .list_objects(bucket, &self.prefix, page_token, self.page_size)
            .await
            .map_err(|source| ScanError::list_objects(bucket, source))
    }

    async fn slot(&self, bucket: &str) -> Result<Slot, ScanError> {
        self.governor
            .acquire()
            .await
            .map_err(|source| ScanError::GovernorClosed {
                bucket: bucket.to_owned(),
                source,
            })
    }

    /// Waits for dispatched objects, then discards the partial accumulation.
    async fn abort(
        &self,
        bucket: &str,
        mut tasks: JoinSet<ObjectResult>,
        err: ScanError,
    ) -> ScanError {
        while tasks.join_next().await.is_some() {}
        self.store.abandon_scan(bucket);
        err
    }
}

async fn read_object(
    slot: Slot,
    client: Arc<dyn StorageClient>,
    store: Arc<AggregateStore>,
    parser: LogLineParser,
    bucket: String,
    key: String,
) -> ObjectResult {
    let totals = fetch_totals(client.as_ref(), &parser, &bucket, &key).await;
    drop(slot);
    match totals {
        Ok(totals) => {
            store.merge_metrics(&bucket, &totals);
            Ok(totals.total_requests())
        }
        Err(err) => {
            warn!("Skipping object '{}' in bucket '{}': {}", key, bucket, err);
            Err(err)
        }
    }
}

/// Folds one object into task-local counters; nothing reaches the store
/// unless the whole body was read.
async fn fetch_totals(
    client: &dyn StorageClient,
    parser: &LogLineParser,
    bucket: &str,
    key: &str,
) -> StorageResult<BucketMetrics> {
    let mut body = client.get_object(bucket, key).await?;
    let mut lines = LineBuffer::default();
    let mut totals = BucketMetrics::default();
    let mut record = |line: &str| {
        for observation in parser.parse(line) {
            totals.record(&observation);
        }
    };
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        lines.feed(&chunk, &mut record);
    }
    lines.finish(&mut record);
    Ok(totals)
}

fn tally(stats: &mut BucketScanStats, bucket: &str, result: Result<ObjectResult, JoinError>) {
    match result {
        Ok(Ok(records)) => {
            stats.objects_scanned = stats.objects_scanned.saturating_add(1);
            stats.observations = stats.observations.saturating_add(records);
        }
        Ok(Err(_)) => {
            stats.objects_failed = stats.objects_failed.saturating_add(1);
        }
        Err(err) => {
            error!("Object task for bucket '{}' failed: {}", bucket, err);
            stats.objects_failed = stats.objects_failed.saturating_add(1);
        }
    }
}
