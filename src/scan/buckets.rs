use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use super::governor::Governor;
use super::objects::{ObjectScanner, ScanOutcome};
use super::report::{BucketOutcome, EndpointReport};
use crate::error::{ScanError, StorageResult};
use crate::storage::{BucketAccess, StorageClient};

/// Enumerates the buckets of one endpoint and scans the accessible ones
/// concurrently.
#[derive(Debug)]
pub struct BucketDiscoverer {
    scanner: Arc<ObjectScanner>,
    governor: Governor,
}

impl BucketDiscoverer {
    #[must_use]
    pub const fn new(scanner: Arc<ObjectScanner>, governor: Governor) -> Self {
        Self { scanner, governor }
    }

    /// Scans every bucket reachable through `client`.
    ///
    /// Per-bucket failures are logged and counted; they never stop the
    /// other buckets.
    ///
    /// # Errors
    ///
    /// Returns an error when the bucket listing itself fails.
    pub async fn discover(&self, client: Arc<dyn StorageClient>) -> StorageResult<EndpointReport> {
        let buckets = {
            let Ok(_slot) = self.governor.acquire().await else {
                return Ok(EndpointReport::new(client.region()));
            };
            client.list_buckets().await?
        };
        let mut report = EndpointReport::new(client.region());
        report.buckets_listed = u64::try_from(buckets.len()).unwrap_or(u64::MAX);
        debug!(
            "Endpoint '{}' lists {} buckets.",
            client.region(),
            buckets.len()
        );

        let mut tasks = JoinSet::new();
        for bucket in buckets {
            tasks.spawn(scan_one(
                Arc::clone(&self.scanner),
                self.governor.clone(),
                Arc::clone(&client),
                bucket,
            ));
        }
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(outcome) => report.record(outcome),
                Err(err) => {
                    error!("Bucket task on '{}' failed: {}", client.region(), err);
                    report.record(BucketOutcome::Failed);
                }
            }
        }
        Ok(report)
    }
}

async fn scan_one(
    scanner: Arc<ObjectScanner>,
    governor: Governor,
    client: Arc<dyn StorageClient>,
    bucket: String,
) -> BucketOutcome {
    let access = {
        let Ok(_slot) = governor.acquire().await else {
            return BucketOutcome::Skipped;
        };
        client.head_bucket(&bucket).await
    };
    match access {
        Ok(BucketAccess::Forbidden) => {
            debug!("No access to bucket '{}'; skipping.", bucket);
            BucketOutcome::Forbidden
        }
        Err(err) => {
            warn!("Failed to check bucket '{}': {}", bucket, err);
            BucketOutcome::Skipped
        }
        Ok(BucketAccess::Accessible) => match scanner.scan_bucket(client, &bucket).await {
            Ok(ScanOutcome::Scanned(stats)) => BucketOutcome::Scanned(stats),
            Ok(ScanOutcome::Empty) => BucketOutcome::Empty,
            Err(err @ ScanError::GovernorClosed { .. }) => {
                debug!("{}", err);
                BucketOutcome::Failed
            }
            Err(err) => {
                error!("Scan of bucket '{}' failed: {}", err.bucket(), err);
                BucketOutcome::Failed
            }
        },
    }
}
