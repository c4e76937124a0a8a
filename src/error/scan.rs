use thiserror::Error;

use super::StorageError;

/// Failures that abort the scan of one bucket for the current cycle.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to resolve owner of bucket '{bucket}': {source}")]
    OwnerLookup {
        bucket: String,
        #[source]
        source: StorageError,
    },
    #[error("Failed to list objects in bucket '{bucket}': {source}")]
    ListObjects {
        bucket: String,
        #[source]
        source: StorageError,
    },
    #[error("Bucket '{bucket}' does not exist.")]
    NoSuchBucket { bucket: String },
    #[error("Scan of bucket '{bucket}' stopped: {source}")]
    GovernorClosed {
        bucket: String,
        #[source]
        source: tokio::sync::AcquireError,
    },
}

impl ScanError {
    pub(crate) fn list_objects(bucket: &str, source: StorageError) -> Self {
        if source.is_not_found() {
            return ScanError::NoSuchBucket {
                bucket: bucket.to_owned(),
            };
        }
        ScanError::ListObjects {
            bucket: bucket.to_owned(),
            source,
        }
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            ScanError::OwnerLookup { bucket, .. }
            | ScanError::ListObjects { bucket, .. }
            | ScanError::NoSuchBucket { bucket }
            | ScanError::GovernorClosed { bucket, .. } => bucket,
        }
    }
}
