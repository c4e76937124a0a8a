//! Object-storage access used by the scan pipeline.
//!
//! [`StorageClient`] is the capability the scanners consume; [`S3Client`]
//! implements it over the S3 REST API with SigV4-signed `reqwest` calls.
mod s3;
mod signing;
mod xml;


use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use url::Url;

pub use s3::{S3Client, S3Connector};

pub use crate::error::{StorageError, StorageResult};
use crate::aggregate::TagSet;

/// Streamed object body.
pub type ObjectStream = BoxStream<'static, StorageResult<Bytes>>;

/// Outcome of the head-bucket accessibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketAccess {
    Accessible,
    Forbidden,
}

/// One page of object keys. `next_page_token` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    pub next_page_token: Option<String>,
}

/// A region-specific storage API base URL plus the credentials used there.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub region: String,
    pub base_url: Url,
    pub credentials: Credentials,
}

/// HTTP settings shared by every endpoint client.
#[derive(Debug, Clone, Copy)]
pub struct ClientSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

/// Storage operations needed to discover buckets and read their access logs.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Region label recorded on every bucket scanned through this client.
    fn region(&self) -> &str;

    async fn list_buckets(&self) -> StorageResult<Vec<String>>;

    /// `Ok(BucketAccess::Forbidden)` for 403 responses; other failures are errors.
    async fn head_bucket(&self, bucket: &str) -> StorageResult<BucketAccess>;

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> StorageResult<ObjectPage>;

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream>;

    /// Display name of the bucket owner, if the ACL carries one.
    async fn get_bucket_acl(&self, bucket: &str) -> StorageResult<Option<String>>;

    /// Bucket tags; a bucket without a tag set yields an empty map.
    async fn get_bucket_tagging(&self, bucket: &str) -> StorageResult<TagSet>;
}

/// Builds the client for one endpoint at the start of every cycle.
pub trait ConnectStorage: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when no client can be built for the endpoint.
    fn connect(&self, endpoint: &EndpointConfig) -> StorageResult<Arc<dyn StorageClient>>;
}
