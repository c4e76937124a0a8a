use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use reqwest::StatusCode;

use crate::aggregate::TagSet;
use crate::error::{StorageError, StorageResult};
use crate::storage::{
    BucketAccess, ConnectStorage, EndpointConfig, ObjectPage, ObjectStream, StorageClient,
};

pub(super) fn service_error(operation: &'static str, status: StatusCode, code: &str) -> StorageError {
    StorageError::Service {
        operation,
        status,
        code: code.to_owned(),
        message: "fake".to_owned(),
    }
}

/// In-memory endpoint. Object keys are served in insertion order and page
/// tokens are plain offsets.
#[derive(Default)]
pub(super) struct FakeStorage {
    region: String,
    buckets: Vec<String>,
    objects: HashMap<String, Vec<(String, String)>>,
    owners: HashMap<String, String>,
    tags: HashMap<String, TagSet>,
    forbidden: HashSet<String>,
    failing_owner: HashSet<String>,
    failing_objects: HashSet<String>,
    failing_list: bool,
    failing_heads: HashSet<String>,
    failing_pages: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    page_tokens: Mutex<Vec<Option<String>>>,
}

impl FakeStorage {
    pub(super) fn new(region: &str) -> Self {
        Self {
            region: region.to_owned(),
            ..Self::default()
        }
    }

    pub(super) fn bucket(mut self, name: &str) -> Self {
        self.buckets.push(name.to_owned());
        self.objects.entry(name.to_owned()).or_default();
        self
    }

    pub(super) fn object(mut self, bucket: &str, key: &str, body: &str) -> Self {
        self.objects
            .entry(bucket.to_owned())
            .or_default()
            .push((key.to_owned(), body.to_owned()));
        self
    }

    pub(super) fn owner(mut self, bucket: &str, owner: &str) -> Self {
        self.owners.insert(bucket.to_owned(), owner.to_owned());
        self
    }

    pub(super) fn tag(mut self, bucket: &str, key: &str, value: &str) -> Self {
        self.tags
            .entry(bucket.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
        self
    }

    pub(super) fn forbidden(mut self, bucket: &str) -> Self {
        self.forbidden.insert(bucket.to_owned());
        self
    }

    pub(super) fn failing_owner(mut self, bucket: &str) -> Self {
        self.failing_owner.insert(bucket.to_owned());
        self
    }

    pub(super) fn failing_object(mut self, key: &str) -> Self {
        self.failing_objects.insert(key.to_owned());
        self
    }

    pub(super) fn failing_list(mut self) -> Self {
        self.failing_list = true;
        self
    }

    pub(super) fn failing_head(mut self, bucket: &str) -> Self {
        self.failing_heads.insert(bucket.to_owned());
        self
    }

    /// Fails the listing call that carries `token`.
    pub(super) fn failing_page(mut self, token: &str) -> Self {
        self.failing_pages.insert(token.to_owned());
        self
    }

    pub(super) fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(super) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(super) fn page_tokens(&self) -> Vec<Option<String>> {
        self.page_tokens
            .lock()
            .map(|tokens| tokens.clone())
            .unwrap_or_default()
    }

    async fn call(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn keys(&self, bucket: &str) -> StorageResult<&[(String, String)]> {
        self.objects
            .get(bucket)
            .map(Vec::as_slice)
            .ok_or_else(|| service_error("ListObjectsV2", StatusCode::NOT_FOUND, "NoSuchBucket"))
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    fn region(&self) -> &str {
        &self.region
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        self.call().await;
        if self.failing_list {
            return Err(service_error(
                "ListBuckets",
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
            ));
        }
        Ok(self.buckets.clone())
    }

    async fn head_bucket(&self, bucket: &str) -> StorageResult<BucketAccess> {
        self.call().await;
        if self.failing_heads.contains(bucket) {
            return Err(service_error(
                "HeadBucket",
                StatusCode::SERVICE_UNAVAILABLE,
                "ServiceUnavailable",
            ));
        }
        if self.forbidden.contains(bucket) {
            return Ok(BucketAccess::Forbidden);
        }
        Ok(BucketAccess::Accessible)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> StorageResult<ObjectPage> {
        self.call().await;
        if let Ok(mut tokens) = self.page_tokens.lock() {
            tokens.push(page_token.map(str::to_owned));
        }
        if page_token.is_some_and(|token| self.failing_pages.contains(token)) {
            return Err(service_error(
                "ListObjectsV2",
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
            ));
        }
        let matching: Vec<&String> = self
            .keys(bucket)?
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with(prefix))
            .collect();
        let start = page_token
            .and_then(|token| token.parse::<usize>().ok())
            .unwrap_or(0);
        let size = usize::try_from(page_size).unwrap_or(usize::MAX);
        let end = start.saturating_add(size).min(matching.len());
        let keys = matching
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|key| (*key).clone())
            .collect();
        let next_page_token = (end < matching.len()).then(|| end.to_string());
        Ok(ObjectPage {
            keys,
            next_page_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream> {
        self.call().await;
        if self.failing_objects.contains(key) {
            return Err(service_error("GetObject", StatusCode::INTERNAL_SERVER_ERROR, "InternalError"));
        }
        let body = self
            .keys(bucket)?
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| service_error("GetObject", StatusCode::NOT_FOUND, "NoSuchKey"))?;
        // Split mid-line so records cross chunk boundaries.
        let bytes = body.into_bytes();
        let middle = bytes.len().checked_div(2).unwrap_or(0);
        let (head, tail) = bytes.split_at(middle);
        let chunks = vec![
            Ok(Bytes::copy_from_slice(head)),
            Ok(Bytes::copy_from_slice(tail)),
        ];
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn get_bucket_acl(&self, bucket: &str) -> StorageResult<Option<String>> {
        self.call().await;
        if self.failing_owner.contains(bucket) {
            return Err(service_error("GetBucketAcl", StatusCode::INTERNAL_SERVER_ERROR, "InternalError"));
        }
        Ok(self.owners.get(bucket).cloned())
    }

    async fn get_bucket_tagging(&self, bucket: &str) -> StorageResult<TagSet> {
        self.call().await;
        Ok(self.tags.get(bucket).cloned().unwrap_or_default())
    }
}

/// Hands out prepared fakes by region; unknown regions fail to connect.
#[derive(Default)]
pub(super) struct FakeConnector {
    clients: HashMap<String, Arc<FakeStorage>>,
}

impl FakeConnector {
    pub(super) fn with(mut self, storage: Arc<FakeStorage>) -> Self {
        self.clients.insert(storage.region.clone(), storage);
        self
    }
}

impl ConnectStorage for FakeConnector {
    fn connect(&self, endpoint: &EndpointConfig) -> StorageResult<Arc<dyn StorageClient>> {
        let Some(client) = self.clients.get(&endpoint.region) else {
            return Err(StorageError::UnaddressableUrl {
                url: endpoint.base_url.to_string(),
            });
        };
        let client: Arc<dyn StorageClient> = client.clone();
        Ok(client)
    }
}
