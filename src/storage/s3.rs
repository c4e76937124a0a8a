use std::sync::Arc;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use futures_util::{StreamExt, TryStreamExt};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Method, Response, Url};
use tracing::debug;

use crate::aggregate::TagSet;
use crate::args::DEFAULT_USER_AGENT;
use crate::error::{StorageError, StorageResult};

use super::signing::signed_headers;
use super::xml::{
    AccessControlPolicy, ErrorBody, ListAllMyBucketsResult, ListBucketV2Result, Tagging, decode,
};
use super::{
    BucketAccess, ClientSettings, ConnectStorage, EndpointConfig, ObjectPage, ObjectStream,
    StorageClient,
};

const NO_SUCH_TAG_SET: &str = "NoSuchTagSet";

/// Everything but `A-Za-z0-9-._~` is escaped in bucket and key segments.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Path-style S3 REST client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct S3Client {
    http: Client,
    base_url: Url,
    region: String,
    credentials: Credentials,
}

impl S3Client {
    /// Binds a shared HTTP client to an endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint URL cannot carry bucket paths.
    pub fn new(http: Client, endpoint: &EndpointConfig) -> StorageResult<Self> {
        if endpoint.base_url.cannot_be_a_base() {
            return Err(StorageError::UnaddressableUrl {
                url: endpoint.base_url.to_string(),
            });
        }
        Ok(Self {
            http,
            base_url: endpoint.base_url.clone(),
            region: endpoint.region.clone(),
            credentials: endpoint.credentials.clone(),
        })
    }

    /// Joins `segments` onto the base path, each encoded with the SigV4
    /// unreserved set so the wire path is the path that gets signed.
    fn url(&self, segments: &[&str]) -> Url {
        let mut path = self.base_url.path().trim_end_matches('/').to_owned();
        for segment in segments {
            path.push('/');
            path.extend(utf8_percent_encode(segment, PATH_SEGMENT));
        }
        let mut url = self.base_url.clone();
        url.set_path(&path);
        url
    }

    fn object_url(&self, bucket: &str, key: &str) -> Url {
        let mut segments = vec![bucket];
        segments.extend(key.split('/'));
        self.url(&segments)
    }

    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
    ) -> StorageResult<Response> {
        let headers = signed_headers(&method, &url, &self.credentials, &self.region)?;
        debug!(operation, url = %url, "Sending storage request");
        let response = self
            .http
            .request(method, url)
            .headers(headers)
            .send()
            .await
            .map_err(|err| StorageError::Transport {
                operation,
                source: err,
            })?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(service_error(operation, response).await)
    }

    async fn send_for_xml<T>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> StorageResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.send(operation, Method::GET, url).await?;
        let body = response
            .text()
            .await
            .map_err(|err| StorageError::Transport {
                operation,
                source: err,
            })?;
        decode(operation, &body)
    }
}

async fn service_error(operation: &'static str, response: Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed = if body.trim().is_empty() {
        None
    } else {
        decode::<ErrorBody>(operation, &body).ok()
    };
    let fallback_code = status
        .canonical_reason()
        .unwrap_or("Unknown")
        .replace(' ', "");
    let (code, message) = match parsed {
        Some(error) if !error.code.is_empty() => (error.code, error.message),
        Some(_) | None => (fallback_code, String::new()),
    };
    StorageError::Service {
        operation,
        status,
        code,
        message,
    }
}

#[async_trait]
impl StorageClient for S3Client {
    fn region(&self) -> &str {
        &self.region
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        let url = self.url(&[]);
        let result: ListAllMyBucketsResult = self.send_for_xml("ListBuckets", url).await?;
        Ok(result
            .buckets
            .bucket
            .into_iter()
            .map(|bucket| bucket.name)
            .filter(|name| !name.is_empty())
            .collect())
    }

    async fn head_bucket(&self, bucket: &str) -> StorageResult<BucketAccess> {
        let url = self.url(&[bucket]);
        match self.send("HeadBucket", Method::HEAD, url).await {
            Ok(_response) => Ok(BucketAccess::Accessible),
            Err(err) if err.is_forbidden() => Ok(BucketAccess::Forbidden),
            Err(err) => Err(err),
        }
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> StorageResult<ObjectPage> {
        let mut url = self.url(&[bucket]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("list-type", "2");
            query.append_pair("prefix", prefix);
            query.append_pair("max-keys", &page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("continuation-token", token);
            }
        }
        let result: ListBucketV2Result = self.send_for_xml("ListObjectsV2", url).await?;
        let next_page_token = if result.is_truncated {
            result
                .next_continuation_token
                .filter(|token| !token.is_empty())
        } else {
            None
        };
        Ok(ObjectPage {
            keys: result
                .contents
                .into_iter()
                .map(|object| object.key)
                .collect(),
            next_page_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream> {
        let url = self.object_url(bucket, key);
        let response = self.send("GetObject", Method::GET, url).await?;
        Ok(response
            .bytes_stream()
            .map_err(|err| StorageError::Body { source: err })
            .boxed())
    }

    async fn get_bucket_acl(&self, bucket: &str) -> StorageResult<Option<String>> {
        let mut url = self.url(&[bucket]);
        url.query_pairs_mut().append_key_only("acl");
        let policy: AccessControlPolicy = self.send_for_xml("GetBucketAcl", url).await?;
        Ok(policy.owner_name())
    }

    async fn get_bucket_tagging(&self, bucket: &str) -> StorageResult<TagSet> {
        let mut url = self.url(&[bucket]);
        url.query_pairs_mut().append_key_only("tagging");
        match self.send_for_xml::<Tagging>("GetBucketTagging", url).await {
            Ok(tagging) => Ok(tagging.into_tags()),
            Err(err) if err.code() == Some(NO_SUCH_TAG_SET) => Ok(TagSet::new()),
            Err(err) => Err(err),
        }
    }
}

/// Shares one connection pool across every endpoint client.
#[derive(Debug, Clone)]
pub struct S3Connector {
    http: Client,
}

impl S3Connector {
    /// Builds the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(settings: ClientSettings) -> StorageResult<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|err| StorageError::BuildClient { source: err })?;
        Ok(Self { http })
    }
}

impl ConnectStorage for S3Connector {
    fn connect(&self, endpoint: &EndpointConfig) -> StorageResult<Arc<dyn StorageClient>> {
        Ok(Arc::new(S3Client::new(self.http.clone(), endpoint)?))
    }
}
