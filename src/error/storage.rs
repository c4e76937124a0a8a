use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid endpoint URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Endpoint URL '{url}' cannot address buckets.")]
    UnaddressableUrl { url: String },
    #[error("Failed to build sigv4 params: {source}")]
    SigV4Params {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to build sigv4 request: {source}")]
    SigV4Request {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to sign request: {source}")]
    SigV4Sign {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to build sign request: {source}")]
    SigV4BuildSign {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} returned {status} {code}: {message}")]
    Service {
        operation: &'static str,
        status: StatusCode,
        code: String,
        message: String,
    },
    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: quick_xml::DeError,
    },
    #[error("Failed to read object body: {source}")]
    Body {
        #[source]
        source: reqwest::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            StorageError::Service { status, .. } => Some(*status),
            StorageError::Transport { source, .. } | StorageError::Body { source } => {
                source.status()
            }
            StorageError::BuildClient { .. }
            | StorageError::InvalidUrl { .. }
            | StorageError::UnaddressableUrl { .. }
            | StorageError::SigV4Params { .. }
            | StorageError::SigV4Request { .. }
            | StorageError::SigV4Sign { .. }
            | StorageError::SigV4BuildSign { .. }
            | StorageError::Decode { .. } => None,
        }
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            StorageError::Service { code, .. } => Some(code.as_str()),
            StorageError::BuildClient { .. }
            | StorageError::InvalidUrl { .. }
            | StorageError::UnaddressableUrl { .. }
            | StorageError::SigV4Params { .. }
            | StorageError::SigV4Request { .. }
            | StorageError::SigV4Sign { .. }
            | StorageError::SigV4BuildSign { .. }
            | StorageError::Transport { .. }
            | StorageError::Decode { .. }
            | StorageError::Body { .. } => None,
        }
    }

    /// 403 responses, including `AccessDenied` bodies served with other codes.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN) || self.code() == Some("AccessDenied")
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self.code() {
            Some("NoSuchBucket") => true,
            None | Some("NotFound") => self.status() == Some(StatusCode::NOT_FOUND),
            Some(_) => false,
        }
    }
}
