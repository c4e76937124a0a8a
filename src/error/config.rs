use super::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Config '{field}' must be >= 1: {source}")]
    FieldMustBePositive {
        field: String,
        #[source]
        source: ValidationError,
    },
    #[error("Invalid config '{field}': {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("Endpoint {index} must set a region.")]
    EndpointMissingRegion { index: usize },
    #[error("Endpoint '{region}' has an invalid base_url '{url}': {source}")]
    EndpointInvalidUrl {
        region: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Endpoint '{region}' is defined more than once.")]
    DuplicateEndpoint { region: String },
    #[error("Endpoint '{region}' has no credentials (set --access-key/--secret-key or the endpoint keys).")]
    MissingCredentials { region: String },
}
