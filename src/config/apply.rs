use std::collections::HashSet;
use std::time::Duration;

use aws_credential_types::Credentials;
use clap::ArgMatches;
use clap::parser::ValueSource;
use url::Url;

use crate::args::{EndpointArg, ExporterArgs, OutputFormat, PositiveUsize, default_endpoints};
use crate::args::parsers::check_page_size;
use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::scan::ScanSettings;
use crate::storage::{ClientSettings, EndpointConfig};

use super::types::{ConfigFile, DurationValue, EndpointEntry};

const CREDENTIALS_PROVIDER: &str = "bucketstat";

/// Everything the exporter needs to run, after all layers are merged.
#[derive(Debug, Clone)]
pub struct ExporterSettings {
    pub scan: ScanSettings,
    pub client: ClientSettings,
    pub endpoints: Vec<EndpointConfig>,
    pub once: bool,
    pub output_format: OutputFormat,
}

/// Copies config-file values into `args` wherever the user did not set
/// the option explicitly.
///
/// # Errors
///
/// Returns an error when a config value is out of range.
pub fn apply_config(
    args: &mut ExporterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_explicit(matches, "cycle")
        && let Some(cycle) = config.cycle.as_ref()
    {
        args.cycle = duration_field(cycle, "cycle")?;
    }

    if !is_explicit(matches, "max_concurrency")
        && let Some(max_concurrency) = config.max_concurrency
    {
        args.max_concurrency = ensure_positive_usize(max_concurrency, "max_concurrency")?;
    }

    if !is_explicit(matches, "page_size")
        && let Some(page_size) = config.page_size
    {
        args.page_size = check_page_size(page_size).map_err(|err| {
            AppError::config(ConfigError::InvalidField {
                field: "page_size",
                source: err,
            })
        })?;
    }

    if !is_explicit(matches, "log_prefix")
        && let Some(prefix) = config.log_prefix.as_ref()
    {
        args.log_prefix.clone_from(prefix);
    }

    if !is_explicit(matches, "request_timeout")
        && let Some(timeout) = config.request_timeout.as_ref()
    {
        args.request_timeout = duration_field(timeout, "request_timeout")?;
    }

    if !is_explicit(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = duration_field(timeout, "connect_timeout")?;
    }

    if !is_explicit(matches, "access_key") && config.access_key.is_some() {
        args.access_key.clone_from(&config.access_key);
    }

    if !is_explicit(matches, "secret_key") && config.secret_key.is_some() {
        args.secret_key.clone_from(&config.secret_key);
    }

    if !is_explicit(matches, "session_token") && config.session_token.is_some() {
        args.session_token.clone_from(&config.session_token);
    }

    if !is_explicit(matches, "output_format")
        && let Some(format) = config.output_format
    {
        args.output_format = format;
    }

    Ok(())
}

/// Builds run settings from merged arguments.
///
/// Endpoints come from `--endpoint` when given, else from the config file,
/// else the built-in defaults.
///
/// # Errors
///
/// Returns an error when an endpoint is malformed, duplicated, or has no
/// credentials.
pub fn resolve_settings(
    args: &ExporterArgs,
    config: Option<&ConfigFile>,
) -> AppResult<ExporterSettings> {
    let entries = endpoint_entries(args, config);
    if entries.is_empty() {
        return Err(AppError::validation(ValidationError::NoEndpoints));
    }

    let mut seen = HashSet::new();
    let mut endpoints = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let endpoint = resolve_endpoint(index, entry, args)?;
        if !seen.insert(endpoint.region.clone()) {
            return Err(AppError::config(ConfigError::DuplicateEndpoint {
                region: endpoint.region,
            }));
        }
        endpoints.push(endpoint);
    }

    Ok(ExporterSettings {
        scan: ScanSettings {
            max_concurrency: args.max_concurrency.get(),
            page_size: args.page_size,
            log_prefix: args.log_prefix.clone(),
            cycle_interval: args.cycle,
        },
        client: ClientSettings {
            request_timeout: args.request_timeout,
            connect_timeout: args.connect_timeout,
        },
        endpoints,
        once: args.once,
        output_format: args.output_format,
    })
}

fn endpoint_entries(args: &ExporterArgs, config: Option<&ConfigFile>) -> Vec<EndpointEntry> {
    if !args.endpoints.is_empty() {
        return args.endpoints.iter().map(entry_from_arg).collect();
    }
    if let Some(entries) = config.and_then(|config| config.endpoints.as_ref())
        && !entries.is_empty()
    {
        return entries.clone();
    }
    default_endpoints().iter().map(entry_from_arg).collect()
}

fn entry_from_arg(arg: &EndpointArg) -> EndpointEntry {
    EndpointEntry {
        region: arg.region.clone(),
        base_url: arg.url.clone(),
        ..EndpointEntry::default()
    }
}

fn resolve_endpoint(
    index: usize,
    entry: &EndpointEntry,
    args: &ExporterArgs,
) -> AppResult<EndpointConfig> {
    let region = entry.region.trim();
    if region.is_empty() {
        return Err(AppError::config(ConfigError::EndpointMissingRegion { index }));
    }
    let base_url = Url::parse(entry.base_url.trim()).map_err(|err| {
        AppError::config(ConfigError::EndpointInvalidUrl {
            region: region.to_owned(),
            url: entry.base_url.clone(),
            source: err,
        })
    })?;

    let access_key = entry.access_key.as_ref().or(args.access_key.as_ref());
    let secret_key = entry.secret_key.as_ref().or(args.secret_key.as_ref());
    let (Some(access_key), Some(secret_key)) = (access_key, secret_key) else {
        return Err(AppError::config(ConfigError::MissingCredentials {
            region: region.to_owned(),
        }));
    };
    let session_token = entry
        .session_token
        .as_ref()
        .or(args.session_token.as_ref())
        .cloned();

    Ok(EndpointConfig {
        region: region.to_owned(),
        base_url,
        credentials: Credentials::new(
            access_key.as_str(),
            secret_key.as_str(),
            session_token,
            None,
            CREDENTIALS_PROVIDER,
        ),
    })
}

/// CLI flags and their environment variables both beat the config file.
fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn duration_field(value: &DurationValue, field: &'static str) -> AppResult<Duration> {
    value.to_duration().map_err(|err| {
        AppError::config(ConfigError::InvalidField { field, source: err })
    })
}
