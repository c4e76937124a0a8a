use clap::Parser;
use std::time::Duration;

use super::parsers::{parse_duration_arg, parse_endpoint, parse_page_size, parse_positive_usize};
use super::types::{EndpointArg, OutputFormat, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Aggregates S3 access logs per bucket: request counts and transferred bytes by HTTP method, refreshed on a fixed cycle.",
    next_help_heading = "Advanced Options"
)]
pub struct ExporterArgs {
    /// Path to config file (TOML/JSON). Defaults to ./bucketstat.toml or ./bucketstat.json if present.
    #[arg(long, short = 'c', help_heading = "Common Options")]
    pub config: Option<String>,

    /// Storage endpoint as REGION=URL (repeatable). Defaults to the IONOS S3 regions.
    #[arg(long = "endpoint", value_parser = parse_endpoint, help_heading = "Common Options")]
    pub endpoints: Vec<EndpointArg>,

    /// Access key used for every endpoint without its own keys
    #[arg(long = "access-key", env = "AWS_ACCESS_KEY_ID", help_heading = "Common Options")]
    pub access_key: Option<String>,

    /// Secret key used for every endpoint without its own keys
    #[arg(
        long = "secret-key",
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true,
        help_heading = "Common Options"
    )]
    pub secret_key: Option<String>,

    /// Session token for temporary credentials
    #[arg(long = "session-token", env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Wait between the end of one scan cycle and the start of the next (ms/s/m/h)
    #[arg(
        long = "cycle",
        env = "BUCKETSTAT_CYCLE",
        default_value = "200s",
        value_parser = parse_duration_arg,
        help_heading = "Common Options"
    )]
    pub cycle: Duration,

    /// Maximum number of storage requests in flight
    #[arg(
        long = "max-concurrency",
        env = "BUCKETSTAT_MAX_CONCURRENCY",
        default_value = "10",
        value_parser = parse_positive_usize
    )]
    pub max_concurrency: PositiveUsize,

    /// Object keys requested per list page (1-1000)
    #[arg(long = "page-size", default_value = "1000", value_parser = parse_page_size)]
    pub page_size: u32,

    /// Key prefix under which access-log objects are stored
    #[arg(long = "log-prefix", default_value = "logs/")]
    pub log_prefix: String,

    /// Timeout for each storage request (ms/s/m/h)
    #[arg(long = "request-timeout", default_value = "30s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Timeout for establishing connections (ms/s/m/h)
    #[arg(long = "connect-timeout", default_value = "5s", value_parser = parse_duration_arg)]
    pub connect_timeout: Duration,

    /// Run a single cycle, print the aggregated metrics and exit
    #[arg(long, help_heading = "Common Options")]
    pub once: bool,

    /// Summary format for --once
    #[arg(long = "output-format", default_value = "text", value_enum)]
    pub output_format: OutputFormat,

    /// Enable verbose logging (sets log level to debug unless overridden by BUCKETSTAT_LOG/RUST_LOG)
    #[arg(long, short = 'v', alias = "debug", help_heading = "Common Options")]
    pub verbose: bool,
}
