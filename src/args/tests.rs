use std::time::Duration;

use clap::Parser;

use super::parsers::{parse_duration_arg, parse_endpoint};
use super::*;
use crate::error::ValidationError;

fn parse(args: &[&str]) -> Result<ExporterArgs, String> {
    ExporterArgs::try_parse_from(std::iter::once("bucketstat").chain(args.iter().copied()))
        .map_err(|err| format!("parse failed: {}", err))
}

#[test]
fn defaults_match_documented_values() -> Result<(), String> {
    let args = parse(&[])?;
    if args.max_concurrency.get() != 10 || args.page_size != 1000 || args.log_prefix != "logs/" {
        return Err(format!("Unexpected defaults {:?}", args));
    }
    if args.request_timeout != Duration::from_secs(30) || args.connect_timeout != Duration::from_secs(5) {
        return Err(format!("Unexpected timeouts {:?}", args));
    }
    if args.once || args.output_format != OutputFormat::Text || !args.endpoints.is_empty() {
        return Err(format!("Unexpected flags {:?}", args));
    }
    Ok(())
}

#[test]
fn endpoint_flags_are_repeatable() -> Result<(), String> {
    let args = parse(&[
        "--endpoint",
        "de=https://s3.example.com",
        "--endpoint",
        "us = http://127.0.0.1:9000",
        "--cycle",
        "5m",
    ])?;
    let regions: Vec<&str> = args.endpoints.iter().map(|e| e.region.as_str()).collect();
    if regions != ["de", "us"] {
        return Err(format!("Unexpected regions {:?}", regions));
    }
    if args.endpoints.get(1).map(|e| e.url.as_str()) != Some("http://127.0.0.1:9000") {
        return Err(format!("Unexpected url {:?}", args.endpoints));
    }
    if args.cycle != Duration::from_secs(300) {
        return Err(format!("Unexpected cycle {:?}", args.cycle));
    }
    Ok(())
}

#[test]
fn rejects_out_of_range_values() -> Result<(), String> {
    for bad in [
        vec!["--page-size", "0"],
        vec!["--page-size", "1001"],
        vec!["--max-concurrency", "0"],
        vec!["--cycle", "0s"],
        vec!["--endpoint", "=http://x"],
        vec!["--endpoint", "no-separator"],
    ] {
        if parse(&bad).is_ok() {
            return Err(format!("Expected {:?} to be rejected", bad));
        }
    }
    Ok(())
}

#[test]
fn duration_units_are_parsed() -> Result<(), String> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("7", Duration::from_secs(7)),
        ("2h", Duration::from_secs(7200)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_arg(input).map_err(|err| err.to_string())?;
        if parsed != expected {
            return Err(format!("{} parsed as {:?}", input, parsed));
        }
    }
    if parse_duration_arg("3d").is_ok() {
        return Err("Unknown unit must fail".to_owned());
    }
    Ok(())
}

#[test]
fn endpoint_parser_reports_empty_region() -> Result<(), String> {
    match parse_endpoint(" =https://x") {
        Err(ValidationError::EndpointRegionEmpty { .. }) => Ok(()),
        other => Err(format!("Unexpected result {:?}", other)),
    }
}

#[test]
fn default_endpoints_cover_both_regions() -> Result<(), String> {
    let regions: Vec<String> = default_endpoints()
        .into_iter()
        .map(|endpoint| endpoint.region)
        .collect();
    if regions != ["eu-central-2", "de"] {
        return Err(format!("Unexpected defaults {:?}", regions));
    }
    Ok(())
}
