use std::fmt::{self, Write as _};

use serde::Serialize;

use crate::aggregate::{BucketSample, StoreSnapshot};
use crate::args::OutputFormat;
use crate::error::AppResult;
use crate::scan::CycleReport;

#[derive(Debug, Serialize)]
struct JsonSummary<'report> {
    cycle: &'report CycleReport,
    total_requests: u64,
    samples: Vec<BucketSample>,
}

/// Prints the result of a single cycle to stdout.
///
/// # Errors
///
/// Returns an error when the JSON summary cannot be serialized.
pub(crate) fn print_summary(
    format: OutputFormat,
    report: &CycleReport,
    snapshot: &StoreSnapshot,
) -> AppResult<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(report, snapshot),
        OutputFormat::Json => render_json(report, snapshot)?,
    };
    println!("{}", rendered);
    Ok(())
}

pub(crate) fn render_json(report: &CycleReport, snapshot: &StoreSnapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonSummary {
        cycle: report,
        total_requests: snapshot.total_requests(),
        samples: snapshot.samples(),
    })
}

pub(crate) fn render_text(report: &CycleReport, snapshot: &StoreSnapshot) -> String {
    let mut out = String::new();
    if write_text(&mut out, report, snapshot).is_err() {
        out.clear();
    }
    out
}

fn write_text(out: &mut String, report: &CycleReport, snapshot: &StoreSnapshot) -> fmt::Result {
    writeln!(out, "Cycle: {}ms", report.elapsed_ms)?;
    for endpoint in &report.endpoints {
        if let Some(error) = endpoint.error.as_deref() {
            writeln!(out, "Endpoint {}: failed: {}", endpoint.region, error)?;
            continue;
        }
        writeln!(
            out,
            "Endpoint {}: {} buckets ({} scanned, {} empty, {} forbidden, {} skipped, {} failed), {} objects ({} failed), {} records",
            endpoint.region,
            endpoint.buckets_listed,
            endpoint.buckets_scanned,
            endpoint.buckets_empty,
            endpoint.buckets_forbidden,
            endpoint.buckets_skipped,
            endpoint.buckets_failed,
            endpoint.objects_scanned,
            endpoint.objects_failed,
            endpoint.observations
        )?;
    }
    writeln!(out, "Total Requests: {}", snapshot.total_requests())?;
    for sample in snapshot.samples() {
        write!(
            out,
            "{} {} region={} owner={}",
            sample.bucket, sample.method, sample.region, sample.owner
        )?;
        for (label, value) in [
            ("environment", &sample.environment),
            ("namespace", &sample.namespace),
            ("tenant", &sample.tenant),
        ] {
            if !value.is_empty() {
                write!(out, " {}={}", label, value)?;
            }
        }
        writeln!(
            out,
            " requests={} request_bytes={} response_bytes={}",
            sample.requests, sample.request_bytes, sample.response_bytes
        )?;
    }
    Ok(())
}
