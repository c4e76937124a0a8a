use std::sync::Arc;

use super::*;

fn parser() -> Result<LogLineParser, String> {
    LogLineParser::new().map_err(|err| format!("pattern failed to compile: {}", err))
}

fn parse_all(parser: &LogLineParser, line: &str) -> Vec<Observation> {
    parser.parse(line).collect()
}

#[test]
fn parse_extracts_response_then_request_size() -> Result<(), String> {
    let parser = parser()?;
    let records = parse_all(&parser, r#""GET /a" 200 ref 10 50 3""#);
    let expected = vec![Observation::new(LogMethod::Get, Some(50), Some(10))];
    if records != expected {
        return Err(format!("Unexpected records: {:?}", records));
    }
    Ok(())
}

#[test]
fn parse_is_repeatable() -> Result<(), String> {
    let parser = parser()?;
    let line = r#"10.0.0.1 [06/Feb/2024:00:00:38 +0000] "PUT /bucket/key HTTP/1.1" 200 - 512 2048 7 5 "-" "aws-cli""#;
    let first = parse_all(&parser, line);
    let second = parse_all(&parser, line);
    if first != second || first.len() != 1 {
        return Err(format!("Parse not repeatable: {:?} vs {:?}", first, second));
    }
    Ok(())
}

#[test]
fn parse_placeholder_sizes_are_absent() -> Result<(), String> {
    let parser = parser()?;
    let records = parse_all(&parser, r#"GET /x" 200 ua - 123 -"#);
    let expected = vec![Observation::new(LogMethod::Get, Some(123), None)];
    if records != expected {
        return Err(format!("Unexpected records: {:?}", records));
    }
    Ok(())
}

#[test]
fn parse_emits_every_embedded_record() -> Result<(), String> {
    let parser = parser()?;
    let line = r#""HEAD /a" 200 - 0 0 1 "POST /b" 201 - 9 40 2"#;
    let records = parse_all(&parser, line);
    let expected = vec![
        Observation::new(LogMethod::Head, Some(0), Some(0)),
        Observation::new(LogMethod::Post, Some(40), Some(9)),
    ];
    if records != expected {
        return Err(format!("Unexpected records: {:?}", records));
    }
    Ok(())
}

#[test]
fn parse_skips_lines_without_a_record() -> Result<(), String> {
    let parser = parser()?;
    for line in [
        "",
        "garbage line",
        r#""DELETE /a" 204 - 0 0 1"#,
        r#""GET /a" abc ref 1 2 3"#,
        r#""GET /a" 200 ref 1 2"#,
    ] {
        let records = parse_all(&parser, line);
        if !records.is_empty() {
            return Err(format!("Expected no records for {:?}: {:?}", line, records));
        }
    }
    Ok(())
}

#[test]
fn record_counts_method_even_without_sizes() -> Result<(), String> {
    let mut metrics = BucketMetrics::new("de", "owner");
    metrics.record(&Observation::new(LogMethod::Get, None, None));
    metrics.record(&Observation::new(LogMethod::Get, Some(123), None));
    if metrics.requests(LogMethod::Get) != 2 {
        return Err("Expected two GET requests".to_owned());
    }
    if metrics.request_bytes(LogMethod::Get) != 123 {
        return Err("Unexpected GET request bytes".to_owned());
    }
    if metrics.response_sizes.contains_key(&LogMethod::Get) {
        return Err("Response size should stay untouched".to_owned());
    }
    if metrics.requests(LogMethod::Put) != 0 {
        return Err("Absent method must read as zero".to_owned());
    }
    Ok(())
}

fn sample_observations() -> Vec<Observation> {
    let mut observations = Vec::new();
    for index in 0..40u64 {
        let method = match index % 4 {
            0 => LogMethod::Get,
            1 => LogMethod::Put,
            2 => LogMethod::Post,
            _ => LogMethod::Head,
        };
        let request = if index % 3 == 0 { None } else { Some(index) };
        let response = if index % 5 == 0 {
            None
        } else {
            Some(index.saturating_mul(10))
        };
        observations.push(Observation::new(method, request, response));
    }
    observations
}

#[test]
fn recording_order_does_not_change_totals() -> Result<(), String> {
    let observations = sample_observations();

    let forward = AggregateStore::new();
    forward.begin_scan("b", "de", "o");
    for observation in &observations {
        if !forward.record_observation("b", observation) {
            return Err("Expected pending scan".to_owned());
        }
    }
    forward.finish_scan("b");

    let reversed = AggregateStore::new();
    reversed.begin_scan("b", "de", "o");
    for observation in observations.iter().rev() {
        reversed.record_observation("b", observation);
    }
    reversed.finish_scan("b");

    if forward.bucket("b") != reversed.bucket("b") || forward.bucket("b").is_none() {
        return Err("Totals depend on recording order".to_owned());
    }
    Ok(())
}

#[test]
fn concurrent_recording_loses_no_updates() -> Result<(), String> {
    let store = Arc::new(AggregateStore::new());
    store.begin_scan("b", "de", "o");
    let observations = sample_observations();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let observations = observations.clone();
        handles.push(std::thread::spawn(move || {
            for observation in &observations {
                store.record_observation("b", observation);
            }
        }));
    }
    for handle in handles {
        handle
            .join()
            .map_err(|_panic| "recording thread panicked".to_owned())?;
    }
    store.finish_scan("b");

    let mut expected = BucketMetrics::new("de", "o");
    for _ in 0..8 {
        for observation in &observations {
            expected.record(observation);
        }
    }
    if store.bucket("b") != Some(expected) {
        return Err("Concurrent totals differ from sequential totals".to_owned());
    }
    Ok(())
}

#[test]
fn finish_scan_replaces_previous_entry() -> Result<(), String> {
    let store = AggregateStore::new();
    let mut old = BucketMetrics::new("de", "old-owner");
    old.record(&Observation::new(LogMethod::Put, Some(1), Some(1)));
    store.upsert_bucket("b", old);

    store.begin_scan("b", "de", "new-owner");
    store.record_observation("b", &Observation::new(LogMethod::Get, Some(5), Some(6)));
    if !store.finish_scan("b") {
        return Err("Expected pending scan".to_owned());
    }

    let current = store.bucket("b").ok_or_else(|| "Missing entry".to_owned())?;
    if current.owner != "new-owner" || current.requests(LogMethod::Put) != 0 {
        return Err(format!("Entry was merged instead of replaced: {:?}", current));
    }
    if current.requests(LogMethod::Get) != 1 {
        return Err("Missing new observation".to_owned());
    }
    Ok(())
}

#[test]
fn abandoned_scan_keeps_stale_entry() -> Result<(), String> {
    let store = AggregateStore::new();
    let mut old = BucketMetrics::new("de", "owner");
    old.record(&Observation::new(LogMethod::Get, None, Some(7)));
    store.upsert_bucket("b", old.clone());

    store.begin_scan("b", "de", "owner");
    store.record_observation("b", &Observation::new(LogMethod::Put, None, None));
    store.abandon_scan("b");

    if store.bucket("b") != Some(old) {
        return Err("Abandoned scan touched the registry".to_owned());
    }
    if store.record_observation("b", &Observation::new(LogMethod::Put, None, None)) {
        return Err("Recording without a pending scan should be refused".to_owned());
    }
    if store.finish_scan("b") {
        return Err("Nothing should be left to finish".to_owned());
    }
    Ok(())
}

#[test]
fn snapshot_projects_tag_labels() -> Result<(), String> {
    let store = AggregateStore::new();
    let mut metrics = BucketMetrics::new("de", UNKNOWN_OWNER);
    metrics.record(&Observation::new(LogMethod::Get, Some(50), Some(10)));
    metrics.record(&Observation::new(LogMethod::Put, Some(30), Some(20)));
    store.upsert_bucket("b2", metrics);
    store.set_tags(
        "b2",
        TagSet::from([
            ("Enviroment".to_owned(), "prod".to_owned()),
            ("Namespace".to_owned(), "billing".to_owned()),
        ]),
    );

    let samples = store.snapshot().samples();
    if samples.len() != 2 {
        return Err(format!("Unexpected samples: {:?}", samples));
    }
    let get = samples
        .iter()
        .find(|sample| sample.method == LogMethod::Get)
        .ok_or_else(|| "Missing GET sample".to_owned())?;
    if get.environment != "prod" || get.namespace != "billing" || !get.tenant.is_empty() {
        return Err(format!("Unexpected labels: {:?}", get));
    }
    if get.owner != UNKNOWN_OWNER || get.request_bytes != 50 || get.response_bytes != 10 {
        return Err(format!("Unexpected values: {:?}", get));
    }
    Ok(())
}

#[test]
fn merged_object_totals_match_recorded_observations() -> Result<(), String> {
    let observations = sample_observations();
    let (first, second) = observations.split_at(17);

    let recorded = AggregateStore::new();
    recorded.begin_scan("b", "de", "o");
    recorded.record_observations("b", &observations);
    recorded.finish_scan("b");

    let merged = AggregateStore::new();
    merged.begin_scan("b", "de", "o");
    for object in [first, second] {
        let mut totals = BucketMetrics::default();
        for observation in object {
            totals.record(observation);
        }
        if !merged.merge_metrics("b", &totals) {
            return Err("Expected pending scan".to_owned());
        }
    }
    merged.finish_scan("b");

    let bucket = merged.bucket("b").ok_or_else(|| "Missing entry".to_owned())?;
    if Some(&bucket) != recorded.bucket("b").as_ref() || bucket.owner != "o" {
        return Err(format!("Merged totals differ: {:?}", bucket));
    }
    if merged.merge_metrics("b", &BucketMetrics::default()) {
        return Err("Merging without a pending scan should be refused".to_owned());
    }
    Ok(())
}
