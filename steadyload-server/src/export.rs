//! CSV export of the run history
use std::fmt::Write;
use steadyload::RunReport;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const HEADERS: [&str; 16] = [
    "Timestamp",
    "URL",
    "QPS",
    "Duration",
    "# Requests",
    "# Fails",
    "Median (ms)",
    "90 %ile",
    "99 %ile",
    "Average (ms)",
    "Min (ms)",
    "Max (ms)",
    "Average size (bytes)",
    "Error Rate (%)",
    "Current RPS",
    "Failures per sec",
];

/// Renders reports as CSV, one row per run.
///
/// Latencies are converted to milliseconds and every float is written with two decimals.
pub fn export_csv(reports: &[RunReport]) -> String {
    let mut out = HEADERS.join(",");
    out.push('\n');

    for r in reports {
        // NOTE: Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
            timestamp(r.completed_at),
            csv_escape(&r.target_url),
            r.rate_per_second,
            r.duration_seconds,
            r.total_requests,
            r.failed_requests,
            r.median_latency * 1000.,
            r.p90_latency * 1000.,
            r.p99_latency * 1000.,
            r.avg_latency * 1000.,
            r.min_latency * 1000.,
            r.max_latency * 1000.,
            r.avg_response_size,
            r.error_rate_percent,
            r.observed_requests_per_second,
            r.observed_failures_per_second,
        );
    }
    out
}

fn timestamp(unix_seconds: f64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos((unix_seconds * 1e9) as i128)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| unix_seconds.to_string())
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
