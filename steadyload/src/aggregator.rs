//! Reduction of raw outcomes into a [`RunReport`]
use std::time::Duration;
use steadyload_core::{Outcome, RunReport, RunRequest};

/// Computes the report for a finished run.
///
/// Pure and deterministic: the result depends only on the arguments, and not on the order of
/// `outcomes`. `elapsed` is the wall-clock time from run start to aggregation.
pub fn aggregate(
    request: &RunRequest,
    outcomes: &[Outcome],
    elapsed: Duration,
    completed_at: f64,
) -> RunReport {
    let mut latencies = vec![];
    let mut size_total: u128 = 0;
    for outcome in outcomes {
        if let Outcome::Success { latency, size } = outcome {
            latencies.push(latency.as_secs_f64());
            size_total += u128::from(*size);
        }
    }
    latencies.sort_by(f64::total_cmp);

    let total = outcomes.len() as u64;
    let successful = latencies.len() as u64;
    let failed = total - successful;

    let latency = LatencySummary::from_sorted(&latencies);
    let avg_response_size = if successful > 0 {
        size_total as f64 / successful as f64
    } else {
        0.
    };

    RunReport {
        target_url: request.target_url.clone(),
        rate_per_second: request.rate_per_second,
        duration_seconds: request.duration_seconds,
        total_requests: total,
        successful_requests: successful,
        failed_requests: failed,
        error_rate_percent: percent(failed, total),
        median_latency: latency.median,
        p90_latency: latency.p90,
        p99_latency: latency.p99,
        avg_latency: latency.avg,
        min_latency: latency.min,
        max_latency: latency.max,
        avg_response_size,
        observed_requests_per_second: per_second(total, elapsed),
        observed_failures_per_second: per_second(failed, elapsed),
        completed_at,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct LatencySummary {
    median: f64,
    p90: f64,
    p99: f64,
    avg: f64,
    min: f64,
    max: f64,
}

impl LatencySummary {
    fn from_sorted(sorted: &[f64]) -> Self {
        let (Some(min), Some(max)) = (sorted.first(), sorted.last()) else {
            return Self::default();
        };

        Self {
            median: statistical::median(sorted),
            p90: nearest_rank(sorted, 0.90).unwrap_or(*max),
            p99: nearest_rank(sorted, 0.99).unwrap_or(*max),
            avg: statistical::mean(sorted),
            min: *min,
            max: *max,
        }
    }
}

/// Nearest-rank percentile: the sample at `floor(quantile × n)`, clamped to the last sample.
pub fn nearest_rank(sorted: &[f64], quantile: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let idx = (quantile * sorted.len() as f64).floor() as usize;
    sorted.get(idx.min(last)).copied()
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.
    } else {
        100. * part as f64 / total as f64
    }
}

fn per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0. {
        count as f64 / secs
    } else {
        0.
    }
}
