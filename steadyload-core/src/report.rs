use crate::RunRequest;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;

/// Summary statistics for a completed run.
///
/// All latencies are in seconds and are computed over successful requests only. When no request
/// was issued every rate and percentage is `0`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunReport {
    #[cfg_attr(feature = "serde", serde(rename = "url"))]
    pub target_url: String,
    #[cfg_attr(feature = "serde", serde(rename = "qps"))]
    pub rate_per_second: u32,
    #[cfg_attr(feature = "serde", serde(rename = "duration"))]
    pub duration_seconds: u32,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    #[cfg_attr(feature = "serde", serde(rename = "error_rate"))]
    pub error_rate_percent: f64,
    pub median_latency: f64,
    pub p90_latency: f64,
    pub p99_latency: f64,
    pub avg_latency: f64,
    pub min_latency: f64,
    pub max_latency: f64,
    #[cfg_attr(feature = "serde", serde(rename = "avg_size"))]
    pub avg_response_size: f64,
    #[cfg_attr(feature = "serde", serde(rename = "current_rps"))]
    pub observed_requests_per_second: f64,
    #[cfg_attr(feature = "serde", serde(rename = "current_failures_per_sec"))]
    pub observed_failures_per_second: f64,
    /// Unix timestamp, in seconds.
    #[cfg_attr(feature = "serde", serde(rename = "timestamp"))]
    pub completed_at: f64,
}

impl RunReport {
    /// An all-zero report for a run that has been accepted but has not finished.
    pub fn pending(request: &RunRequest, timestamp: f64) -> Self {
        Self {
            target_url: request.target_url.clone(),
            rate_per_second: request.rate_per_second,
            duration_seconds: request.duration_seconds,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            error_rate_percent: 0.,
            median_latency: 0.,
            p90_latency: 0.,
            p99_latency: 0.,
            avg_latency: 0.,
            min_latency: 0.,
            max_latency: 0.,
            avg_response_size: 0.,
            observed_requests_per_second: 0.,
            observed_failures_per_second: 0.,
            completed_at: timestamp,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Requests={} ({} failed), ErrorRate={:.2}%, RPS={:.2}, p50={:?}, p90={:?}, p99={:?}",
            self.total_requests,
            self.failed_requests,
            self.error_rate_percent,
            self.observed_requests_per_second,
            secs(self.median_latency),
            secs(self.p90_latency),
            secs(self.p99_latency),
        )
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn unix_timestamp() -> f64 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1e9
}
