#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

/// Parameters for a single load test run.
///
/// The rate and duration are plain integers so that any caller-supplied value can be represented;
/// use [`RunRequest::plan`] to validate them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunRequest {
    #[cfg_attr(feature = "serde", serde(rename = "url"))]
    pub target_url: String,
    #[cfg_attr(feature = "serde", serde(rename = "qps"))]
    pub rate_per_second: u32,
    #[cfg_attr(feature = "serde", serde(rename = "duration"))]
    pub duration_seconds: u32,
}

impl RunRequest {
    pub fn new(target_url: impl Into<String>, rate_per_second: u32, duration_seconds: u32) -> Self {
        Self {
            target_url: target_url.into(),
            rate_per_second,
            duration_seconds,
        }
    }

    pub fn plan(&self) -> Result<RunPlan, ValidationError> {
        let rate = NonZeroU32::new(self.rate_per_second)
            .ok_or(ValidationError::Rate(self.rate_per_second))?;
        let duration = NonZeroU32::new(self.duration_seconds)
            .ok_or(ValidationError::Duration(self.duration_seconds))?;
        Ok(RunPlan { rate, duration })
    }
}

/// A validated rate and duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunPlan {
    pub rate: NonZeroU32,
    pub duration: NonZeroU32,
}

impl RunPlan {
    pub fn total_requests(&self) -> u64 {
        u64::from(self.rate.get()) * u64::from(self.duration.get())
    }

    /// Intended spacing between two ticks.
    pub fn interval(&self) -> Duration {
        // NOTE: Rates above 1e9/s would round down to a zero interval, which tokio rejects.
        (Duration::from_secs(1) / self.rate.get()).max(Duration::from_nanos(1))
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration.get()))
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Rate must be at least 1 request per second, got {0}")]
    Rate(u32),

    #[error("Duration must be at least 1 second, got {0}")]
    Duration(u32),
}
