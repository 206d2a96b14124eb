use std::fmt;
use std::time::Duration;

/// Result of a single request attempt.
///
/// Failures are not timed; they report zero latency and zero size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success { latency: Duration, size: u64 },
    Failure { reason: FailureReason },
}

impl Outcome {
    pub fn success(latency: Duration, size: u64) -> Self {
        Self::Success { latency, size }
    }

    pub fn failure(reason: FailureReason) -> Self {
        Self::Failure { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn latency_seconds(&self) -> f64 {
        match self {
            Self::Success { latency, .. } => latency.as_secs_f64(),
            Self::Failure { .. } => 0.,
        }
    }

    pub fn response_size(&self) -> u64 {
        match self {
            Self::Success { size, .. } => *size,
            Self::Failure { .. } => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// The target answered with a non-2xx status code.
    Status(u16),
    Timeout,
    /// Connection, protocol, or body read error.
    Transport(String),
    /// The task running the request died before producing an outcome.
    Aborted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Aborted => write!(f, "request aborted"),
        }
    }
}
