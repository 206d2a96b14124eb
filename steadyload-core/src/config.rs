use crate::{RunPlan, DEFAULT_MAX_IN_FLIGHT, DEFAULT_REQUEST_TIMEOUT, MIN_IN_FLIGHT};
use std::time::Duration;

/// Engine-wide settings that apply to every run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Hard cap on outstanding requests per run.
    pub max_in_flight: usize,
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Number of requests that may be outstanding at once during the given plan.
    ///
    /// A request lives at most `request_timeout`, so `ceil(rate × request_timeout) + 1` slots let
    /// every tick start on schedule no matter how slow the target is. Bounded by `max_in_flight`
    /// and by `u32::MAX`.
    pub fn in_flight_limit(&self, plan: &RunPlan) -> usize {
        let wanted = (f64::from(plan.rate.get()) * self.request_timeout.as_secs_f64()).ceil() + 1.;
        let ceiling = self.max_in_flight.clamp(MIN_IN_FLIGHT, u32::MAX as usize);
        // NOTE: `as` saturates for out-of-range floats.
        (wanted as usize).clamp(MIN_IN_FLIGHT, ceiling)
    }
}
