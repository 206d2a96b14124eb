use std::time::Duration;

/// Upper bound on concurrently outstanding requests for a single run, unless configured otherwise.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 65_536;

pub const MIN_IN_FLIGHT: usize = 1;

/// The default timeout for a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
