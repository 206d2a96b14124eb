//! Request execution
use crate::EngineError;
use reqwest::Client;
use std::future::Future;
use steadyload_core::{EngineConfig, FailureReason, Outcome};
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Issues a single request and classifies the result.
///
/// Implementations must never fail: every error is reported as an [`Outcome::Failure`], so the
/// engine has no per-request error handling of its own. No retries happen at this layer.
///
/// Implementors can use `async fn execute`; the returned future must be `Send` because each
/// call runs on its own request task.
pub trait Executor: Send + Sync {
    fn execute(&self, target: &str) -> impl Future<Output = Outcome> + Send;
}

/// [`Executor`] issuing HTTP GETs over a shared, keep-alive `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.max_in_flight)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Executor for HttpExecutor {
    async fn execute(&self, target: &str) -> Outcome {
        let start = Instant::now();

        let response = match self.client.get(target).send().await {
            Ok(response) => response,
            Err(err) => return Outcome::failure(classify(&err)),
        };

        let status = response.status();
        if !status.is_success() {
            return Outcome::failure(FailureReason::Status(status.as_u16()));
        }

        match response.bytes().await {
            Ok(body) => Outcome::success(start.elapsed(), body.len() as u64),
            Err(err) => Outcome::failure(classify(&err)),
        }
    }
}

fn classify(err: &reqwest::Error) -> FailureReason {
    if err.is_timeout() {
        FailureReason::Timeout
    } else {
        FailureReason::Transport(err.to_string())
    }
}
