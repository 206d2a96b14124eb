//! Target service for exercising the load generator.
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{Arc, RwLock},
    time::Duration,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

#[derive(Clone, Default)]
pub struct MockState {
    limiters: Arc<RwLock<HashMap<u32, Arc<DefaultDirectRateLimiter>>>>,
}

pub fn app() -> Router {
    Router::new()
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/bytes/:size", get(bytes))
        .route("/status/:code", get(status))
        .route("/max/:max_tps/delay/ms/:delay_ms", get(max))
        .with_state(MockState::default())
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Mock service listening on {}", listener.local_addr()?);
    axum::serve(listener, app()).await?;
    Ok(())
}

/// Starts the service on an ephemeral localhost port and returns its address.
pub async fn spawn() -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app()).await });
    Ok(addr)
}

#[debug_handler]
pub async fn delay(Path(delay_ms): Path<u64>) {
    counter!("mock_service_requests").increment(1);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

#[debug_handler]
pub async fn bytes(Path(size): Path<usize>) -> Vec<u8> {
    counter!("mock_service_requests").increment(1);
    vec![b'x'; size]
}

#[debug_handler]
pub async fn status(Path(code): Path<u16>) -> StatusCode {
    counter!("mock_service_requests").increment(1);
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// Fails with 500 once more than `max_tps` requests per second arrive.
#[debug_handler]
pub async fn max(
    State(state): State<MockState>,
    Path((max_tps, delay_ms)): Path<(u32, u64)>,
) -> Result<(), StatusCode> {
    counter!("mock_service_requests").increment(1);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let limiter = state.limiter(max_tps)?;
    match limiter.check() {
        Ok(_) => Ok(()),
        Err(_) => {
            debug!("Over {max_tps} TPS");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

impl MockState {
    fn limiter(&self, max_tps: u32) -> Result<Arc<DefaultDirectRateLimiter>, StatusCode> {
        let tps = NonZeroU32::new(max_tps).ok_or(StatusCode::BAD_REQUEST)?;

        let existing = self
            .limiters
            .read()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .get(&max_tps)
            .cloned();
        if let Some(limiter) = existing {
            return Ok(limiter);
        }

        let mut limiters = self
            .limiters
            .write()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(limiters
            .entry(max_tps)
            .or_insert_with(|| Arc::new(rate_limiter(tps)))
            .clone())
    }
}

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}
