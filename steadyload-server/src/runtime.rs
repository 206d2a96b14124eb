//! Server runtime
//!
//! Builds the engine from CLI arguments or builder calls, binds the HTTP API, and optionally
//! installs a Prometheus exporter for the engine's request metrics.
use crate::{
    error::ServerError,
    history::ResultHistory,
    server::{router, ServerState},
};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use steadyload::{EngineConfig, EngineError, Executor, HttpExecutor, LoadGenerator};
use steadyload_core::DEFAULT_MAX_IN_FLIGHT;
use tokio::net::TcpListener;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn};

const DEFAULT_PORT: u16 = 8000;

#[derive(Parser, Debug)]
#[command(version, about = "Fixed-rate HTTP load generator with an HTTP API.")]
pub struct Cli {
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,

    /// Per-request timeout, e.g. `30s` or `1500ms`.
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    request_timeout: Duration,

    /// Cap on concurrently outstanding requests. Dispatch falls behind schedule once reached.
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    max_in_flight: usize,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

/// The steadyload HTTP server.
///
/// # Example
///
/// ```no_run
/// use steadyload_server::LoadTestServer;
///
/// #[tokio::main]
/// async fn main() -> Result<(), steadyload_server::ServerError> {
///     LoadTestServer::new()
///         .with_args()
///         .run()
///         .await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LoadTestServer {
    host: IpAddr,
    port: u16,
    config: EngineConfig,
    metrics_addr: Option<SocketAddr>,
}

impl Default for LoadTestServer {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadTestServer {
    pub fn new() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            config: EngineConfig::default(),
            metrics_addr: None,
        }
    }

    /// Use the default CLI arguments.
    ///
    /// `-p`, `--port` to set the port (default `8000`)
    ///
    /// `--host` to set the bind address (default `0.0.0.0`)
    ///
    /// `--request-timeout` and `--max-in-flight` to tune the engine
    ///
    /// `--metrics-addr` to serve Prometheus metrics
    ///
    /// # Example
    /// ```ignore
    /// $ ./steadyload-server -p 8080 --request-timeout 5s
    /// $ ./steadyload-server --metrics-addr 127.0.0.1:9000
    /// ```
    pub fn with_args(self) -> Self {
        self.with_cli(Cli::parse())
    }

    pub fn with_cli(mut self, cli: Cli) -> Self {
        self.host = cli.host;
        self.port = cli.port;
        self.metrics_addr = cli.metrics_addr;
        self.config = EngineConfig::new()
            .request_timeout(cli.request_timeout)
            .max_in_flight(cli.max_in_flight);
        self
    }

    pub fn host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metrics_addr(mut self, addr: SocketAddr) -> Self {
        self.metrics_addr = Some(addr);
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[instrument(name = "steadyload", skip_all, fields(addr = %self.addr()))]
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.addr()).await?;
        self.serve(listener).await
    }

    /// Serves the API on an already bound listener until Ctrl-C.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        if let Some(addr) = self.metrics_addr {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()?;
            info!("Prometheus metrics on {addr}.");
        }

        let executor = HttpExecutor::new(&self.config)?;
        let generator = LoadGenerator::with_config(executor, self.config);
        let state = Arc::new(ServerState::new(generator, ResultHistory::new()));
        let app = router(state.clone());

        info!("Listening on {}.", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(state))
            .await?;

        info!("Server stopped.");
        Ok(())
    }
}

async fn shutdown_signal<E>(state: Arc<ServerState<E>>)
where
    E: Executor + 'static,
{
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }

    info!("Shutting down.");
    match state.generator().cancel_run() {
        Ok(()) => info!("Cancelled the active run."),
        Err(EngineError::NoRunActive) => {}
        Err(err) => error!("Failed to cancel the active run: {err}"),
    }
}
