use std::sync::PoisonError;
use steadyload::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install the Prometheus exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Mutex is poisoned.")]
    PoisonData,
}

impl<T> From<PoisonError<T>> for ServerError {
    fn from(_err: PoisonError<T>) -> Self {
        Self::PoisonData
    }
}
