use std::sync::PoisonError;
use steadyload_core::ValidationError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid run request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Another run ({0}) is currently in progress.")]
    RunInProgress(Uuid),

    #[error("No run is currently active.")]
    NoRunActive,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Run slot mutex is poisoned.")]
    PoisonData,
}

impl<T> From<PoisonError<T>> for EngineError {
    fn from(_err: PoisonError<T>) -> Self {
        Self::PoisonData
    }
}
