use crate::{export::export_csv, history::ResultHistory, ServerError};
use axum::{
    extract::{rejection::JsonRejection, Json, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use steadyload::{
    unix_timestamp, EngineError, Executor, LoadGenerator, Run, RunReport, RunRequest, RunStatus,
};
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument, Instrument};

/// Shared state behind every handler.
pub struct ServerState<E> {
    generator: LoadGenerator<E>,
    history: ResultHistory,
}

impl<E> ServerState<E>
where
    E: Executor + 'static,
{
    pub fn new(generator: LoadGenerator<E>, history: ResultHistory) -> Self {
        Self { generator, history }
    }

    pub fn generator(&self) -> &LoadGenerator<E> {
        &self.generator
    }

    pub fn history(&self) -> &ResultHistory {
        &self.history
    }
}

pub fn router<E>(state: Arc<ServerState<E>>) -> Router
where
    E: Executor + 'static,
{
    Router::new()
        .route("/loadtest", post(run::<E>))
        .route("/stop", post(stop::<E>))
        .route("/results", get(results::<E>))
        .route("/results.csv", get(results_csv::<E>))
        .route("/status", get(status::<E>))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[derive(Error, Debug)]
enum HandlerError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    Rejection(#[from] JsonRejection),

    #[error("Run task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct Detail {
    detail: String,
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        use HandlerError::*;
        let (status, detail) = match self {
            Engine(EngineError::Validation(err)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            Engine(EngineError::RunInProgress(_)) => (
                StatusCode::BAD_REQUEST,
                "Another test is currently running.".to_string(),
            ),
            Engine(EngineError::NoRunActive) => (
                StatusCode::BAD_REQUEST,
                "No test is currently running.".to_string(),
            ),
            Rejection(rejection) => (rejection.status(), rejection.body_text()),
            err => {
                error!("Internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal error: {err}"),
                )
            }
        };
        (status, Json(Detail { detail })).into_response()
    }
}

#[derive(Deserialize, Debug, Default)]
struct RunQuery {
    #[serde(default)]
    wait: bool,
}

#[instrument(skip(state))]
async fn run<E>(
    State(state): State<Arc<ServerState<E>>>,
    Query(query): Query<RunQuery>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunReport>, HandlerError>
where
    E: Executor + 'static,
{
    let Json(request) = payload?;
    let pending = RunReport::pending(&request, unix_timestamp());
    let run = state.generator.begin(request)?;

    // The run lives on its own task so a dropped connection never abandons it.
    let task = tokio::spawn(execute_and_record(run, state.history.clone()).in_current_span());
    if !query.wait {
        return Ok(Json(pending));
    }

    Ok(Json(task.await??))
}

async fn execute_and_record<E>(run: Run<E>, history: ResultHistory) -> Result<RunReport, ServerError>
where
    E: Executor + 'static,
{
    let report = run.execute().await;
    if let Err(err) = history.push(report.clone()) {
        error!("Failed to record run report: {err}");
        return Err(err);
    }
    Ok(report)
}

async fn stop<E>(State(state): State<Arc<ServerState<E>>>) -> Result<Json<Message>, HandlerError>
where
    E: Executor + 'static,
{
    state.generator.cancel_run()?;
    info!("Stop requested.");
    Ok(Json(Message {
        message: "Test stopped",
    }))
}

async fn results<E>(
    State(state): State<Arc<ServerState<E>>>,
) -> Result<Json<Vec<RunReport>>, HandlerError>
where
    E: Executor + 'static,
{
    Ok(Json(state.history.snapshot()?))
}

async fn results_csv<E>(
    State(state): State<Arc<ServerState<E>>>,
) -> Result<impl IntoResponse, HandlerError>
where
    E: Executor + 'static,
{
    let reports = state.history.snapshot()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"load_test_results.csv\"",
            ),
        ],
        export_csv(&reports),
    ))
}

async fn status<E>(
    State(state): State<Arc<ServerState<E>>>,
) -> Result<Json<Option<RunStatus>>, HandlerError>
where
    E: Executor + 'static,
{
    let status = state.generator.active_run()?.map(|handle| handle.status());
    Ok(Json(status))
}
